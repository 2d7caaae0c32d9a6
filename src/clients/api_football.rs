use anyhow::{Context, Result, bail};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiFixture {
    pub fixture: FixtureInfo,
    pub league: League,
    pub teams: Teams,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureInfo {
    pub id: i64,
    pub date: String,
    pub timestamp: i64,
    #[serde(default)]
    pub timezone: Option<String>,
    pub status: FixtureStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureStatus {
    #[serde(default)]
    pub long: String,
    #[serde(default)]
    pub short: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct League {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Teams {
    pub home: Team,
    pub away: Team,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Team {
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
}

#[derive(Deserialize)]
struct FixturesResponse {
    #[serde(default)]
    errors: Value,
    #[serde(default)]
    response: Vec<ApiFixture>,
}

/// API-Football reports problems as either `[]` or `{field: message}`.
fn has_errors(errors: &Value) -> bool {
    match errors {
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

pub struct ApiFootballClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ApiFootballClient {
    #[must_use]
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// All fixtures on `date` (`YYYY-MM-DD`) in `timezone`.
    pub async fn fixtures_for_date(&self, date: &str, timezone: &str) -> Result<Vec<ApiFixture>> {
        if !self.is_configured() {
            bail!("APISPORTS_KEY is not configured");
        }

        let url = format!("{}/fixtures", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("date", date), ("timezone", timezone)])
            .header("x-apisports-key", &self.api_key)
            .send()
            .await
            .context("Failed to reach API-Football")?;

        let status = response.status();
        if !status.is_success() {
            bail!("API returned {status}");
        }

        let body: FixturesResponse = response
            .json()
            .await
            .context("Failed to decode API-Football response")?;

        if has_errors(&body.errors) {
            bail!("{}", body.errors);
        }

        debug!(date, count = body.response.len(), "Fetched fixtures");
        Ok(body.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_shapes() {
        assert!(!has_errors(&serde_json::json!([])));
        assert!(!has_errors(&serde_json::json!({})));
        assert!(!has_errors(&Value::Null));
        assert!(has_errors(&serde_json::json!({"token": "Error/Missing application key"})));
        assert!(has_errors(&serde_json::json!(["rate limit"])));
    }

    #[test]
    fn test_parse_fixture() {
        let raw = r#"{
            "errors": [],
            "response": [{
                "fixture": {"id": 1035037, "date": "2026-03-14T15:00:00+03:00",
                            "timestamp": 1773489600, "timezone": "Africa/Mogadishu",
                            "status": {"long": "Not Started", "short": "NS"}},
                "league": {"id": 39, "name": "Premier League", "logo": "https://x/39.png"},
                "teams": {"home": {"name": "Arsenal", "logo": null},
                          "away": {"name": "Chelsea", "logo": "https://x/49.png"}}
            }]
        }"#;
        let parsed: FixturesResponse = serde_json::from_str(raw).unwrap();
        assert!(!has_errors(&parsed.errors));
        assert_eq!(parsed.response.len(), 1);
        let f = &parsed.response[0];
        assert_eq!(f.fixture.status.short, "NS");
        assert_eq!(f.teams.home.logo, None);
        assert_eq!(f.league.name, "Premier League");
    }
}
