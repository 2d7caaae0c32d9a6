//! Football fixtures pulled from API-Football, filtered by allowed league and
//! importable into the site's own match list.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{RwLock, broadcast};
use tracing::{error, info};

use crate::clients::api_football::{ApiFixture, ApiFootballClient};
use crate::config::Config;
use crate::db::Store;
use crate::db::repositories::fixture::{
    AllowedLeague, Fixture, FixtureUpsert, NewSyncLog, SyncLog,
};
use crate::db::repositories::matches::{Match, NewMatch};
use crate::domain::events::NotificationEvent;
use crate::domain::slug::fixture_slug;
use crate::domain::{DayMode, MatchStatus};

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for FixtureError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for FixtureError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SyncOutcome {
    pub mode: DayMode,
    pub date: String,
    pub ok: bool,
    pub fetched: u32,
    pub skipped: u32,
    pub imported: u32,
    pub updated: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportResult {
    pub created: bool,
    #[serde(rename = "match")]
    pub imported: Match,
}

/// Map an API-Football short status onto the site's three states.
#[must_use]
pub fn normalize_status(short: &str) -> MatchStatus {
    match short {
        "1H" | "HT" | "2H" | "ET" | "P" | "LIVE" | "BT" => MatchStatus::Live,
        "FT" | "AET" | "PEN" => MatchStatus::Finished,
        _ => MatchStatus::Upcoming,
    }
}

#[must_use]
pub fn fallback_description(home: &str, away: &str, league: &str, status: MatchStatus) -> String {
    match status {
        MatchStatus::Upcoming => format!(
            "{home} vs {away} waa ciyaar ka tirsan {league}. Daawo ciyaarta maanta Fanbroj si toos ah."
        ),
        MatchStatus::Live => format!(
            "{home} vs {away} hadda waa socota oo waa ciyaar ka tirsan {league}. Daawo ciyaarta live Fanbroj."
        ),
        MatchStatus::Finished => format!(
            "{home} vs {away} waa ciyaar ka tirsan {league}. Ciyaartu way dhamaatay. Natiijooyinka iyo dib-u-eegista ciyaarta ayaa lasoo gelin doonaa dhowaan Fanbroj."
        ),
    }
}

/// `YYYY-MM-DD` for `mode`, as seen from `UTC + offset_hours`.
#[must_use]
pub fn date_for_mode(mode: DayMode, now: DateTime<Utc>, offset_hours: i32) -> String {
    let local = now + Duration::hours(i64::from(offset_hours)) + Duration::days(mode.day_offset());
    local.format("%Y-%m-%d").to_string()
}

fn to_upsert(raw: ApiFixture, date: &str, default_tz: &str) -> FixtureUpsert {
    let status = normalize_status(&raw.fixture.status.short);
    let description =
        fallback_description(&raw.teams.home.name, &raw.teams.away.name, &raw.league.name, status);

    FixtureUpsert {
        api_fixture_id: raw.fixture.id,
        slug: fixture_slug(&raw.teams.home.name, &raw.teams.away.name, date),
        kickoff_at: raw.fixture.timestamp * 1000,
        kickoff_iso: raw.fixture.date,
        timezone: raw
            .fixture
            .timezone
            .filter(|tz| !tz.is_empty())
            .unwrap_or_else(|| default_tz.to_string()),
        status,
        raw_status_short: raw.fixture.status.short,
        raw_status_long: raw.fixture.status.long,
        home_name: raw.teams.home.name,
        home_logo: raw.teams.home.logo,
        away_name: raw.teams.away.name,
        away_logo: raw.teams.away.logo,
        league_name: raw.league.name,
        league_logo: raw.league.logo,
        description,
        fetched_for_date: date.to_string(),
    }
}

pub struct FixtureService {
    store: Store,
    client: Arc<ApiFootballClient>,
    config: Arc<RwLock<Config>>,
    event_bus: broadcast::Sender<NotificationEvent>,
}

impl FixtureService {
    #[must_use]
    pub const fn new(
        store: Store,
        client: Arc<ApiFootballClient>,
        config: Arc<RwLock<Config>>,
        event_bus: broadcast::Sender<NotificationEvent>,
    ) -> Self {
        Self {
            store,
            client,
            config,
            event_bus,
        }
    }

    async fn date_for(&self, mode: DayMode) -> String {
        let offset = self.config.read().await.fixtures.utc_offset_hours;
        date_for_mode(mode, Utc::now(), offset)
    }

    // ========================================================================
    // Sync
    // ========================================================================

    /// Fetch one day and upsert the fixtures of enabled leagues. A failed
    /// fetch is logged and reported in the outcome rather than returned as an error.
    pub async fn sync(&self, mode: DayMode) -> Result<SyncOutcome, FixtureError> {
        let date = self.date_for(mode).await;
        let timezone = self.config.read().await.fixtures.timezone.clone();

        let mut outcome = SyncOutcome {
            mode,
            date: date.clone(),
            ok: true,
            fetched: 0,
            skipped: 0,
            imported: 0,
            updated: 0,
            error: None,
        };

        match self.client.fixtures_for_date(&date, &timezone).await {
            Ok(raw) => {
                let allowed: HashSet<String> = self
                    .store
                    .fixtures()
                    .enabled_league_names()
                    .await?
                    .into_iter()
                    .collect();

                outcome.fetched = u32::try_from(raw.len()).unwrap_or(u32::MAX);
                for fixture in raw {
                    if !allowed.contains(&fixture.league.name) {
                        outcome.skipped += 1;
                        continue;
                    }
                    let upsert = to_upsert(fixture, &date, &timezone);
                    if self.store.fixtures().upsert(upsert).await? {
                        outcome.imported += 1;
                    } else {
                        outcome.updated += 1;
                    }
                }
            }
            Err(e) => {
                error!(mode = %mode, date = %date, error = %e, "Fixture fetch failed");
                outcome.ok = false;
                outcome.error = Some(e.to_string());
            }
        }

        self.store
            .fixtures()
            .log_sync(NewSyncLog {
                date: date.clone(),
                mode: mode.as_str().to_string(),
                ok: outcome.ok,
                fetched: i32::try_from(outcome.fetched).unwrap_or(i32::MAX),
                skipped: i32::try_from(outcome.skipped).unwrap_or(i32::MAX),
                imported: i32::try_from(outcome.imported).unwrap_or(i32::MAX),
                updated: i32::try_from(outcome.updated).unwrap_or(i32::MAX),
                error: outcome.error.clone(),
            })
            .await?;

        info!(
            mode = %mode,
            date = %date,
            ok = outcome.ok,
            fetched = outcome.fetched,
            skipped = outcome.skipped,
            imported = outcome.imported,
            updated = outcome.updated,
            "Fixture sync finished"
        );
        let _ = self.event_bus.send(NotificationEvent::FixturesSynced {
            mode: mode.as_str().to_string(),
            ok: outcome.ok,
            imported: outcome.imported,
            updated: outcome.updated,
            skipped: outcome.skipped,
        });

        Ok(outcome)
    }

    pub async fn sync_all_days(&self) -> Result<Vec<SyncOutcome>, FixtureError> {
        let mut outcomes = Vec::with_capacity(DayMode::ALL.len());
        for mode in DayMode::ALL {
            outcomes.push(self.sync(*mode).await?);
        }
        Ok(outcomes)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub async fn by_day(
        &self,
        mode: DayMode,
        status: Option<MatchStatus>,
    ) -> Result<Vec<Fixture>, FixtureError> {
        let date = self.date_for(mode).await;
        Ok(self.store.fixtures().for_date(&date, status).await?)
    }

    pub async fn live(&self) -> Result<Vec<Fixture>, FixtureError> {
        Ok(self.store.fixtures().with_status(MatchStatus::Live).await?)
    }

    pub async fn upcoming_today(&self) -> Result<Vec<Fixture>, FixtureError> {
        self.by_day(DayMode::Today, Some(MatchStatus::Upcoming)).await
    }

    pub async fn finished_today(&self) -> Result<Vec<Fixture>, FixtureError> {
        self.by_day(DayMode::Today, Some(MatchStatus::Finished)).await
    }

    pub async fn by_slug(&self, slug: &str) -> Result<Fixture, FixtureError> {
        self.store
            .fixtures()
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| FixtureError::NotFound(format!("Fixture '{slug}'")))
    }

    pub async fn all(
        &self,
        status: Option<MatchStatus>,
        limit: Option<u64>,
    ) -> Result<Vec<Fixture>, FixtureError> {
        Ok(self.store.fixtures().list(status, limit).await?)
    }

    pub async fn sync_logs(&self, limit: u64) -> Result<Vec<SyncLog>, FixtureError> {
        Ok(self.store.fixtures().sync_logs(limit).await?)
    }

    /// Create a site match from a fixture, or return the match already using its slug.
    pub async fn import_to_match(&self, fixture_id: i32) -> Result<ImportResult, FixtureError> {
        let fixture = self
            .store
            .fixtures()
            .get(fixture_id)
            .await?
            .ok_or_else(|| FixtureError::NotFound(format!("Fixture {fixture_id}")))?;

        let matches = self.store.matches();
        if let Some(existing) = matches.get_by_slug(&fixture.slug).await? {
            return Ok(ImportResult {
                created: false,
                imported: existing,
            });
        }

        let status = fixture
            .status
            .parse::<MatchStatus>()
            .unwrap_or(MatchStatus::Upcoming);
        let league_id = self
            .store
            .fixtures()
            .leagues()
            .await?
            .into_iter()
            .find(|l| l.league_name == fixture.league_name)
            .map(|l| l.api_league_id.to_string());

        let created = matches
            .create(NewMatch {
                slug: fixture.slug.clone(),
                title: format!("{} vs {}", fixture.home_name, fixture.away_name),
                team_a: fixture.home_name,
                team_b: fixture.away_name,
                team_a_logo: fixture.home_logo,
                team_b_logo: fixture.away_logo,
                league_id,
                league_name: Some(fixture.league_name),
                kickoff_at: fixture.kickoff_at,
                status,
                is_premium: false,
                required_plan: None,
                embeds: Vec::new(),
                thumbnail_url: None,
                summary: Some(fixture.description),
                score_a: None,
                score_b: None,
                minute: None,
            })
            .await?;

        info!(fixture_id, match_id = created.id, slug = %created.slug, "Fixture imported");
        let _ = self.event_bus.send(NotificationEvent::MatchCreated {
            id: created.id,
            slug: created.slug.clone(),
            title: created.title.clone(),
        });

        Ok(ImportResult {
            created: true,
            imported: created,
        })
    }

    // ========================================================================
    // Allowed leagues
    // ========================================================================

    pub async fn leagues(&self) -> Result<Vec<AllowedLeague>, FixtureError> {
        Ok(self.store.fixtures().leagues().await?)
    }

    pub async fn add_league(
        &self,
        name: &str,
        api_league_id: i32,
    ) -> Result<AllowedLeague, FixtureError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FixtureError::Validation("league_name is required".to_string()));
        }
        if self
            .store
            .fixtures()
            .league_by_api_id(api_league_id)
            .await?
            .is_some()
        {
            return Err(FixtureError::Conflict(format!(
                "League {api_league_id} is already allowed"
            )));
        }
        Ok(self.store.fixtures().add_league(name, api_league_id).await?)
    }

    /// Flip a league on or off. Returns the new state.
    pub async fn toggle_league(&self, id: i32) -> Result<bool, FixtureError> {
        let league = self
            .leagues()
            .await?
            .into_iter()
            .find(|l| l.id == id)
            .ok_or_else(|| FixtureError::NotFound(format!("League {id}")))?;

        let enabled = !league.enabled;
        self.store.fixtures().set_league_enabled(id, enabled).await?;
        Ok(enabled)
    }

    pub async fn seed_leagues(&self) -> Result<usize, FixtureError> {
        Ok(self.store.fixtures().seed_leagues().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_normalize_status() {
        for s in ["NS", "TBD", "PST", "CANC", ""] {
            assert_eq!(normalize_status(s), MatchStatus::Upcoming, "{s}");
        }
        for s in ["1H", "HT", "2H", "ET", "P", "LIVE", "BT"] {
            assert_eq!(normalize_status(s), MatchStatus::Live, "{s}");
        }
        for s in ["FT", "AET", "PEN"] {
            assert_eq!(normalize_status(s), MatchStatus::Finished, "{s}");
        }
    }

    #[test]
    fn test_date_for_mode_uses_offset() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 22, 30, 0).unwrap();
        assert_eq!(date_for_mode(DayMode::Today, now, 3), "2026-03-15");
        assert_eq!(date_for_mode(DayMode::Today, now, 0), "2026-03-14");
        assert_eq!(date_for_mode(DayMode::Yesterday, now, 3), "2026-03-14");
        assert_eq!(date_for_mode(DayMode::Tomorrow, now, 3), "2026-03-16");
    }

    #[test]
    fn test_fallback_description_mentions_teams() {
        let text = fallback_description("Arsenal", "Chelsea", "Premier League", MatchStatus::Live);
        assert!(text.starts_with("Arsenal vs Chelsea hadda waa socota"));
        assert!(text.contains("Premier League"));
    }
}
