//! Search analytics: what visitors type, what they click, and what comes up empty.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::limits::MIN_SEARCH_QUERY_CHARS;
use crate::constants::time::MILLIS_PER_DAY;
use crate::db::Store;
use crate::db::repositories::movie::{Movie, MovieFilter};
use crate::db::repositories::search::SearchEvent;
use crate::domain::{SearchItemType, now_millis};

/// Top queries matched against titles when filling the content list.
const CONTENT_QUERY_POOL: usize = 20;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AnalyticsError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AnalyticsError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub struct SearchSummary {
    pub total: u64,
    pub zero_result: u64,
    pub zero_result_rate: u64,
    pub clicked: u64,
    pub click_through_rate: u64,
    pub unique_devices: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct QueryStat {
    pub query: String,
    pub count: u64,
    pub clicks: u64,
    pub no_results: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ZeroResultQuery {
    pub query: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TrendPoint {
    pub date: String,
    pub searches: u64,
    pub zero_results: u64,
    pub clicks: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentItem {
    #[serde(rename = "type")]
    pub kind: SearchItemType,
    #[serde(flatten)]
    pub movie: Movie,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackRequest {
    pub query: String,
    #[serde(default)]
    pub results_count: i32,
    #[serde(default)]
    pub device_id: Option<String>,
}

fn percent(part: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    (part * 100 + total / 2) / total
}

fn utc_date(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

#[must_use]
pub fn summarize(events: &[SearchEvent]) -> SearchSummary {
    let total = events.len() as u64;
    let zero_result = events.iter().filter(|e| !e.has_results).count() as u64;
    let clicked = events.iter().filter(|e| e.clicked_item.is_some()).count() as u64;
    let unique_devices = events
        .iter()
        .filter_map(|e| e.device_id.as_deref())
        .collect::<HashSet<_>>()
        .len() as u64;

    SearchSummary {
        total,
        zero_result,
        zero_result_rate: percent(zero_result, total),
        clicked,
        click_through_rate: percent(clicked, total),
        unique_devices,
    }
}

/// Aggregated by lowercase query, most frequent first.
#[must_use]
pub fn top_queries(events: &[SearchEvent], limit: usize) -> Vec<QueryStat> {
    let mut by_query: HashMap<&str, QueryStat> = HashMap::new();
    for event in events {
        let stat = by_query
            .entry(event.query_lower.as_str())
            .or_insert_with(|| QueryStat {
                query: event.query_lower.clone(),
                count: 0,
                clicks: 0,
                no_results: 0,
            });
        stat.count += 1;
        if event.clicked_item.is_some() {
            stat.clicks += 1;
        }
        if !event.has_results {
            stat.no_results += 1;
        }
    }

    let mut stats: Vec<QueryStat> = by_query.into_values().collect();
    stats.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.query.cmp(&b.query)));
    stats.truncate(limit);
    stats
}

#[must_use]
pub fn zero_result_queries(events: &[SearchEvent], limit: usize) -> Vec<ZeroResultQuery> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for event in events.iter().filter(|e| !e.has_results) {
        *counts.entry(event.query_lower.as_str()).or_default() += 1;
    }

    let mut rows: Vec<ZeroResultQuery> = counts
        .into_iter()
        .map(|(query, count)| ZeroResultQuery {
            query: query.to_string(),
            count,
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.query.cmp(&b.query)));
    rows.truncate(limit);
    rows
}

/// One point per UTC day that has searches, oldest first.
#[must_use]
pub fn trend(events: &[SearchEvent]) -> Vec<TrendPoint> {
    let mut days: BTreeMap<String, TrendPoint> = BTreeMap::new();
    for event in events {
        let date = utc_date(event.created_at);
        let point = days.entry(date.clone()).or_insert_with(|| TrendPoint {
            date,
            searches: 0,
            zero_results: 0,
            clicks: 0,
        });
        point.searches += 1;
        if !event.has_results {
            point.zero_results += 1;
        }
        if event.clicked_item.is_some() {
            point.clicks += 1;
        }
    }
    days.into_values().collect()
}

pub struct AnalyticsService {
    store: Store,
}

impl AnalyticsService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn window(&self, days: i64) -> Result<Vec<SearchEvent>, AnalyticsError> {
        let since = now_millis() - days.max(1) * MILLIS_PER_DAY;
        Ok(self.store.searches().since(since).await?)
    }

    /// Returns `None` when the query is too short to be worth keeping.
    pub async fn track(&self, request: TrackRequest) -> Result<Option<i32>, AnalyticsError> {
        let query = request.query.trim();
        if query.chars().count() < MIN_SEARCH_QUERY_CHARS {
            return Ok(None);
        }
        let id = self
            .store
            .searches()
            .insert(query, request.results_count.max(0), request.device_id)
            .await?;
        Ok(Some(id))
    }

    pub async fn track_click(
        &self,
        id: i32,
        item: &str,
        kind: SearchItemType,
    ) -> Result<bool, AnalyticsError> {
        if item.trim().is_empty() {
            return Err(AnalyticsError::Validation("clicked item is required".to_string()));
        }
        Ok(self.store.searches().set_click(id, item, kind).await?)
    }

    pub async fn summary(&self, days: i64) -> Result<SearchSummary, AnalyticsError> {
        Ok(summarize(&self.window(days).await?))
    }

    pub async fn top_queries(
        &self,
        days: i64,
        limit: usize,
    ) -> Result<Vec<QueryStat>, AnalyticsError> {
        Ok(top_queries(&self.window(days).await?, limit))
    }

    pub async fn zero_result_queries(
        &self,
        days: i64,
        limit: usize,
    ) -> Result<Vec<ZeroResultQuery>, AnalyticsError> {
        Ok(zero_result_queries(&self.window(days).await?, limit))
    }

    pub async fn recent(&self, limit: u64) -> Result<Vec<SearchEvent>, AnalyticsError> {
        Ok(self.store.searches().recent(limit).await?)
    }

    pub async fn trend(&self, days: i64) -> Result<Vec<TrendPoint>, AnalyticsError> {
        Ok(trend(&self.window(days).await?))
    }

    /// Trending list: clicked titles, then titles matching popular queries,
    /// then the most viewed published movies.
    pub async fn most_searched_content(
        &self,
        days: i64,
        limit: usize,
    ) -> Result<Vec<ContentItem>, AnalyticsError> {
        let events = self.window(days).await?;
        let movies = self.store.movies();
        let mut results: Vec<ContentItem> = Vec::with_capacity(limit);
        let mut seen: HashSet<String> = HashSet::new();

        let mut clicks: HashMap<(SearchItemType, &str), u64> = HashMap::new();
        for event in &events {
            let (Some(item), Some(kind)) = (event.clicked_item.as_deref(), event.clicked_type.as_deref())
            else {
                continue;
            };
            match kind.parse::<SearchItemType>() {
                Ok(SearchItemType::Match) | Err(_) => {}
                Ok(kind) => *clicks.entry((kind, item)).or_default() += 1,
            }
        }
        let mut clicked: Vec<_> = clicks.into_iter().collect();
        clicked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.1.cmp(b.0.1)));

        for ((kind, slug), _) in clicked {
            if results.len() >= limit {
                break;
            }
            if seen.contains(slug) {
                continue;
            }
            if let Some(movie) = movies.get_by_slug(slug).await?
                && movie.is_published
            {
                seen.insert(movie.slug.clone());
                results.push(ContentItem { kind, movie });
            }
        }

        if results.len() < limit {
            let answered: Vec<SearchEvent> =
                events.iter().filter(|e| e.has_results).cloned().collect();
            let popular = top_queries(&answered, CONTENT_QUERY_POOL);
            let published = movies
                .list(&MovieFilter {
                    published: Some(true),
                    ..Default::default()
                })
                .await?;

            'queries: for stat in popular {
                for movie in &published {
                    if results.len() >= limit {
                        break 'queries;
                    }
                    if seen.contains(&movie.slug) {
                        continue;
                    }
                    let title_hit = movie.title.to_lowercase().contains(&stat.query);
                    let somali_hit = movie
                        .title_somali
                        .as_deref()
                        .is_some_and(|t| t.to_lowercase().contains(&stat.query));
                    if title_hit || somali_hit {
                        seen.insert(movie.slug.clone());
                        results.push(ContentItem {
                            kind: SearchItemType::Movie,
                            movie: movie.clone(),
                        });
                    }
                }
            }
        }

        if results.len() < limit {
            let pad = u64::try_from(limit + seen.len()).unwrap_or(u64::MAX);
            for movie in movies.most_viewed(pad).await? {
                if results.len() >= limit {
                    break;
                }
                if seen.insert(movie.slug.clone()) {
                    results.push(ContentItem {
                        kind: SearchItemType::Movie,
                        movie,
                    });
                }
            }
        }

        results.truncate(limit);
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(query: &str, results: i32, clicked: Option<&str>, device: Option<&str>, at: i64) -> SearchEvent {
        SearchEvent {
            id: 0,
            query: query.to_string(),
            query_lower: query.to_lowercase(),
            results_count: results,
            has_results: results > 0,
            device_id: device.map(str::to_string),
            clicked_item: clicked.map(str::to_string),
            clicked_type: clicked.map(|_| "movie".to_string()),
            created_at: at,
        }
    }

    #[test]
    fn test_summary_rates() {
        let events = vec![
            event("Arsenal", 3, Some("arsenal-vs-chelsea"), Some("d1"), 0),
            event("arsenal", 0, None, Some("d1"), 0),
            event("Barca", 0, None, Some("d2"), 0),
            event("Kgf", 2, None, None, 0),
        ];
        let summary = summarize(&events);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.zero_result, 2);
        assert_eq!(summary.zero_result_rate, 50);
        assert_eq!(summary.clicked, 1);
        assert_eq!(summary.click_through_rate, 25);
        assert_eq!(summary.unique_devices, 2);
    }

    #[test]
    fn test_summary_empty_has_zero_rates() {
        assert_eq!(summarize(&[]), SearchSummary::default());
    }

    #[test]
    fn test_top_queries_groups_case_insensitively() {
        let events = vec![
            event("Arsenal", 3, Some("x"), None, 0),
            event("ARSENAL", 0, None, None, 0),
            event("kgf", 1, None, None, 0),
        ];
        let top = top_queries(&events, 20);
        assert_eq!(top[0].query, "arsenal");
        assert_eq!(top[0].count, 2);
        assert_eq!(top[0].clicks, 1);
        assert_eq!(top[0].no_results, 1);
        assert_eq!(top.len(), 2);
        assert_eq!(top_queries(&events, 1).len(), 1);
    }

    #[test]
    fn test_trend_buckets_by_utc_day() {
        let day = MILLIS_PER_DAY;
        let events = vec![
            event("a", 0, None, None, day + 10),
            event("b", 1, None, None, 10),
            event("c", 1, Some("x"), None, day + 20),
        ];
        let points = trend(&events);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, "1970-01-01");
        assert_eq!(points[1].date, "1970-01-02");
        assert_eq!(points[1].searches, 2);
        assert_eq!(points[1].zero_results, 1);
        assert_eq!(points[1].clicks, 1);
    }

    #[test]
    fn test_zero_result_queries() {
        let events = vec![
            event("nope", 0, None, None, 0),
            event("Nope", 0, None, None, 0),
            event("found", 2, None, None, 0),
        ];
        let rows = zero_result_queries(&events, 30);
        assert_eq!(rows, vec![ZeroResultQuery { query: "nope".into(), count: 2 }]);
    }
}
