use crate::domain::{MatchStatus, now_millis};
use crate::entities::{allowed_leagues, fixtures, prelude::*, sync_logs};
use anyhow::Result;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::Serialize;

pub use allowed_leagues::Model as AllowedLeague;
pub use fixtures::Model as Fixture;
pub use sync_logs::Model as SyncLog;

/// (name, API-Football league id) pairs inserted by `seed_leagues`.
pub const DEFAULT_LEAGUES: &[(&str, i32)] = &[
    ("UEFA Champions League", 2),
    ("FIFA World Cup", 1),
    ("UEFA Euro", 4),
    ("Premier League", 39),
    ("La Liga", 140),
    ("Africa Cup of Nations", 6),
    ("Serie A", 135),
    ("Bundesliga", 78),
    ("Ligue 1", 61),
];

pub struct FixtureRepository {
    conn: DatabaseConnection,
}

impl FixtureRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    // ========================================================================
    // Fixtures
    // ========================================================================

    /// Inserts or refreshes by `api_fixture_id`. Returns true when inserted.
    pub async fn upsert(&self, input: FixtureUpsert) -> Result<bool> {
        let now = now_millis();
        let existing = Fixtures::find()
            .filter(fixtures::Column::ApiFixtureId.eq(input.api_fixture_id))
            .one(&self.conn)
            .await?;

        if let Some(existing) = existing {
            let mut active: fixtures::ActiveModel = existing.into();
            active.slug = Set(input.slug);
            active.kickoff_at = Set(input.kickoff_at);
            active.kickoff_iso = Set(input.kickoff_iso);
            active.timezone = Set(input.timezone);
            active.status = Set(input.status.as_str().to_string());
            active.raw_status_short = Set(input.raw_status_short);
            active.raw_status_long = Set(input.raw_status_long);
            active.home_name = Set(input.home_name);
            active.home_logo = Set(input.home_logo);
            active.away_name = Set(input.away_name);
            active.away_logo = Set(input.away_logo);
            active.league_name = Set(input.league_name);
            active.league_logo = Set(input.league_logo);
            active.description = Set(input.description);
            active.fetched_for_date = Set(input.fetched_for_date);
            active.updated_at = Set(now);
            active.update(&self.conn).await?;
            return Ok(false);
        }

        fixtures::ActiveModel {
            api_fixture_id: Set(input.api_fixture_id),
            slug: Set(input.slug),
            kickoff_at: Set(input.kickoff_at),
            kickoff_iso: Set(input.kickoff_iso),
            timezone: Set(input.timezone),
            status: Set(input.status.as_str().to_string()),
            raw_status_short: Set(input.raw_status_short),
            raw_status_long: Set(input.raw_status_long),
            home_name: Set(input.home_name),
            home_logo: Set(input.home_logo),
            away_name: Set(input.away_name),
            away_logo: Set(input.away_logo),
            league_name: Set(input.league_name),
            league_logo: Set(input.league_logo),
            description: Set(input.description),
            fetched_for_date: Set(input.fetched_for_date),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;
        Ok(true)
    }

    pub async fn get(&self, id: i32) -> Result<Option<Fixture>> {
        Ok(Fixtures::find_by_id(id).one(&self.conn).await?)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Fixture>> {
        Ok(Fixtures::find()
            .filter(fixtures::Column::Slug.eq(slug))
            .one(&self.conn)
            .await?)
    }

    pub async fn for_date(&self, date: &str, status: Option<MatchStatus>) -> Result<Vec<Fixture>> {
        let mut query = Fixtures::find()
            .filter(fixtures::Column::FetchedForDate.eq(date))
            .order_by_asc(fixtures::Column::KickoffAt);
        if let Some(status) = status {
            query = query.filter(fixtures::Column::Status.eq(status.as_str()));
        }
        Ok(query.all(&self.conn).await?)
    }

    pub async fn with_status(&self, status: MatchStatus) -> Result<Vec<Fixture>> {
        Ok(Fixtures::find()
            .filter(fixtures::Column::Status.eq(status.as_str()))
            .order_by_asc(fixtures::Column::KickoffAt)
            .all(&self.conn)
            .await?)
    }

    pub async fn list(&self, status: Option<MatchStatus>, limit: Option<u64>) -> Result<Vec<Fixture>> {
        let mut query = Fixtures::find().order_by_asc(fixtures::Column::KickoffAt);
        if let Some(status) = status {
            query = query.filter(fixtures::Column::Status.eq(status.as_str()));
        }
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        Ok(query.all(&self.conn).await?)
    }

    // ========================================================================
    // Sync log
    // ========================================================================

    pub async fn log_sync(&self, entry: NewSyncLog) -> Result<SyncLog> {
        Ok(sync_logs::ActiveModel {
            date: Set(entry.date),
            mode: Set(entry.mode),
            ok: Set(entry.ok),
            fetched_count: Set(entry.fetched),
            skipped_count: Set(entry.skipped),
            imported_count: Set(entry.imported),
            updated_count: Set(entry.updated),
            error: Set(entry.error),
            ran_at: Set(now_millis()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?)
    }

    pub async fn sync_logs(&self, limit: u64) -> Result<Vec<SyncLog>> {
        Ok(SyncLogs::find()
            .order_by_desc(sync_logs::Column::RanAt)
            .limit(limit)
            .all(&self.conn)
            .await?)
    }

    // ========================================================================
    // Allowed leagues
    // ========================================================================

    pub async fn leagues(&self) -> Result<Vec<AllowedLeague>> {
        Ok(AllowedLeagues::find()
            .order_by_asc(allowed_leagues::Column::LeagueName)
            .all(&self.conn)
            .await?)
    }

    pub async fn enabled_league_names(&self) -> Result<Vec<String>> {
        Ok(AllowedLeagues::find()
            .select_only()
            .column(allowed_leagues::Column::LeagueName)
            .filter(allowed_leagues::Column::Enabled.eq(true))
            .into_tuple()
            .all(&self.conn)
            .await?)
    }

    pub async fn league_by_api_id(&self, api_league_id: i32) -> Result<Option<AllowedLeague>> {
        Ok(AllowedLeagues::find()
            .filter(allowed_leagues::Column::ApiLeagueId.eq(api_league_id))
            .one(&self.conn)
            .await?)
    }

    pub async fn add_league(&self, name: &str, api_league_id: i32) -> Result<AllowedLeague> {
        Ok(allowed_leagues::ActiveModel {
            league_name: Set(name.to_string()),
            api_league_id: Set(api_league_id),
            enabled: Set(true),
            created_at: Set(now_millis()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?)
    }

    pub async fn set_league_enabled(&self, id: i32, enabled: bool) -> Result<bool> {
        let result = AllowedLeagues::update_many()
            .col_expr(allowed_leagues::Column::Enabled, Expr::value(enabled))
            .filter(allowed_leagues::Column::Id.eq(id))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Inserts the default leagues when none exist. Returns how many were added.
    pub async fn seed_leagues(&self) -> Result<usize> {
        if AllowedLeagues::find().count(&self.conn).await? > 0 {
            return Ok(0);
        }

        let now = now_millis();
        let rows = DEFAULT_LEAGUES
            .iter()
            .map(|&(name, id)| allowed_leagues::ActiveModel {
                league_name: Set(name.to_string()),
                api_league_id: Set(id),
                enabled: Set(true),
                created_at: Set(now),
                ..Default::default()
            });
        AllowedLeagues::insert_many(rows).exec(&self.conn).await?;
        Ok(DEFAULT_LEAGUES.len())
    }
}

// ============================================================================
// Data Types
// ============================================================================

#[derive(Debug, Clone)]
pub struct FixtureUpsert {
    pub api_fixture_id: i64,
    pub slug: String,
    pub kickoff_at: i64,
    pub kickoff_iso: String,
    pub timezone: String,
    pub status: MatchStatus,
    pub raw_status_short: String,
    pub raw_status_long: String,
    pub home_name: String,
    pub home_logo: Option<String>,
    pub away_name: String,
    pub away_logo: Option<String>,
    pub league_name: String,
    pub league_logo: Option<String>,
    pub description: String,
    pub fetched_for_date: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewSyncLog {
    pub date: String,
    pub mode: String,
    pub ok: bool,
    pub fetched: i32,
    pub skipped: i32,
    pub imported: i32,
    pub updated: i32,
    pub error: Option<String>,
}
