use crate::constants::limits::{MATCH_SEARCH_RESULTS, RELATED_MATCHES};
use crate::domain::{Embed, MatchStatus, decode_list, encode_list, now_millis};
use crate::entities::{matches, prelude::*};
use anyhow::Result;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};

pub struct MatchRepository {
    conn: DatabaseConnection,
}

impl MatchRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(m: matches::Model) -> Match {
        Match {
            id: m.id,
            slug: m.slug,
            title: m.title,
            team_a: m.team_a,
            team_b: m.team_b,
            team_a_logo: m.team_a_logo,
            team_b_logo: m.team_b_logo,
            league_id: m.league_id,
            league_name: m.league_name,
            kickoff_at: m.kickoff_at,
            status: m.status.parse().unwrap_or(MatchStatus::Upcoming),
            is_premium: m.is_premium,
            required_plan: m.required_plan,
            embeds: decode_list(&m.embeds),
            thumbnail_url: m.thumbnail_url,
            summary: m.summary,
            score_a: m.score_a,
            score_b: m.score_b,
            minute: m.minute,
            views: m.views,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub async fn list(&self, filter: &MatchFilter) -> Result<Vec<Match>> {
        let mut query = Matches::find().order_by_asc(matches::Column::KickoffAt);

        if let Some(status) = filter.status {
            query = query.filter(matches::Column::Status.eq(status.as_str()));
        }
        if let Some(league) = &filter.league {
            query = query.filter(
                Condition::any()
                    .add(matches::Column::LeagueId.eq(league.as_str()))
                    .add(matches::Column::LeagueName.eq(league.as_str())),
            );
        }
        if let Some(premium) = filter.premium {
            query = query.filter(matches::Column::IsPremium.eq(premium));
        }
        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }

        let rows = query.all(&self.conn).await?;
        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn get(&self, id: i32) -> Result<Option<Match>> {
        let row = Matches::find_by_id(id).one(&self.conn).await?;
        Ok(row.map(Self::map_model))
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Match>> {
        let row = Matches::find()
            .filter(matches::Column::Slug.eq(slug))
            .one(&self.conn)
            .await?;
        Ok(row.map(Self::map_model))
    }

    pub async fn slug_exists(&self, slug: &str) -> Result<bool> {
        let count = Matches::find()
            .filter(matches::Column::Slug.eq(slug))
            .count(&self.conn)
            .await?;
        Ok(count > 0)
    }

    /// Other matches from the same league.
    pub async fn related(&self, id: i32) -> Result<Vec<Match>> {
        let Some(current) = Matches::find_by_id(id).one(&self.conn).await? else {
            return Ok(Vec::new());
        };
        let Some(league) = current.league_name.or(current.league_id) else {
            return Ok(Vec::new());
        };

        let rows = Matches::find()
            .filter(matches::Column::Id.ne(id))
            .filter(
                Condition::any()
                    .add(matches::Column::LeagueName.eq(league.as_str()))
                    .add(matches::Column::LeagueId.eq(league.as_str())),
            )
            .order_by_desc(matches::Column::KickoffAt)
            .limit(RELATED_MATCHES)
            .all(&self.conn)
            .await?;
        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    /// Case-insensitive search over title, teams and league.
    pub async fn search(&self, query: &str) -> Result<Vec<Match>> {
        let q = query.trim();
        if q.is_empty() {
            return Ok(Vec::new());
        }

        let rows = Matches::find()
            .filter(
                Condition::any()
                    .add(matches::Column::Title.contains(q))
                    .add(matches::Column::TeamA.contains(q))
                    .add(matches::Column::TeamB.contains(q))
                    .add(matches::Column::LeagueName.contains(q)),
            )
            .order_by_desc(matches::Column::KickoffAt)
            .limit(MATCH_SEARCH_RESULTS)
            .all(&self.conn)
            .await?;
        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    /// Upcoming matches with kickoff in `[from, to]`.
    pub async fn upcoming_between(&self, from: i64, to: i64) -> Result<Vec<Match>> {
        let rows = Matches::find()
            .filter(matches::Column::Status.eq(MatchStatus::Upcoming.as_str()))
            .filter(matches::Column::KickoffAt.between(from, to))
            .all(&self.conn)
            .await?;
        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    pub async fn create(&self, input: NewMatch) -> Result<Match> {
        let now = now_millis();
        let model = matches::ActiveModel {
            slug: Set(input.slug),
            title: Set(input.title),
            team_a: Set(input.team_a),
            team_b: Set(input.team_b),
            team_a_logo: Set(input.team_a_logo),
            team_b_logo: Set(input.team_b_logo),
            league_id: Set(input.league_id),
            league_name: Set(input.league_name),
            kickoff_at: Set(input.kickoff_at),
            status: Set(input.status.as_str().to_string()),
            is_premium: Set(input.is_premium),
            required_plan: Set(input.required_plan),
            embeds: Set(encode_list(&input.embeds)),
            thumbnail_url: Set(input.thumbnail_url),
            summary: Set(input.summary),
            score_a: Set(input.score_a),
            score_b: Set(input.score_b),
            minute: Set(input.minute),
            views: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        Ok(Self::map_model(model))
    }

    pub async fn update(&self, id: i32, patch: MatchPatch) -> Result<Option<Match>> {
        let Some(existing) = Matches::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: matches::ActiveModel = existing.into();
        if let Some(v) = patch.slug {
            active.slug = Set(v);
        }
        if let Some(v) = patch.title {
            active.title = Set(v);
        }
        if let Some(v) = patch.team_a {
            active.team_a = Set(v);
        }
        if let Some(v) = patch.team_b {
            active.team_b = Set(v);
        }
        if let Some(v) = patch.team_a_logo {
            active.team_a_logo = Set(Some(v));
        }
        if let Some(v) = patch.team_b_logo {
            active.team_b_logo = Set(Some(v));
        }
        if let Some(v) = patch.league_id {
            active.league_id = Set(Some(v));
        }
        if let Some(v) = patch.league_name {
            active.league_name = Set(Some(v));
        }
        if let Some(v) = patch.kickoff_at {
            active.kickoff_at = Set(v);
        }
        if let Some(v) = patch.status {
            active.status = Set(v.as_str().to_string());
        }
        if let Some(v) = patch.is_premium {
            active.is_premium = Set(v);
        }
        if let Some(v) = patch.required_plan {
            active.required_plan = Set(Some(v));
        }
        if let Some(v) = patch.embeds {
            active.embeds = Set(encode_list(&v));
        }
        if let Some(v) = patch.thumbnail_url {
            active.thumbnail_url = Set(Some(v));
        }
        if let Some(v) = patch.summary {
            active.summary = Set(Some(v));
        }
        if let Some(v) = patch.score_a {
            active.score_a = Set(Some(v));
        }
        if let Some(v) = patch.score_b {
            active.score_b = Set(Some(v));
        }
        if let Some(v) = patch.minute {
            active.minute = Set(Some(v));
        }
        active.updated_at = Set(now_millis());

        let model = active.update(&self.conn).await?;
        Ok(Some(Self::map_model(model)))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Matches::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn bulk_update_status(&self, ids: &[i32], status: MatchStatus) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = Matches::update_many()
            .col_expr(matches::Column::Status, Expr::value(status.as_str()))
            .col_expr(matches::Column::UpdatedAt, Expr::value(now_millis()))
            .filter(matches::Column::Id.is_in(ids.iter().copied()))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn increment_views(&self, slug: &str) -> Result<bool> {
        let result = Matches::update_many()
            .col_expr(
                matches::Column::Views,
                Expr::col(matches::Column::Views).add(1),
            )
            .filter(matches::Column::Slug.eq(slug))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

// ============================================================================
// Data Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Match {
    pub id: i32,
    pub slug: String,
    pub title: String,
    pub team_a: String,
    pub team_b: String,
    pub team_a_logo: Option<String>,
    pub team_b_logo: Option<String>,
    pub league_id: Option<String>,
    pub league_name: Option<String>,
    pub kickoff_at: i64,
    pub status: MatchStatus,
    pub is_premium: bool,
    pub required_plan: Option<String>,
    pub embeds: Vec<Embed>,
    pub thumbnail_url: Option<String>,
    pub summary: Option<String>,
    pub score_a: Option<i32>,
    pub score_b: Option<i32>,
    pub minute: Option<i32>,
    pub views: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Default)]
pub struct MatchFilter {
    pub status: Option<MatchStatus>,
    pub league: Option<String>,
    pub premium: Option<bool>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMatch {
    pub slug: String,
    pub title: String,
    pub team_a: String,
    pub team_b: String,
    #[serde(default)]
    pub team_a_logo: Option<String>,
    #[serde(default)]
    pub team_b_logo: Option<String>,
    #[serde(default)]
    pub league_id: Option<String>,
    #[serde(default)]
    pub league_name: Option<String>,
    pub kickoff_at: i64,
    #[serde(default = "default_status")]
    pub status: MatchStatus,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub required_plan: Option<String>,
    #[serde(default)]
    pub embeds: Vec<Embed>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub score_a: Option<i32>,
    #[serde(default)]
    pub score_b: Option<i32>,
    #[serde(default)]
    pub minute: Option<i32>,
}

const fn default_status() -> MatchStatus {
    MatchStatus::Upcoming
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MatchPatch {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub team_a: Option<String>,
    pub team_b: Option<String>,
    pub team_a_logo: Option<String>,
    pub team_b_logo: Option<String>,
    pub league_id: Option<String>,
    pub league_name: Option<String>,
    pub kickoff_at: Option<i64>,
    pub status: Option<MatchStatus>,
    pub is_premium: Option<bool>,
    pub required_plan: Option<String>,
    pub embeds: Option<Vec<Embed>>,
    pub thumbnail_url: Option<String>,
    pub summary: Option<String>,
    pub score_a: Option<i32>,
    pub score_b: Option<i32>,
    pub minute: Option<i32>,
}
