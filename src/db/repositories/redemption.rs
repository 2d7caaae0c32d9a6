use crate::constants::redemptions::{CODE_ALPHABET, CODE_LENGTH, MAX_CODE_ATTEMPTS};
use crate::domain::{Plan, RedemptionSource, now_millis};
use crate::entities::{prelude::*, redemptions};
use anyhow::{Result, bail};
use rand::Rng;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::Serialize;
use std::collections::BTreeMap;

pub use redemptions::Model as Redemption;

/// Access codes handed out by admins or issued after a payment.
pub struct RedemptionRepository {
    conn: DatabaseConnection,
}

impl RedemptionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<Redemption>> {
        Ok(Redemptions::find_by_id(id).one(&self.conn).await?)
    }

    /// Codes are stored uppercase; lookups are case-insensitive for the caller.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<Redemption>> {
        Ok(Redemptions::find()
            .filter(redemptions::Column::Code.eq(code.trim().to_uppercase()))
            .one(&self.conn)
            .await?)
    }

    pub async fn code_exists(&self, code: &str) -> Result<bool> {
        let count = Redemptions::find()
            .filter(redemptions::Column::Code.eq(code))
            .count(&self.conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn list(&self, limit: u64) -> Result<Vec<Redemption>> {
        Ok(Redemptions::find()
            .order_by_desc(redemptions::Column::CreatedAt)
            .order_by_desc(redemptions::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await?)
    }

    /// Inserts a row under a freshly drawn code that is not in use yet.
    pub async fn create(&self, input: NewRedemption) -> Result<Redemption> {
        let mut code = None;
        for _ in 0..MAX_CODE_ATTEMPTS {
            let candidate = generate_code();
            if !self.code_exists(&candidate).await? {
                code = Some(candidate);
                break;
            }
        }
        let Some(code) = code else {
            bail!("No free redemption code after {MAX_CODE_ATTEMPTS} attempts");
        };

        let now = now_millis();
        Ok(redemptions::ActiveModel {
            code: Set(code),
            plan: Set(input.plan.as_str().to_string()),
            duration_days: Set(input.duration_days),
            max_devices: Set(input.max_devices),
            source: Set(input.source.as_str().to_string()),
            payment_order_id: Set(input.payment_order_id),
            note: Set(input.note),
            expires_at: Set(input.expires_at),
            used_by_user_id: Set(input.used_by_user_id),
            used_at: Set(input.used_by_user_id.map(|_| now)),
            revoked_at: Set(None),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?)
    }

    /// Claims an unused, unrevoked code. `false` means another caller got it first.
    pub async fn mark_used(&self, id: i32, user_id: i32) -> Result<bool> {
        let result = Redemptions::update_many()
            .col_expr(redemptions::Column::UsedByUserId, Expr::value(user_id))
            .col_expr(redemptions::Column::UsedAt, Expr::value(now_millis()))
            .filter(redemptions::Column::Id.eq(id))
            .filter(redemptions::Column::UsedByUserId.is_null())
            .filter(redemptions::Column::RevokedAt.is_null())
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected == 1)
    }

    /// Undoes `mark_used` when activating the subscription failed.
    pub async fn release(&self, id: i32) -> Result<()> {
        Redemptions::update_many()
            .col_expr(
                redemptions::Column::UsedByUserId,
                Expr::value(Option::<i32>::None),
            )
            .col_expr(redemptions::Column::UsedAt, Expr::value(Option::<i64>::None))
            .filter(redemptions::Column::Id.eq(id))
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    pub async fn revoke(&self, id: i32) -> Result<Option<Redemption>> {
        let Some(existing) = Redemptions::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };
        if existing.revoked_at.is_some() {
            return Ok(Some(existing));
        }
        let mut active: redemptions::ActiveModel = existing.into();
        active.revoked_at = Set(Some(now_millis()));
        Ok(Some(active.update(&self.conn).await?))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Redemptions::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn stats(&self, now: i64) -> Result<RedemptionStats> {
        let rows = Redemptions::find().all(&self.conn).await?;
        Ok(RedemptionStats::tally(&rows, now))
    }
}

#[derive(Debug, Clone)]
pub struct NewRedemption {
    pub plan: Plan,
    pub duration_days: i32,
    pub max_devices: i32,
    pub source: RedemptionSource,
    pub payment_order_id: Option<String>,
    pub note: Option<String>,
    pub expires_at: Option<i64>,
    /// Set when the code is issued already used, as after a payment.
    pub used_by_user_id: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RedemptionStats {
    pub total: u64,
    pub used: u64,
    pub revoked: u64,
    /// Neither used, revoked nor past its redeem-by date.
    pub available: u64,
    pub by_plan: BTreeMap<String, u64>,
}

impl RedemptionStats {
    fn tally(rows: &[Redemption], now: i64) -> Self {
        let mut stats = Self::default();
        for row in rows {
            stats.total += 1;
            *stats.by_plan.entry(row.plan.clone()).or_default() += 1;
            if row.revoked_at.is_some() {
                stats.revoked += 1;
            } else if row.used_by_user_id.is_some() {
                stats.used += 1;
            } else if row.expires_at.is_none_or(|at| at > now) {
                stats.available += 1;
            }
        }
        stats
    }
}

#[must_use]
pub fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| char::from(CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i32, plan: &str) -> Redemption {
        Redemption {
            id,
            code: format!("CODE{id:04}"),
            plan: plan.to_string(),
            duration_days: 30,
            max_devices: 3,
            source: "manual".to_string(),
            payment_order_id: None,
            note: None,
            expires_at: None,
            used_by_user_id: None,
            used_at: None,
            revoked_at: None,
            created_at: 0,
        }
    }

    #[test]
    fn test_generate_code_shape() {
        let code = generate_code();
        assert_eq!(code.len(), CODE_LENGTH);
        assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        assert!(!code.contains(['I', 'O', '0', '1']));
    }

    #[test]
    fn test_stats_tally() {
        let mut used = row(2, "monthly");
        used.used_by_user_id = Some(7);
        let mut revoked = row(3, "weekly");
        revoked.revoked_at = Some(5);
        let mut lapsed = row(4, "monthly");
        lapsed.expires_at = Some(50);

        let stats = RedemptionStats::tally(&[row(1, "monthly"), used, revoked, lapsed], 100);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.used, 1);
        assert_eq!(stats.revoked, 1);
        assert_eq!(stats.available, 1);
        assert_eq!(stats.by_plan.get("monthly"), Some(&3));
        assert_eq!(stats.by_plan.get("weekly"), Some(&1));
    }
}
