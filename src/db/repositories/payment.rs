use crate::domain::pagination::PageRequest;
use crate::domain::{PaymentStatus, Plan, now_millis};
use crate::entities::{payments, prelude::*};
use anyhow::Result;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::Serialize;

pub use payments::Model as Payment;

pub struct PaymentRepository {
    conn: DatabaseConnection,
}

impl PaymentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create_pending(&self, input: NewPayment) -> Result<Payment> {
        Ok(payments::ActiveModel {
            order_id: Set(input.order_id),
            device_id: Set(input.device_id),
            plan: Set(input.plan.as_str().to_string()),
            amount: Set(input.amount),
            currency: Set(input.currency),
            gateway: Set(input.gateway),
            status: Set(PaymentStatus::Pending.as_str().to_string()),
            created_at: Set(now_millis()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?)
    }

    pub async fn get_by_order_id(&self, order_id: &str) -> Result<Option<Payment>> {
        Ok(Payments::find()
            .filter(payments::Column::OrderId.eq(order_id))
            .one(&self.conn)
            .await?)
    }

    pub async fn get_by_sid(&self, sid: &str) -> Result<Option<Payment>> {
        Ok(Payments::find()
            .filter(payments::Column::Sid.eq(sid))
            .one(&self.conn)
            .await?)
    }

    /// Flips a payment to `success` only if no other callback got there first.
    pub async fn claim_success(&self, id: i32) -> Result<bool> {
        let result = Payments::update_many()
            .col_expr(
                payments::Column::Status,
                Expr::value(PaymentStatus::Success.as_str()),
            )
            .filter(payments::Column::Id.eq(id))
            .filter(payments::Column::Status.ne(PaymentStatus::Success.as_str()))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected == 1)
    }

    /// Undo a claim whose fulfilment failed so the gateway can retry.
    pub async fn release_claim(&self, id: i32, status: &str) -> Result<()> {
        Payments::update_many()
            .col_expr(payments::Column::Status, Expr::value(status))
            .filter(payments::Column::Id.eq(id))
            .filter(payments::Column::SubscriptionId.is_null())
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    pub async fn mark_success(&self, payment: Payment, outcome: SuccessOutcome) -> Result<Payment> {
        let now = now_millis();
        let mut active: payments::ActiveModel = payment.into();
        active.status = Set(PaymentStatus::Success.as_str().to_string());
        active.user_id = Set(Some(outcome.user_id));
        active.subscription_id = Set(Some(outcome.subscription_id));
        active.access_code = Set(outcome.access_code);
        active.completed_at = Set(Some(now));
        active.verified_at = Set(Some(now));
        if let Some(sid) = outcome.sid {
            active.sid = Set(Some(sid));
        }
        if let Some(kind) = outcome.payment_type {
            active.payment_type = Set(Some(kind));
        }
        if let Some(message) = outcome.message {
            active.last_gateway_message = Set(Some(message));
        }
        Ok(active.update(&self.conn).await?)
    }

    /// Returns false when the payment has already succeeded; a late failure
    /// callback never downgrades it.
    pub async fn mark_failed(
        &self,
        payment: &Payment,
        reason: Option<String>,
        sid: Option<String>,
    ) -> Result<bool> {
        let mut update = Payments::update_many()
            .col_expr(
                payments::Column::Status,
                Expr::value(PaymentStatus::Failed.as_str()),
            )
            .col_expr(payments::Column::FailedAt, Expr::value(Some(now_millis())))
            .col_expr(payments::Column::FailureReason, Expr::value(reason.clone()))
            .col_expr(payments::Column::LastGatewayMessage, Expr::value(reason));
        if let Some(sid) = sid {
            update = update.col_expr(payments::Column::Sid, Expr::value(Some(sid)));
        }
        let result = update
            .filter(payments::Column::Id.eq(payment.id))
            .filter(payments::Column::Status.ne(PaymentStatus::Success.as_str()))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected == 1)
    }

    pub async fn record_gateway_message(
        &self,
        payment: Payment,
        message: Option<String>,
        sid: Option<String>,
    ) -> Result<Payment> {
        let mut active: payments::ActiveModel = payment.into();
        active.last_gateway_message = Set(message);
        if let Some(sid) = sid {
            active.sid = Set(Some(sid));
        }
        Ok(active.update(&self.conn).await?)
    }

    /// Admin listing, newest first.
    pub async fn list_page(
        &self,
        request: PageRequest,
        status: Option<PaymentStatus>,
        search: Option<&str>,
    ) -> Result<(Vec<Payment>, u64)> {
        let mut query = Payments::find().order_by_desc(payments::Column::CreatedAt);

        if let Some(status) = status {
            query = query.filter(payments::Column::Status.eq(status.as_str()));
        }
        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            let mut condition = Condition::any()
                .add(payments::Column::OrderId.contains(term))
                .add(payments::Column::DeviceId.contains(term))
                .add(payments::Column::Plan.contains(term))
                .add(payments::Column::Sid.contains(term))
                .add(payments::Column::AccessCode.contains(term));
            if let Ok(user_id) = term.parse::<i32>() {
                condition = condition.add(payments::Column::UserId.eq(user_id));
            }
            query = query.filter(condition);
        }

        let paginator = query.paginate(&self.conn, request.limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(request.index()).await?;
        Ok((items, total))
    }

    pub async fn stats(&self, stale_before: i64) -> Result<PaymentStats> {
        let count_status = |status: PaymentStatus| {
            Payments::find()
                .filter(payments::Column::Status.eq(status.as_str()))
                .count(&self.conn)
        };

        let all = Payments::find().count(&self.conn).await?;
        let pending = count_status(PaymentStatus::Pending).await?;
        let success = count_status(PaymentStatus::Success).await?;
        let failed = count_status(PaymentStatus::Failed).await?;
        let stale_pending = Payments::find()
            .filter(payments::Column::Status.eq(PaymentStatus::Pending.as_str()))
            .filter(payments::Column::CreatedAt.lt(stale_before))
            .count(&self.conn)
            .await?;

        Ok(PaymentStats {
            all,
            pending,
            success,
            failed,
            stale_pending,
        })
    }

    pub async fn successful(&self) -> Result<Vec<Payment>> {
        Ok(Payments::find()
            .filter(payments::Column::Status.eq(PaymentStatus::Success.as_str()))
            .order_by_asc(payments::Column::CreatedAt)
            .all(&self.conn)
            .await?)
    }
}

// ============================================================================
// Data Types
// ============================================================================

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub order_id: String,
    pub device_id: String,
    pub plan: Plan,
    pub amount: f64,
    pub currency: String,
    pub gateway: String,
}

#[derive(Debug, Clone)]
pub struct SuccessOutcome {
    pub user_id: i32,
    pub subscription_id: i32,
    pub access_code: Option<String>,
    pub sid: Option<String>,
    pub payment_type: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct PaymentStats {
    pub all: u64,
    pub pending: u64,
    pub success: u64,
    pub failed: u64,
    pub stale_pending: u64,
}
