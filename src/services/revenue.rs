//! Revenue dashboard figures, computed from successful payments and the
//! subscriptions that are active right now.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::constants::time::MILLIS_PER_DAY;
use crate::db::Store;
use crate::db::repositories::payment::Payment;
use crate::db::repositories::subscription::Subscription;
use crate::domain::{Plan, round2};

const DAILY_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlanRevenue {
    pub plan: String,
    pub count: u64,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GatewayRevenue {
    pub gateway: String,
    pub count: u64,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailyRevenue {
    pub date: String,
    pub revenue: f64,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RevenueReport {
    pub total_revenue: f64,
    pub this_month: f64,
    pub last_month: f64,
    pub mrr: f64,
    pub arr: f64,
    pub active_subscriptions: u64,
    pub new_today: u64,
    pub new_this_week: u64,
    pub total_payments: u64,
    pub revenue_by_plan: Vec<PlanRevenue>,
    pub revenue_by_gateway: Vec<GatewayRevenue>,
    pub daily: Vec<DailyRevenue>,
}

/// Subscriptions created since these two instants.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewSubscriptionCounts {
    pub today: u64,
    pub this_week: u64,
}

fn month_start(date: NaiveDate) -> i64 {
    date.with_day(1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map_or(0, |dt| Utc.from_utc_datetime(&dt).timestamp_millis())
}

fn previous_month_start(date: NaiveDate) -> i64 {
    let (year, month) = if date.month() == 1 {
        (date.year() - 1, 12)
    } else {
        (date.year(), date.month() - 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).map_or(0, month_start)
}

/// Completion time, falling back to creation for rows that never got one.
fn paid_at(payment: &Payment) -> i64 {
    payment.completed_at.unwrap_or(payment.created_at)
}

/// `(key, count, rounded revenue)` per distinct key, sorted by key.
fn breakdown<'a>(rows: impl Iterator<Item = (&'a str, f64)>) -> Vec<(String, u64, f64)> {
    let mut totals: BTreeMap<&str, (u64, f64)> = BTreeMap::new();
    for (key, amount) in rows {
        let entry = totals.entry(key).or_default();
        entry.0 += 1;
        entry.1 += amount;
    }
    totals
        .into_iter()
        .map(|(key, (count, revenue))| (key.to_string(), count, round2(revenue)))
        .collect()
}

#[must_use]
pub fn compute(
    payments: &[Payment],
    active: &[Subscription],
    new_subscriptions: NewSubscriptionCounts,
    now: DateTime<Utc>,
) -> RevenueReport {
    let today = now.date_naive();
    let this_month_start = month_start(today);
    let last_month_start = previous_month_start(today);

    let total_revenue: f64 = payments.iter().map(|p| p.amount).sum();
    let this_month: f64 = payments
        .iter()
        .filter(|p| paid_at(p) >= this_month_start)
        .map(|p| p.amount)
        .sum();
    let last_month: f64 = payments
        .iter()
        .filter(|p| (last_month_start..this_month_start).contains(&paid_at(p)))
        .map(|p| p.amount)
        .sum();

    let mrr: f64 = active
        .iter()
        .filter_map(|s| s.plan.parse::<Plan>().ok())
        .map(|plan| plan.monthly_equivalent())
        .sum();

    let window_start = now.timestamp_millis() - DAILY_WINDOW_DAYS * MILLIS_PER_DAY;
    let mut by_day: BTreeMap<String, (f64, u64)> = BTreeMap::new();
    for payment in payments.iter().filter(|p| paid_at(p) >= window_start) {
        if let Some(ts) = DateTime::from_timestamp_millis(paid_at(payment)) {
            let entry = by_day.entry(ts.format("%Y-%m-%d").to_string()).or_default();
            entry.0 += payment.amount;
            entry.1 += 1;
        }
    }
    let daily = (0..DAILY_WINDOW_DAYS)
        .rev()
        .map(|days_ago| {
            let date = (now - Duration::days(days_ago)).format("%Y-%m-%d").to_string();
            let (revenue, count) = by_day.get(&date).copied().unwrap_or_default();
            DailyRevenue {
                date,
                revenue: round2(revenue),
                count,
            }
        })
        .collect();

    RevenueReport {
        total_revenue: round2(total_revenue),
        this_month: round2(this_month),
        last_month: round2(last_month),
        mrr: round2(mrr),
        arr: round2(mrr * 12.0),
        active_subscriptions: active.len() as u64,
        new_today: new_subscriptions.today,
        new_this_week: new_subscriptions.this_week,
        total_payments: payments.len() as u64,
        revenue_by_plan: breakdown(payments.iter().map(|p| (p.plan.as_str(), p.amount)))
            .into_iter()
            .map(|(plan, count, revenue)| PlanRevenue {
                plan,
                count,
                revenue,
            })
            .collect(),
        revenue_by_gateway: breakdown(payments.iter().map(|p| (p.gateway.as_str(), p.amount)))
            .into_iter()
            .map(|(gateway, count, revenue)| GatewayRevenue {
                gateway,
                count,
                revenue,
            })
            .collect(),
        daily,
    }
}

pub async fn report(store: &Store) -> anyhow::Result<RevenueReport> {
    let now = Utc::now();
    let now_ms = now.timestamp_millis();
    let midnight = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map_or(now_ms, |dt| Utc.from_utc_datetime(&dt).timestamp_millis());

    let payments = store.payments().successful().await?;
    let subscriptions = store.subscriptions();
    let active = subscriptions.all_active(now_ms).await?;
    let new_subscriptions = NewSubscriptionCounts {
        today: subscriptions.count_created_since(midnight).await?,
        this_week: subscriptions
            .count_created_since(now_ms - 7 * MILLIS_PER_DAY)
            .await?,
    };

    Ok(compute(&payments, &active, new_subscriptions, now))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment(plan: &str, gateway: &str, amount: f64, at: DateTime<Utc>) -> Payment {
        Payment {
            id: 0,
            order_id: format!("FB-{}", at.timestamp_millis()),
            device_id: "d".to_string(),
            plan: plan.to_string(),
            amount,
            currency: "USD".to_string(),
            gateway: gateway.to_string(),
            status: "success".to_string(),
            sid: None,
            payment_type: None,
            user_id: Some(1),
            subscription_id: Some(1),
            access_code: None,
            failure_reason: None,
            last_gateway_message: None,
            created_at: at.timestamp_millis(),
            completed_at: Some(at.timestamp_millis()),
            failed_at: None,
            verified_at: None,
        }
    }

    fn subscription(plan: &str) -> Subscription {
        Subscription {
            id: 0,
            user_id: 1,
            plan: plan.to_string(),
            status: "active".to_string(),
            match_id: None,
            expires_at: i64::MAX,
            max_devices: 1,
            access_code: None,
            created_at: 0,
        }
    }

    #[test]
    fn test_month_buckets_and_totals() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        let payments = vec![
            payment("monthly", "sifalo", 3.5, Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()),
            payment("weekly", "sifalo", 1.0, Utc.with_ymd_and_hms(2026, 2, 27, 8, 0, 0).unwrap()),
            payment("weekly", "waafi", 1.0, Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap()),
        ];

        let report = compute(&payments, &[], NewSubscriptionCounts::default(), now);
        assert!((report.total_revenue - 5.5).abs() < 1e-9);
        assert!((report.this_month - 3.5).abs() < 1e-9);
        assert!((report.last_month - 1.0).abs() < 1e-9);
        assert_eq!(report.total_payments, 3);

        let weekly = report
            .revenue_by_plan
            .iter()
            .find(|r| r.plan == "weekly")
            .unwrap();
        assert_eq!(weekly.count, 2);
        assert_eq!(report.revenue_by_gateway.len(), 2);
    }

    #[test]
    fn test_january_compares_with_december() {
        let now = Utc.with_ymd_and_hms(2026, 1, 3, 0, 0, 0).unwrap();
        let payments = vec![payment(
            "yearly",
            "sifalo",
            11.0,
            Utc.with_ymd_and_hms(2025, 12, 31, 23, 0, 0).unwrap(),
        )];
        let report = compute(&payments, &[], NewSubscriptionCounts::default(), now);
        assert!((report.last_month - 11.0).abs() < 1e-9);
        assert!(report.this_month.abs() < 1e-9);
    }

    #[test]
    fn test_mrr_and_arr() {
        let active = vec![subscription("weekly"), subscription("monthly"), subscription("match")];
        let report = compute(&[], &active, NewSubscriptionCounts::default(), Utc::now());
        // 12.99 + 6.00 + 1.50
        assert!((report.mrr - 20.49).abs() < 1e-9);
        assert!((report.arr - 245.88).abs() < 1e-9);
        assert_eq!(report.active_subscriptions, 3);
    }

    #[test]
    fn test_daily_covers_thirty_days_ending_today() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        let payments = vec![
            payment("match", "sifalo", 0.2, now - Duration::hours(1)),
            payment("match", "sifalo", 0.2, now - Duration::hours(2)),
            payment("match", "sifalo", 0.2, now - Duration::days(45)),
        ];
        let report = compute(&payments, &[], NewSubscriptionCounts::default(), now);
        assert_eq!(report.daily.len(), 30);
        let last = report.daily.last().unwrap();
        assert_eq!(last.date, "2026-03-10");
        assert_eq!(last.count, 2);
        assert!((last.revenue - 0.4).abs() < 1e-9);
        assert_eq!(report.daily[0].date, "2026-02-09");
    }
}
