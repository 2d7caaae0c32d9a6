use crate::domain::{Plan, now_millis};
use crate::entities::{prelude::*, settings};
use anyhow::Result;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};

const SETTINGS_ROW_ID: i32 = 1;

pub struct SettingsRepository {
    conn: DatabaseConnection,
}

impl SettingsRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(m: settings::Model) -> SiteSettings {
        SiteSettings {
            site_name: m.site_name,
            whatsapp_number: m.whatsapp_number,
            ads_enabled: m.ads_enabled,
            price_match: m.price_match,
            price_weekly: m.price_weekly,
            price_monthly: m.price_monthly,
            price_yearly: m.price_yearly,
            max_devices_match: m.max_devices_match,
            max_devices_weekly: m.max_devices_weekly,
            max_devices_monthly: m.max_devices_monthly,
            max_devices_yearly: m.max_devices_yearly,
            free_movie_of_week: m.free_movie_of_week,
            trial_days: m.trial_days,
            updated_at: m.updated_at,
        }
    }

    /// The settings row, created with defaults when missing.
    pub async fn get(&self) -> Result<SiteSettings> {
        if let Some(row) = Settings::find_by_id(SETTINGS_ROW_ID).one(&self.conn).await? {
            return Ok(Self::map_model(row));
        }

        let defaults = SiteSettings::default();
        let row = settings::ActiveModel {
            id: Set(SETTINGS_ROW_ID),
            site_name: Set(defaults.site_name),
            whatsapp_number: Set(defaults.whatsapp_number),
            ads_enabled: Set(defaults.ads_enabled),
            price_match: Set(defaults.price_match),
            price_weekly: Set(defaults.price_weekly),
            price_monthly: Set(defaults.price_monthly),
            price_yearly: Set(defaults.price_yearly),
            max_devices_match: Set(defaults.max_devices_match),
            max_devices_weekly: Set(defaults.max_devices_weekly),
            max_devices_monthly: Set(defaults.max_devices_monthly),
            max_devices_yearly: Set(defaults.max_devices_yearly),
            free_movie_of_week: Set(None),
            trial_days: Set(defaults.trial_days),
            updated_at: Set(now_millis()),
        }
        .insert(&self.conn)
        .await?;
        Ok(Self::map_model(row))
    }

    pub async fn update(&self, patch: SettingsPatch) -> Result<SiteSettings> {
        self.get().await?;
        let Some(existing) = Settings::find_by_id(SETTINGS_ROW_ID).one(&self.conn).await? else {
            anyhow::bail!("settings row missing after initialisation");
        };

        let mut active: settings::ActiveModel = existing.into();
        if let Some(v) = patch.site_name {
            active.site_name = Set(v);
        }
        if let Some(v) = patch.whatsapp_number {
            active.whatsapp_number = Set(v);
        }
        if let Some(v) = patch.ads_enabled {
            active.ads_enabled = Set(v);
        }
        if let Some(v) = patch.price_match {
            active.price_match = Set(v);
        }
        if let Some(v) = patch.price_weekly {
            active.price_weekly = Set(v);
        }
        if let Some(v) = patch.price_monthly {
            active.price_monthly = Set(v);
        }
        if let Some(v) = patch.price_yearly {
            active.price_yearly = Set(v);
        }
        if let Some(v) = patch.max_devices_match {
            active.max_devices_match = Set(v);
        }
        if let Some(v) = patch.max_devices_weekly {
            active.max_devices_weekly = Set(v);
        }
        if let Some(v) = patch.max_devices_monthly {
            active.max_devices_monthly = Set(v);
        }
        if let Some(v) = patch.max_devices_yearly {
            active.max_devices_yearly = Set(v);
        }
        if let Some(v) = patch.free_movie_of_week {
            active.free_movie_of_week = Set(Some(v));
        }
        if let Some(v) = patch.trial_days {
            active.trial_days = Set(v);
        }
        active.updated_at = Set(now_millis());

        Ok(Self::map_model(active.update(&self.conn).await?))
    }

    pub async fn set_free_movie(&self, slug: &str) -> Result<()> {
        self.get().await?;
        Settings::update_many()
            .col_expr(settings::Column::FreeMovieOfWeek, Expr::value(slug))
            .col_expr(settings::Column::UpdatedAt, Expr::value(now_millis()))
            .filter(settings::Column::Id.eq(SETTINGS_ROW_ID))
            .exec(&self.conn)
            .await?;
        Ok(())
    }
}

// ============================================================================
// Data Types
// ============================================================================

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SiteSettings {
    pub site_name: String,
    pub whatsapp_number: String,
    pub ads_enabled: bool,
    pub price_match: f64,
    pub price_weekly: f64,
    pub price_monthly: f64,
    pub price_yearly: f64,
    pub max_devices_match: i32,
    pub max_devices_weekly: i32,
    pub max_devices_monthly: i32,
    pub max_devices_yearly: i32,
    pub free_movie_of_week: Option<String>,
    pub trial_days: i32,
    pub updated_at: i64,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            site_name: "Fanbroj".to_string(),
            whatsapp_number: "+252618274188".to_string(),
            ads_enabled: false,
            price_match: 0.2,
            price_weekly: 1.0,
            price_monthly: 3.5,
            price_yearly: 11.0,
            max_devices_match: Plan::Match.default_max_devices(),
            max_devices_weekly: Plan::Weekly.default_max_devices(),
            max_devices_monthly: Plan::Monthly.default_max_devices(),
            max_devices_yearly: Plan::Yearly.default_max_devices(),
            free_movie_of_week: None,
            trial_days: 7,
            updated_at: 0,
        }
    }
}

impl SiteSettings {
    #[must_use]
    pub const fn price_for(&self, plan: Plan) -> f64 {
        match plan {
            Plan::Match => self.price_match,
            Plan::Weekly => self.price_weekly,
            Plan::Monthly => self.price_monthly,
            Plan::Yearly => self.price_yearly,
        }
    }

    #[must_use]
    pub const fn max_devices_for(&self, plan: Plan) -> i32 {
        match plan {
            Plan::Match => self.max_devices_match,
            Plan::Weekly => self.max_devices_weekly,
            Plan::Monthly => self.max_devices_monthly,
            Plan::Yearly => self.max_devices_yearly,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SettingsPatch {
    pub site_name: Option<String>,
    pub whatsapp_number: Option<String>,
    pub ads_enabled: Option<bool>,
    pub price_match: Option<f64>,
    pub price_weekly: Option<f64>,
    pub price_monthly: Option<f64>,
    pub price_yearly: Option<f64>,
    pub max_devices_match: Option<i32>,
    pub max_devices_weekly: Option<i32>,
    pub max_devices_monthly: Option<i32>,
    pub max_devices_yearly: Option<i32>,
    pub free_movie_of_week: Option<String>,
    pub trial_days: Option<i32>,
}
