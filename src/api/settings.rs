use axum::{Json, extract::State};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::db::repositories::settings::{SettingsPatch, SiteSettings};
use crate::domain::events::NotificationEvent;

pub async fn get_settings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SiteSettings>>, ApiError> {
    let settings = state.store().settings().get().await?;
    Ok(Json(ApiResponse::success(settings)))
}

/// `PUT /api/settings`: only the fields present in the body change.
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(patch): Json<SettingsPatch>,
) -> Result<Json<ApiResponse<SiteSettings>>, ApiError> {
    validate_patch(&patch)?;
    let settings = state.store().settings().update(patch).await?;
    let _ = state.event_bus().send(NotificationEvent::SettingsUpdated);
    Ok(Json(ApiResponse::success(settings)))
}

fn validate_patch(patch: &SettingsPatch) -> Result<(), ApiError> {
    let prices = [
        patch.price_match,
        patch.price_weekly,
        patch.price_monthly,
        patch.price_yearly,
    ];
    if prices.iter().flatten().any(|p| !p.is_finite() || *p < 0.0) {
        return Err(ApiError::validation("Prices must be zero or positive"));
    }

    let caps = [
        patch.max_devices_match,
        patch.max_devices_weekly,
        patch.max_devices_monthly,
        patch.max_devices_yearly,
    ];
    if caps.iter().flatten().any(|c| *c < 1) {
        return Err(ApiError::validation("Device caps must be at least 1"));
    }

    if patch.trial_days.is_some_and(|d| d < 0) {
        return Err(ApiError::validation("trial_days cannot be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_patch_rejects_negative_price() {
        let patch = SettingsPatch {
            price_weekly: Some(-1.0),
            ..Default::default()
        };
        assert!(validate_patch(&patch).is_err());
    }

    #[test]
    fn test_validate_patch_rejects_zero_device_cap() {
        let patch = SettingsPatch {
            max_devices_yearly: Some(0),
            ..Default::default()
        };
        assert!(validate_patch(&patch).is_err());
    }

    #[test]
    fn test_validate_patch_accepts_partial_update() {
        let patch = SettingsPatch {
            site_name: Some("Fanbroj".to_string()),
            price_match: Some(0.25),
            ..Default::default()
        };
        assert!(validate_patch(&patch).is_ok());
    }
}
