use axum::{
    Extension, Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::constants::auth::SESSION_KEY;
use crate::services::auth_service::AdminInfo;
use crate::services::{AuthError, LoginResult};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Serialize)]
pub struct ApiKeyResponse {
    pub api_key: String,
}

/// Username of the authenticated admin, inserted by [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct AdminUser(pub String);

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::Unauthorized("Invalid credentials".to_string()),
            AuthError::AdminNotFound => Self::Unauthorized("Admin not found".to_string()),
            AuthError::Validation(msg) => Self::validation(msg),
            AuthError::Database(msg) => Self::DatabaseError(msg),
            AuthError::Internal(msg) => Self::internal(msg),
        }
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Admin gate. Checks, in order:
/// 1. Session cookie (from login)
/// 2. `X-Api-Key` header
/// 3. `Authorization: Bearer <api_key>` header
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    match resolve_admin(&state, &headers, &session).await {
        Some(user) => {
            tracing::Span::current().record("admin", &user);
            request.extensions_mut().insert(AdminUser(user));
            next.run(request).await
        }
        None => ApiError::Unauthorized("Unauthorized".to_string()).into_response(),
    }
}

/// Username of the admin behind this request, if any. Used directly by
/// endpoints that are public for some actions and admin-only for others.
pub async fn resolve_admin(state: &AppState, headers: &HeaderMap, session: &Session) -> Option<String> {
    if let Ok(Some(user)) = session.get::<String>(SESSION_KEY).await {
        return Some(user);
    }

    let key = extract_api_key(headers)?;
    state.auth().verify_api_key(&key).await.ok().flatten()
}

fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    if let Some(api_key) = headers.get("X-Api-Key")
        && let Ok(key_str) = api_key.to_str()
    {
        return Some(key_str.trim().to_string());
    }

    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
/// Authenticate with username and password, returns API key on success
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResult>>, ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let result = state
        .auth()
        .login(&payload.username, &payload.password)
        .await?;

    session
        .insert(SESSION_KEY, &result.username)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    Ok(Json(ApiResponse::success(result)))
}

/// POST /auth/logout
pub async fn logout(session: Session) -> impl IntoResponse {
    let _ = session.flush().await;
    (StatusCode::OK, Json(ApiResponse::success(MessageResponse::new("Logged out"))))
}

/// GET /auth/me
pub async fn get_current_admin(
    State(state): State<Arc<AppState>>,
    Extension(AdminUser(username)): Extension<AdminUser>,
) -> Result<Json<ApiResponse<AdminInfo>>, ApiError> {
    let info = state.auth().admin_info(&username).await?;
    Ok(Json(ApiResponse::success(info)))
}

/// PUT /auth/password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(AdminUser(username)): Extension<AdminUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .auth()
        .change_password(&username, &payload.current_password, &payload.new_password)
        .await?;

    tracing::info!("Password changed for admin: {username}");

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password updated successfully",
    ))))
}

/// GET /auth/api-key
pub async fn get_api_key(
    State(state): State<Arc<AppState>>,
    Extension(AdminUser(username)): Extension<AdminUser>,
) -> Result<Json<ApiResponse<ApiKeyResponse>>, ApiError> {
    let api_key = state.auth().api_key(&username).await?;
    Ok(Json(ApiResponse::success(ApiKeyResponse { api_key })))
}

/// POST /auth/api-key/regenerate
pub async fn regenerate_api_key(
    State(state): State<Arc<AppState>>,
    Extension(AdminUser(username)): Extension<AdminUser>,
) -> Result<Json<ApiResponse<ApiKeyResponse>>, ApiError> {
    let api_key = state.auth().regenerate_api_key(&username).await?;

    tracing::info!("API key regenerated for admin: {username}");

    Ok(Json(ApiResponse::success(ApiKeyResponse { api_key })))
}
