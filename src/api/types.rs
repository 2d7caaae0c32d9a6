use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedCount {
    pub deleted_count: u64,
}

/// `?id=` used by the endpoints that take the row id in the query string.
#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<i32>,
}

/// Payload for `PUT` endpoints that carry the row id in the body.
#[derive(Debug, Deserialize)]
pub struct WithId<T> {
    pub id: Option<i32>,
    #[serde(flatten)]
    pub patch: T,
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub uptime: u64,
    pub database: bool,
    pub scheduler_running: bool,
}
