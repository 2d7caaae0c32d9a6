//! Domain events for the application.
//!
//! Events are published on the shared broadcast bus. The SSE endpoint relays
//! them to admin dashboards and open pages, and `LogService` persists the
//! interesting ones.

use serde::Serialize;

/// Events sent to connected clients via SSE (Server-Sent Events).
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum NotificationEvent {
    MovieCreated {
        id: i32,
        slug: String,
        title: String,
    },
    MovieUpdated {
        id: i32,
        slug: String,
    },
    SeriesCreated {
        id: i32,
        slug: String,
        title: String,
    },
    SeriesUpdated {
        id: i32,
        slug: String,
    },
    MatchCreated {
        id: i32,
        slug: String,
        title: String,
    },
    MatchUpdated {
        id: i32,
        slug: String,
    },
    MatchStatusChanged {
        ids: Vec<i32>,
        status: String,
    },

    SettingsUpdated,
    FreeMovieRotated {
        slug: String,
        title: String,
    },

    PpvUnlocked {
        user_id: i32,
        content_type: String,
        content_id: String,
        expires_at: i64,
    },
    PaymentCompleted {
        order_id: String,
        plan: String,
        amount: f64,
    },
    PaymentFailed {
        order_id: String,
        reason: Option<String>,
    },
    SubscriptionCreated {
        id: i32,
        user_id: i32,
        plan: String,
    },
    SubscriptionRevoked {
        id: i32,
    },
    CodeRedeemed {
        code: String,
        user_id: i32,
        plan: String,
    },
    DevicesCleared {
        scope: String,
        deleted: u64,
    },

    PushBroadcastFinished {
        audience: String,
        sent: usize,
        failed: usize,
        deactivated: usize,
    },
    FixturesSynced {
        mode: String,
        ok: bool,
        imported: u32,
        updated: u32,
        skipped: u32,
    },

    JobStarted {
        job: String,
    },
    JobFinished {
        job: String,
        duration_ms: u64,
        ok: bool,
    },

    Error {
        message: String,
    },
    Info {
        message: String,
    },
}

impl NotificationEvent {
    /// Variant name, used as the `event_type` column of persisted logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MovieCreated { .. } => "MovieCreated",
            Self::MovieUpdated { .. } => "MovieUpdated",
            Self::SeriesCreated { .. } => "SeriesCreated",
            Self::SeriesUpdated { .. } => "SeriesUpdated",
            Self::MatchCreated { .. } => "MatchCreated",
            Self::MatchUpdated { .. } => "MatchUpdated",
            Self::MatchStatusChanged { .. } => "MatchStatusChanged",
            Self::SettingsUpdated => "SettingsUpdated",
            Self::FreeMovieRotated { .. } => "FreeMovieRotated",
            Self::PpvUnlocked { .. } => "PpvUnlocked",
            Self::PaymentCompleted { .. } => "PaymentCompleted",
            Self::PaymentFailed { .. } => "PaymentFailed",
            Self::SubscriptionCreated { .. } => "SubscriptionCreated",
            Self::SubscriptionRevoked { .. } => "SubscriptionRevoked",
            Self::CodeRedeemed { .. } => "CodeRedeemed",
            Self::DevicesCleared { .. } => "DevicesCleared",
            Self::PushBroadcastFinished { .. } => "PushBroadcastFinished",
            Self::FixturesSynced { .. } => "FixturesSynced",
            Self::JobStarted { .. } => "JobStarted",
            Self::JobFinished { .. } => "JobFinished",
            Self::Error { .. } => "Error",
            Self::Info { .. } => "Info",
        }
    }
}
