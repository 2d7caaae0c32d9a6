pub mod access_service;
pub mod access_service_impl;
pub use access_service::{AccessError, AccessService, ContentRef, PremiumAccess};
pub use access_service_impl::SeaOrmAccessService;

pub mod analytics;
pub use analytics::{AnalyticsError, AnalyticsService};

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, LoginResult};
pub use auth_service_impl::SeaOrmAuthService;

pub mod catalog;
pub use catalog::{CatalogError, CatalogService};

pub mod fixtures;
pub use fixtures::{FixtureError, FixtureService};

pub mod jobs;

pub mod logs;
pub use logs::LogService;

pub mod notifications;
pub use notifications::NotificationService;

pub mod payment_service;
pub mod payment_service_impl;
pub use payment_service::{PaymentError, PaymentService};
pub use payment_service_impl::SeaOrmPaymentService;

pub mod ppv_service;
pub mod ppv_service_impl;
pub use ppv_service::{PpvError, PpvService};
pub use ppv_service_impl::SeaOrmPpvService;

pub mod push;
pub use push::{PushError, PushSender, PushService};

pub mod redemptions;
pub use redemptions::{RedemptionError, RedemptionService};

pub mod revenue;

pub mod scheduler;
pub use scheduler::Scheduler;
