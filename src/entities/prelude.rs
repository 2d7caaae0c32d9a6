pub use super::ad_impressions::Entity as AdImpressions;
pub use super::admins::Entity as Admins;
pub use super::ads::Entity as Ads;
pub use super::allowed_leagues::Entity as AllowedLeagues;
pub use super::categories::Entity as Categories;
pub use super::channels::Entity as Channels;
pub use super::devices::Entity as Devices;
pub use super::episodes::Entity as Episodes;
pub use super::fixtures::Entity as Fixtures;
pub use super::hero_slides::Entity as HeroSlides;
pub use super::match_reminders::Entity as MatchReminders;
pub use super::matches::Entity as Matches;
pub use super::movies::Entity as Movies;
pub use super::notification_logs::Entity as NotificationLogs;
pub use super::notification_preferences::Entity as NotificationPreferences;
pub use super::payments::Entity as Payments;
pub use super::ppv_content::Entity as PpvContent;
pub use super::ppv_purchases::Entity as PpvPurchases;
pub use super::promo_banners::Entity as PromoBanners;
pub use super::push_subscriptions::Entity as PushSubscriptions;
pub use super::redemptions::Entity as Redemptions;
pub use super::search_events::Entity as SearchEvents;
pub use super::series::Entity as Series;
pub use super::settings::Entity as Settings;
pub use super::subscriptions::Entity as Subscriptions;
pub use super::sync_logs::Entity as SyncLogs;
pub use super::system_logs::Entity as SystemLogs;
pub use super::users::Entity as Users;
