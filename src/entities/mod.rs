pub mod prelude;

pub mod ad_impressions;
pub mod admins;
pub mod ads;
pub mod allowed_leagues;
pub mod categories;
pub mod channels;
pub mod devices;
pub mod episodes;
pub mod fixtures;
pub mod hero_slides;
pub mod match_reminders;
pub mod matches;
pub mod movies;
pub mod notification_logs;
pub mod notification_preferences;
pub mod payments;
pub mod ppv_content;
pub mod ppv_purchases;
pub mod promo_banners;
pub mod push_subscriptions;
pub mod redemptions;
pub mod search_events;
pub mod series;
pub mod settings;
pub mod subscriptions;
pub mod sync_logs;
pub mod system_logs;
pub mod users;
