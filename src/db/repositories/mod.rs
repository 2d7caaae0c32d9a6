pub mod ad;
pub mod admin;
pub mod banner;
pub mod category;
pub mod channel;
pub mod fixture;
pub mod hero_slide;
pub mod logs;
pub mod matches;
pub mod movie;
pub mod notification;
pub mod payment;
pub mod ppv;
pub mod push;
pub mod redemption;
pub mod search;
pub mod series;
pub mod settings;
pub mod subscription;
pub mod user;
