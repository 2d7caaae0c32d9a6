mod admin;
mod init;
mod jobs;
mod seed;

pub use admin::{cmd_regenerate_api_key, cmd_show_api_key};
pub use init::cmd_init;
pub use jobs::{cmd_expire_subscriptions, cmd_job, cmd_sync_fixtures};
pub use seed::cmd_seed;
