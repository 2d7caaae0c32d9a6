use crate::config::Config;
use crate::state::SharedState;

pub async fn cmd_show_api_key(config: Config, username: &str) -> anyhow::Result<()> {
    let state = SharedState::new(config).await?;
    let key = state.auth.api_key(username).await?;
    println!("{key}");
    Ok(())
}

pub async fn cmd_regenerate_api_key(config: Config, username: &str) -> anyhow::Result<()> {
    let state = SharedState::new(config).await?;
    let key = state.auth.regenerate_api_key(username).await?;
    println!("New API key for {username}:");
    println!("{key}");
    Ok(())
}
