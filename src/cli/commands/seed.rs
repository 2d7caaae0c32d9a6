use crate::config::Config;
use crate::db::Store;

pub async fn cmd_seed(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let report = store.seed_defaults().await?;

    println!("Categories added: {}", report.categories);
    println!(
        "Ad slots:         {}",
        if report.ad_slots_seeded {
            "seeded"
        } else {
            "already present"
        }
    );
    println!("Leagues added:    {}", report.leagues);
    Ok(())
}
