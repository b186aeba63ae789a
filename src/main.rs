use dotenvy::dotenv;
use squad_ledger::{
    bot::{self, BotData},
    config,
    errors::{Error, Result},
};
use std::{env, path::Path};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file (non-fatal, env vars can be set externally)
    dotenv().ok();

    // 3. Connect to the database and make sure the tables exist
    let db = config::database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    config::database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 4. Seed templates from config.toml when present
    if Path::new("config.toml").exists() {
        let app_config = config::templates::load_default_config()?;
        config::templates::seed_templates(&db, &app_config)
            .await
            .inspect_err(|e| error!("Failed to seed templates: {}", e))?;
    } else {
        info!("No config.toml found, skipping template seeding.");
    }

    // 5. Run the bot
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {}", e))
        .map_err(Error::EnvVar)?;
    let nicknames = config::users::get_user_nicknames();
    info!("Loaded {} member nicknames", nicknames.len());

    bot::run_bot(token, BotData::new(db, nicknames)).await
}
