use std::sync::Arc;

use anyhow::Context;
use hrpro_core::core::{ConfigFile, ensure_jwt_secret};
use hrpro_core::{AppState, Config, PgStore, StateOptions, Store, init_logger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. .env is optional
    let _ = dotenvy::dotenv();

    let config = Config::from_env().context("load configuration")?;
    init_logger(Some(&config.log_level), config.log_dir.as_deref());
    tracing::info!(env = ?config.env, "HR core starting...");

    // 2. JWT secret: env, then config file, then generated
    let config_path = config.config_file_path();
    let jwt_secret = ensure_jwt_secret(config.jwt_secret.as_deref(), &config_path)
        .context("resolve JWT secret")?;

    // 3. Database
    let file = ConfigFile::load(&config_path).context("read config file")?;
    let target = config
        .database_target(file.database.as_ref())
        .context("resolve database target")?;
    let store = PgStore::connect(&target).await.context("connect to database")?;
    if config.is_production() {
        tracing::info!("Production environment, skipping migrations");
    } else {
        store.migrate().await.context("run migrations")?;
    }

    // 4. Services and initial admin
    let store: Arc<dyn Store> = Arc::new(store);
    let state = AppState::new(store, StateOptions::from_config(&config, jwt_secret));
    let admin = &config.initial_admin;
    let seeded = state
        .auth
        .seed_initial_admin(&admin.username, &admin.password, &admin.role)
        .await
        .context("seed initial admin")?;

    tracing::info!(
        seeded_admin = seeded,
        data_dir = %config.data_dir.display(),
        "HR core ready"
    );
    Ok(())
}
