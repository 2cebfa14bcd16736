use std::sync::Arc;

use anyhow::Context;

use lifelog_api::config::Config;
use lifelog_api::db::{self, DocumentStore, MemoryStore, PgStore};
use lifelog_api::{router, AppState};

async fn connect_store(config: &Config) -> anyhow::Result<Arc<dyn DocumentStore>> {
    if let Some(url) = &config.database_url {
        let pool = db::pool::create_pool(url)
            .await
            .context("Failed to connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;
        tracing::info!("Database migrations applied");

        return Ok(Arc::new(PgStore::new(pool)));
    }

    let store = match &config.seed_file {
        Some(path) => MemoryStore::from_seed_file(path)
            .await
            .with_context(|| format!("Failed to load seed file {}", path.display()))?,
        None => {
            tracing::warn!("DATABASE_URL and SEED_FILE unset, serving an empty in-memory store");
            MemoryStore::new()
        }
    };
    Ok(Arc::new(store))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lifelog_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Config::from_env();
    let store = connect_store(&config).await?;
    tracing::info!(backend = store.backend(), "Document store ready");

    let addr = config.listen_addr();
    let app = router(AppState::new(store, config));

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
