use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lms_backend::config::Config;
use lms_backend::db::{self, sessions};
use lms_backend::media::DiskMediaStore;
use lms_backend::router;
use lms_backend::services::AccountService;
use lms_backend::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "lms_backend=debug,tower_http=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = db::connect(&config.database_url).await?;
    db::migrate(&pool).await?;

    let purged = sessions::purge_expired(&pool).await?;
    if purged > 0 {
        info!("purged {} expired sessions", purged);
    }

    if AccountService::new(pool.clone()).seed_admin(&config).await? {
        info!("seeded admin account {}", config.admin_email);
    }

    let media = DiskMediaStore::open(&config.media_dir).await?;
    info!("storing uploads in {}", media.root().display());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState {
        db: pool,
        media: Arc::new(media),
        config: Arc::new(config),
    };

    let app = router(state);

    info!("listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
