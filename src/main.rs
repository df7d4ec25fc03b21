use std::net::SocketAddr;

use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use ruokareseptit::config::{Cli, Config};
use ruokareseptit::state::AppState;
use ruokareseptit::{db, routes, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli);
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;

    // Initialize database
    let pool = db::create_pool(&config.db_path())?;
    db::run_migrations(&pool)?;

    if let Some(users) = cli.seed_users {
        let mut rng = rand::thread_rng();
        let report = seed::seed(&pool, &mut rng, users)?;
        tracing::info!(
            "Seeded {} users, {} recipes, {} reviews",
            report.users,
            report.recipes,
            report.reviews
        );
        return Ok(());
    }

    let state = AppState {
        db: pool,
        config: config.clone(),
    };
    let app = routes::app(state).layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
