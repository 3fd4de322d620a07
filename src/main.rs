use article_ranking::config::Config;
use article_ranking::services::background_jobs::BackgroundJobsService;
use article_ranking::services::voting_engine::VotingEngine;
use article_ranking::{AppState, create_app};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "article_ranking=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    // Create the voting engine
    let engine = Arc::new(VotingEngine::with_system_clock(config.engine_settings()));
    tracing::info!("Voting engine created with {:?}", engine.settings());

    // Expire voter sets and group rankings in the background
    let jobs = BackgroundJobsService::new(
        engine.clone(),
        Duration::from_secs(config.sweep_interval_secs.max(1)),
    );
    jobs.start_all_jobs();

    // Create application state
    let state = AppState {
        engine,
        config: Arc::new(config.clone()),
    };

    // Create application
    let app = create_app(state);

    // Create listener
    let listener = TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;
    tracing::info!("Server listening on {}:{}", config.host, config.port);

    // Start server
    axum::serve(listener, app).await?;

    Ok(())
}
