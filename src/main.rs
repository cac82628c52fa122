use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use garage_dashboard::config::AppConfig;
use garage_dashboard::database::{DatabaseManager, MemoryUserStore, PgUserStore, UserStore};
use garage_dashboard::services::seed_admin_if_none_exists;
use garage_dashboard::{app, AppState};

#[derive(Parser, Debug)]
#[command(name = "garage-dashboard")]
#[command(about = "Backend for the Garage storage cluster admin dashboard")]
#[command(version)]
struct Args {
    #[arg(long, env = "PORT", default_value_t = 3000, help = "Port to listen on")]
    port: u16,

    #[arg(long, default_value = "0.0.0.0", help = "Address to bind")]
    bind: String,

    #[arg(long, help = "Keep accounts in memory instead of Postgres")]
    memory_store: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so DATABASE_URL, GARAGE_API_KEY etc. are picked up
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("garage_dashboard=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    let config = AppConfig::from_env().context("invalid configuration")?;
    info!("Starting Garage dashboard in {:?} mode", config.environment);

    if config.garage.api_key.is_none() {
        warn!("GARAGE_API_KEY is not set, every Garage admin API call will fail");
    }

    let users: Arc<dyn UserStore> = if args.memory_store {
        warn!("using in-memory account store, accounts are lost on restart");
        Arc::new(MemoryUserStore::new())
    } else {
        let pool = DatabaseManager::connect(&config.database)
            .await
            .context("failed to connect to database")?;
        DatabaseManager::ensure_schema(&pool)
            .await
            .context("failed to prepare database schema")?;
        Arc::new(PgUserStore::new(pool))
    };

    let state = AppState::new(config, users)?;
    seed_admin_if_none_exists(&state.accounts, state.config.admin.as_ref()).await;

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", args.bind, args.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("Garage dashboard listening on http://{}", addr);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
