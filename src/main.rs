use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use movies_api::auth::{Authenticator, HttpTokenVerifier};
use movies_api::database::{DatabaseManager, PgMovieStore};
use movies_api::middleware::{RateLimitConfig, RateLimiter};
use movies_api::{app, config, AppState};

/// Movie catalog HTTP API
#[derive(Debug, Parser)]
#[command(name = "movies-api", version, about)]
struct Args {
    /// Bind address, overrides HOST
    #[arg(long)]
    host: Option<String>,

    /// Listen port, overrides PORT
    #[arg(long)]
    port: Option<u16>,

    /// Do not apply embedded migrations at startup
    #[arg(long)]
    skip_migrations: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, AUTH_VERIFIER_URL, etc.
    let dotenv = config::load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("movies_api=info,tower_http=info")),
        )
        .init();

    match dotenv {
        Ok(Some(path)) => info!("Loaded environment from {}", path.display()),
        Ok(None) => {}
        Err(e) => warn!("Ignoring unreadable .env file: {}", e),
    }

    let args = Args::parse();

    let mut config = config::config().clone();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.skip_migrations {
        config.database.run_migrations = false;
    }
    info!("Starting movies-api in {} mode", config.environment.as_str());

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    if config.database.run_migrations {
        DatabaseManager::migrate(&pool).await.context("failed to run migrations")?;
    }

    let verifier = HttpTokenVerifier::new(&config.auth.verifier_url, config.auth.timeout())
        .context("failed to build token authority client")?;
    info!("Verifying bearer tokens against {}", verifier.endpoint());
    let authenticator = Authenticator::new(Arc::new(verifier), config.auth.timeout());
    let limiter = RateLimiter::new(RateLimitConfig::from(&config.api));
    if limiter.is_enabled() {
        info!(
            "Rate limiting at {} req/s, burst {}",
            config.api.rate_limit_rps,
            limiter.capacity()
        );
    }

    let store = PgMovieStore::new(pool.clone(), config.database.query_timeout());
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let shutdown_budget = Duration::from_secs(config.server.shutdown_timeout_secs);
    let state = AppState::new(config, Arc::new(store), authenticator, limiter);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("movies-api listening on http://{}", bind_addr);

    let shutdown = Arc::new(tokio::sync::Notify::new());
    let server = axum::serve(listener, app(state)).with_graceful_shutdown({
        let shutdown = shutdown.clone();
        async move { shutdown.notified().await }
    });
    let mut server = tokio::spawn(async move { server.await });

    tokio::select! {
        joined = &mut server => {
            joined.context("server task panicked")?.context("server error")?;
            pool.close().await;
            return Ok(());
        }
        _ = shutdown_signal() => {}
    }

    info!("Shutting down, draining in-flight requests for up to {:?}", shutdown_budget);
    shutdown.notify_one();
    match tokio::time::timeout(shutdown_budget, &mut server).await {
        Ok(joined) => joined.context("server task panicked")?.context("server error")?,
        Err(_) => warn!("Graceful shutdown exceeded {:?}, dropping remaining connections", shutdown_budget),
    }

    pool.close().await;
    info!("Stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
