//! Conference Central server.
//!
//! HTTP API, background task worker and announcement scheduler.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tower_http::cors::{AllowHeaders, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use confcentral_kernel::auth::AuthService;
use confcentral_kernel::tasks::{CronResult, TaskWorker};
use confcentral_kernel::{AppState, Config, app_router, db};

/// Conference Central command line.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server with the task worker and scheduler (default).
    Serve,

    /// Apply database migrations and exit.
    Migrate,

    /// Recompute the nearly-sold-out announcement once and exit.
    Announce,

    /// Mint a bearer token for local development.
    Token {
        /// Subject (user id).
        #[arg(long)]
        user_id: String,

        /// Email claim.
        #[arg(long)]
        email: String,

        /// Optional nickname claim.
        #[arg(long)]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let args = Args::parse();
    let config = Config::from_env().context("failed to load configuration")?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Migrate => migrate(&config).await,
        Command::Announce => announce(&config).await,
        Command::Token {
            user_id,
            email,
            name,
        } => {
            let auth = AuthService::new(config.jwt_secret.as_bytes(), config.jwt_issuer.clone());
            let token = auth.issue_token(&user_id, &email, name.as_deref())?;
            println!("{token}");
            Ok(())
        }
    }
}

async fn serve(config: Config) -> Result<()> {
    info!(port = config.port, "Starting Conference Central");

    let state = AppState::new(&config)
        .await
        .context("failed to initialize application state")?;

    info!("Database and Redis connections established");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let worker = TaskWorker::new(
        state.queue().clone(),
        state.cache().clone(),
        state.email().cloned(),
    );
    let worker_rx = shutdown_rx.clone();
    let worker_handle = tokio::spawn(async move { worker.run(worker_rx).await });

    let scheduler_handle = if config.announcement_interval_secs > 0 {
        let cron = Arc::clone(state.cron());
        let interval = Duration::from_secs(config.announcement_interval_secs);
        let scheduler_rx = shutdown_rx.clone();
        Some(tokio::spawn(async move {
            cron.run_scheduler(interval, scheduler_rx).await;
        }))
    } else {
        info!("announcement scheduler disabled");
        None
    };

    let cors = build_cors_layer(&config);

    let app = app_router(state)
        // TraceLayer → CORS → bearer auth → routes
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind to address")?;

    info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped, waiting for background tasks");
    let _ = shutdown_tx.send(true);
    if let Err(e) = worker_handle.await {
        warn!(error = %e, "task worker ended abnormally");
    }
    if let Some(handle) = scheduler_handle
        && let Err(e) = handle.await
    {
        warn!(error = %e, "scheduler ended abnormally");
    }

    Ok(())
}

async fn migrate(config: &Config) -> Result<()> {
    let pool = db::create_pool(config).await?;
    db::run_migrations(&pool).await?;
    info!("migrations applied");
    Ok(())
}

async fn announce(config: &Config) -> Result<()> {
    let state = AppState::new(config)
        .await
        .context("failed to initialize application state")?;

    match state.cron().run().await {
        CronResult::Completed { tasks_run, .. } => {
            info!(tasks = ?tasks_run, "announcement refreshed");
            Ok(())
        }
        CronResult::Skipped => {
            info!("another instance holds the cron lock");
            Ok(())
        }
        CronResult::Failed(e) => anyhow::bail!("announcement job failed: {e}"),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        // Never resolve rather than shutting down immediately
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    if config.cors_allowed_origins.len() == 1 && config.cors_allowed_origins[0] == "*" {
        CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(methods)
            .allow_headers(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(origin = %o, "ignoring unparseable CORS origin");
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true)
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
