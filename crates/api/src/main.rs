use std::net::SocketAddr;

use anyhow::Context;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trellis_api::config::{LogFormat, ServerConfig};
use trellis_api::pipeline::{Collaborators, Pipeline};
use trellis_api::routes;
use trellis_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env().context("Invalid configuration")?;

    // --- Tracing ---
    init_tracing(config.log_format);
    tracing::info!(
        grpc_addr = %config.grpc_addr(),
        health_port = config.health_port,
        "Loaded server configuration"
    );

    // --- Database ---
    let pool = trellis_db::create_pool(
        &config.database_url,
        config.db_max_connections,
        config.query_timeout(),
    )
    .await
    .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    trellis_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    trellis_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    // --- Pipeline ---
    let collaborators = Collaborators::from_config(&config)?;
    let pipeline = Pipeline::postgres(pool.clone(), config.query_timeout(), &collaborators);

    // --- Shutdown fan-out ---
    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = stop_tx.send(true);
    });

    // --- gRPC server ---
    let grpc_addr: SocketAddr = config
        .grpc_addr()
        .parse()
        .context("GRPC_HOST/GRPC_PORT do not form a socket address")?;
    let grpc = tonic::transport::Server::builder()
        .timeout(config.request_timeout())
        .layer(TraceLayer::new_for_grpc())
        .add_service(pipeline.plan_server())
        .add_service(pipeline.session_server())
        .serve_with_shutdown(grpc_addr, stopped(stop_rx.clone()));
    tracing::info!(%grpc_addr, "Starting gRPC server");

    // --- Health server ---
    let health_addr = SocketAddr::new(grpc_addr.ip(), config.health_port);
    let listener = tokio::net::TcpListener::bind(health_addr)
        .await
        .with_context(|| format!("Failed to bind health endpoint to {health_addr}"))?;
    let app = routes::build_router(AppState {
        pool,
        config: std::sync::Arc::new(config),
    });
    let health = axum::serve(listener, app).with_graceful_shutdown(stopped(stop_rx));
    tracing::info!(%health_addr, "Starting health endpoint");

    tokio::try_join!(
        async { grpc.await.context("gRPC server error") },
        async { health.await.context("Health server error") },
    )?;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "trellis_api=debug,trellis_db=debug,trellis_core=info,tower_http=info".into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Resolves once the shutdown flag is raised.
async fn stopped(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the servers shut
/// down cleanly whether stopped interactively or by a process manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
