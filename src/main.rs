use std::sync::Arc;

use clap::Parser;
use mimalloc_rust::GlobalMiMalloc;

pub mod config;
pub mod http;
pub mod logging;
pub mod sql;

#[global_allocator]
static GLOBAL_MIMALLOC: GlobalMiMalloc = GlobalMiMalloc;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = config::Config::parse();
    logging::init();

    tracing::info!(database = %config.database_url, "connecting to database");
    let database = sql::SqliteDatabase::open(&config.database_url, config.pool_options())
        .expect("Failed to open database");
    let relay = Arc::new(sql::QueryRelay::new(Arc::new(database)));

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .expect("Failed to bind listener");
    let addr = listener.local_addr().expect("Failed to read listener address");
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, http::create_router(relay))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to serve");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutting down");
}
