//! Snippets Server - Main entry point

use anyhow::Result;
use snippets_common::logging::{init_logging, LogConfig};
use std::{net::SocketAddr, time::Duration};
use tokio::signal;
use tracing::info;

use snippets_server::{
    api::{self, AppState},
    audit::AuditRecorder,
    auth::hash_password,
    config::{AdminBootstrap, Config, StorageBackend},
    db::{self, Storage},
    models::NewUser,
    store::EntityStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::builder()
        .log_file_prefix("snippets-server")
        .filter_directives("snippets_server=debug,tower_http=debug,sqlx=info")
        .build();

    // Environment variables take precedence
    let log_config = log_config.merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    info!("Starting Snippets Server");

    let config = Config::load()?;
    info!(
        host = %config.server.host,
        port = config.server.port,
        storage = ?config.storage,
        "Configuration loaded"
    );

    let storage = open_storage(&config).await?;
    let recorder = AuditRecorder::new(storage.audit.clone(), config.audit.to_audit_config());
    let store = EntityStore::new(storage, recorder);

    if let Some(admin) = &config.admin {
        bootstrap_admin(&store, admin).await?;
    }

    let app = api::create_router(AppState::new(store), &config.cors);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
        .await?;

    info!("Server shut down gracefully");

    Ok(())
}

async fn open_storage(config: &Config) -> Result<Storage> {
    match config.storage {
        StorageBackend::Postgres => {
            let pool = db::create_pool(&config.database).await?;
            info!("Database connection pool established");

            sqlx::migrate!("../../migrations")
                .run(&pool)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;
            info!("Database migrations completed");

            Ok(Storage::postgres(pool))
        },
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on shutdown");
            Ok(Storage::memory())
        },
    }
}

/// Create the configured administrator unless the username is taken
///
/// Runs as a system operation with no acting user.
async fn bootstrap_admin(store: &EntityStore, admin: &AdminBootstrap) -> Result<()> {
    let users = &store.storage().users;
    if let Some(existing) = users.find_user_by_username(&admin.username).await? {
        info!(user_id = existing.id, "Bootstrap admin already exists");
        return Ok(());
    }

    let new_user = NewUser {
        username: admin.username.clone(),
        password_hash: hash_password(&admin.password).await?,
        is_admin: true,
    };
    let user = store.create_user(new_user, None).await?;
    info!(user_id = user.id, username = %user.username, "Bootstrap admin created");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    info!("Waiting up to {} seconds for connections to close", timeout_secs);
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}
