use bulletin_common::context::Context;
use bulletin_db::{
    client::DbClient,
    memory::MemoryPostStorage,
    storage::{PostStorage, StorageError},
};
use config::{Env, StorageBackend};
use server::ServerState;
use service::PostServiceImpl;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod server;
mod service;

#[derive(Debug, Error)]
enum InitError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
    #[error("DATABASE_URL must be set for the postgres storage backend")]
    MissingDatabaseUrl,
    #[error("Error setting up storage: {0}")]
    Storage(#[from] StorageError),
    #[error("Error binding tcp listener: {0}")]
    TcpBind(std::io::Error),
    #[error("Error serving server: {0}")]
    TcpServe(std::io::Error),
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "bulletin_api=debug,\
                bulletin_db=debug,\
                tower_http=debug,axum::rejection=trace,sqlx=warn"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn get_env() -> Result<Env, InitError> {
    if let Err(e) = dotenvy::dotenv() {
        if e.not_found() {
            debug!("No .dotenv file found");
        } else {
            return Err(e.into());
        }
    }

    envy::from_env().map_err(InitError::from)
}

async fn connect_storage(env: &Env) -> Result<(Arc<dyn PostStorage>, Option<DbClient>), InitError> {
    match env.storage_backend {
        StorageBackend::Postgres => {
            let url = env
                .database_url
                .as_deref()
                .ok_or(InitError::MissingDatabaseUrl)?;
            let client = DbClient::connect(url, env.database_max_connections).await?;
            client.migrate().await?;
            info!(max_connections = env.database_max_connections, "Connected to database");

            Ok((Arc::new(client.clone()), Some(client)))
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage, posts will not survive a restart");
            Ok((Arc::new(MemoryPostStorage::new()), None))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Could not listen for Ctrl-C");
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
                warn!(error = %err, "Could not listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

/// Resolves on a shutdown signal. In-flight requests get `deadline` to finish before `root`
/// is cancelled, which aborts their storage calls.
async fn graceful_shutdown(root: Context, deadline: Duration) {
    shutdown_signal().await;
    info!(?deadline, "Shutting down");

    tokio::spawn(async move {
        tokio::time::sleep(deadline).await;
        warn!("Shutdown deadline passed, cancelling in-flight requests");
        root.cancel();
    });
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let env = get_env()?;

    let (storage, db_client) = connect_storage(&env).await?;
    let root_context = Context::new();
    let state = ServerState {
        post_service: Arc::new(PostServiceImpl::new(storage)),
        root_context: root_context.clone(),
    };
    let app = server::router(state, env.request_timeout());

    let server_address = SocketAddr::new(env.server_address, env.server_port);
    let listener = tokio::net::TcpListener::bind(server_address)
        .await
        .map_err(InitError::TcpBind)?;
    info!(%server_address, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(graceful_shutdown(root_context, env.shutdown_timeout()))
        .await
        .map_err(InitError::TcpServe)?;

    if let Some(client) = db_client {
        client.close().await;
        debug!("Closed database pool");
    }
    info!("Server stopped");

    Ok(())
}
