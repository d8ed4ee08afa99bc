#![warn(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::single_match_else)]

use crate::{
    config::RuntimeConfiguration,
    data::postgres::PostgresStudentStore,
    error::{BindListenerSnafu, ServeSnafu, StudentsResult},
    state::StudentsState,
};
use snafu::ResultExt;
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[macro_use]
extern crate tracing;

mod config;
mod data;
mod error;
mod routes;
mod state;
mod uploads;

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    warn!("signal received, starting graceful shutdown");
}

#[snafu::report]
#[tokio::main]
async fn main() -> StudentsResult<()> {
    let dotenv_result = dotenvy::dotenv();

    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .finish(),
    )
    .expect("unable to set tracing subscriber");

    info!("`tracing` online");
    if let Err(e) = dotenv_result {
        debug!(?e, "No .env file loaded, using the process environment");
    }

    let config = RuntimeConfiguration::new()?;
    let store = PostgresStudentStore::connect_lazy(&config.db_config())?;

    //a missing database shouldn't stop us listening - requests will just fail until it's back
    tokio::spawn({
        let store = store.clone();
        async move {
            match store.migrate().await {
                Ok(()) => info!("Connection successful"),
                Err(e) => error!(?e, "Unable to connect to and migrate the database"),
            }
        }
    });

    let state = StudentsState::new(Arc::new(store), config.clone());

    let addr = config.server_config().listen_addr;
    let listener = TcpListener::bind(addr)
        .await
        .context(BindListenerSnafu { addr })?;

    info!(addr = ?listener.local_addr().unwrap_or(addr), "Listening");
    serve(listener, state, shutdown_signal()).await
}

async fn serve(
    listener: TcpListener,
    state: StudentsState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> StudentsResult<()> {
    let served = axum::serve(listener, routes::app(state.clone()))
        .with_graceful_shutdown(shutdown)
        .await
        .context(ServeSnafu);

    //only once every in-flight request has drained
    state.sensible_shutdown().await;
    served
}
