//! Development stand-in for the Wondertone preview backend.
//!
//! Serves the same submission and status endpoints the storefront talks to,
//! renders placeholder previews in the style's palette, and can be told to
//! answer synchronously or to fail specific styles.

pub mod config;
pub mod error;
pub mod job;
pub mod prompt_cache;
pub mod render;
pub mod routes;
pub mod schemas;
pub mod state;
pub mod store;
pub mod watermark;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use anyhow::Context;
use axum::Router;
use log::info;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use crate::routes::api_routes;
use crate::state::GenState;

pub use config::GatewayConfig;
pub use error::GatewayError;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// A running gateway. Dropping it stops the server and the sweeper.
pub struct Gateway {
    addr: SocketAddr,
    state: Arc<GenState>,
    server: JoinHandle<()>,
    sweeper: JoinHandle<()>,
}

impl Gateway {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> &str {
        self.state.base_url()
    }

    pub fn state(&self) -> &Arc<GenState> {
        &self.state
    }

    pub fn shutdown(&self) {
        self.server.abort();
        self.sweeper.abort();
        self.state.watermark.shutdown();
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        self.shutdown();
    }
}

pub fn app(state: Arc<GenState>) -> Router {
    Router::new()
        .merge(api_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `config.port` (0 picks a free port) and start serving in the background.
pub async fn serve(config: GatewayConfig) -> anyhow::Result<Gateway> {
    let bind = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {}", bind))?;
    let addr = listener.local_addr()?;

    let base_url = config
        .public_url
        .clone()
        .unwrap_or_else(|| format!("http://127.0.0.1:{}", addr.port()));
    let retention = config.job_retention;
    let state = Arc::new(GenState::new(config, base_url));

    info!("Starting preview gateway on {} ({})", addr, state.base_url());

    let router = app(state.clone());
    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            log::error!("gateway server stopped: {}", e);
        }
    });

    let sweep_state = state.clone();
    let sweeper = tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL.min(retention.max(Duration::from_secs(1))));
        loop {
            interval.tick().await;
            let removed = sweep_state.jobs.clear_completed(retention).await;
            if removed > 0 {
                info!("swept {} finished preview jobs", removed);
            }
        }
    });

    Ok(Gateway { addr, state, server, sweeper })
}
