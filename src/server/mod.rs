// src/server/mod.rs

//! Static file server for the generated site, with live reload.

pub mod reload;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::middleware;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use reload::inject_script;

use crate::notifier::BroadcastNotifier;
use crate::task::{BoxFuture, LeafAction, TaskContext};

pub const WS_PATH: &str = "/__sitepipe/ws";
pub const CLIENT_PATH: &str = "/__sitepipe/client.js";

#[derive(Debug, Clone)]
pub(crate) struct ServerState {
    notifier: Arc<BroadcastNotifier>,
}

pub fn create_router(site_root: impl AsRef<Path>, notifier: Arc<BroadcastNotifier>) -> Router {
    let files = ServeDir::new(site_root.as_ref()).append_index_html_on_directories(true);

    Router::new()
        .route(WS_PATH, get(reload::ws_handler))
        .route(CLIENT_PATH, get(reload::client_script))
        .fallback_service(files)
        .layer(middleware::from_fn(reload::inject_reload_client))
        .layer(TraceLayer::new_for_http())
        .with_state(ServerState { notifier })
}

/// Leaf behind `startServer`: serves `site_root` on `address` until the
/// process ends.
#[derive(Debug, Clone)]
pub struct ServeAction {
    address: String,
    site_root: PathBuf,
    notifier: Arc<BroadcastNotifier>,
}

impl ServeAction {
    pub fn new(
        address: impl Into<String>,
        site_root: impl Into<PathBuf>,
        notifier: Arc<BroadcastNotifier>,
    ) -> Self {
        Self {
            address: address.into(),
            site_root: site_root.into(),
            notifier,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    async fn serve(&self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(&self.address)
            .await
            .with_context(|| format!("binding {}", self.address))?;
        let local: SocketAddr = listener.local_addr()?;
        info!(address = %local, root = ?self.site_root, "serving site");

        let router = create_router(&self.site_root, self.notifier.clone());
        axum::serve(listener, router)
            .await
            .context("HTTP server stopped")?;
        Ok(())
    }
}

impl LeafAction for ServeAction {
    fn run(&self, _ctx: TaskContext) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(self.serve())
    }
}
