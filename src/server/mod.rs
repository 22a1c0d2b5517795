//! Web surface
//!
//! Serves the single-page form and the generate/reset actions over axum.

pub mod handlers;

use crate::dispatch::Dispatcher;
use crate::models::ImageArtifact;
use crate::{Error, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    dispatcher: Arc<Dispatcher>,
    limiter: Option<Arc<Semaphore>>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher) -> Self {
        let limiter = dispatcher
            .settings()
            .concurrency_limit
            .map(|limit| Arc::new(Semaphore::new(limit)));

        Self {
            dispatcher: Arc::new(dispatcher),
            limiter,
        }
    }

    /// Waits for a slot when a concurrency cap is set, then runs the dispatch
    /// on its own task. A caller dropped while still queued never reaches the
    /// endpoint; once the call has started, a disconnect no longer aborts it.
    pub async fn generate(&self, prompt: String) -> Result<ImageArtifact> {
        let permit = match &self.limiter {
            Some(semaphore) => Some(
                Arc::clone(semaphore)
                    .acquire_owned()
                    .await
                    .map_err(|e| self.upstream_error(e.to_string()))?,
            ),
            None => None,
        };

        let dispatcher = Arc::clone(&self.dispatcher);
        tokio::spawn(async move {
            let result = dispatcher.dispatch(&prompt).await;
            drop(permit);
            result
        })
        .await
        .map_err(|e| self.upstream_error(format!("generation task failed: {}", e)))?
    }

    fn upstream_error(&self, message: String) -> Error {
        Error::Upstream {
            label: self.dispatcher.settings().upstream_label.clone(),
            message,
        }
    }

    pub fn available_slots(&self) -> Option<usize> {
        self.limiter
            .as_ref()
            .map(|semaphore| semaphore.available_permits())
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/generate", post(handlers::generate))
        .route("/api/reset", post(handlers::reset))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
