//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request id, tracing, request timeout)
//! - Bind server to listener
//! - Swap in a freshly built coordinator when the config is reloaded
//! - Stop accepting and drain on shutdown

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{body::Body, http::Request, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::Span;

use crate::config::ServiceConfig;
use crate::http::handlers;
use crate::http::request::{request_id, MakeRequestUuidV4};
use crate::lookup::RaceCoordinator;
use crate::providers::{build_providers, ProviderBuildError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<ArcSwap<RaceCoordinator>>,
}

impl AppState {
    pub fn new(coordinator: RaceCoordinator) -> Self {
        Self {
            coordinator: Arc::new(ArcSwap::from_pointee(coordinator)),
        }
    }

    /// Rebuild the coordinator from `config` and swap it in.
    ///
    /// Races already in flight finish on the coordinator they started with.
    pub fn reload(&self, config: &ServiceConfig) {
        match build_coordinator(config) {
            Ok(coordinator) => {
                tracing::info!(
                    providers = coordinator.providers().len(),
                    timeout_ms = config.lookup.timeout_ms,
                    cancel_losers = config.lookup.cancel_losers,
                    "Configuration reloaded"
                );
                self.coordinator.store(Arc::new(coordinator));
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to apply reloaded config, keeping current providers");
            }
        }
    }
}

/// Build the race coordinator described by `config`.
pub fn build_coordinator(config: &ServiceConfig) -> Result<RaceCoordinator, ProviderBuildError> {
    let providers = build_providers(&config.providers)?;
    Ok(RaceCoordinator::new(providers)
        .with_timeout(Duration::from_millis(config.lookup.timeout_ms))
        .with_cancel_losers(config.lookup.cancel_losers))
}

/// HTTP server for the postal code lookup service.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServiceConfig) -> Result<Self, ProviderBuildError> {
        let state = AppState::new(build_coordinator(&config)?);
        let router = Self::build_router(&config, state.clone());
        Ok(Self {
            router,
            config,
            state,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        Router::new()
            .route("/cep", get(handlers::missing_cep))
            .route("/cep/", get(handlers::missing_cep))
            .route("/cep/{cep}", get(handlers::lookup_cep))
            .route("/health", get(handlers::health))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configuration updates received on `config_updates` rebuild the
    /// coordinator. Returns once `shutdown` fires and in-flight requests
    /// have drained.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ServiceConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            timeout_ms = self.config.lookup.timeout_ms,
            "HTTP server starting"
        );

        let state = self.state.clone();
        let mut reload_shutdown = shutdown.resubscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    update = config_updates.recv() => match update {
                        Some(config) => state.reload(&config),
                        None => break,
                    },
                    _ = reload_shutdown.recv() => break,
                }
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The router with all middleware applied.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

fn make_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id(request.headers()),
    )
}
