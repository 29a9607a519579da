//! First-success-wins race across all registered providers.
//!
//! # State Machine
//! ```text
//! Pending → Resolved(Success)   first Ok observed
//! Pending → Resolved(Failure)   every provider failed
//! Pending → TimedOut            deadline fired first
//! ```
//! All three are terminal; outcomes arriving afterwards are never consumed.
//!
//! # Design Decisions
//! - One tokio task per provider, observed in completion order
//! - Single one-shot deadline per race, not renewed by partial progress
//! - Losing tasks are aborted when `cancel_losers` is set, detached otherwise

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{FuturesUnordered, StreamExt};
use tokio::task::AbortHandle;
use tokio::time::{self, Instant};

use crate::lookup::types::{
    AddressResult, LookupError, PostalCode, ProviderError, ProviderErrorKind,
};
use crate::observability::metrics;
use crate::providers::ProviderClient;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Races every registered provider for each postal code.
///
/// Holds no per-request state; every call to [`resolve`](Self::resolve) is an
/// independent race.
#[derive(Clone)]
pub struct RaceCoordinator {
    providers: Vec<Arc<dyn ProviderClient>>,
    timeout: Duration,
    cancel_losers: bool,
}

impl RaceCoordinator {
    pub fn new(providers: Vec<Arc<dyn ProviderClient>>) -> Self {
        Self {
            providers,
            timeout: DEFAULT_TIMEOUT,
            cancel_losers: true,
        }
    }

    /// Set the default race timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Abort (true) or detach (false) lookups still running when the race ends.
    pub fn with_cancel_losers(mut self, cancel_losers: bool) -> Self {
        self.cancel_losers = cancel_losers;
        self
    }

    /// Default timeout applied by callers that have no deadline of their own.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn providers(&self) -> &[Arc<dyn ProviderClient>] {
        &self.providers
    }

    /// Resolve `postal_code`, returning the first successful lookup.
    pub async fn resolve(
        &self,
        postal_code: &str,
        timeout: Duration,
    ) -> Result<AddressResult, LookupError> {
        let started = Instant::now();
        let result = match PostalCode::parse(postal_code) {
            Ok(code) => self.race(code, started + timeout, timeout).await,
            Err(e) => Err(e),
        };

        match &result {
            Ok(address) => tracing::info!(
                postal_code = %postal_code,
                provider = %address.source_provider,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Postal code resolved"
            ),
            Err(e) => tracing::warn!(
                postal_code = %postal_code,
                outcome = e.label(),
                error = %e,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Postal code not resolved"
            ),
        }
        metrics::record_resolution(&result, started.elapsed());
        result
    }

    async fn race(
        &self,
        code: PostalCode,
        deadline: Instant,
        timeout: Duration,
    ) -> Result<AddressResult, LookupError> {
        let mut losers = AbortOnDrop::new(self.cancel_losers, self.providers.len());
        let mut pending: FuturesUnordered<_> = self
            .providers
            .iter()
            .map(|provider| {
                let id = provider.id();
                let provider = Arc::clone(provider);
                let code = code.clone();
                let handle = tokio::spawn(async move {
                    let started = Instant::now();
                    let outcome = provider.lookup(&code).await;
                    metrics::record_provider_lookup(provider.id(), &outcome, started.elapsed());
                    outcome
                });
                losers.handles.push(handle.abort_handle());
                async move { (id, handle.await) }
            })
            .collect();

        let mut failures = Vec::new();
        loop {
            match time::timeout_at(deadline, pending.next()).await {
                Err(_) => {
                    return Err(LookupError::TimedOut { timeout, failures });
                }
                Ok(None) => return Err(LookupError::AllProvidersFailed(failures)),
                Ok(Some((_, Ok(Ok(address))))) => return Ok(address),
                Ok(Some((id, Ok(Err(e))))) => {
                    tracing::debug!(provider = %id, postal_code = %code, error = %e.kind, "Provider lookup failed");
                    failures.push(e);
                }
                Ok(Some((id, Err(join_err)))) => {
                    tracing::error!(provider = %id, error = %join_err, "Provider lookup task failed");
                    failures.push(ProviderError::new(
                        id,
                        ProviderErrorKind::Task(join_err.to_string()),
                    ));
                }
            }
        }
    }
}

/// Aborts the tracked lookup tasks when dropped, if armed.
///
/// Covers both a race that ends normally and a caller that drops the race
/// future before it ends.
struct AbortOnDrop {
    armed: bool,
    handles: Vec<AbortHandle>,
}

impl AbortOnDrop {
    fn new(armed: bool, capacity: usize) -> Self {
        Self {
            armed,
            handles: Vec::with_capacity(capacity),
        }
    }
}

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        if self.armed {
            for handle in &self.handles {
                handle.abort();
            }
        }
    }
}

impl std::fmt::Debug for RaceCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RaceCoordinator")
            .field(
                "providers",
                &self.providers.iter().map(|p| p.id()).collect::<Vec<_>>(),
            )
            .field("timeout", &self.timeout)
            .field("cancel_losers", &self.cancel_losers)
            .finish()
    }
}
