//! Supervised upstream connection.
//!
//! `UpstreamLink` is the only writer of [`ConnectionState`]. A background
//! supervisor connects with unbounded fixed-delay retries, waits for the
//! session to report it closed, then starts over.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use obs_control_core::action::UpstreamRequest;
use obs_control_core::errors::UpstreamError;
use obs_control_core::security::UpstreamTarget;
use obs_control_core::session::{CloseEvent, UpstreamSession};
use obs_control_core::state::{ConnectionState, HealthSnapshot};

/// Reconnect behavior.
#[derive(Clone, Debug)]
pub struct LinkConfig {
    /// Fixed pause between failed connect attempts.
    pub retry_delay: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_secs(2),
        }
    }
}

/// The single persistent upstream session.
pub struct UpstreamLink {
    session: Arc<dyn UpstreamSession>,
    target: UpstreamTarget,
    config: LinkConfig,
    state: RwLock<ConnectionState>,
    attempts: AtomicU64,
}

impl UpstreamLink {
    pub fn new(
        session: Arc<dyn UpstreamSession>,
        target: UpstreamTarget,
        config: LinkConfig,
    ) -> Self {
        Self {
            session,
            target,
            config,
            state: RwLock::new(ConnectionState::default()),
            attempts: AtomicU64::new(0),
        }
    }

    pub fn with_defaults(session: Arc<dyn UpstreamSession>, target: UpstreamTarget) -> Self {
        Self::new(session, target, LinkConfig::default())
    }

    /// Connect, retrying forever with a fixed delay. Returns once connected.
    pub async fn connect(&self) {
        loop {
            let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
            match self.session.connect(&self.target).await {
                Ok(()) => {
                    self.state.write().mark_connected();
                    info!(address = %self.target.address, attempt, "Connected to upstream");
                    return;
                }
                Err(e) => {
                    self.state.write().mark_failed(e.to_string());
                    warn!(
                        address = %self.target.address,
                        attempt,
                        error = %e,
                        kind = e.error_kind(),
                        retry_in_ms = self.config.retry_delay.as_millis() as u64,
                        "Upstream connect failed"
                    );
                    tokio::time::sleep(self.config.retry_delay).await;
                }
            }
        }
    }

    /// Spawn the supervisor: initial connect, then reconnect after every close.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        // Subscribe before the first connect so no close can slip past.
        let closed = self.session.subscribe_closed();
        tokio::spawn(Arc::clone(self).supervise(closed))
    }

    async fn supervise(self: Arc<Self>, mut closed: broadcast::Receiver<CloseEvent>) {
        loop {
            self.connect().await;

            match closed.recv().await {
                Ok(event) => {
                    self.state.write().mark_closed();
                    warn!(reason = %event.reason, "Upstream connection closed, reconnecting");
                }
                Err(RecvError::Lagged(skipped)) => {
                    self.state.write().mark_closed();
                    warn!(skipped, "Missed upstream close notifications, reconnecting");
                }
                Err(RecvError::Closed) => {
                    self.state.write().mark_closed();
                    warn!("Upstream session dropped, supervisor stopping");
                    return;
                }
            }
        }
    }

    /// True iff the link is connected.
    pub fn is_ready(&self) -> bool {
        self.state.read().is_connected()
    }

    /// Diagnostic from the last failed attempt; empty when none or connected.
    pub fn last_error(&self) -> String {
        self.state.read().last_error().to_string()
    }

    /// Consistent copy of status and diagnostic.
    pub fn state(&self) -> ConnectionState {
        self.state.read().clone()
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        self.state.read().snapshot()
    }

    /// Total connect attempts since creation.
    pub fn connect_attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Forward one request to the session. Callers check `is_ready()` first.
    pub async fn call(&self, request: &UpstreamRequest) -> Result<(), UpstreamError> {
        self.session.call(request).await
    }
}
