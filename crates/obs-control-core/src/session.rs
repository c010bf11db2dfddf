use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::action::UpstreamRequest;
use crate::errors::UpstreamError;
use crate::security::UpstreamTarget;

/// Notification that an established session went away.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CloseEvent {
    pub reason: String,
}

/// Transport for the upstream remote-control RPC session.
///
/// Implementations hold at most one live connection. Closed events are only
/// emitted for sessions that completed `connect`, never for failed attempts.
#[async_trait]
pub trait UpstreamSession: Send + Sync {
    /// Establish (or replace) the session.
    async fn connect(&self, target: &UpstreamTarget) -> Result<(), UpstreamError>;

    /// Invoke one request and wait for the upstream to acknowledge it.
    async fn call(&self, request: &UpstreamRequest) -> Result<(), UpstreamError>;

    /// Subscribe to closed notifications.
    fn subscribe_closed(&self) -> broadcast::Receiver<CloseEvent>;
}
