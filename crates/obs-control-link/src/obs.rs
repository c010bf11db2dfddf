//! obs-websocket session: a thin adapter over [`obws::Client`].
//!
//! The client owns the protocol. This module maps requests onto its typed API
//! and turns the end of its event stream into a single [`CloseEvent`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use obws::events::Event;
use obws::Client;
use parking_lot::Mutex;
use secrecy::ExposeSecret;
use tokio::sync::{broadcast, oneshot};
use url::Url;

use obs_control_core::action::UpstreamRequest;
use obs_control_core::errors::UpstreamError;
use obs_control_core::security::UpstreamTarget;
use obs_control_core::session::{CloseEvent, UpstreamSession};

/// Tuning for [`ObsSession`].
#[derive(Clone, Debug)]
pub struct ObsSessionConfig {
    /// Upper bound on dialing plus handshake.
    pub connect_timeout: Duration,
}

impl Default for ObsSessionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// The current connection and the task watching it.
struct Active {
    client: Arc<Client>,
    open: Arc<AtomicBool>,
    // Dropped on replacement, which ends the watcher without a closed event.
    _stop: oneshot::Sender<()>,
}

/// A single obs-websocket connection, replaceable by calling `connect` again.
pub struct ObsSession {
    config: ObsSessionConfig,
    active: Mutex<Option<Active>>,
    closed_tx: broadcast::Sender<CloseEvent>,
}

impl ObsSession {
    pub fn new(config: ObsSessionConfig) -> Self {
        let (closed_tx, _) = broadcast::channel(16);
        Self {
            config,
            active: Mutex::new(None),
            closed_tx,
        }
    }

    /// Whether the current connection is still up.
    pub fn is_open(&self) -> bool {
        self.active
            .lock()
            .as_ref()
            .is_some_and(|a| a.open.load(Ordering::Relaxed))
    }
}

impl Default for ObsSession {
    fn default() -> Self {
        Self::new(ObsSessionConfig::default())
    }
}

#[async_trait]
impl UpstreamSession for ObsSession {
    async fn connect(&self, target: &UpstreamTarget) -> Result<(), UpstreamError> {
        let (host, port) = endpoint(&target.address)?;
        let password = target.credential.0.expose_secret();
        let password = (!password.is_empty()).then_some(password);

        let client = tokio::time::timeout(
            self.config.connect_timeout,
            Client::connect(host.as_str(), port, password),
        )
        .await
        .map_err(|_| UpstreamError::Timeout(self.config.connect_timeout))?
        .map_err(|e| UpstreamError::Connect(e.to_string()))?;

        let client = Arc::new(client);
        let open = Arc::new(AtomicBool::new(true));
        let (stop_tx, stop_rx) = oneshot::channel();
        let (ready_tx, ready_rx) = oneshot::channel();
        let _ = tokio::spawn(watch_connection(
            Arc::clone(&client),
            Arc::clone(&open),
            stop_rx,
            ready_tx,
            self.closed_tx.clone(),
        ));
        ready_rx
            .await
            .map_err(|_| UpstreamError::Connect("event watcher exited".into()))??;

        let _previous = self.active.lock().replace(Active {
            client,
            open,
            _stop: stop_tx,
        });
        tracing::debug!(%host, port, "obs-websocket session identified");
        Ok(())
    }

    async fn call(&self, request: &UpstreamRequest) -> Result<(), UpstreamError> {
        let client = self
            .active
            .lock()
            .as_ref()
            .filter(|a| a.open.load(Ordering::Relaxed))
            .map(|a| Arc::clone(&a.client))
            .ok_or(UpstreamError::NotConnected)?;

        let result = match request {
            UpstreamRequest::SetCurrentProgramScene { scene_name } => client
                .scenes()
                .set_current_program_scene(scene_name.as_str())
                .await
                .map(drop),
            UpstreamRequest::StartStream => client.streaming().start().await.map(drop),
            UpstreamRequest::StopStream => client.streaming().stop().await.map(drop),
            UpstreamRequest::StartRecord => client.recording().start().await.map(drop),
            UpstreamRequest::StopRecord => client.recording().stop().await.map(drop),
            UpstreamRequest::SetInputMute { input_name, muted } => client
                .inputs()
                .set_muted(obws::requests::inputs::InputId::Name(input_name.as_str()), *muted)
                .await
                .map(drop),
        };

        result.map_err(|e| {
            tracing::debug!(request_type = request.request_type(), error = %e, "Request failed");
            upstream_error(e)
        })
    }

    fn subscribe_closed(&self) -> broadcast::Receiver<CloseEvent> {
        self.closed_tx.subscribe()
    }
}

/// Split a `ws://host:port` address into what `Client::connect` takes.
fn endpoint(address: &str) -> Result<(String, u16), UpstreamError> {
    let url = Url::parse(address)
        .map_err(|e| UpstreamError::Connect(format!("invalid address {address}: {e}")))?;
    if url.scheme() != "ws" {
        return Err(UpstreamError::Connect(format!(
            "unsupported scheme {} in {address}",
            url.scheme()
        )));
    }
    let host = url
        .host_str()
        .ok_or_else(|| UpstreamError::Connect(format!("missing host in {address}")))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| UpstreamError::Connect(format!("missing port in {address}")))?;
    Ok((host.to_string(), port))
}

fn upstream_error(err: obws::error::Error) -> UpstreamError {
    match err {
        obws::error::Error::Api { code, message, .. } => UpstreamError::rejected(code, message),
        other => UpstreamError::Transport(other.to_string()),
    }
}

/// Subscribes to the client's events, reports readiness, then emits one
/// closed event when the connection ends.
async fn watch_connection(
    client: Arc<Client>,
    open: Arc<AtomicBool>,
    stop: oneshot::Receiver<()>,
    ready: oneshot::Sender<Result<(), UpstreamError>>,
    closed_tx: broadcast::Sender<CloseEvent>,
) {
    let events = match client.events() {
        Ok(events) => events,
        Err(e) => {
            let _ = ready.send(Err(UpstreamError::Connect(e.to_string())));
            return;
        }
    };
    let _ = ready.send(Ok(()));

    if let Some(reason) = wait_for_close(events, stop).await {
        open.store(false, Ordering::Relaxed);
        tracing::warn!(reason = %reason, "obs-websocket session lost");
        let _ = closed_tx.send(CloseEvent { reason });
    }
}

/// Returns the close reason, or `None` if the watcher was stopped locally.
async fn wait_for_close<S>(events: S, mut stop: oneshot::Receiver<()>) -> Option<String>
where
    S: Stream<Item = Event>,
{
    let mut events = std::pin::pin!(events);
    loop {
        tokio::select! {
            _ = &mut stop => return None,
            event = events.next() => match event {
                Some(Event::ServerStopping) => tracing::debug!("obs-websocket server stopping"),
                Some(Event::ServerStopped) => return Some("obs-websocket server stopped".into()),
                Some(_) => {}
                None => return Some("connection closed".into()),
            },
        }
    }
}
