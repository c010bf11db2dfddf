use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use obs_control_core::action::UpstreamRequest;
use obs_control_core::errors::UpstreamError;
use obs_control_core::security::UpstreamTarget;
use obs_control_core::session::{CloseEvent, UpstreamSession};

/// Scripted session for deterministic testing without a running OBS.
///
/// Connect and call results are consumed in order; once a queue is empty,
/// connects and calls succeed.
pub struct MockSession {
    connect_results: Mutex<VecDeque<Result<(), UpstreamError>>>,
    call_results: Mutex<VecDeque<Result<(), UpstreamError>>>,
    calls: Mutex<Vec<UpstreamRequest>>,
    connect_count: AtomicUsize,
    open: AtomicBool,
    closed_tx: broadcast::Sender<CloseEvent>,
}

impl Default for MockSession {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSession {
    pub fn new() -> Self {
        let (closed_tx, _) = broadcast::channel(16);
        Self {
            connect_results: Mutex::new(VecDeque::new()),
            call_results: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            connect_count: AtomicUsize::new(0),
            open: AtomicBool::new(false),
            closed_tx,
        }
    }

    /// Convenience: fail the first connects with the given messages.
    pub fn failing_connects(messages: &[&str]) -> Self {
        let mock = Self::new();
        for msg in messages {
            mock.push_connect_result(Err(UpstreamError::Connect((*msg).to_string())));
        }
        mock
    }

    pub fn push_connect_result(&self, result: Result<(), UpstreamError>) {
        self.connect_results.lock().push_back(result);
    }

    pub fn push_call_result(&self, result: Result<(), UpstreamError>) {
        self.call_results.lock().push_back(result);
    }

    /// Every request received, in order, including ones refused while closed.
    pub fn calls(&self) -> Vec<UpstreamRequest> {
        self.calls.lock().clone()
    }

    pub fn connect_count(&self) -> usize {
        self.connect_count.load(Ordering::Relaxed)
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Relaxed)
    }

    /// Simulate the upstream dropping an established session.
    pub fn close(&self, reason: &str) {
        if self.open.swap(false, Ordering::Relaxed) {
            let _ = self.closed_tx.send(CloseEvent {
                reason: reason.to_string(),
            });
        }
    }
}

#[async_trait]
impl UpstreamSession for MockSession {
    async fn connect(&self, _target: &UpstreamTarget) -> Result<(), UpstreamError> {
        let _ = self.connect_count.fetch_add(1, Ordering::Relaxed);
        let result = self.connect_results.lock().pop_front().unwrap_or(Ok(()));
        if result.is_ok() {
            self.open.store(true, Ordering::Relaxed);
        }
        result
    }

    async fn call(&self, request: &UpstreamRequest) -> Result<(), UpstreamError> {
        self.calls.lock().push(request.clone());
        if !self.is_open() {
            return Err(UpstreamError::NotConnected);
        }
        self.call_results.lock().pop_front().unwrap_or(Ok(()))
    }

    fn subscribe_closed(&self) -> broadcast::Receiver<CloseEvent> {
        self.closed_tx.subscribe()
    }
}
