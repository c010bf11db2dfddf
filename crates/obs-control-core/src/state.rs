use serde::Serialize;

/// Whether the upstream session is usable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connected,
}

/// Upstream connection status plus the diagnostic from the last failed attempt.
///
/// Status and diagnostic always change together so readers never observe a
/// connected link with a stale error, or the reverse.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectionState {
    status: ConnectionStatus,
    last_error: Option<String>,
}

impl ConnectionState {
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    /// Diagnostic of the last failed attempt, empty when none or connected.
    pub fn last_error(&self) -> &str {
        match self.status {
            ConnectionStatus::Connected => "",
            ConnectionStatus::Disconnected => self.last_error.as_deref().unwrap_or(""),
        }
    }

    /// A connect attempt succeeded.
    pub fn mark_connected(&mut self) {
        self.status = ConnectionStatus::Connected;
        self.last_error = None;
    }

    /// A connect attempt failed.
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = ConnectionStatus::Disconnected;
        self.last_error = Some(error.into());
    }

    /// The session reported it was closed. The previous diagnostic is kept.
    pub fn mark_closed(&mut self) {
        self.status = ConnectionStatus::Disconnected;
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            ready: self.is_connected(),
            last_error: self.last_error().to_string(),
        }
    }
}

/// Point-in-time view of the upstream link for health polling.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub ready: bool,
    pub last_error: String,
}
