use std::fmt;
use std::time::Duration;

/// Failures of a single action request.
/// All of these are answered at the request boundary; none affect the upstream link.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("OBS not connected")]
    NotConnected,
    #[error("{0} missing")]
    MissingField(&'static str),
    #[error("Unknown action")]
    UnknownAction,
    /// Carries the upstream's message verbatim.
    #[error("{0}")]
    UpstreamCallFailed(String),
}

impl ActionError {
    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::NotConnected => "not_connected",
            Self::MissingField(_) => "missing_field",
            Self::UnknownAction => "unknown_action",
            Self::UpstreamCallFailed(_) => "upstream_call_failed",
        }
    }
}

impl From<UpstreamError> for ActionError {
    fn from(err: UpstreamError) -> Self {
        Self::UpstreamCallFailed(err.to_string())
    }
}

/// Failures reported by an upstream session.
#[derive(Clone, Debug, thiserror::Error)]
pub enum UpstreamError {
    // Connection establishment
    #[error("{0}")]
    Connect(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    // Established session
    #[error("not connected")]
    NotConnected,
    /// The upstream refused the request; carries its comment.
    #[error("{0}")]
    Rejected(String),
    #[error("{0}")]
    Transport(String),
}

impl UpstreamError {
    /// Build a rejection, falling back to the status code when the upstream gave no comment.
    pub fn rejected(code: impl fmt::Debug, comment: Option<String>) -> Self {
        let comment = comment
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| format!("request failed with code {code:?}"));
        Self::Rejected(comment)
    }

    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Connect(_) => "connect",
            Self::Timeout(_) => "timeout",
            Self::NotConnected => "not_connected",
            Self::Rejected(_) => "rejected",
            Self::Transport(_) => "transport",
        }
    }
}
