//! Shared-token gate in front of every route.

use std::fmt;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use secrecy::{ExposeSecret, SecretString};

/// Header carrying the panel token.
pub const TOKEN_HEADER: &str = "x-panel-token";

/// Checks requests against an optional shared token. No token means open access.
#[derive(Clone, Default)]
pub struct TokenGate {
    token: Option<Arc<SecretString>>,
}

impl TokenGate {
    /// An empty token disables the gate.
    pub fn new(token: Option<SecretString>) -> Self {
        let token = token
            .filter(|t| !t.expose_secret().is_empty())
            .map(Arc::new);
        Self { token }
    }

    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    pub fn permits(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = &self.token else {
            return true;
        };
        headers
            .get(TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|presented| presented == expected.expose_secret())
    }
}

impl fmt::Debug for TokenGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGate")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Middleware rejecting requests without the configured token.
pub async fn require_token(
    State(gate): State<TokenGate>,
    request: Request,
    next: Next,
) -> Response {
    if gate.permits(request.headers()) {
        return next.run(request).await;
    }
    tracing::debug!(path = %request.uri().path(), "Rejected request without valid panel token");
    (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
}
