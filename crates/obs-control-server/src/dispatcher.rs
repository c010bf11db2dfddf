//! Turns control-panel action requests into upstream calls.

use std::sync::Arc;

use tracing::{debug, info, warn};

use obs_control_core::action::{Action, ActionBody};
use obs_control_core::errors::ActionError;
use obs_control_link::UpstreamLink;

/// Validates actions and forwards them over the shared upstream link.
pub struct ActionDispatcher {
    link: Arc<UpstreamLink>,
}

impl ActionDispatcher {
    pub fn new(link: Arc<UpstreamLink>) -> Self {
        Self { link }
    }

    /// Execute one action, returning the confirmation message.
    ///
    /// Checks connectivity first, then the action and its fields, and only
    /// then issues exactly one upstream call. Failures never touch the
    /// link's connection state.
    pub async fn dispatch(&self, body: &ActionBody) -> Result<String, ActionError> {
        let result = self.execute(body).await;
        let name = body.action_name().unwrap_or("");
        match &result {
            Ok(message) => info!(action = name, %message, "Action executed"),
            Err(e) => warn!(action = name, error = %e, kind = e.error_kind(), "Action failed"),
        }
        result
    }

    async fn execute(&self, body: &ActionBody) -> Result<String, ActionError> {
        if !self.link.is_ready() {
            return Err(ActionError::NotConnected);
        }

        let action = Action::parse(body)?;
        let request = action.upstream_request();
        debug!(
            action = action.name(),
            request_type = request.request_type(),
            "Forwarding action upstream"
        );

        self.link.call(&request).await?;
        Ok(action.success_message())
    }
}
