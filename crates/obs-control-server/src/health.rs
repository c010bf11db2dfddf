use std::sync::Arc;

use serde::Serialize;

use obs_control_core::state::HealthSnapshot;
use obs_control_link::UpstreamLink;

/// Read-only view of the upstream link for health polling.
pub struct HealthReporter {
    link: Arc<UpstreamLink>,
}

impl HealthReporter {
    pub fn new(link: Arc<UpstreamLink>) -> Self {
        Self { link }
    }

    /// Never blocks on the network and never fails.
    pub fn snapshot(&self) -> HealthSnapshot {
        self.link.snapshot()
    }
}

/// Body of `GET /api/health`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub ok: bool,
    pub obs_connected: bool,
    pub last_obs_error: String,
}

impl From<HealthSnapshot> for HealthResponse {
    fn from(snapshot: HealthSnapshot) -> Self {
        Self {
            ok: snapshot.ready,
            obs_connected: snapshot.ready,
            last_obs_error: snapshot.last_error,
        }
    }
}
