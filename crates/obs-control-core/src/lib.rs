pub mod action;
pub mod errors;
pub mod security;
pub mod session;
pub mod state;

pub use action::{Action, ActionBody, UpstreamRequest};
pub use errors::{ActionError, UpstreamError};
pub use security::{Credential, UpstreamTarget};
pub use session::{CloseEvent, UpstreamSession};
pub use state::{ConnectionState, ConnectionStatus, HealthSnapshot};
