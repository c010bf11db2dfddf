pub mod link;
pub mod mock;
pub mod obs;

pub use link::{LinkConfig, UpstreamLink};
pub use obs::{ObsSession, ObsSessionConfig};
