pub mod core;
pub mod error;
pub mod handler;
pub mod tee;
pub mod upstream_client;

pub use crate::core::{Gateway, GatewayState};
pub use upstream_client::{UpstreamClient, UpstreamClientConfig, WreqUpstreamClient};
