//! Provider-facing abstractions for chatgate.
//!
//! Nothing here performs IO. The routing table picks a backend, `provider`
//! turns a chat request into an `UpstreamHttpRequest`, and a higher layer
//! sends it and hands the bytes back for decoding.

pub mod audit;
pub mod errors;
pub mod headers;
pub mod provider;
pub mod routing;
pub mod upstream;

pub use audit::{AuditRecord, AuditSink, NoopAuditSink, SharedAuditSink};
pub use errors::GatewayError;
pub use headers::{Headers, header_get, header_set};
pub use provider::{build_upstream_request, decode_provider_response};
pub use routing::{BackendTarget, RoutingTable};
pub use upstream::{
    ByteStream, HttpMethod, UpstreamBody, UpstreamFailure, UpstreamHttpRequest,
    UpstreamHttpResponse, UpstreamTransportErrorKind,
};
