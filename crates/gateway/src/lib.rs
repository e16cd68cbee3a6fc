//! Remote data gateway.
//!
//! Fetches importable rows from configured dropdown sources and talks to
//! the template API. Every call has a `try_*` form that returns
//! [`GatewayError`] and, for the read paths, a soft form that logs the
//! failure and returns an empty value.

pub mod client;
pub mod envelope;
pub mod templates;
pub mod transport;

pub use client::{RemoteGateway, SourceSummary, TemplateFilter};
pub use envelope::{envelope_items, unwrap_envelope};
pub use templates::{map_template, template_body};
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};

/// Error type for gateway operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    /// The requested feature has no endpoint configured.
    #[error("not configured: {0}")]
    NotConfigured(String),
    #[error("unknown dropdown source '{0}'")]
    UnknownSource(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP {0}: {1}")]
    Http(u16, String),
    #[error("parse error: {0}")]
    Parse(String),
    /// The body parsed but had no recognized shape.
    #[error("unexpected response shape from {0}")]
    UnexpectedShape(String),
}

impl GatewayError {
    /// 404 from the server.
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::Http(404, _))
    }
}
