//! HTTP client for the remote stamping service
//!
//! Implements [`stamp_core::StampGateway`] over multipart uploads, plus the
//! configuration needed to find the service.

pub mod config;
pub mod error;
pub mod http;

pub use config::GatewayConfig;
pub use error::ClientError;
pub use http::HttpStampGateway;
