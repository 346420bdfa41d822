//! Contract with the remote stamping service
//!
//! The service burns the signature image into the PDF. The client only
//! hands it the two source files plus normalized coordinates and gets an
//! opaque document back.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::coords::PdfCoordinates;
use crate::error::SessionError;

/// An uploaded file. Cloning shares the bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct SourceFile {
    name: String,
    content_type: String,
    bytes: Arc<[u8]>,
}

impl SourceFile {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn pdf(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::new(name, "application/pdf", bytes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Bytes are elided so logs stay readable
impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFile")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Stamp one box onto the document
#[derive(Debug, Clone)]
pub struct SingleStampRequest {
    pub pdf: SourceFile,
    pub image: SourceFile,
    pub coords: PdfCoordinates,
}

/// Stamp one box per page; `coords` is page-ascending
#[derive(Debug, Clone)]
pub struct MultiStampRequest {
    pub pdf: SourceFile,
    pub image: SourceFile,
    pub coords: Vec<PdfCoordinates>,
}

/// Raw document returned by the service
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StampedDocument {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl StampedDocument {
    pub fn pdf(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            content_type: "application/pdf".to_string(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The host could not be reached at all
    #[error("Stamping service unreachable: {0}")]
    Connectivity(String),

    /// The host answered with a non-success status
    #[error("Stamping service rejected the request ({status}): {message}")]
    Stamp { status: u16, message: String },

    /// Connected, but the exchange did not complete (timeout, broken body)
    #[error("Stamping request did not complete: {0}")]
    Transport(String),
}

impl From<GatewayError> for SessionError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Connectivity(detail) => SessionError::Connectivity(detail),
            GatewayError::Stamp { status, message } => SessionError::Stamp { status, message },
            GatewayError::Transport(detail) => SessionError::Transport(detail),
        }
    }
}

#[async_trait]
pub trait StampGateway: Send + Sync {
    /// Reachability probe. Failures mean "unreachable", never an error.
    async fn health(&self) -> bool;

    async fn stamp_single(
        &self,
        request: &SingleStampRequest,
    ) -> Result<StampedDocument, GatewayError>;

    async fn stamp_multi(
        &self,
        request: &MultiStampRequest,
    ) -> Result<StampedDocument, GatewayError>;
}
