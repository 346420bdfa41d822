//! Object-URL style handles for signature images and stamped documents
//!
//! Both kinds wrap transient binary resources. A handle is released exactly
//! once: display handles when their last holder drops them, artifact handles
//! when their single owner drops or releases them.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::gateway::{SourceFile, StampedDocument};

#[derive(Debug, Default)]
struct LedgerState {
    next_id: AtomicU64,
    live_display: AtomicUsize,
    live_artifacts: AtomicUsize,
    released: AtomicUsize,
}

/// Mints handles and keeps count of the ones still alive
#[derive(Debug, Clone, Default)]
pub struct ResourceLedger {
    state: Arc<LedgerState>,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn mint(&self, kind: &str) -> String {
        let id = self.state.next_id.fetch_add(1, Ordering::Relaxed);
        format!("blob:{}/{}", kind, id)
    }

    /// Allocate a display handle for an uploaded image
    pub fn display_handle(&self, image: &SourceFile) -> DisplayHandle {
        let url = self.mint("display");
        self.state.live_display.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(%url, image = image.name(), "acquired display handle");
        DisplayHandle(Arc::new(DisplayLease {
            url,
            image: image.clone(),
            ledger: Arc::clone(&self.state),
        }))
    }

    /// Wrap a document returned by the stamping service
    pub fn artifact_handle(&self, document: StampedDocument) -> ArtifactHandle {
        let url = self.mint("artifact");
        self.state.live_artifacts.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(%url, bytes = document.bytes.len(), "acquired artifact handle");
        ArtifactHandle {
            url,
            document,
            ledger: Arc::clone(&self.state),
        }
    }

    pub fn live_display_handles(&self) -> usize {
        self.state.live_display.load(Ordering::Relaxed)
    }

    pub fn live_artifacts(&self) -> usize {
        self.state.live_artifacts.load(Ordering::Relaxed)
    }

    /// Handles of either kind released so far
    pub fn total_released(&self) -> usize {
        self.state.released.load(Ordering::Relaxed)
    }
}

struct DisplayLease {
    url: String,
    image: SourceFile,
    ledger: Arc<LedgerState>,
}

impl Drop for DisplayLease {
    fn drop(&mut self) {
        self.ledger.live_display.fetch_sub(1, Ordering::Relaxed);
        self.ledger.released.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(url = %self.url, "released display handle");
    }
}

/// Shared handle to the signature image shown inside an overlay.
///
/// Clones (e.g. inside undo snapshots) refer to the same lease; the
/// underlying handle is released when the last clone goes away.
#[derive(Clone)]
pub struct DisplayHandle(Arc<DisplayLease>);

impl DisplayHandle {
    pub fn url(&self) -> &str {
        &self.0.url
    }

    pub fn image(&self) -> &SourceFile {
        &self.0.image
    }
}

impl PartialEq for DisplayHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for DisplayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DisplayHandle").field(&self.0.url).finish()
    }
}

/// Uniquely owned handle to a stamped document
pub struct ArtifactHandle {
    url: String,
    document: StampedDocument,
    ledger: Arc<LedgerState>,
}

impl ArtifactHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn bytes(&self) -> &[u8] {
        &self.document.bytes
    }

    pub fn content_type(&self) -> &str {
        &self.document.content_type
    }

    /// Release now instead of at end of scope
    pub fn release(self) {}

    /// Take the document out; the handle itself is still released
    pub fn into_document(mut self) -> StampedDocument {
        std::mem::take(&mut self.document)
    }
}

impl Drop for ArtifactHandle {
    fn drop(&mut self) {
        self.ledger.live_artifacts.fetch_sub(1, Ordering::Relaxed);
        self.ledger.released.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(url = %self.url, "released artifact handle");
    }
}

impl fmt::Debug for ArtifactHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactHandle")
            .field("url", &self.url)
            .field("len", &self.document.bytes.len())
            .finish()
    }
}
