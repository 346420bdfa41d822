//! Signature stamping core
//!
//! Client-side model for placing a signature image on a PDF: overlay
//! geometry at any zoom, draft placements with undo/redo, one placement per
//! page once the draft has been stamped, and the session that drives the
//! remote stamping service.
//!
//! Rendering, image decoding and the stamping itself live elsewhere; this
//! crate only produces scale-normalized coordinates and manages the
//! resulting document handles.

pub mod collection;
pub mod coords;
pub mod error;
pub mod gateway;
pub mod gesture;
pub mod handles;
pub mod placement;
pub mod projection;
pub mod session;

pub use collection::SignatureCollection;
pub use coords::{to_pdf_coords, to_screen_box, PdfCoordinates};
pub use error::{SessionError, CONNECTIVITY_MESSAGE};
pub use gateway::{
    GatewayError, MultiStampRequest, SingleStampRequest, SourceFile, StampGateway,
    StampedDocument,
};
pub use gesture::{Gesture, GestureKind};
pub use handles::{ArtifactHandle, DisplayHandle, ResourceLedger};
pub use placement::{
    Placement, PlacementId, PlacementPatch, ScreenBox, DEFAULT_PLACEMENT, MIN_PLACEMENT_SIZE,
};
pub use projection::PageProjection;
pub use session::{EditorSession, PendingSave, PendingStamp, SessionState};
