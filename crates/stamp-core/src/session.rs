//! Editor session: draft editing, stamped preview, final save
//!
//! ```text
//! Empty ──files──▶ Ready ──stamp──▶ Previewing ──save──▶ Finalized
//!                    ▲                   │  ▲                 │
//!                    └──── new PDF ──────┘  └──── edit/save ──┘
//! ```
//!
//! Gateway calls are the only suspension points. Each call is split into a
//! `begin_*` step that validates and takes the busy flag, and a `complete_*`
//! step that applies the outcome. The pending request owns the busy guard,
//! so the flag is cleared on every exit path, including a dropped future.
//! A failed call leaves the session in its pre-attempt state.
//!
//! Every pending request carries a ticket naming the session and the loaded
//! document it was built from. A completion whose ticket no longer matches
//! (another session, or the PDF was replaced meanwhile) is discarded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use uuid::Uuid;

use crate::collection::SignatureCollection;
use crate::coords::{to_pdf_coords, validate_scale};
use crate::error::{Result, SessionError};
use crate::gateway::{
    GatewayError, MultiStampRequest, SingleStampRequest, SourceFile, StampGateway,
    StampedDocument,
};
use crate::handles::{ArtifactHandle, ResourceLedger};
use crate::placement::{PlacementId, PlacementPatch};
use crate::projection::PageProjection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// PDF or image still missing
    Empty,
    /// Both files present, drafting on page 1
    Ready,
    /// Draft stamped, per-page placements editable
    Previewing,
    /// Final document produced
    Finalized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Draft,
    Previewing,
    Finalized,
}

#[derive(Debug, Clone, Default)]
struct BusyFlag(Arc<AtomicBool>);

impl BusyFlag {
    fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn try_acquire(&self) -> Option<BusyGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(Arc::clone(&self.0)))
    }
}

#[derive(Debug)]
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Which session and which loaded document a request was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ticket {
    session: Uuid,
    document: u64,
}

/// Draft stamp waiting on the gateway
#[derive(Debug)]
pub struct PendingStamp {
    request: SingleStampRequest,
    ticket: Ticket,
    _busy: BusyGuard,
}

impl PendingStamp {
    pub fn request(&self) -> &SingleStampRequest {
        &self.request
    }
}

/// Final multi-page save waiting on the gateway
#[derive(Debug)]
pub struct PendingSave {
    request: MultiStampRequest,
    ticket: Ticket,
    _busy: BusyGuard,
}

impl PendingSave {
    pub fn request(&self) -> &MultiStampRequest {
        &self.request
    }
}

#[derive(Debug)]
pub struct EditorSession {
    id: Uuid,
    ledger: ResourceLedger,
    pdf: Option<SourceFile>,
    /// Bumped on every `load_pdf`
    document: u64,
    image: Option<SourceFile>,
    draft: SignatureCollection,
    projection: PageProjection,
    scale: f64,
    phase: Phase,
    connected: bool,
    busy: BusyFlag,
    last_error: Option<SessionError>,
    preview: Option<ArtifactHandle>,
    finalized: Option<ArtifactHandle>,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorSession {
    pub fn new() -> Self {
        Self::with_ledger(ResourceLedger::new())
    }

    /// Use a caller-provided ledger, e.g. to observe handle lifetimes
    pub fn with_ledger(ledger: ResourceLedger) -> Self {
        Self {
            id: Uuid::new_v4(),
            ledger,
            pdf: None,
            document: 0,
            image: None,
            draft: SignatureCollection::new(),
            projection: PageProjection::new(),
            scale: 1.0,
            phase: Phase::Draft,
            connected: true,
            busy: BusyFlag::default(),
            last_error: None,
            preview: None,
            finalized: None,
        }
    }

    // ============ Inputs ============

    /// Replace the document. Anything stamped from the old one is discarded.
    pub fn load_pdf(&mut self, pdf: SourceFile) {
        tracing::info!(name = pdf.name(), bytes = pdf.len(), "loaded PDF");
        self.pdf = Some(pdf);
        self.document += 1;
        if self.phase != Phase::Draft || self.preview.is_some() || self.finalized.is_some() {
            self.discard_artifacts();
            self.projection.clear();
            self.phase = Phase::Draft;
        }
    }

    /// Replace the signature image used for future placements
    pub fn load_image(&mut self, image: SourceFile) {
        tracing::info!(name = image.name(), bytes = image.len(), "loaded signature image");
        self.image = Some(image);
    }

    pub fn pdf(&self) -> Option<&SourceFile> {
        self.pdf.as_ref()
    }

    pub fn image(&self) -> Option<&SourceFile> {
        self.image.as_ref()
    }

    /// Result of the external health probe
    pub fn record_health(&mut self, reachable: bool) {
        if reachable != self.connected {
            if reachable {
                tracing::info!("stamping service reachable");
            } else {
                tracing::warn!("stamping service unreachable");
            }
        }
        self.connected = reachable;
    }

    /// Probe the gateway once and record the result
    pub async fn refresh_health<G>(&mut self, gateway: &G) -> bool
    where
        G: StampGateway + ?Sized,
    {
        let reachable = gateway.health().await;
        self.record_health(reachable);
        reachable
    }

    /// Change the display scale. Live placements are re-expressed at the
    /// new scale so their PDF coordinates do not move.
    pub fn set_scale(&mut self, scale: f64) -> Result<()> {
        let scale = validate_scale(scale)?;
        let factor = scale / self.scale;
        if factor != 1.0 {
            self.draft.rescale(factor);
            self.projection.rescale(factor);
        }
        self.scale = scale;
        Ok(())
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    // ============ Draft editing ============

    pub fn add_signature(&mut self) -> Result<PlacementId> {
        self.draft
            .add(self.image.as_ref(), &self.ledger)
            .inspect_err(|err| self.last_error = Some(err.clone()))
    }

    pub fn update_signature(&mut self, id: PlacementId, patch: &PlacementPatch) -> bool {
        self.draft.update(id, patch)
    }

    pub fn undo(&mut self) -> bool {
        self.draft.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.draft.redo()
    }

    pub fn draft(&self) -> &SignatureCollection {
        &self.draft
    }

    // ============ Stamped preview ============

    /// Render-surface callback: the previewed document has `total_pages`.
    /// Returns how many page placements were created.
    pub fn on_preview_pages_loaded(&mut self, total_pages: u32) -> usize {
        if self.phase == Phase::Draft {
            tracing::warn!(total_pages, "page count reported without a stamped preview");
            return 0;
        }
        let (Some(seed), Some(image)) = (self.draft.first(), self.image.as_ref()) else {
            tracing::warn!(total_pages, "no draft placement to seed pages from");
            return 0;
        };
        self.projection
            .initialize(total_pages, seed.bounds(), image, &self.ledger)
    }

    pub fn update_page_signature(&mut self, id: PlacementId, patch: &PlacementPatch) -> bool {
        self.projection.update(id, patch)
    }

    pub fn projection(&self) -> &PageProjection {
        &self.projection
    }

    // ============ Gateway operations ============

    /// Validate a draft stamp and take the busy flag
    pub fn begin_stamp(&mut self) -> Result<PendingStamp> {
        if self.busy.is_set() {
            return Err(SessionError::Busy);
        }
        self.last_error = None;

        let request = self.draft_request().inspect_err(|err| {
            self.last_error = Some(err.clone());
        })?;
        let busy = self.busy.try_acquire().ok_or(SessionError::Busy)?;

        tracing::info!(coords = ?request.coords, "stamping draft");
        Ok(PendingStamp {
            request,
            ticket: self.ticket(),
            _busy: busy,
        })
    }

    fn draft_request(&self) -> Result<SingleStampRequest> {
        if !self.connected {
            return Err(SessionError::Connectivity(
                "health probe reported the service as unreachable".to_string(),
            ));
        }
        let pdf = self.pdf.clone().ok_or(SessionError::MissingPdf)?;
        let image = self.image.clone().ok_or(SessionError::MissingImage)?;
        let first = self.draft.first().ok_or(SessionError::MissingPlacement)?;
        let coords = to_pdf_coords(&first.bounds(), self.scale)?;
        Ok(SingleStampRequest { pdf, image, coords })
    }

    /// Apply the gateway's answer to a draft stamp
    pub fn complete_stamp(
        &mut self,
        pending: PendingStamp,
        outcome: std::result::Result<StampedDocument, GatewayError>,
    ) -> Result<()> {
        self.check_ticket(pending.ticket)?;
        let document = outcome.map_err(|err| self.record_failure(err))?;

        self.finalized = None;
        self.preview = Some(self.ledger.artifact_handle(document));
        self.projection.clear();
        self.phase = Phase::Previewing;
        tracing::info!("draft stamped, previewing");

        drop(pending);
        Ok(())
    }

    /// Stamp the first draft placement onto every page
    pub async fn stamp_pdf<G>(&mut self, gateway: &G) -> Result<()>
    where
        G: StampGateway + ?Sized,
    {
        let pending = self.begin_stamp()?;
        let outcome = gateway.stamp_single(pending.request()).await;
        self.complete_stamp(pending, outcome)
    }

    /// Validate a final save and take the busy flag
    pub fn begin_save(&mut self) -> Result<PendingSave> {
        if self.busy.is_set() {
            return Err(SessionError::Busy);
        }
        self.last_error = None;

        let request = self.save_request().inspect_err(|err| {
            self.last_error = Some(err.clone());
        })?;
        let busy = self.busy.try_acquire().ok_or(SessionError::Busy)?;

        tracing::info!(pages = request.coords.len(), "saving final PDF");
        Ok(PendingSave {
            request,
            ticket: self.ticket(),
            _busy: busy,
        })
    }

    fn save_request(&self) -> Result<MultiStampRequest> {
        if self.projection.is_empty() {
            return Err(SessionError::EmptyProjection);
        }
        let pdf = self.pdf.clone().ok_or(SessionError::MissingPdf)?;
        let image = self.image.clone().ok_or(SessionError::MissingImage)?;
        let coords = self.projection.to_ordered_coords(self.scale)?;
        Ok(MultiStampRequest { pdf, image, coords })
    }

    /// Apply the gateway's answer to a final save
    pub fn complete_save(
        &mut self,
        pending: PendingSave,
        outcome: std::result::Result<StampedDocument, GatewayError>,
    ) -> Result<()> {
        self.check_ticket(pending.ticket)?;
        let document = outcome.map_err(|err| self.record_failure(err))?;

        self.finalized = Some(self.ledger.artifact_handle(document));
        self.preview = None;
        self.phase = Phase::Finalized;
        tracing::info!(pages = pending.request.coords.len(), "final PDF saved");

        drop(pending);
        Ok(())
    }

    /// Stamp every page at its own placement
    pub async fn save_final_pdf<G>(&mut self, gateway: &G) -> Result<()>
    where
        G: StampGateway + ?Sized,
    {
        let pending = self.begin_save()?;
        let outcome = gateway.stamp_multi(pending.request()).await;
        self.complete_save(pending, outcome)
    }

    fn ticket(&self) -> Ticket {
        Ticket {
            session: self.id,
            document: self.document,
        }
    }

    /// Outcomes for another session or a replaced document leave state untouched
    fn check_ticket(&self, ticket: Ticket) -> Result<()> {
        if ticket == self.ticket() {
            return Ok(());
        }
        tracing::warn!(
            issued_for = ticket.document,
            current = self.document,
            foreign = ticket.session != self.id,
            "discarding stale gateway outcome"
        );
        Err(SessionError::StaleRequest)
    }

    fn record_failure(&mut self, err: GatewayError) -> SessionError {
        tracing::warn!(error = %err, "gateway call failed");
        if matches!(err, GatewayError::Connectivity(_)) {
            self.connected = false;
        }
        let err = SessionError::from(err);
        self.last_error = Some(err.clone());
        err
    }

    // ============ Status ============

    pub fn state(&self) -> SessionState {
        match self.phase {
            Phase::Finalized => SessionState::Finalized,
            Phase::Previewing => SessionState::Previewing,
            Phase::Draft if self.pdf.is_some() && self.image.is_some() => SessionState::Ready,
            Phase::Draft => SessionState::Empty,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_set()
    }

    pub fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn preview_artifact(&self) -> Option<&ArtifactHandle> {
        self.preview.as_ref()
    }

    pub fn final_artifact(&self) -> Option<&ArtifactHandle> {
        self.finalized.as_ref()
    }

    /// Hand the final document to the caller, leaving the session without one
    pub fn take_final_artifact(&mut self) -> Option<ArtifactHandle> {
        self.finalized.take()
    }

    /// Release both artifacts (teardown or document replacement)
    pub fn discard_artifacts(&mut self) {
        self.preview = None;
        self.finalized = None;
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }
}
