//! Draft signature collection with snapshot undo/redo
//!
//! Only discrete "add" actions are undoable. Drag and resize updates mutate
//! the current placements in place and never touch the history.

use crate::error::{Result, SessionError};
use crate::gateway::SourceFile;
use crate::handles::ResourceLedger;
use crate::placement::{Placement, PlacementId, PlacementPatch, DEFAULT_PLACEMENT};

type Snapshot = Vec<Placement>;

#[derive(Debug, Default)]
pub struct SignatureCollection {
    placements: Vec<Placement>,
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
}

impl SignatureCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a placement at the default box.
    ///
    /// The pre-add state is pushed onto the undo stack. The redo stack is
    /// left as is.
    pub fn add(
        &mut self,
        image: Option<&SourceFile>,
        ledger: &ResourceLedger,
    ) -> Result<PlacementId> {
        let image = image.ok_or(SessionError::MissingImage)?;
        let placement = Placement::draft(DEFAULT_PLACEMENT, ledger.display_handle(image));
        let id = placement.id();

        self.undo_stack.push(self.placements.clone());
        self.placements.push(placement);
        tracing::debug!(%id, count = self.placements.len(), "added draft placement");
        Ok(id)
    }

    /// Merge a patch into the matching placement. Returns false if not found.
    pub fn update(&mut self, id: PlacementId, patch: &PlacementPatch) -> bool {
        match self.placements.iter_mut().find(|p| p.id() == id) {
            Some(placement) => {
                placement.apply(patch);
                true
            }
            None => false,
        }
    }

    /// Returns false if there was nothing to undo
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.undo_stack.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.placements, previous);
        self.redo_stack.push(current);
        true
    }

    /// Returns false if there was nothing to redo
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.placements, next);
        self.undo_stack.push(current);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn get(&self, id: PlacementId) -> Option<&Placement> {
        self.placements.iter().find(|p| p.id() == id)
    }

    /// The placement every stamped page is seeded from
    pub fn first(&self) -> Option<&Placement> {
        self.placements.first()
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Re-express every placement, including history, at a new scale
    pub fn rescale(&mut self, factor: f64) {
        let snapshots = self.undo_stack.iter_mut().chain(self.redo_stack.iter_mut());
        for placement in snapshots.flatten().chain(self.placements.iter_mut()) {
            placement.rescale(factor);
        }
    }
}
