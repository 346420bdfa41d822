//! Pointer gestures on a single overlay
//!
//! A gesture lives from pointer-down to pointer-up. It remembers where the
//! pointer started and what the box looked like, and turns every later
//! pointer position into a patch for that one placement.

use crate::placement::{Placement, PlacementId, PlacementPatch, ScreenBox, MIN_PLACEMENT_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Drag,
    Resize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gesture {
    kind: GestureKind,
    target: PlacementId,
    pointer_origin: (f64, f64),
    original: ScreenBox,
}

impl Gesture {
    /// Pointer went down on the overlay body
    pub fn drag(placement: &Placement, pointer: (f64, f64)) -> Self {
        Self::start(GestureKind::Drag, placement, pointer)
    }

    /// Pointer went down on the resize handle
    pub fn resize(placement: &Placement, pointer: (f64, f64)) -> Self {
        Self::start(GestureKind::Resize, placement, pointer)
    }

    fn start(kind: GestureKind, placement: &Placement, pointer: (f64, f64)) -> Self {
        Self {
            kind,
            target: placement.id(),
            pointer_origin: pointer,
            original: placement.bounds(),
        }
    }

    pub fn kind(&self) -> GestureKind {
        self.kind
    }

    pub fn target(&self) -> PlacementId {
        self.target
    }

    /// Patch for the current pointer position
    pub fn track(&self, pointer: (f64, f64)) -> PlacementPatch {
        let dx = pointer.0 - self.pointer_origin.0;
        let dy = pointer.1 - self.pointer_origin.1;

        match self.kind {
            GestureKind::Drag => {
                PlacementPatch::position(self.original.x + dx, self.original.y + dy)
            }
            GestureKind::Resize => PlacementPatch::size(
                (self.original.width + dx).max(MIN_PLACEMENT_SIZE),
                (self.original.height + dy).max(MIN_PLACEMENT_SIZE),
            ),
        }
    }
}
