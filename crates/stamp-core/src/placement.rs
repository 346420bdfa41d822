//! Signature placements and their on-screen geometry

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::coords::{to_pdf_coords, PdfCoordinates};
use crate::error::Result;
use crate::handles::DisplayHandle;

/// Smallest width or height an overlay may have, in screen pixels
pub const MIN_PLACEMENT_SIZE: f64 = 20.0;

/// Where a freshly added draft signature appears
pub const DEFAULT_PLACEMENT: ScreenBox = ScreenBox {
    x: 50.0,
    y: 50.0,
    width: 120.0,
    height: 60.0,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlacementId(Uuid);

impl PlacementId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlacementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlacementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Box in rendered pixels, top-left origin
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ScreenBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    fn clamped(mut self) -> Self {
        self.width = self.width.max(MIN_PLACEMENT_SIZE);
        self.height = self.height.max(MIN_PLACEMENT_SIZE);
        self
    }

    fn scaled(self, factor: f64) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
            width: self.width * factor,
            height: self.height * factor,
        }
    }
}

/// Partial update from a drag or resize; unset fields are left alone
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacementPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl PlacementPatch {
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    pub fn size(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    pub fn bounds(bounds: ScreenBox) -> Self {
        Self {
            x: Some(bounds.x),
            y: Some(bounds.y),
            width: Some(bounds.width),
            height: Some(bounds.height),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.width.is_none() && self.height.is_none()
    }
}

/// One signature overlay.
///
/// `bounds` is only meaningful together with the display scale that was
/// active when it was last written.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    id: PlacementId,
    page: u32,
    bounds: ScreenBox,
    image: DisplayHandle,
}

impl Placement {
    /// Create a placement; page 0 is promoted to 1
    pub fn new(page: u32, bounds: ScreenBox, image: DisplayHandle) -> Self {
        Self {
            id: PlacementId::new(),
            page: page.max(1),
            bounds: bounds.clamped(),
            image,
        }
    }

    /// Draft placements always live on page 1
    pub fn draft(bounds: ScreenBox, image: DisplayHandle) -> Self {
        Self::new(1, bounds, image)
    }

    pub fn id(&self) -> PlacementId {
        self.id
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn bounds(&self) -> ScreenBox {
        self.bounds
    }

    pub fn image(&self) -> &DisplayHandle {
        &self.image
    }

    /// Merge a patch, keeping the size floor
    pub fn apply(&mut self, patch: &PlacementPatch) {
        let mut next = self.bounds;
        if let Some(x) = patch.x {
            next.x = x;
        }
        if let Some(y) = patch.y {
            next.y = y;
        }
        if let Some(width) = patch.width {
            next.width = width;
        }
        if let Some(height) = patch.height {
            next.height = height;
        }
        self.bounds = next.clamped();
    }

    /// Re-express the box at a new display scale (`factor = new / old`)
    pub fn rescale(&mut self, factor: f64) {
        self.bounds = self.bounds.scaled(factor).clamped();
    }

    /// Native coordinates, tagged with this placement's page
    pub fn to_pdf_coords(&self, scale: f64) -> Result<PdfCoordinates> {
        Ok(to_pdf_coords(&self.bounds, scale)?.on_page(self.page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::SourceFile;
    use crate::handles::ResourceLedger;
    use pretty_assertions::assert_eq;

    fn handle() -> DisplayHandle {
        ResourceLedger::new().display_handle(&SourceFile::new("sig.png", "image/png", vec![1u8]))
    }

    #[test]
    fn test_apply_merges_only_given_fields() {
        let mut placement = Placement::draft(DEFAULT_PLACEMENT, handle());
        placement.apply(&PlacementPatch::position(80.0, 90.0));
        assert_eq!(placement.bounds(), ScreenBox::new(80.0, 90.0, 120.0, 60.0));

        placement.apply(&PlacementPatch {
            height: Some(75.0),
            ..Default::default()
        });
        assert_eq!(placement.bounds(), ScreenBox::new(80.0, 90.0, 120.0, 75.0));
    }

    #[test]
    fn test_size_floor_clamps_to_exactly_twenty() {
        let mut placement = Placement::draft(DEFAULT_PLACEMENT, handle());
        placement.apply(&PlacementPatch::size(5.0, -40.0));
        assert_eq!(placement.bounds().width, MIN_PLACEMENT_SIZE);
        assert_eq!(placement.bounds().height, MIN_PLACEMENT_SIZE);
    }

    #[test]
    fn test_construction_enforces_floor_and_page() {
        let placement = Placement::new(0, ScreenBox::new(0.0, 0.0, 1.0, 1.0), handle());
        assert_eq!(placement.page(), 1);
        assert_eq!(placement.bounds().width, MIN_PLACEMENT_SIZE);
    }

    #[test]
    fn test_rescale_keeps_pdf_box() {
        let mut placement = Placement::new(2, DEFAULT_PLACEMENT, handle());
        let before = placement.to_pdf_coords(1.0).unwrap();

        placement.rescale(1.5);
        let after = placement.to_pdf_coords(1.5).unwrap();

        assert!((before.x - after.x).abs() < 1e-9);
        assert!((before.width - after.width).abs() < 1e-9);
        assert_eq!(after.page, Some(2));
    }

    #[test]
    fn test_rescale_below_one_keeps_floor_and_grows_pdf_box() {
        let mut placement = Placement::draft(ScreenBox::new(40.0, 40.0, 20.0, 20.0), handle());
        assert_eq!(placement.to_pdf_coords(1.0).unwrap().width, 20.0);

        placement.rescale(0.5);
        assert_eq!(placement.bounds(), ScreenBox::new(20.0, 20.0, 20.0, 20.0));

        // Position follows the zoom; the floored size does not
        let coords = placement.to_pdf_coords(0.5).unwrap();
        assert_eq!((coords.x, coords.y), (40.0, 40.0));
        assert_eq!((coords.width, coords.height), (40.0, 40.0));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Placement::draft(DEFAULT_PLACEMENT, handle());
        let b = Placement::draft(DEFAULT_PLACEMENT, handle());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_patch_json_omits_unset_fields() {
        let json = serde_json::to_string(&PlacementPatch::position(1.0, 2.0)).unwrap();
        assert_eq!(json, r#"{"x":1.0,"y":2.0}"#);
        assert!(PlacementPatch::default().is_empty());
    }
}
