//! Coordinate transformation between screen space and PDF space
//!
//! Overlays are positioned in rendered pixels (top-left origin) at whatever
//! zoom the page is currently drawn with. The stamping service works in the
//! page's native units, so every box is divided by the display scale before
//! it leaves the client. No rounding happens here; the service owns precision.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};
use crate::placement::ScreenBox;

/// Scale-independent box sent to the stamping service
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PdfCoordinates {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl PdfCoordinates {
    /// Tag these coordinates with a 1-based page number
    pub fn on_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}

/// Reject zero, negative and non-finite scales
pub fn validate_scale(scale: f64) -> Result<f64> {
    if scale.is_finite() && scale > 0.0 {
        Ok(scale)
    } else {
        Err(SessionError::InvalidScale(scale))
    }
}

/// Convert a screen box drawn at `scale` into native PDF units
pub fn to_pdf_coords(bounds: &ScreenBox, scale: f64) -> Result<PdfCoordinates> {
    let scale = validate_scale(scale)?;
    Ok(PdfCoordinates {
        x: bounds.x / scale,
        y: bounds.y / scale,
        width: bounds.width / scale,
        height: bounds.height / scale,
        page: None,
    })
}

/// Convert native PDF units back into a screen box drawn at `scale`
pub fn to_screen_box(coords: &PdfCoordinates, scale: f64) -> Result<ScreenBox> {
    let scale = validate_scale(scale)?;
    Ok(ScreenBox {
        x: coords.x * scale,
        y: coords.y * scale,
        width: coords.width * scale,
        height: coords.height * scale,
    })
}
