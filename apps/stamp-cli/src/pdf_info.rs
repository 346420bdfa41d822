//! Page count of a stamped document
//!
//! Stands in for the render surface that would normally report how many
//! pages the preview has.

use anyhow::{bail, Context, Result};
use lopdf::Document;

pub fn page_count(bytes: &[u8]) -> Result<u32> {
    let doc = Document::load_mem(bytes).context("Stamped document is not a readable PDF")?;
    let count = doc.get_pages().len() as u32;
    if count == 0 {
        bail!("Stamped document has no pages");
    }
    Ok(count)
}
