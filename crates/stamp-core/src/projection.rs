//! One signature placement per page of the stamped preview
//!
//! Once the previewed document reports its page count, every page gets its
//! own placement seeded from the draft geometry. Pages the user already
//! adjusted keep their geometry across re-initialization.

use std::collections::HashSet;

use crate::coords::PdfCoordinates;
use crate::error::Result;
use crate::gateway::SourceFile;
use crate::handles::ResourceLedger;
use crate::placement::{Placement, PlacementId, PlacementPatch, ScreenBox};

#[derive(Debug, Default)]
pub struct PageProjection {
    entries: Vec<Placement>,
}

impl PageProjection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty, wrong size, a page repeated, or a page past the end
    pub fn needs_initialization(&self, total_pages: u32) -> bool {
        let distinct: HashSet<u32> = self.entries.iter().map(Placement::page).collect();
        self.entries.is_empty()
            || self.entries.len() != total_pages as usize
            || distinct.len() != self.entries.len()
            || self.entries.iter().any(|p| p.page() > total_pages)
    }

    /// Make sure pages `1..=total_pages` each have exactly one placement.
    ///
    /// Existing entries for pages still in range are kept untouched; missing
    /// pages get a new placement at `seed` with its own display handle.
    /// Dropped entries release their handles. Returns the number of
    /// placements synthesized.
    pub fn initialize(
        &mut self,
        total_pages: u32,
        seed: ScreenBox,
        image: &SourceFile,
        ledger: &ResourceLedger,
    ) -> usize {
        if !self.needs_initialization(total_pages) {
            return 0;
        }

        let mut seen = HashSet::new();
        let before = self.entries.len();
        self.entries.retain(|p| p.page() <= total_pages && seen.insert(p.page()));
        let discarded = before - self.entries.len();

        let missing: Vec<u32> = (1..=total_pages).filter(|page| !seen.contains(page)).collect();
        for &page in &missing {
            self.entries.push(Placement::new(page, seed, ledger.display_handle(image)));
        }

        tracing::info!(
            total_pages,
            kept = self.entries.len() - missing.len(),
            synthesized = missing.len(),
            discarded,
            "initialized page projection"
        );
        missing.len()
    }

    /// Put a placement on its page, replacing whatever was there
    pub fn insert(&mut self, placement: Placement) -> Option<Placement> {
        match self.entries.iter_mut().find(|p| p.page() == placement.page()) {
            Some(slot) => Some(std::mem::replace(slot, placement)),
            None => {
                self.entries.push(placement);
                None
            }
        }
    }

    /// Merge a patch into the matching placement. Returns false if not found.
    pub fn update(&mut self, id: PlacementId, patch: &PlacementPatch) -> bool {
        match self.entries.iter_mut().find(|p| p.id() == id) {
            Some(placement) => {
                placement.apply(patch);
                true
            }
            None => false,
        }
    }

    pub fn page(&self, page: u32) -> Option<&Placement> {
        self.entries.iter().find(|p| p.page() == page)
    }

    pub fn get(&self, id: PlacementId) -> Option<&Placement> {
        self.entries.iter().find(|p| p.id() == id)
    }

    pub fn placements(&self) -> &[Placement] {
        &self.entries
    }

    /// Native coordinates for every page, ascending by page number
    pub fn to_ordered_coords(&self, scale: f64) -> Result<Vec<PdfCoordinates>> {
        let mut ordered: Vec<&Placement> = self.entries.iter().collect();
        ordered.sort_by_key(|p| p.page());
        ordered.into_iter().map(|p| p.to_pdf_coords(scale)).collect()
    }

    pub fn rescale(&mut self, factor: f64) {
        for placement in &mut self.entries {
            placement.rescale(factor);
        }
    }

    /// Drop every entry, releasing their handles
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            tracing::debug!(count = self.entries.len(), "cleared page projection");
        }
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
