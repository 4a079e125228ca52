//! Resolution catalog grouped by aspect ratio.
//!
//! Hardware capability reports arrive as flat lists of supported sizes; the
//! catalog buckets them by reduced aspect ratio and answers the two queries
//! session building needs: "best preview size for this surface" and
//! "smallest size of this ratio that still meets a floor resolution".

use std::collections::BTreeSet;

use crate::errors::CaptureError;
use crate::types::{AspectRatio, Size};

/// Outcome of a constrained size lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeSelection {
    /// A size meeting the requested floor.
    Exact(Size),
    /// Nothing met the floor; the bucket's largest size is a degraded
    /// fallback, not a hard failure.
    Degraded(Size),
}

impl SizeSelection {
    pub fn size(&self) -> Size {
        match self {
            SizeSelection::Exact(size) | SizeSelection::Degraded(size) => *size,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, SizeSelection::Degraded(_))
    }
}

/// Groups sizes by the aspect ratio they reduce to. Buckets keep insertion
/// order; sizes within a bucket are kept unique and ascending by area.
#[derive(Debug, Clone, Default)]
pub struct SizeCatalog {
    buckets: Vec<(AspectRatio, BTreeSet<Size>)>,
}

impl SizeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `size` to the bucket whose ratio matches it, creating the bucket
    /// if needed. Returns `false` without mutation when already present.
    pub fn add(&mut self, size: Size) -> bool {
        for (ratio, sizes) in &mut self.buckets {
            if ratio.matches(size) {
                return sizes.insert(size);
            }
        }
        let mut sizes = BTreeSet::new();
        sizes.insert(size);
        self.buckets
            .push((AspectRatio::of(size.width, size.height), sizes));
        true
    }

    /// Removes a ratio and all its sizes. No-op when absent.
    pub fn remove(&mut self, ratio: &AspectRatio) {
        self.buckets.retain(|(r, _)| r != ratio);
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Known ratios in insertion order.
    pub fn ratios(&self) -> Vec<AspectRatio> {
        self.buckets.iter().map(|(ratio, _)| *ratio).collect()
    }

    pub fn contains_ratio(&self, ratio: &AspectRatio) -> bool {
        self.buckets.iter().any(|(r, _)| r == ratio)
    }

    /// Sizes for `ratio`, ascending by area. Empty when the ratio is unknown.
    pub fn sizes_for(&self, ratio: &AspectRatio) -> BTreeSet<Size> {
        self.buckets
            .iter()
            .find(|(r, _)| r == ratio)
            .map(|(_, sizes)| sizes.clone())
            .unwrap_or_default()
    }

    /// Ratios sorted by |value - target| ascending. The sort is stable, so
    /// ties keep the buckets' insertion order.
    pub fn ratios_by_closeness_to(&self, target: AspectRatio) -> Vec<AspectRatio> {
        let target_value = target.value();
        let mut ratios = self.ratios();
        ratios.sort_by(|a, b| {
            let da = (a.value() - target_value).abs();
            let db = (b.value() - target_value).abs();
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        });
        ratios
    }

    /// Maximum-area size across all buckets.
    pub fn largest(&self) -> Result<Size, CaptureError> {
        self.buckets
            .iter()
            .flat_map(|(_, sizes)| sizes.iter())
            .copied()
            .max()
            .ok_or(CaptureError::EmptyCatalog)
    }

    /// Picks the optimal streaming size for a surface: walk ratios from the
    /// closest to the surface's own ratio and return the smallest size whose
    /// both dimensions cover the surface. Matching the ratio beats raw size
    /// (avoids letterboxing); only when no ratio can satisfy the surface does
    /// the globally largest size serve as a degraded fallback.
    pub fn optimal_size(&self, surface: Size) -> Result<Size, CaptureError> {
        let target = AspectRatio::of(surface.width.max(1), surface.height.max(1));
        for ratio in self.ratios_by_closeness_to(target) {
            if let Some((_, sizes)) = self.buckets.iter().find(|(r, _)| *r == ratio) {
                if let Some(size) = sizes.iter().find(|s| s.covers(surface)) {
                    return Ok(*size);
                }
            }
        }
        self.largest()
    }

    /// Within one ratio's bucket, the minimum-area size whose dimensions meet
    /// the floor; the bucket's largest size otherwise, flagged degraded.
    pub fn smallest_at_least(
        &self,
        ratio: &AspectRatio,
        floor: Size,
    ) -> Result<SizeSelection, CaptureError> {
        let (_, sizes) = self
            .buckets
            .iter()
            .find(|(r, _)| r == ratio)
            .ok_or_else(|| CaptureError::UnknownRatio(ratio.to_string()))?;
        if let Some(size) = sizes.iter().find(|s| s.covers(floor)) {
            return Ok(SizeSelection::Exact(*size));
        }
        sizes
            .iter()
            .next_back()
            .copied()
            .map(SizeSelection::Degraded)
            .ok_or(CaptureError::EmptyCatalog)
    }
}
