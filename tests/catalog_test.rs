//! Tests for the aspect-ratio size catalog.
//!
//! Covers bucket grouping, idempotent insertion, closeness ordering, and the
//! two size-selection algorithms used when building sessions.

use camsession::sizes::{SizeCatalog, SizeSelection};
use camsession::types::{AspectRatio, Size};
use camsession::CaptureError;
use proptest::prelude::*;

fn catalog() -> SizeCatalog {
    let mut catalog = SizeCatalog::new();
    for (w, h) in [(320, 240), (640, 480), (1280, 960)] {
        catalog.add(Size::new(w, h));
    }
    for (w, h) in [(640, 360), (1280, 720)] {
        catalog.add(Size::new(w, h));
    }
    catalog
}

#[test]
fn test_second_add_returns_false_and_keeps_cardinality() {
    let mut c = catalog();
    let before: usize = c
        .ratios()
        .iter()
        .map(|r| c.sizes_for(r).len())
        .sum();
    assert!(!c.add(Size::new(1280, 720)));
    let after: usize = c
        .ratios()
        .iter()
        .map(|r| c.sizes_for(r).len())
        .sum();
    assert_eq!(before, after);
}

#[test]
fn test_unknown_ratio_yields_empty_set() {
    let c = catalog();
    assert!(c.sizes_for(&AspectRatio::of(21, 9)).is_empty());
}

#[test]
fn test_closeness_order_is_stable_on_ties() {
    let mut c = SizeCatalog::new();
    // 3:2 and its inverse are equidistant from 1:1; insertion order breaks
    // the tie.
    c.add(Size::new(300, 200));
    c.add(Size::new(200, 300));
    let sorted = c.ratios_by_closeness_to(AspectRatio::of(1, 1));
    assert_eq!(sorted, vec![AspectRatio::of(3, 2), AspectRatio::of(2, 3)]);
}

#[test]
fn test_optimal_size_picks_smallest_big_enough_of_closest_ratio() {
    let c = catalog();
    // 1000x560 is closest to 16:9 (1.786 vs 1.778); 1280x720 is the
    // smallest 16:9 size covering the surface.
    assert_eq!(
        c.optimal_size(Size::new(1000, 560)).unwrap(),
        Size::new(1280, 720)
    );
}

#[test]
fn test_optimal_size_degrades_to_global_largest() {
    let c = catalog();
    assert_eq!(
        c.optimal_size(Size::new(3000, 2000)).unwrap(),
        Size::new(1280, 960)
    );
}

#[test]
fn test_optimal_size_on_empty_catalog_fails() {
    let c = SizeCatalog::new();
    assert_eq!(
        c.optimal_size(Size::new(640, 480)),
        Err(CaptureError::EmptyCatalog)
    );
}

#[test]
fn test_smallest_at_least_within_single_ratio() {
    let c = catalog();
    let ratio = AspectRatio::of(16, 9);
    assert_eq!(
        c.smallest_at_least(&ratio, Size::new(800, 400)).unwrap(),
        SizeSelection::Exact(Size::new(1280, 720))
    );
    assert_eq!(
        c.smallest_at_least(&ratio, Size::new(1920, 1080)).unwrap(),
        SizeSelection::Degraded(Size::new(1280, 720))
    );
}

#[test]
fn test_rebuild_after_clear() {
    let mut c = catalog();
    c.clear();
    assert!(c.is_empty());
    assert!(c.add(Size::new(640, 480)));
    assert_eq!(c.ratios(), vec![AspectRatio::of(4, 3)]);
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

proptest! {
    #[test]
    fn prop_add_is_idempotent(w in 1u32..4000, h in 1u32..4000) {
        let mut c = SizeCatalog::new();
        prop_assert!(c.add(Size::new(w, h)));
        prop_assert!(!c.add(Size::new(w, h)));
        prop_assert_eq!(c.sizes_for(&AspectRatio::of(w, h)).len(), 1);
    }

    #[test]
    fn prop_ratio_reduces_to_lowest_terms(w in 1u32..4000, h in 1u32..4000) {
        let ratio = AspectRatio::of(w, h);
        prop_assert!(ratio.matches(Size::new(w, h)));
        prop_assert_eq!(gcd(ratio.numerator(), ratio.denominator()), 1);
    }

    #[test]
    fn prop_every_size_lives_under_exactly_one_ratio(
        sizes in proptest::collection::vec((1u32..2000, 1u32..2000), 1..40)
    ) {
        let mut c = SizeCatalog::new();
        for (w, h) in &sizes {
            c.add(Size::new(*w, *h));
        }
        for (w, h) in &sizes {
            let size = Size::new(*w, *h);
            let owners = c
                .ratios()
                .iter()
                .filter(|r| c.sizes_for(r).contains(&size))
                .count();
            prop_assert_eq!(owners, 1);
        }
    }
}
