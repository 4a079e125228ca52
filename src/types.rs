//! Core value types shared across the capture pipeline.
//!
//! `Size` and `AspectRatio` are immutable value types; `SessionConfig` is the
//! full tuple of parameters that determines how a capture session is built.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A pixel resolution. Ordered by area so size sets sort smallest-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Swapped copy (width and height exchanged).
    pub fn transpose(&self) -> Size {
        Size::new(self.height, self.width)
    }

    /// Copy with the longer edge as the width. Sensor catalogs report
    /// landscape sizes, so surfaces are normalized before comparison.
    pub fn landscape(&self) -> Size {
        if self.width < self.height {
            self.transpose()
        } else {
            *self
        }
    }

    /// True when both dimensions meet or exceed `other`'s.
    pub fn covers(&self, other: Size) -> bool {
        self.width >= other.width && self.height >= other.height
    }
}

impl Ord for Size {
    fn cmp(&self, other: &Self) -> Ordering {
        // Area first; width/height tiebreak keeps the order total.
        self.area()
            .cmp(&other.area())
            .then(self.width.cmp(&other.width))
            .then(self.height.cmp(&other.height))
    }
}

impl PartialOrd for Size {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A width:height ratio reduced to lowest terms at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AspectRatio {
    numerator: u32,
    denominator: u32,
}

impl AspectRatio {
    /// Builds the reduced ratio of `width:height`. Zero components are kept
    /// as-is (no reduction possible); catalogs never produce them.
    pub fn of(width: u32, height: u32) -> Self {
        let divisor = gcd(width, height).max(1);
        Self {
            numerator: width / divisor,
            denominator: height / divisor,
        }
    }

    pub fn numerator(&self) -> u32 {
        self.numerator
    }

    pub fn denominator(&self) -> u32 {
        self.denominator
    }

    /// True when `size` reduces to this ratio.
    pub fn matches(&self, size: Size) -> bool {
        size.width as u64 * self.denominator as u64
            == size.height as u64 * self.numerator as u64
    }

    pub fn value(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    pub fn inverse(&self) -> AspectRatio {
        AspectRatio {
            numerator: self.denominator,
            denominator: self.numerator,
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.numerator, self.denominator)
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

/// Which way the lens points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    Back,
    Front,
}

/// Flash behavior requested by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlashMode {
    Off,
    On,
    Torch,
    Auto,
    RedEye,
}

/// Still-photo capture vs. video recording. Switching modes changes which
/// output size catalog applies and forces a session rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraMode {
    Photo,
    Video,
}

/// A display/encoder surface observed (not owned) by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamTarget {
    /// Opaque handle owned by the UI/encoder collaborator.
    pub handle: u64,
    pub size: Size,
}

impl StreamTarget {
    pub fn new(handle: u64, width: u32, height: u32) -> Self {
        Self {
            handle,
            size: Size::new(width, height),
        }
    }
}

/// Everything that determines how a session must be built.
///
/// Aspect ratio and mode changes force a full session teardown and rebuild;
/// autofocus and flash apply to a live repeating request in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub facing: Facing,
    /// `None` until the device capability report picks a default.
    pub aspect_ratio: Option<AspectRatio>,
    pub autofocus: bool,
    pub flash: FlashMode,
    /// Display rotation in degrees (0, 90, 180, 270).
    pub display_rotation: u16,
    pub mode: CameraMode,
    pub video_bit_rate: u32,
    pub video_frame_rate: u32,
    /// Floor resolution for the recording stream.
    pub min_video_size: Size,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            facing: Facing::Back,
            aspect_ratio: None,
            autofocus: true,
            flash: FlashMode::Auto,
            display_rotation: 0,
            mode: CameraMode::Photo,
            video_bit_rate: 10_000_000,
            video_frame_rate: 30,
            min_video_size: Size::new(1280, 720),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_ordering_by_area() {
        let mut sizes = vec![
            Size::new(1920, 1080),
            Size::new(640, 480),
            Size::new(1280, 720),
        ];
        sizes.sort();
        assert_eq!(sizes[0], Size::new(640, 480));
        assert_eq!(sizes[2], Size::new(1920, 1080));
    }

    #[test]
    fn test_size_covers() {
        assert!(Size::new(1280, 720).covers(Size::new(1000, 560)));
        assert!(!Size::new(1280, 720).covers(Size::new(1000, 721)));
        assert!(Size::new(640, 480).covers(Size::new(640, 480)));
    }

    #[test]
    fn test_size_landscape_normalization() {
        assert_eq!(Size::new(720, 1280).landscape(), Size::new(1280, 720));
        assert_eq!(Size::new(1280, 720).landscape(), Size::new(1280, 720));
    }

    #[test]
    fn test_aspect_ratio_reduction() {
        assert_eq!(AspectRatio::of(1920, 1080), AspectRatio::of(16, 9));
        assert_eq!(AspectRatio::of(640, 480), AspectRatio::of(4, 3));
        assert_eq!(AspectRatio::of(16, 9).numerator(), 16);
        assert_eq!(AspectRatio::of(16, 9).denominator(), 9);
    }

    #[test]
    fn test_aspect_ratio_matches() {
        let ratio = AspectRatio::of(16, 9);
        assert!(ratio.matches(Size::new(1280, 720)));
        assert!(ratio.matches(Size::new(640, 360)));
        assert!(!ratio.matches(Size::new(640, 480)));
    }

    #[test]
    fn test_aspect_ratio_inverse() {
        assert_eq!(AspectRatio::of(16, 9).inverse(), AspectRatio::of(9, 16));
    }

    #[test]
    fn test_aspect_ratio_display() {
        assert_eq!(AspectRatio::of(1920, 1080).to_string(), "16:9");
    }

    #[test]
    fn test_session_config_serialization() {
        let config = SessionConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: SessionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
