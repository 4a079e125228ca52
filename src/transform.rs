//! Preview transform planning.
//!
//! Computes the 2-D affine transform mapping sensor-space preview pixels onto
//! a display surface given the display rotation and the selected preview
//! size. Pure: the caller hands the result to the rendering collaborator.

use serde::{Deserialize, Serialize};

use crate::types::Size;

/// Row-major 2x3 affine transform:
/// `x' = a*x + b*y + tx`, `y' = c*x + d*y + ty`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub a: f32,
    pub b: f32,
    pub tx: f32,
    pub c: f32,
    pub d: f32,
    pub ty: f32,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        a: 1.0,
        b: 0.0,
        tx: 0.0,
        c: 0.0,
        d: 1.0,
        ty: 0.0,
    };

    /// Maps a point through the transform.
    pub fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.b * y + self.tx,
            self.c * x + self.d * y + self.ty,
        )
    }

    /// Composition: apply `self` first, then `next`.
    pub fn then(&self, next: &Transform) -> Transform {
        Transform {
            a: next.a * self.a + next.b * self.c,
            b: next.a * self.b + next.b * self.d,
            tx: next.a * self.tx + next.b * self.ty + next.tx,
            c: next.c * self.a + next.d * self.c,
            d: next.c * self.b + next.d * self.d,
            ty: next.c * self.tx + next.d * self.ty + next.ty,
        }
    }
}

/// Plans the surface transform for the current rotation and preview size.
///
/// For landscape display rotations (90/270) the surface corners are mapped
/// through a quarter turn first: clockwise for 90, counter-clockwise for 270.
/// A per-axis scale about the surface center then corrects the preview's
/// aspect ratio so it fills the surface without distortion; the overflowing
/// axis is the one scaled up.
pub fn plan(
    display_rotation: u16,
    surface: Size,
    preview: Size,
    effective_rotation: u16,
) -> Transform {
    let sw = surface.width.max(1) as f32;
    let sh = surface.height.max(1) as f32;

    let rotation = if display_rotation % 180 == 90 {
        if display_rotation == 90 {
            // Clockwise quarter turn: (0,0)->(0,h), (w,0)->(0,0),
            // (0,h)->(w,h), (w,h)->(w,0).
            Transform {
                a: 0.0,
                b: sw / sh,
                tx: 0.0,
                c: -sh / sw,
                d: 0.0,
                ty: sh,
            }
        } else {
            // Counter-clockwise: (0,0)->(w,0), (w,0)->(w,h),
            // (0,h)->(0,0), (w,h)->(0,h).
            Transform {
                a: 0.0,
                b: -sw / sh,
                tx: sw,
                c: sh / sw,
                d: 0.0,
                ty: 0.0,
            }
        }
    } else {
        Transform::IDENTITY
    };

    // Total rotation between sensor rows and surface rows decides whether the
    // preview's dimensions read swapped on this surface.
    let oriented = if (display_rotation + effective_rotation) % 180 == 90 {
        preview.transpose()
    } else {
        preview
    };
    let surface_ratio = sw / sh;
    let preview_ratio = oriented.width.max(1) as f32 / oriented.height.max(1) as f32;

    let (sx, sy) = if preview_ratio > surface_ratio {
        (preview_ratio / surface_ratio, 1.0)
    } else if preview_ratio < surface_ratio {
        (1.0, surface_ratio / preview_ratio)
    } else {
        (1.0, 1.0)
    };
    let scale = Transform {
        a: sx,
        b: 0.0,
        tx: (1.0 - sx) * sw * 0.5,
        c: 0.0,
        d: sy,
        ty: (1.0 - sy) * sh * 0.5,
    };

    rotation.then(&scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: (f32, f32), expected: (f32, f32)) {
        assert!(
            (actual.0 - expected.0).abs() < 1e-3 && (actual.1 - expected.1).abs() < 1e-3,
            "expected {:?}, got {:?}",
            expected,
            actual
        );
    }

    #[test]
    fn test_identity_when_ratios_match() {
        let t = plan(0, Size::new(1280, 720), Size::new(1280, 720), 0);
        assert_eq!(t, Transform::IDENTITY);
    }

    #[test]
    fn test_rotation_90_maps_corners_clockwise() {
        // Sensor mounted at 90 keeps the oriented ratio square with the
        // surface, isolating the corner mapping.
        let t = plan(90, Size::new(400, 200), Size::new(400, 200), 90);
        assert_close(t.map(0.0, 0.0), (0.0, 200.0));
        assert_close(t.map(400.0, 0.0), (0.0, 0.0));
        assert_close(t.map(0.0, 200.0), (400.0, 200.0));
        assert_close(t.map(400.0, 200.0), (400.0, 0.0));
    }

    #[test]
    fn test_rotation_270_maps_corners_counter_clockwise() {
        let t = plan(270, Size::new(400, 200), Size::new(400, 200), 90);
        assert_close(t.map(0.0, 0.0), (400.0, 0.0));
        assert_close(t.map(400.0, 0.0), (400.0, 200.0));
        assert_close(t.map(0.0, 200.0), (0.0, 0.0));
        assert_close(t.map(400.0, 200.0), (0.0, 200.0));
    }

    #[test]
    fn test_scale_widens_overflowing_axis_about_center() {
        // 16:9 preview on a 4:3 surface: x is scaled up, center is fixed.
        let t = plan(0, Size::new(400, 300), Size::new(1600, 900), 0);
        assert_close(t.map(200.0, 150.0), (200.0, 150.0));
        let (x0, _) = t.map(0.0, 0.0);
        assert!(x0 < 0.0, "left edge should overflow the surface");
        let (x1, _) = t.map(400.0, 0.0);
        assert!(x1 > 400.0, "right edge should overflow the surface");
    }

    #[test]
    fn test_portrait_surface_with_rotated_sensor_is_undistorted() {
        // Portrait surface, sensor mounted at 90: oriented preview is
        // 720x1280 which matches the surface ratio exactly.
        let t = plan(0, Size::new(1080, 1920), Size::new(1280, 720), 90);
        assert_eq!(t, Transform::IDENTITY);
    }

    #[test]
    fn test_composition_order() {
        let shift = Transform {
            a: 1.0,
            b: 0.0,
            tx: 10.0,
            c: 0.0,
            d: 1.0,
            ty: 0.0,
        };
        let double = Transform {
            a: 2.0,
            b: 0.0,
            tx: 0.0,
            c: 0.0,
            d: 2.0,
            ty: 0.0,
        };
        // Shift then scale doubles the shift; scale then shift does not.
        assert_close(shift.then(&double).map(0.0, 0.0), (20.0, 0.0));
        assert_close(double.then(&shift).map(0.0, 0.0), (10.0, 0.0));
    }
}
