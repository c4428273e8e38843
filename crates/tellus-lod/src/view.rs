//! The camera view parameters the tessellation reads each frame.

use glam::DVec3;

/// Read-only camera pose and projection parameters for one update.
///
/// The camera itself is an external collaborator; the tessellation only
/// needs enough of it to project world-space sizes to pixels.
#[derive(Clone, Copy, Debug)]
pub struct ViewParams {
    /// World-space eye position.
    pub eye: DVec3,
    /// Vertical field of view in radians.
    pub fov_y: f64,
    /// Viewport height in pixels.
    pub viewport_height: f64,
}

impl ViewParams {
    /// Perspective camera at `eye` with a 768-pixel-high viewport and a
    /// 60° vertical field of view.
    #[must_use]
    pub fn with_eye(eye: DVec3) -> Self {
        Self {
            eye,
            fov_y: 60.0_f64.to_radians(),
            viewport_height: 768.0,
        }
    }

    /// Pixels subtended per radian of angular size at the screen center.
    #[must_use]
    pub fn pixels_per_radian(&self) -> f64 {
        self.viewport_height / (2.0 * (self.fov_y * 0.5).tan())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_narrower_fov_magnifies() {
        let wide = ViewParams {
            eye: DVec3::ZERO,
            fov_y: 90.0_f64.to_radians(),
            viewport_height: 768.0,
        };
        let narrow = ViewParams {
            eye: DVec3::ZERO,
            fov_y: 30.0_f64.to_radians(),
            viewport_height: 768.0,
        };
        assert!(narrow.pixels_per_radian() > wide.pixels_per_radian());
    }

    #[test]
    fn test_pixels_scale_with_viewport() {
        let small = ViewParams {
            eye: DVec3::ZERO,
            fov_y: 1.0,
            viewport_height: 100.0,
        };
        let large = ViewParams {
            eye: DVec3::ZERO,
            fov_y: 1.0,
            viewport_height: 200.0,
        };
        let ratio = large.pixels_per_radian() / small.pixels_per_radian();
        assert!((ratio - 2.0).abs() < 1e-12);
    }
}
