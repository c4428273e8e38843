//! Projected screen-space error for quadtree tiles.

use tellus_cubesphere::TileBounds;
use tracing::warn;

use crate::ViewParams;

/// Smallest draw-error threshold accepted from configuration. Values below
/// this (or NaN) are clamped rather than propagated.
pub const MIN_DRAW_ERROR_THRESHOLD: f64 = 0.25;

/// Projected screen-space error of a tile in pixels.
///
/// The tile's geometric deviation (how far its sampled mesh can stray
/// from the true surface, on the order of one grid cell of its bounding
/// radius) is projected through the camera. A camera sitting inside the
/// bound yields a very large error, which forces the deepest subdivision
/// directly under the viewer.
#[must_use]
pub fn screen_space_error(bounds: &TileBounds, grid_resolution: u32, view: &ViewParams) -> f64 {
    let cells = grid_resolution.saturating_sub(1).max(1) as f64;
    let geometric_error = bounds.radius / cells;
    let distance = bounds.distance_to(view.eye).max(1e-6);
    (geometric_error / distance).atan() * view.pixels_per_radian()
}

/// Clamp a configured draw-error threshold to a usable value. NaN and
/// too-small values fall back to the safe minimum.
#[must_use]
pub fn sanitize_threshold(value: f64) -> f64 {
    if value.is_nan() || value < MIN_DRAW_ERROR_THRESHOLD {
        warn!(
            value,
            clamped = MIN_DRAW_ERROR_THRESHOLD,
            "invalid draw-error threshold clamped"
        );
        MIN_DRAW_ERROR_THRESHOLD
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use tellus_cubesphere::{CubeFace, TileKey};

    const RADIUS: f64 = 6000.0;
    const RES: u32 = 17;

    fn view_at(eye: DVec3) -> ViewParams {
        ViewParams::with_eye(eye)
    }

    #[test]
    fn test_error_shrinks_with_distance() {
        let bounds = TileBounds::from_key(&TileKey::root(CubeFace::PosX), RADIUS, 0.0);
        let near = screen_space_error(&bounds, RES, &view_at(DVec3::X * (RADIUS * 2.0)));
        let far = screen_space_error(&bounds, RES, &view_at(DVec3::X * (RADIUS * 50.0)));
        assert!(near > far);
        assert!(far > 0.0);
    }

    #[test]
    fn test_children_have_smaller_error_than_parent() {
        let parent = TileKey::root(CubeFace::PosY);
        let eye = DVec3::Y * (RADIUS * 4.0);
        let parent_error =
            screen_space_error(&TileBounds::from_key(&parent, RADIUS, 0.0), RES, &view_at(eye));
        for child in parent.children().unwrap() {
            let child_error =
                screen_space_error(&TileBounds::from_key(&child, RADIUS, 0.0), RES, &view_at(eye));
            assert!(child_error < parent_error);
        }
    }

    #[test]
    fn test_camera_inside_bound_blows_up_error() {
        let bounds = TileBounds::from_key(&TileKey::root(CubeFace::PosZ), RADIUS, 0.0);
        let error = screen_space_error(&bounds, RES, &view_at(bounds.center));
        // The angular size saturates at a quarter turn, which projects to
        // far more pixels than any usable threshold.
        assert!(error > 500.0, "error inside the bound should be huge, got {error}");
    }

    #[test]
    fn test_finer_grids_reduce_error() {
        let bounds = TileBounds::from_key(&TileKey::root(CubeFace::PosX), RADIUS, 0.0);
        let eye = view_at(DVec3::X * (RADIUS * 5.0));
        let coarse = screen_space_error(&bounds, 5, &eye);
        let fine = screen_space_error(&bounds, 33, &eye);
        assert!(fine < coarse);
    }

    #[test]
    fn test_default_threshold_keeps_roots_for_far_cameras() {
        // A camera hundreds of radii out must sit below the default split
        // threshold for every root face.
        let eye = view_at(DVec3::Z * (RADIUS * 200.0));
        for face in CubeFace::ALL {
            let bounds = TileBounds::from_key(&TileKey::root(face), RADIUS, 25.0);
            let error = screen_space_error(&bounds, RES, &eye);
            assert!(error < 15.0, "face {face:?} error {error} should stay under 15");
        }
    }

    #[test]
    fn test_sanitize_accepts_normal_values() {
        assert_eq!(sanitize_threshold(15.0), 15.0);
        assert_eq!(
            sanitize_threshold(MIN_DRAW_ERROR_THRESHOLD),
            MIN_DRAW_ERROR_THRESHOLD
        );
    }

    #[test]
    fn test_sanitize_clamps_invalid_values() {
        assert_eq!(sanitize_threshold(-3.0), MIN_DRAW_ERROR_THRESHOLD);
        assert_eq!(sanitize_threshold(f64::NAN), MIN_DRAW_ERROR_THRESHOLD);
        assert_eq!(sanitize_threshold(0.0), MIN_DRAW_ERROR_THRESHOLD);
    }
}
