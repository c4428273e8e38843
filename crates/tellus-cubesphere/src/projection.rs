//! Cube-to-sphere projection.
//!
//! Uses the tangent-warp mapping: face coordinates are remapped through
//! `tan(x · π/4)` before normalization, which keeps tile areas close to
//! uniform across a face instead of bunching toward the corners.

use std::f64::consts::FRAC_PI_4;

use glam::DVec3;

use crate::FaceCoord;

/// Convert a [`FaceCoord`] to a point on the surface of the `[-1, 1]` cube.
///
/// The face center `(u=0.5, v=0.5)` maps to the face normal.
#[inline]
#[must_use]
pub fn face_coord_to_cube_point(fc: &FaceCoord) -> DVec3 {
    let s = 2.0 * fc.u - 1.0;
    let t = 2.0 * fc.v - 1.0;
    fc.face.normal() + s * fc.face.tangent() + t * fc.face.bitangent()
}

/// Project a [`FaceCoord`] onto the unit sphere.
///
/// `tan(π/4) = 1`, so the warp is the identity at the face edges and only
/// stretches the interior; adjacent faces still meet exactly at shared
/// edges. Returns a unit-length direction.
#[inline]
#[must_use]
pub fn face_coord_to_sphere(fc: &FaceCoord) -> DVec3 {
    let s = 2.0 * fc.u - 1.0;
    let t = 2.0 * fc.v - 1.0;

    let ws = (s * FRAC_PI_4).tan();
    let wt = (t * FRAC_PI_4).tan();

    let cube_point = fc.face.normal() + ws * fc.face.tangent() + wt * fc.face.bitangent();
    cube_point.normalize()
}
