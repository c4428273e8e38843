//! World-space bounding spheres for quadtree tiles.

use glam::DVec3;

use crate::{FaceCoord, TileKey, face_coord_to_sphere};

/// A bounding sphere around one tile's patch of the planet surface.
///
/// Used by the LOD error metric: the angular size of this sphere as seen
/// from the camera is the tile's projected screen-space footprint.
#[derive(Clone, Copy, Debug)]
pub struct TileBounds {
    /// World-space center of the patch, on the undisplaced sphere.
    pub center: DVec3,
    /// Radius covering the patch corners plus the terrain's maximum
    /// displacement.
    pub radius: f64,
}

impl TileBounds {
    /// Compute the bounding sphere for a tile on a planet of the given
    /// surface radius. `max_displacement` is a conservative bound on the
    /// terrain height added on top of the base sphere.
    #[must_use]
    pub fn from_key(key: &TileKey, surface_radius: f64, max_displacement: f64) -> Self {
        let (u_min, v_min, u_max, v_max) = key.uv_bounds();
        let center = face_coord_to_sphere(&key.center()) * surface_radius;

        let corners = [
            (u_min, v_min),
            (u_max, v_min),
            (u_min, v_max),
            (u_max, v_max),
        ];
        let mut radius: f64 = 0.0;
        for (u, v) in corners {
            let corner = face_coord_to_sphere(&FaceCoord::new(key.face, u, v)) * surface_radius;
            radius = radius.max((corner - center).length());
        }

        Self {
            center,
            radius: radius + max_displacement,
        }
    }

    /// Distance from `point` to the closest part of this bound, zero when
    /// the point is inside.
    #[must_use]
    pub fn distance_to(&self, point: DVec3) -> f64 {
        ((point - self.center).length() - self.radius).max(0.0)
    }
}
