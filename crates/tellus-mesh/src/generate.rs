//! Worker-side tile mesh generation.

use tellus_cubesphere::{FaceCoord, TileKey, face_coord_to_sphere};
use tellus_terrain::Terrain;

use crate::{TileGeometry, TileVertex};

/// Sample the terrain field over the tile's UV rectangle and build its
/// vertex grid.
///
/// Pure CPU work, safe to call from any worker thread: the terrain is read
/// immutably and no GPU objects are touched. Buffer creation happens later
/// on the render thread.
#[must_use]
pub fn generate_tile_mesh(terrain: &Terrain, key: TileKey, resolution: u32) -> TileGeometry {
    assert!(resolution >= 2, "a tile grid needs at least 2×2 vertices");
    let (u_min, v_min, u_max, v_max) = key.uv_bounds();
    let center_dir = face_coord_to_sphere(&key.center());
    let center = center_dir * terrain.params().surface_radius;

    let steps = (resolution - 1) as f64;
    let mut vertices = Vec::with_capacity((resolution * resolution) as usize);
    for y in 0..resolution {
        let v = v_min + (v_max - v_min) * (y as f64 / steps);
        for x in 0..resolution {
            let u = u_min + (u_max - u_min) * (x as f64 / steps);
            let dir = face_coord_to_sphere(&FaceCoord::new(key.face, u, v));
            let sample = terrain.evaluate_at(dir);
            vertices.push(TileVertex {
                position: (sample.position - center).as_vec3().to_array(),
                normal: sample.normal.as_vec3().to_array(),
                material: sample.material_weights,
            });
        }
    }

    TileGeometry {
        key,
        center,
        resolution,
        vertices,
    }
}
