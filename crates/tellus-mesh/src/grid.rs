//! Shared index topology for tile grids.
//!
//! Every tile is sampled on the same regular grid, so the triangle index
//! list depends only on the resolution. Tiles at the same resolution can
//! therefore share a single index buffer; only vertex data varies.

/// Vertices per tile edge. 17×17 vertices → 16×16 quads → 512 triangles.
pub const TILE_RESOLUTION: u32 = 17;

/// Build the triangle index list for a `resolution × resolution` vertex
/// grid, row-major with `u` varying fastest. Winding is counter-clockwise
/// seen from outside the planet.
///
/// # Panics
///
/// Panics if `resolution < 2`.
#[must_use]
pub fn tile_grid_indices(resolution: u32) -> Vec<u32> {
    assert!(resolution >= 2, "a tile grid needs at least 2×2 vertices");
    let quads = resolution - 1;
    let mut indices = Vec::with_capacity((quads * quads * 6) as usize);
    for y in 0..quads {
        for x in 0..quads {
            let a = y * resolution + x;
            let b = a + 1;
            let c = b + resolution;
            let d = a + resolution;
            indices.extend_from_slice(&[a, b, c, a, c, d]);
        }
    }
    indices
}
