//! Generated tile geometry.

use glam::DVec3;
use tellus_cubesphere::TileKey;

use crate::TileVertex;

/// Vertex data for one tile's patch of terrain.
///
/// Immutable after generation. Owned by the tile pool; the quadtree and the
/// per-frame draw list hold non-owning references into the pool. Index data
/// is not stored here; see [`tile_grid_indices`](crate::tile_grid_indices).
pub struct TileGeometry {
    /// The tile this geometry was generated for.
    pub key: TileKey,
    /// World-space tile center; vertex positions are relative to it.
    pub center: DVec3,
    /// Grid resolution (vertices per edge) this tile was sampled at.
    pub resolution: u32,
    /// Interleaved vertex data, row-major over the sample grid.
    pub vertices: Vec<TileVertex>,
}

impl TileGeometry {
    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Size of the vertex data in bytes, as uploaded to the GPU.
    #[must_use]
    pub fn vertex_bytes(&self) -> usize {
        self.vertices.len() * std::mem::size_of::<TileVertex>()
    }
}
