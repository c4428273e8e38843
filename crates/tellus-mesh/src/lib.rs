//! Tile mesh generation: samples the terrain field over a tile's UV grid
//! and emits GPU-ready vertex data with a shared index topology.

mod generate;
mod geometry;
mod grid;
mod vertex;

pub use generate::generate_tile_mesh;
pub use geometry::TileGeometry;
pub use grid::{TILE_RESOLUTION, tile_grid_indices};
pub use vertex::TileVertex;
