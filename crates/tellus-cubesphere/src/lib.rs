//! Cube-sphere geometry: the six root faces, tile addressing, and the
//! cube-to-sphere projection used by the planet tessellation.

mod bounds;
mod cube_face;
mod face_coord;
mod projection;
mod tile_key;

pub use bounds::TileBounds;
pub use cube_face::CubeFace;
pub use face_coord::FaceCoord;
pub use projection::{face_coord_to_cube_point, face_coord_to_sphere};
pub use tile_key::TileKey;
