//! Procedural terrain field: an ordered stack of strokes evaluated on the
//! unit sphere to produce radial displacement, normals, and material weights.

mod field;
mod stroke;

pub use field::{Terrain, TerrainParams, TerrainSample};
pub use stroke::{
    PointPattern, PointPatternParams, RidgedMultifractal, RidgedMultifractalParams, Stroke,
};
