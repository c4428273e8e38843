//! The adaptive planet tessellation: a view-driven LOD quadtree over six
//! cube-sphere faces, fed by background tile generation.

mod draw_list;
mod error_metric;
mod node;
mod renderer;
mod session;
mod tessellation;
mod view;

pub use draw_list::DrawEntry;
pub use error_metric::{MIN_DRAW_ERROR_THRESHOLD, sanitize_threshold, screen_space_error};
pub use node::{TileNode, TileState};
pub use renderer::{GpuWork, NullRenderer, TileRenderer};
pub use session::{SessionParams, TerrainSession};
pub use tessellation::{FrameStats, PlanetTessellation, TessellationConfig};
pub use view::ViewParams;
