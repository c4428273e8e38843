//! The narrow interface the tessellation drives the renderer through.

use tellus_cubesphere::TileKey;
use tellus_mesh::TileGeometry;
use tellus_pool::TileRef;

/// GPU-affecting work staged through the
/// [`GpuTaskQueue`](tellus_task::GpuTaskQueue) and executed against the
/// renderer when the batch joins.
#[derive(Clone, Copy, Debug)]
pub enum GpuWork {
    /// Create GPU buffers for freshly admitted geometry.
    Upload(TileRef),
    /// Drop the GPU buffers of a merged-away tile.
    Release(TileKey),
}

/// Draw-submission collaborator. The tessellation performs no shader or
/// uniform setup; it only hands geometry across this boundary, strictly on
/// the render thread.
pub trait TileRenderer {
    /// Create GPU buffers for one tile. Called when an upload batch joins.
    fn upload_tile(&mut self, geometry: &TileGeometry);
    /// Release the GPU buffers of a tile that left the quadtree.
    fn release_tile(&mut self, key: TileKey);
    /// Submit one tile of the frame's draw list.
    fn draw_tile(&mut self, geometry: &TileGeometry);
}

/// Renderer that ignores everything; used headless and in tests.
#[derive(Default)]
pub struct NullRenderer;

impl TileRenderer for NullRenderer {
    fn upload_tile(&mut self, _geometry: &TileGeometry) {}
    fn release_tile(&mut self, _key: TileKey) {}
    fn draw_tile(&mut self, _geometry: &TileGeometry) {}
}
