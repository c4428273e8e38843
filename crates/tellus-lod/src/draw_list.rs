//! Per-frame draw list entries.

use tellus_cubesphere::TileKey;
use tellus_pool::TileRef;

/// One visible tile of the current frame.
///
/// Entries are built fresh into the frame arena every update and are never
/// retained across frames; the geometry itself stays owned by the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawEntry {
    /// Which tile is drawn.
    pub key: TileKey,
    /// Its geometry in the tile pool.
    pub tile: TileRef,
}
