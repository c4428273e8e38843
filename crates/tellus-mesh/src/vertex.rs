//! The interleaved vertex format shared by every tile mesh.

use static_assertions::const_assert_eq;

/// One vertex of a tile mesh.
///
/// Positions are stored relative to the tile's `f64` center so that `f32`
/// precision holds up at planet scale; the center travels alongside the
/// geometry and is applied by the renderer.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TileVertex {
    /// Position relative to the tile center.
    pub position: [f32; 3],
    /// Outward surface normal.
    pub normal: [f32; 3],
    /// Rock / snow / lowland material blend weights.
    pub material: [f32; 3],
}

// 9 floats, tightly packed; render pipelines assume this stride.
const_assert_eq!(std::mem::size_of::<TileVertex>(), 36);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_is_pod_castable() {
        let verts = [TileVertex {
            position: [1.0, 2.0, 3.0],
            normal: [0.0, 1.0, 0.0],
            material: [1.0, 0.0, 0.0],
        }];
        let bytes: &[u8] = bytemuck::cast_slice(&verts);
        assert_eq!(bytes.len(), 36);
    }
}
