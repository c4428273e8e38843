//! A normalized position on one cube face.

use crate::CubeFace;

/// A point on a single cube face, with `u` and `v` in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceCoord {
    /// The face this coordinate lives on.
    pub face: CubeFace,
    /// Horizontal coordinate across the face.
    pub u: f64,
    /// Vertical coordinate across the face.
    pub v: f64,
}

impl FaceCoord {
    /// Construct a face coordinate. Values outside `[0, 1]` are accepted
    /// (they address points past the face edge, used by finite-difference
    /// sampling near seams) but callers normally stay inside the face.
    #[must_use]
    pub fn new(face: CubeFace, u: f64, v: f64) -> Self {
        Self { face, u, v }
    }
}
