//! The composed terrain field: displacement, normals, and material weights
//! sampled at unit-sphere points.

use glam::DVec3;

use crate::Stroke;

/// Shape parameters of the planet the field is draped over.
#[derive(Clone, Debug)]
pub struct TerrainParams {
    /// Base sphere radius in world units.
    pub surface_radius: f64,
    /// World-unit height of a field value of 1.0.
    pub height_scale: f64,
    /// Tangent-space offset used for finite-difference normals.
    pub normal_epsilon: f64,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            surface_radius: 6000.0,
            height_scale: 25.0,
            normal_epsilon: 1e-4,
        }
    }
}

/// The field evaluated at one unit-sphere point.
#[derive(Clone, Copy, Debug)]
pub struct TerrainSample {
    /// Displaced world-space surface position.
    pub position: DVec3,
    /// Outward surface normal, estimated by finite differences.
    pub normal: DVec3,
    /// Blend weights for the rock / snow / lowland material channels.
    pub material_weights: [f32; 3],
}

/// An immutable stack of strokes over a base sphere.
///
/// Evaluation is pure: no interior mutability, no shared state, so a
/// `Terrain` can be sampled concurrently from any number of worker threads.
pub struct Terrain {
    params: TerrainParams,
    strokes: Vec<Stroke>,
    amplitude_bound: f64,
}

impl Terrain {
    /// Create a terrain with no strokes (a perfect sphere).
    #[must_use]
    pub fn new(params: TerrainParams) -> Self {
        Self {
            params,
            strokes: Vec::new(),
            amplitude_bound: 0.0,
        }
    }

    /// Append a stroke. Order is significant: later strokes compose over
    /// the accumulated field of earlier ones.
    pub fn add_stroke(&mut self, stroke: Stroke) {
        self.amplitude_bound += stroke.amplitude_bound();
        self.strokes.push(stroke);
    }

    /// The shape parameters.
    #[must_use]
    pub fn params(&self) -> &TerrainParams {
        &self.params
    }

    /// Number of strokes in the stack.
    #[must_use]
    pub fn stroke_count(&self) -> usize {
        self.strokes.len()
    }

    /// Raw field value at a unit-sphere direction (unscaled).
    #[must_use]
    pub fn height_at(&self, dir: DVec3) -> f64 {
        self.strokes
            .iter()
            .fold(0.0, |acc, stroke| stroke.compose(acc, dir))
    }

    /// Displaced world-space position for a unit-sphere direction.
    #[must_use]
    pub fn position_at(&self, dir: DVec3) -> DVec3 {
        dir * (self.params.surface_radius + self.params.height_scale * self.height_at(dir))
    }

    /// Conservative world-unit bound on the radial displacement, used when
    /// sizing tile bounding spheres.
    #[must_use]
    pub fn max_displacement(&self) -> f64 {
        self.params.height_scale * self.amplitude_bound
    }

    /// Full sample: displaced position, finite-difference normal, and
    /// material weights.
    #[must_use]
    pub fn evaluate_at(&self, dir: DVec3) -> TerrainSample {
        let dir = dir.normalize();
        let height = self.height_at(dir);
        let position =
            dir * (self.params.surface_radius + self.params.height_scale * height);

        let (t1, t2) = tangent_basis(dir);
        let e = self.params.normal_epsilon;
        let du = self.position_at((dir + e * t1).normalize())
            - self.position_at((dir - e * t1).normalize());
        let dv = self.position_at((dir + e * t2).normalize())
            - self.position_at((dir - e * t2).normalize());
        let mut normal = du.cross(dv);
        if normal.length_squared() < 1e-30 {
            normal = dir;
        } else {
            normal = normal.normalize();
            if normal.dot(dir) < 0.0 {
                normal = -normal;
            }
        }

        TerrainSample {
            position,
            normal,
            material_weights: self.material_weights(height, normal, dir),
        }
    }

    /// Material blend from normalized height and slope: steep faces read as
    /// rock, high ground as snow, the remainder as lowland.
    fn material_weights(&self, height: f64, normal: DVec3, dir: DVec3) -> [f32; 3] {
        let relative = if self.amplitude_bound > 0.0 {
            (height / self.amplitude_bound).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let slope = (1.0 - normal.dot(dir)).clamp(0.0, 1.0);

        let rock = (slope * 8.0).clamp(0.0, 1.0) as f32;
        let snow = smoothstep(0.55, 0.75, relative) as f32 * (1.0 - rock);
        let lowland = (1.0 - rock - snow).max(0.0);
        [rock, snow, lowland]
    }
}

/// An arbitrary-but-stable orthonormal tangent basis for a direction.
fn tangent_basis(dir: DVec3) -> (DVec3, DVec3) {
    let up = if dir.z.abs() < 0.9 { DVec3::Z } else { DVec3::X };
    let t1 = up.cross(dir).normalize();
    let t2 = dir.cross(t1);
    (t1, t2)
}

fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
