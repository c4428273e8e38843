//! Stroke types: individually parametrized procedural contributions to the
//! terrain field.
//!
//! The stroke set is closed and dispatched by tag; each variant precomputes
//! whatever state it needs (noise basis, spectral weights, scattered points)
//! at construction so that evaluation is pure and lock-free.

use glam::DVec3;
use noise::{NoiseFn, Simplex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Parameters for a ridged-multifractal stroke.
///
/// Per octave the signal is `(offset − |noise|)²`, weighted by the previous
/// octave's signal (times `gain`, clamped to `[0, 1]`) and a spectral weight
/// `frequency^−h`, so ridge crests sharpen where the field is already high.
#[derive(Clone, Debug)]
pub struct RidgedMultifractalParams {
    /// Noise basis seed.
    pub seed: u32,
    /// Number of octaves composited.
    pub octaves: u32,
    /// Frequency multiplier between successive octaves.
    pub lacunarity: f64,
    /// Feedback strength from one octave's signal into the next octave's
    /// weight.
    pub gain: f64,
    /// Ridge offset; the per-octave signal is `(offset − |noise|)²`.
    pub offset: f64,
    /// Fractal exponent controlling how quickly higher octaves attenuate.
    pub h: f64,
    /// Frequency of the first octave on the unit sphere.
    pub initial_frequency: f64,
}

impl Default for RidgedMultifractalParams {
    fn default() -> Self {
        Self {
            seed: 0,
            octaves: 64,
            lacunarity: 1.9,
            gain: 1.9,
            offset: 0.8,
            h: 0.4,
            initial_frequency: 1.5,
        }
    }
}

/// Parameters for a point-pattern stroke: `count` smooth radial bumps
/// scattered deterministically over the sphere.
#[derive(Clone, Debug)]
pub struct PointPatternParams {
    /// Scatter seed.
    pub seed: u64,
    /// Number of bumps.
    pub count: u32,
    /// Mean angular bump radius in radians.
    pub radius_mean: f64,
    /// Half-width of the uniform radius spread around the mean.
    pub radius_variance: f64,
    /// Mean bump intensity (field units, signed).
    pub intensity_mean: f64,
    /// Half-width of the uniform intensity spread around the mean.
    pub intensity_variance: f64,
}

impl Default for PointPatternParams {
    fn default() -> Self {
        Self {
            seed: 0,
            count: 10,
            radius_mean: 0.17,
            radius_variance: 0.03,
            intensity_mean: 1.0,
            intensity_variance: 0.1,
        }
    }
}

/// One scattered bump of a point-pattern stroke.
#[derive(Clone, Copy, Debug)]
struct PatternPoint {
    direction: DVec3,
    radius: f64,
    intensity: f64,
}

/// A ridged-multifractal stroke with its precomputed basis and spectral
/// weight table.
pub struct RidgedMultifractal {
    params: RidgedMultifractalParams,
    basis: Simplex,
    spectral_weights: Vec<f64>,
}

impl RidgedMultifractal {
    fn new(params: RidgedMultifractalParams) -> Self {
        let mut spectral_weights = Vec::with_capacity(params.octaves as usize);
        let mut frequency = params.initial_frequency;
        for _ in 0..params.octaves {
            spectral_weights.push(frequency.powf(-params.h));
            frequency *= params.lacunarity;
        }
        Self {
            basis: Simplex::new(params.seed),
            params,
            spectral_weights,
        }
    }

    fn evaluate(&self, p: DVec3) -> f64 {
        let mut frequency = self.params.initial_frequency;
        let mut weight = 1.0_f64;
        let mut total = 0.0;

        for &spectral in &self.spectral_weights {
            let n = self
                .basis
                .get([p.x * frequency, p.y * frequency, p.z * frequency]);
            let mut signal = self.params.offset - n.abs();
            signal *= signal;
            signal *= weight;
            total += signal * spectral;

            weight = (signal * self.params.gain).clamp(0.0, 1.0);
            frequency *= self.params.lacunarity;
        }

        total
    }

    /// Upper bound on `evaluate`: each octave's signal is at most
    /// `max(offset, 1 − offset)²` with weight ≤ 1.
    fn amplitude_bound(&self) -> f64 {
        let peak = self.params.offset.max(1.0 - self.params.offset);
        let peak = peak * peak;
        peak * self.spectral_weights.iter().sum::<f64>()
    }
}

/// A point-pattern stroke with its scattered bumps.
pub struct PointPattern {
    points: Vec<PatternPoint>,
}

impl PointPattern {
    fn new(params: &PointPatternParams) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
        let mut points = Vec::with_capacity(params.count as usize);
        for _ in 0..params.count {
            // Uniform direction on the sphere: uniform z and azimuth.
            let z: f64 = rng.random_range(-1.0..1.0);
            let azimuth: f64 = rng.random_range(0.0..std::f64::consts::TAU);
            let ring = (1.0 - z * z).sqrt();
            let direction = DVec3::new(ring * azimuth.cos(), ring * azimuth.sin(), z);

            let radius = params.radius_mean
                + rng.random_range(-params.radius_variance..=params.radius_variance);
            let intensity = params.intensity_mean
                + rng.random_range(-params.intensity_variance..=params.intensity_variance);

            points.push(PatternPoint {
                direction,
                radius: radius.max(1e-3),
                intensity,
            });
        }
        Self { points }
    }

    fn evaluate(&self, p: DVec3) -> f64 {
        let mut total = 0.0;
        for point in &self.points {
            let angle = p.dot(point.direction).clamp(-1.0, 1.0).acos();
            if angle < point.radius {
                // Cosine bump: intensity at the center, zero at the rim.
                let t = angle / point.radius;
                total += point.intensity * 0.5 * (1.0 + (t * std::f64::consts::PI).cos());
            }
        }
        total
    }

    fn amplitude_bound(&self) -> f64 {
        self.points.iter().map(|p| p.intensity.abs()).sum()
    }
}

/// One procedural contribution to the terrain field.
///
/// Strokes compose additively in the order they were added to a
/// [`Terrain`](crate::Terrain); the composition rule is fixed per variant.
pub enum Stroke {
    /// Ridge-forming fractal noise.
    RidgedMultifractal(RidgedMultifractal),
    /// Deterministic scattered bumps.
    PointPattern(PointPattern),
}

impl Stroke {
    /// Build a ridged-multifractal stroke.
    #[must_use]
    pub fn ridged_multifractal(params: RidgedMultifractalParams) -> Self {
        Stroke::RidgedMultifractal(RidgedMultifractal::new(params))
    }

    /// Build a point-pattern stroke.
    #[must_use]
    pub fn point_pattern(params: PointPatternParams) -> Self {
        Stroke::PointPattern(PointPattern::new(&params))
    }

    /// Evaluate this stroke's scalar field at a unit-sphere point.
    #[must_use]
    pub fn evaluate(&self, p: DVec3) -> f64 {
        match self {
            Stroke::RidgedMultifractal(s) => s.evaluate(p),
            Stroke::PointPattern(s) => s.evaluate(p),
        }
    }

    /// Fold this stroke over an accumulated field value.
    #[must_use]
    pub fn compose(&self, accumulated: f64, p: DVec3) -> f64 {
        accumulated + self.evaluate(p)
    }

    /// Conservative upper bound on `|evaluate|`.
    #[must_use]
    pub fn amplitude_bound(&self) -> f64 {
        match self {
            Stroke::RidgedMultifractal(s) => s.amplitude_bound(),
            Stroke::PointPattern(s) => s.amplitude_bound(),
        }
    }
}
