//! Headless tessellation demo: flies a camera from orbit down to the
//! surface of a procedural planet and logs what the quadtree does.
//!
//! Run with `cargo run -p tellus-demo`, or
//! `cargo run -p tellus-demo -- --frames 600 --draw-error-threshold 10`.

use std::sync::Arc;

use clap::Parser;
use glam::DVec3;
use tracing::info;

use tellus_config::{DRAW_ERROR_THRESHOLD_KEY, DemoArgs, Settings};
use tellus_cubesphere::TileKey;
use tellus_lod::{SessionParams, TerrainSession, TessellationConfig, TileRenderer, ViewParams};
use tellus_mesh::TileGeometry;
use tellus_terrain::{RidgedMultifractalParams, Stroke, Terrain, TerrainParams};

/// Renderer stand-in that counts submissions instead of touching a GPU.
#[derive(Default)]
struct CountingRenderer {
    uploads: u64,
    releases: u64,
    draws: u64,
}

impl TileRenderer for CountingRenderer {
    fn upload_tile(&mut self, _geometry: &TileGeometry) {
        self.uploads += 1;
    }

    fn release_tile(&mut self, _key: TileKey) {
        self.releases += 1;
    }

    fn draw_tile(&mut self, _geometry: &TileGeometry) {
        self.draws += 1;
    }
}

fn build_terrain(seed: u32) -> Arc<Terrain> {
    let mut terrain = Terrain::new(TerrainParams::default());
    terrain.add_stroke(Stroke::ridged_multifractal(RidgedMultifractalParams {
        seed,
        ..Default::default()
    }));
    Arc::new(terrain)
}

/// Camera eye for a descent from orbit to low altitude over the +Z face.
fn descent_eye(surface_radius: f64, progress: f64) -> DVec3 {
    // Ease from seven radii out down to 0.1 units above the surface.
    let start_altitude = surface_radius * 7.0;
    let end_altitude = 0.1;
    let t = progress.clamp(0.0, 1.0);
    // Exponential descent reads naturally: half the remaining altitude
    // roughly every tenth of the flight.
    let altitude = start_altitude * (end_altitude / start_altitude).powf(t);
    DVec3::new(0.0, 0.0, surface_radius + altitude)
}

fn main() {
    let args = DemoArgs::parse();
    tellus_log::init_logging(args.log.as_deref());

    let settings_path = args.settings_path();
    let mut settings = Settings::load_or_default(&settings_path);
    let threshold = args
        .draw_error_threshold
        .unwrap_or_else(|| settings.get_f64(DRAW_ERROR_THRESHOLD_KEY, 15.0));

    let terrain = build_terrain(args.seed);
    let surface_radius = terrain.params().surface_radius;
    info!(
        seed = args.seed,
        surface_radius,
        threshold,
        workers = args.workers,
        "starting tessellation demo"
    );

    let mut session = TerrainSession::new(
        terrain,
        SessionParams {
            worker_count: args.workers,
            config: TessellationConfig {
                draw_error_threshold: threshold,
                ..Default::default()
            },
            ..Default::default()
        },
    );
    let mut renderer = CountingRenderer::default();

    for frame in 0..args.frames {
        let progress = frame as f64 / args.frames.max(1) as f64;
        let view = ViewParams::with_eye(descent_eye(surface_radius, progress));

        let stats = session.update(&view, &mut renderer);
        session.render(&mut renderer);

        if frame % 30 == 0 || frame + 1 == args.frames {
            let generation = session.progress();
            let altitude = view.eye.length() - surface_radius;
            info!(
                frame,
                altitude,
                drawn = stats.drawn_tiles,
                resident = session.pool().resident_count(),
                pending = generation.pending,
                generated = generation.completed,
                splits = stats.splits,
                merges = stats.merges,
                "frame"
            );
        }

        std::thread::sleep(std::time::Duration::from_millis(2));
    }

    session.shutdown();

    info!(
        uploads = renderer.uploads,
        releases = renderer.releases,
        draws = renderer.draws,
        "flight complete"
    );

    settings.set_f64(DRAW_ERROR_THRESHOLD_KEY, session.draw_error_threshold());
    match settings.save(&settings_path) {
        Ok(()) => info!(path = %settings_path.display(), "settings saved"),
        Err(error) => tracing::warn!(%error, "could not save settings"),
    }
}
