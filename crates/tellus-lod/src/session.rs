//! The terrain session: single owner of the quadtree, the worker pool, the
//! GPU staging queue, the frame arena, and the tile pool.
//!
//! Field declaration order doubles as teardown order: the tessellation goes
//! first, the scheduler then joins its workers (draining in-flight jobs),
//! and the pool that backs all tile geometry is destroyed last. No manual
//! destroy-order discipline is needed anywhere else.

use std::sync::Arc;

use tellus_pool::{FrameArena, TilePool};
use tellus_task::{
    GenerationProgress, GpuTaskQueue, TerrainTileSource, TileJobScheduler, TileMeshSource,
};
use tellus_terrain::Terrain;

use crate::{
    DrawEntry, FrameStats, GpuWork, PlanetTessellation, TessellationConfig, TileRenderer,
    ViewParams,
};

/// Construction parameters for a session.
#[derive(Clone, Debug)]
pub struct SessionParams {
    /// Worker threads for tile generation.
    pub worker_count: usize,
    /// Tile pool slots. Bounds resident geometry; splits back off when the
    /// pool runs dry.
    pub pool_capacity: usize,
    /// Split/merge tunables.
    pub config: TessellationConfig,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            worker_count: 3,
            pool_capacity: 2048,
            config: TessellationConfig::default(),
        }
    }
}

/// Owns the whole tessellation stack for one planet.
pub struct TerrainSession {
    // Declaration order is drop order: quadtree, then workers, then the
    // pool its geometry lives in.
    tessellation: PlanetTessellation,
    scheduler: TileJobScheduler,
    gpu_tasks: GpuTaskQueue<GpuWork>,
    arena: FrameArena<DrawEntry>,
    pool: TilePool,
}

impl TerrainSession {
    /// Create a session over a terrain, generating tiles at the configured
    /// grid resolution.
    #[must_use]
    pub fn new(terrain: Arc<Terrain>, params: SessionParams) -> Self {
        let surface_radius = terrain.params().surface_radius;
        let max_displacement = terrain.max_displacement();
        let source = Arc::new(TerrainTileSource::new(
            terrain,
            params.config.grid_resolution,
        ));
        Self::with_source(source, surface_radius, max_displacement, params)
    }

    /// Create a session over an arbitrary mesh source (procedural variants,
    /// test doubles).
    #[must_use]
    pub fn with_source(
        source: Arc<dyn TileMeshSource>,
        surface_radius: f64,
        max_displacement: f64,
        params: SessionParams,
    ) -> Self {
        Self {
            tessellation: PlanetTessellation::new(
                source,
                surface_radius,
                max_displacement,
                params.config,
            ),
            scheduler: TileJobScheduler::new(params.worker_count),
            gpu_tasks: GpuTaskQueue::new(),
            arena: FrameArena::new(),
            pool: TilePool::with_capacity(params.pool_capacity),
        }
    }

    /// Run one frame of LOD work and rebuild the draw list. The renderer
    /// receives upload/release calls for the GPU batch that joined this
    /// frame; draw submissions happen separately in [`render`](Self::render).
    pub fn update(&mut self, view: &ViewParams, renderer: &mut dyn TileRenderer) -> FrameStats {
        self.arena.begin_frame();
        self.tessellation.update(
            view,
            renderer,
            &mut self.scheduler,
            &mut self.pool,
            &mut self.gpu_tasks,
            &mut self.arena,
        )
    }

    /// Issue one draw submission per entry of this frame's draw list. No
    /// decision logic lives here.
    pub fn render(&self, renderer: &mut dyn TileRenderer) {
        for entry in self.arena.entries() {
            if let Some(geometry) = self.pool.get(entry.tile) {
                renderer.draw_tile(geometry);
            }
        }
    }

    /// This frame's draw list, valid until the next update.
    #[must_use]
    pub fn draw_list(&self) -> &[DrawEntry] {
        self.arena.entries()
    }

    /// Generation pipeline counters for the progress display.
    #[must_use]
    pub fn progress(&self) -> GenerationProgress {
        self.scheduler.progress()
    }

    /// Read access to the quadtree (diagnostics, tests).
    #[must_use]
    pub fn tessellation(&self) -> &PlanetTessellation {
        &self.tessellation
    }

    /// Read access to the tile pool (capacity/occupancy stats).
    #[must_use]
    pub fn pool(&self) -> &TilePool {
        &self.pool
    }

    /// Current draw-error threshold in pixels.
    #[must_use]
    pub fn draw_error_threshold(&self) -> f64 {
        self.tessellation.draw_error_threshold()
    }

    /// Update the draw-error threshold; invalid values are clamped.
    pub fn set_draw_error_threshold(&mut self, value: f64) {
        self.tessellation.set_draw_error_threshold(value);
    }

    /// Join the worker pool. Runs implicitly on drop; explicit shutdown
    /// lets callers sequence it before saving settings on exit.
    pub fn shutdown(&mut self) {
        self.scheduler.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use glam::DVec3;
    use tellus_cubesphere::{TileKey, face_coord_to_sphere};
    use tellus_mesh::TileGeometry;
    use tellus_task::JobError;
    use tellus_terrain::{RidgedMultifractalParams, Stroke, TerrainParams};

    use crate::{NullRenderer, TileState};

    const RADIUS: f64 = 6000.0;

    fn test_terrain() -> Arc<Terrain> {
        let mut terrain = Terrain::new(TerrainParams::default());
        terrain.add_stroke(Stroke::ridged_multifractal(RidgedMultifractalParams {
            octaves: 4,
            ..Default::default()
        }));
        Arc::new(terrain)
    }

    fn test_params(max_depth: u8) -> SessionParams {
        SessionParams {
            worker_count: 3,
            pool_capacity: 4096,
            config: TessellationConfig {
                max_depth,
                grid_resolution: 5,
                ..Default::default()
            },
        }
    }

    /// Drive updates until the pipeline is quiescent (no pending jobs, no
    /// splits/merges/completions) for a few consecutive frames.
    fn settle(
        session: &mut TerrainSession,
        view: &ViewParams,
        renderer: &mut dyn TileRenderer,
        max_frames: usize,
    ) -> bool {
        let mut quiet = 0;
        for _ in 0..max_frames {
            let stats = session.update(view, renderer);
            let busy = session.progress().pending > 0
                || stats.splits > 0
                || stats.merges > 0
                || stats.completed_tiles > 0
                || stats.failed_jobs > 0;
            if busy {
                quiet = 0;
                std::thread::sleep(Duration::from_millis(1));
            } else {
                quiet += 1;
                if quiet >= 3 {
                    return true;
                }
            }
        }
        false
    }

    fn drawn_keys(session: &TerrainSession) -> Vec<TileKey> {
        session.draw_list().iter().map(|e| e.key).collect()
    }

    fn assert_crack_free(session: &TerrainSession) {
        let drawn: HashSet<TileKey> = drawn_keys(session).into_iter().collect();
        for key in &drawn {
            let mut walk = *key;
            while let Some(parent) = walk.parent() {
                assert!(
                    !drawn.contains(&parent),
                    "tile {key} drawn together with its ancestor {parent}"
                );
                walk = parent;
            }
        }
    }

    fn assert_tree_invariants(session: &TerrainSession) {
        session.tessellation().visit_nodes(|node| {
            if !node.is_leaf() {
                assert!(
                    node.geometry.is_some(),
                    "interior node {} must retain its geometry",
                    node.key
                );
            }
            if node.abandoned {
                assert_eq!(node.state, TileState::Unloaded);
            }
        });
    }

    /// Scenario A: a camera far from the planet converges to exactly the
    /// six root faces.
    #[test]
    fn test_far_camera_converges_to_six_roots() {
        let mut session = TerrainSession::new(test_terrain(), test_params(8));
        let view = ViewParams::with_eye(DVec3::new(0.0, 0.0, RADIUS * 200.0));
        let mut renderer = NullRenderer;

        assert!(settle(&mut session, &view, &mut renderer, 300));

        let keys = drawn_keys(&session);
        assert_eq!(keys.len(), 6, "expected the six root tiles, got {keys:?}");
        assert!(keys.iter().all(|k| k.level == 0));
        assert_tree_invariants(&session);
    }

    /// Scenario B: a camera at the surface forces max-depth splits under
    /// its footprint while the far side of the planet stays coarse.
    #[test]
    fn test_surface_camera_refines_under_footprint() {
        let max_depth = 5;
        let mut session = TerrainSession::new(test_terrain(), test_params(max_depth));
        let view = ViewParams::with_eye(DVec3::new(0.0, 0.0, RADIUS + 0.1));
        let mut renderer = NullRenderer;

        assert!(
            settle(&mut session, &view, &mut renderer, 800),
            "refinement should finish within a bounded number of frames"
        );
        assert_crack_free(&session);
        assert_tree_invariants(&session);

        let mut deepest_under_camera = 0;
        let mut deepest_far_side = 0;
        for key in drawn_keys(&session) {
            let dir = face_coord_to_sphere(&key.center());
            if dir.z > 0.9 {
                deepest_under_camera = deepest_under_camera.max(key.level);
            }
            if dir.z < -0.5 {
                deepest_far_side = deepest_far_side.max(key.level);
            }
        }
        assert_eq!(
            deepest_under_camera, max_depth,
            "tiles under the camera should reach max depth"
        );
        assert!(
            deepest_far_side < max_depth,
            "the far side should stay coarser than max depth, got {deepest_far_side}"
        );
    }

    /// The crack-free invariant holds on every intermediate frame, not
    /// just at quiescence.
    #[test]
    fn test_no_double_draw_during_refinement() {
        let mut session = TerrainSession::new(test_terrain(), test_params(4));
        let view = ViewParams::with_eye(DVec3::new(0.0, 0.0, RADIUS * 1.5));
        let mut renderer = NullRenderer;

        for _ in 0..200 {
            session.update(&view, &mut renderer);
            assert_crack_free(&session);
            assert_tree_invariants(&session);
            if session.progress().pending == 0 && session.draw_list().len() > 6 {
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    /// Scenario C: a transient failure is retried within the bound and the
    /// tile still becomes resident.
    #[test]
    fn test_transient_failure_is_retried() {
        struct FlakySource {
            inner: TerrainTileSource,
            failures_left: AtomicU32,
        }
        impl TileMeshSource for FlakySource {
            fn generate(&self, key: TileKey) -> Result<TileGeometry, JobError> {
                if self
                    .failures_left
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                        left.checked_sub(1)
                    })
                    .is_ok()
                {
                    return Err(JobError::Failed("transient".into()));
                }
                self.inner.generate(key)
            }
        }

        let terrain = test_terrain();
        let params = test_params(4);
        let source = Arc::new(FlakySource {
            inner: TerrainTileSource::new(terrain.clone(), params.config.grid_resolution),
            failures_left: AtomicU32::new(2),
        });
        let mut session = TerrainSession::with_source(
            source,
            terrain.params().surface_radius,
            terrain.max_displacement(),
            params,
        );
        let view = ViewParams::with_eye(DVec3::new(0.0, 0.0, RADIUS * 200.0));
        let mut renderer = NullRenderer;

        assert!(settle(&mut session, &view, &mut renderer, 300));

        assert_eq!(drawn_keys(&session).len(), 6, "all roots should recover");
        let mut total_failures = 0;
        session.tessellation().visit_nodes(|node| {
            total_failures += node.failures;
            assert!(!node.abandoned);
            assert!(node.failures < session.tessellation().config().max_generation_retries);
        });
        assert_eq!(total_failures, 2);
    }

    /// A tile that keeps failing is abandoned after the retry bound and the
    /// planet degrades silently instead of crashing.
    #[test]
    fn test_permanent_failure_abandons_tile() {
        struct BrokenSource;
        impl TileMeshSource for BrokenSource {
            fn generate(&self, _key: TileKey) -> Result<TileGeometry, JobError> {
                Err(JobError::Failed("no geometry today".into()))
            }
        }

        let mut session =
            TerrainSession::with_source(Arc::new(BrokenSource), RADIUS, 0.0, test_params(4));
        let view = ViewParams::with_eye(DVec3::new(0.0, 0.0, RADIUS * 200.0));
        let mut renderer = NullRenderer;

        assert!(settle(&mut session, &view, &mut renderer, 300));

        assert!(session.draw_list().is_empty());
        let retries = session.tessellation().config().max_generation_retries;
        session.tessellation().visit_nodes(|node| {
            assert!(node.abandoned);
            assert_eq!(node.state, TileState::Unloaded);
            assert_eq!(node.failures, retries);
        });
        assert_eq!(session.progress().pending, 0);
    }

    /// Scenario D: with the pool at capacity, split requests are deferred
    /// without disturbing resident tiles.
    #[test]
    fn test_full_pool_defers_splits() {
        let mut params = test_params(6);
        params.pool_capacity = 6;
        let mut session = TerrainSession::new(test_terrain(), params);
        let view = ViewParams::with_eye(DVec3::new(0.0, 0.0, RADIUS * 1.2));
        let mut renderer = NullRenderer;

        let mut deferred = 0;
        for _ in 0..150 {
            let stats = session.update(&view, &mut renderer);
            deferred += stats.deferred_splits;
            std::thread::sleep(Duration::from_millis(1));
            if deferred > 0 && session.progress().pending == 0 {
                break;
            }
        }

        assert!(deferred > 0, "splits should be deferred while the pool is full");
        assert_eq!(session.pool().available(), 0);
        let keys = drawn_keys(&session);
        assert_eq!(keys.len(), 6, "resident root tiles must be unaffected");
        assert!(keys.iter().all(|k| k.level == 0));
        assert_crack_free(&session);
    }

    /// Merging releases pool slots and re-splitting reproduces the same
    /// geometry: the procedural field has no hidden state.
    #[test]
    fn test_merge_then_resplit_reproduces_geometry() {
        #[derive(Default)]
        struct RecordingRenderer {
            uploads: Vec<(TileKey, [f32; 3])>,
            releases: Vec<TileKey>,
        }
        impl TileRenderer for RecordingRenderer {
            fn upload_tile(&mut self, geometry: &TileGeometry) {
                self.uploads
                    .push((geometry.key, geometry.vertices[0].position));
            }
            fn release_tile(&mut self, key: TileKey) {
                self.releases.push(key);
            }
            fn draw_tile(&mut self, _geometry: &TileGeometry) {}
        }

        let mut session = TerrainSession::new(test_terrain(), test_params(2));
        let mut renderer = RecordingRenderer::default();
        let near = ViewParams::with_eye(DVec3::new(0.0, 0.0, RADIUS * 1.5));
        let far = ViewParams::with_eye(DVec3::new(0.0, 0.0, RADIUS * 200.0));

        assert!(settle(&mut session, &near, &mut renderer, 400));
        let resident_near = session.pool().resident_count();
        assert!(resident_near > 6, "the near camera should have split tiles");

        assert!(settle(&mut session, &far, &mut renderer, 400));
        assert!(
            !renderer.releases.is_empty(),
            "merging should release child tiles"
        );
        assert_eq!(drawn_keys(&session).len(), 6);
        assert!(
            session.pool().resident_count() < resident_near,
            "merges should return slots to the pool"
        );

        assert!(settle(&mut session, &near, &mut renderer, 400));

        let mut first_upload: HashMap<TileKey, [f32; 3]> = HashMap::new();
        let mut reuploaded = 0;
        for (key, vertex) in &renderer.uploads {
            if let Some(previous) = first_upload.get(key) {
                assert_eq!(
                    previous, vertex,
                    "re-split tile {key} must regenerate identical geometry"
                );
                reuploaded += 1;
            } else {
                first_upload.insert(*key, *vertex);
            }
        }
        assert!(reuploaded > 0, "some tiles should have been regenerated");
    }

    /// Identical camera schedules produce identical draw lists, including
    /// order, once each pose has settled.
    #[test]
    fn test_identical_camera_schedules_are_deterministic() {
        let schedule = [
            DVec3::new(0.0, 0.0, RADIUS * 200.0),
            DVec3::new(0.0, 0.0, RADIUS * 2.5),
            DVec3::new(RADIUS * 2.5, 0.0, 0.0),
            DVec3::new(0.0, 0.0, RADIUS * 200.0),
        ];

        let run = || {
            let mut session = TerrainSession::new(test_terrain(), test_params(4));
            let mut renderer = NullRenderer;
            let mut lists = Vec::new();
            for eye in schedule {
                let view = ViewParams::with_eye(eye);
                assert!(settle(&mut session, &view, &mut renderer, 600));
                lists.push(drawn_keys(&session));
            }
            lists
        };

        let first = run();
        let second = run();
        assert_eq!(first, second);
        assert_eq!(first.last().map(Vec::len), Some(6));
    }

    /// The progress counters feed the UI: pending rises on submission and
    /// returns to zero at quiescence.
    #[test]
    fn test_progress_reports_pipeline_activity() {
        let mut session = TerrainSession::new(test_terrain(), test_params(3));
        let view = ViewParams::with_eye(DVec3::new(0.0, 0.0, RADIUS * 200.0));
        let mut renderer = NullRenderer;

        session.update(&view, &mut renderer);
        let progress = session.progress();
        assert_eq!(progress.submitted, 6, "six roots submit on the first frame");

        assert!(settle(&mut session, &view, &mut renderer, 300));
        let progress = session.progress();
        assert_eq!(progress.pending, 0);
        assert_eq!(progress.submitted, progress.completed);
    }

    /// Threshold updates flow through the session, with clamping.
    #[test]
    fn test_threshold_round_trip_and_clamp() {
        let mut session = TerrainSession::new(test_terrain(), test_params(3));
        assert_eq!(session.draw_error_threshold(), 15.0);

        session.set_draw_error_threshold(30.0);
        assert_eq!(session.draw_error_threshold(), 30.0);

        session.set_draw_error_threshold(f64::NAN);
        assert_eq!(
            session.draw_error_threshold(),
            crate::MIN_DRAW_ERROR_THRESHOLD
        );
    }

    /// Explicit shutdown drains workers; drop after shutdown is safe.
    #[test]
    fn test_shutdown_then_drop() {
        let mut session = TerrainSession::new(test_terrain(), test_params(3));
        let view = ViewParams::with_eye(DVec3::new(0.0, 0.0, RADIUS * 200.0));
        let mut renderer = NullRenderer;
        session.update(&view, &mut renderer);
        session.shutdown();
        drop(session);
    }
}
