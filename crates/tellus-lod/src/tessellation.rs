//! The LOD controller: six per-face quadtrees split and merged against the
//! projected screen-space error, feeding tile generation jobs to the worker
//! pool and draining finished geometry back into the tile pool.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use tellus_cubesphere::{CubeFace, TileBounds, TileKey};
use tellus_mesh::TILE_RESOLUTION;
use tellus_pool::{FrameArena, PoolError, TilePool};
use tellus_task::{GpuTaskQueue, JobHandle, JobResult, TileJobScheduler, TileMeshSource};

use crate::{
    DrawEntry, GpuWork, TileNode, TileRenderer, TileState, ViewParams, sanitize_threshold,
    screen_space_error,
};

/// Tunables for the split/merge policy.
#[derive(Clone, Debug)]
pub struct TessellationConfig {
    /// Split when a tile's projected error exceeds this many pixels.
    pub draw_error_threshold: f64,
    /// Merge only below `draw_error_threshold * merge_ratio`; the gap is
    /// the hysteresis band that keeps tiles from oscillating at the
    /// threshold boundary.
    pub merge_ratio: f64,
    /// Deepest allowed subdivision level.
    pub max_depth: u8,
    /// Vertices per tile edge handed to the mesh source.
    pub grid_resolution: u32,
    /// Generation failures tolerated before a tile is abandoned.
    pub max_generation_retries: u32,
}

impl Default for TessellationConfig {
    fn default() -> Self {
        Self {
            draw_error_threshold: 15.0,
            merge_ratio: 0.5,
            max_depth: 12,
            grid_resolution: TILE_RESOLUTION,
            max_generation_retries: 3,
        }
    }
}

/// Counters for one update, reset every frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Nodes split this frame.
    pub splits: u32,
    /// Nodes merged (children collapsed) this frame.
    pub merges: u32,
    /// Splits skipped because the pool lacked capacity.
    pub deferred_splits: u32,
    /// Tiles admitted to the pool this frame.
    pub completed_tiles: u32,
    /// Results dropped because their node merged away or was superseded.
    pub discarded_results: u32,
    /// Generation failures observed this frame.
    pub failed_jobs: u32,
    /// Entries in this frame's draw list.
    pub drawn_tiles: u32,
}

/// The six-face planet quadtree and its job bookkeeping.
pub struct PlanetTessellation {
    roots: [TileNode; 6],
    config: TessellationConfig,
    source: Arc<dyn TileMeshSource>,
    surface_radius: f64,
    max_displacement: f64,
    in_flight: FxHashMap<TileKey, JobHandle>,
}

impl PlanetTessellation {
    /// Create the quadtree with all six roots in `Requested` state.
    ///
    /// `surface_radius` and `max_displacement` size the tile bounds used by
    /// the error metric; they come from the terrain the source samples.
    #[must_use]
    pub fn new(
        source: Arc<dyn TileMeshSource>,
        surface_radius: f64,
        max_displacement: f64,
        mut config: TessellationConfig,
    ) -> Self {
        config.draw_error_threshold = sanitize_threshold(config.draw_error_threshold);
        config.max_depth = config.max_depth.min(TileKey::MAX_LEVEL);
        Self {
            roots: CubeFace::ALL.map(|face| TileNode::new(TileKey::root(face), TileState::Requested)),
            config,
            source,
            surface_radius,
            max_displacement,
            in_flight: FxHashMap::default(),
        }
    }

    /// Current split threshold in pixels.
    #[must_use]
    pub fn draw_error_threshold(&self) -> f64 {
        self.config.draw_error_threshold
    }

    /// Replace the split threshold; invalid values are clamped.
    pub fn set_draw_error_threshold(&mut self, value: f64) {
        self.config.draw_error_threshold = sanitize_threshold(value);
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &TessellationConfig {
        &self.config
    }

    /// Visit every node of all six trees, faces in canonical order,
    /// depth-first within a face.
    pub fn visit_nodes(&self, mut f: impl FnMut(&TileNode)) {
        for root in &self.roots {
            root.visit(&mut f);
        }
    }

    /// One frame of LOD work. See the module doc for the phase order:
    /// join GPU work, apply completions, split/merge, build the draw list,
    /// kick GPU work.
    pub fn update(
        &mut self,
        view: &ViewParams,
        renderer: &mut dyn TileRenderer,
        scheduler: &mut TileJobScheduler,
        pool: &mut TilePool,
        gpu: &mut GpuTaskQueue<GpuWork>,
        arena: &mut FrameArena<DrawEntry>,
    ) -> FrameStats {
        let mut stats = FrameStats::default();

        // Last frame's kicked batch runs now, on the render thread.
        for work in gpu.join() {
            match work {
                GpuWork::Upload(tile) => {
                    if let Some(geometry) = pool.get(tile) {
                        renderer.upload_tile(geometry);
                        pool.mark_uploaded(tile);
                    }
                }
                GpuWork::Release(key) => renderer.release_tile(key),
            }
        }

        for result in scheduler.poll_completed() {
            self.apply_completion(result, pool, gpu, &mut stats);
        }

        let mut ctx = UpdateCtx {
            view,
            config: &self.config,
            source: &self.source,
            surface_radius: self.surface_radius,
            max_displacement: self.max_displacement,
            scheduler,
            pool,
            gpu,
            in_flight: &mut self.in_flight,
            stats: &mut stats,
        };
        for root in &mut self.roots {
            update_node(root, &mut ctx);
        }

        for root in &self.roots {
            collect_draw_list(root, pool, arena);
        }
        stats.drawn_tiles = arena.len() as u32;

        gpu.kick();
        stats
    }

    /// Route one drained job result to its node, or discard it if the node
    /// merged away or the job was superseded.
    fn apply_completion(
        &mut self,
        result: JobResult,
        pool: &mut TilePool,
        gpu: &mut GpuTaskQueue<GpuWork>,
        stats: &mut FrameStats,
    ) {
        let JobResult {
            handle,
            key,
            result,
        } = result;

        if self.in_flight.get(&key).copied() != Some(handle) {
            trace!(%key, "discarding superseded generation result");
            stats.discarded_results += 1;
            return;
        }
        self.in_flight.remove(&key);

        let Some(node) = self.roots[key.face.index()].find_mut(key) else {
            trace!(%key, "discarding result for merged-away tile");
            stats.discarded_results += 1;
            return;
        };
        if node.state != TileState::Generating {
            trace!(%key, state = ?node.state, "discarding result for non-generating node");
            stats.discarded_results += 1;
            return;
        }

        match result {
            Ok(geometry) => match pool.insert(geometry) {
                Ok(tile) => {
                    node.geometry = Some(tile);
                    node.state = TileState::Resident;
                    gpu.add(GpuWork::Upload(tile));
                    stats.completed_tiles += 1;
                }
                Err(PoolError::Exhausted { capacity }) => {
                    warn!(%key, capacity, "tile pool exhausted, deferring admission");
                    node.state = TileState::Requested;
                }
            },
            Err(error) => {
                stats.failed_jobs += 1;
                node.failures += 1;
                if node.failures >= self.config.max_generation_retries {
                    warn!(
                        %key,
                        failures = node.failures,
                        %error,
                        "tile generation abandoned after repeated failures"
                    );
                    node.abandoned = true;
                    node.state = TileState::Unloaded;
                } else {
                    debug!(%key, failures = node.failures, %error, "tile generation failed, retrying");
                    node.state = TileState::Requested;
                }
            }
        }
    }
}

struct UpdateCtx<'a> {
    view: &'a ViewParams,
    config: &'a TessellationConfig,
    source: &'a Arc<dyn TileMeshSource>,
    surface_radius: f64,
    max_displacement: f64,
    scheduler: &'a mut TileJobScheduler,
    pool: &'a mut TilePool,
    gpu: &'a mut GpuTaskQueue<GpuWork>,
    in_flight: &'a mut FxHashMap<TileKey, JobHandle>,
    stats: &'a mut FrameStats,
}

/// Depth-first split/merge walk of one subtree. Children are visited in
/// fixed slot order, so identical camera input reproduces identical
/// decisions.
fn update_node(node: &mut TileNode, ctx: &mut UpdateCtx<'_>) {
    if node.abandoned {
        return;
    }

    if node.state == TileState::Requested && node.is_leaf() {
        try_submit(node, ctx);
    }

    let bounds = TileBounds::from_key(&node.key, ctx.surface_radius, ctx.max_displacement);
    let error = screen_space_error(&bounds, ctx.config.grid_resolution, ctx.view);
    let split_threshold = ctx.config.draw_error_threshold;
    let merge_threshold = split_threshold * ctx.config.merge_ratio;

    if node.is_leaf() {
        let drawable = node.geometry.is_some_and(|tile| ctx.pool.is_uploaded(tile));
        if node.state == TileState::Resident
            && drawable
            && error > split_threshold
            && node.key.level < ctx.config.max_depth
        {
            if ctx.pool.available() >= 4 {
                split(node, ctx);
                if let Some(children) = node.children.as_mut() {
                    for child in children.iter_mut() {
                        update_node(child, ctx);
                    }
                }
            } else {
                trace!(key = %node.key, "split deferred, tile pool near capacity");
                ctx.stats.deferred_splits += 1;
            }
        }
    } else if error < merge_threshold
        && node
            .children
            .as_ref()
            .is_some_and(|children| children.iter().all(TileNode::is_leaf))
    {
        collapse(node, ctx);
    } else {
        if node.state == TileState::Splitting {
            let complete = node
                .children
                .as_ref()
                .is_some_and(|children| children.iter().all(|child| child.geometry.is_some()));
            if complete {
                node.state = TileState::Resident;
            }
        }
        if let Some(children) = node.children.as_mut() {
            for child in children.iter_mut() {
                update_node(child, ctx);
            }
        }
    }
}

/// Submit a `Requested` leaf exactly once, backing off while the pool has
/// no room for the result.
fn try_submit(node: &mut TileNode, ctx: &mut UpdateCtx<'_>) {
    if ctx.in_flight.contains_key(&node.key) || ctx.pool.available() == 0 {
        return;
    }
    let handle = ctx.scheduler.submit(node.key, ctx.source.clone());
    ctx.in_flight.insert(node.key, handle);
    node.state = TileState::Generating;
    trace!(key = %node.key, "generation job submitted");
}

/// Create four `Requested` children; the parent keeps showing its geometry
/// until they all arrive.
fn split(node: &mut TileNode, ctx: &mut UpdateCtx<'_>) {
    let Some(child_keys) = node.key.children() else {
        return;
    };
    node.state = TileState::Splitting;
    node.children = Some(Box::new(
        child_keys.map(|key| TileNode::new(key, TileState::Requested)),
    ));
    ctx.stats.splits += 1;
    debug!(key = %node.key, "split");
}

/// Collapse the four children back into this node: their geometry returns
/// to the pool free list and still-running jobs are orphaned so their
/// results get discarded on arrival.
fn collapse(node: &mut TileNode, ctx: &mut UpdateCtx<'_>) {
    node.state = TileState::Merging;
    if let Some(children) = node.children.take() {
        for child in children.iter() {
            ctx.in_flight.remove(&child.key);
            if let Some(tile) = child.geometry {
                if ctx.pool.release(tile) {
                    ctx.gpu.add(GpuWork::Release(child.key));
                }
            }
        }
    }
    node.state = TileState::Resident;
    ctx.stats.merges += 1;
    debug!(key = %node.key, "merge");
}

/// Whether every leaf under `node` can be drawn right now.
fn subtree_drawable(node: &TileNode, pool: &TilePool) -> bool {
    match &node.children {
        None => node.geometry.is_some_and(|tile| pool.is_uploaded(tile)),
        Some(children) => children.iter().all(|child| subtree_drawable(child, pool)),
    }
}

/// Crack-free draw list: an interior node descends only when its whole
/// subtree is drawable, otherwise its own retained geometry covers the
/// region. A tile and its ancestor never appear together.
fn collect_draw_list(node: &TileNode, pool: &TilePool, arena: &mut FrameArena<DrawEntry>) {
    let own_tile = node
        .geometry
        .filter(|&tile| pool.is_uploaded(tile));
    match &node.children {
        None => {
            if let Some(tile) = own_tile {
                arena.push(DrawEntry {
                    key: node.key,
                    tile,
                });
            }
        }
        Some(children) => {
            if children.iter().all(|child| subtree_drawable(child, pool)) {
                for child in children.iter() {
                    collect_draw_list(child, pool, arena);
                }
            } else if let Some(tile) = own_tile {
                arena.push(DrawEntry {
                    key: node.key,
                    tile,
                });
            }
        }
    }
}
