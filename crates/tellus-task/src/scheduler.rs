//! Fixed-size worker pool for asynchronous tile mesh generation.
//!
//! Workers pull jobs from a channel, run the mesh source, and push results
//! back through a completion channel drained once per frame on the main
//! thread. The completion channel is the only synchronization point; all
//! quadtree and pool mutation stays on the main thread.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::debug;

use tellus_cubesphere::TileKey;
use tellus_mesh::{TileGeometry, generate_tile_mesh};
use tellus_terrain::Terrain;

/// Anything that can produce tile geometry on a worker thread.
///
/// Implementations must be pure with respect to the key: the same key must
/// always yield the same geometry, and calls may run concurrently.
pub trait TileMeshSource: Send + Sync {
    /// Generate the mesh for one tile.
    fn generate(&self, key: TileKey) -> Result<TileGeometry, JobError>;
}

/// The production mesh source: an immutable terrain sampled at a fixed
/// grid resolution.
pub struct TerrainTileSource {
    terrain: Arc<Terrain>,
    resolution: u32,
}

impl TerrainTileSource {
    /// Wrap a terrain for worker-side generation at the given resolution.
    #[must_use]
    pub fn new(terrain: Arc<Terrain>, resolution: u32) -> Self {
        Self {
            terrain,
            resolution,
        }
    }
}

impl TileMeshSource for TerrainTileSource {
    fn generate(&self, key: TileKey) -> Result<TileGeometry, JobError> {
        Ok(generate_tile_mesh(&self.terrain, key, self.resolution))
    }
}

/// Why a job produced no geometry.
#[derive(Clone, Debug, thiserror::Error)]
pub enum JobError {
    /// The source reported a generation failure.
    #[error("tile generation failed: {0}")]
    Failed(String),
    /// The source panicked; caught at the scheduler boundary so a worker
    /// crash never takes down the frame loop.
    #[error("tile generation panicked: {0}")]
    Panicked(String),
}

/// Opaque identifier for a submitted job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct JobHandle(u64);

/// One drained completion.
pub struct JobResult {
    /// Handle returned by the matching `submit`.
    pub handle: JobHandle,
    /// The tile the job was generating.
    pub key: TileKey,
    /// Geometry, or the reason there is none.
    pub result: Result<TileGeometry, JobError>,
}

/// Read-only pipeline counters for the progress display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GenerationProgress {
    /// Jobs submitted but not yet drained.
    pub pending: usize,
    /// Jobs submitted over the scheduler's lifetime.
    pub submitted: u64,
    /// Jobs drained over the scheduler's lifetime.
    pub completed: u64,
}

struct JobRequest {
    handle: JobHandle,
    key: TileKey,
    source: Arc<dyn TileMeshSource>,
}

/// Worker count leaving headroom for the main/render thread.
#[must_use]
pub fn default_worker_count() -> usize {
    num_cpus::get().saturating_sub(2).max(1)
}

/// The fixed worker pool.
///
/// Completion order is first-finished, not submission order; callers must
/// not rely on FIFO delivery.
pub struct TileJobScheduler {
    task_sender: Option<Sender<JobRequest>>,
    result_receiver: Receiver<JobResult>,
    worker_handles: Vec<JoinHandle<()>>,
    pending: usize,
    next_handle: u64,
    submitted: u64,
    completed: u64,
}

impl TileJobScheduler {
    /// Spawn `worker_count` generation threads.
    #[must_use]
    pub fn new(worker_count: usize) -> Self {
        let (task_sender, task_receiver) = unbounded::<JobRequest>();
        let (result_sender, result_receiver) = unbounded::<JobResult>();

        let mut worker_handles = Vec::with_capacity(worker_count);
        for _ in 0..worker_count.max(1) {
            let receiver: Receiver<JobRequest> = task_receiver.clone();
            let sender = result_sender.clone();

            let handle = std::thread::Builder::new()
                .name("tile-gen-worker".into())
                .spawn(move || {
                    while let Ok(request) = receiver.recv() {
                        let outcome =
                            catch_unwind(AssertUnwindSafe(|| request.source.generate(request.key)));
                        let result = match outcome {
                            Ok(result) => result,
                            Err(payload) => Err(JobError::Panicked(panic_message(&payload))),
                        };
                        // A send failure means the scheduler is gone; the
                        // worker just drains out.
                        let _ = sender.send(JobResult {
                            handle: request.handle,
                            key: request.key,
                            result,
                        });
                    }
                })
                .expect("failed to spawn tile generation worker");
            worker_handles.push(handle);
        }

        Self {
            task_sender: Some(task_sender),
            result_receiver,
            worker_handles,
            pending: 0,
            next_handle: 0,
            submitted: 0,
            completed: 0,
        }
    }

    /// Queue one tile for generation.
    ///
    /// # Panics
    ///
    /// Panics if called after [`shutdown`](Self::shutdown); submission after
    /// shutdown is a caller contract violation.
    pub fn submit(&mut self, key: TileKey, source: Arc<dyn TileMeshSource>) -> JobHandle {
        let sender = self
            .task_sender
            .as_ref()
            .expect("submit called after scheduler shutdown");

        let handle = JobHandle(self.next_handle);
        self.next_handle += 1;
        self.submitted += 1;
        self.pending += 1;

        sender
            .send(JobRequest {
                handle,
                key,
                source,
            })
            .expect("worker channel closed while scheduler is live");
        handle
    }

    /// Drain every completion that has arrived since the last call.
    /// Never blocks.
    pub fn poll_completed(&mut self) -> Vec<JobResult> {
        let mut results = Vec::new();
        while let Ok(result) = self.result_receiver.try_recv() {
            self.pending -= 1;
            self.completed += 1;
            results.push(result);
        }
        results
    }

    /// Pipeline counters for the progress display. Never blocks.
    #[must_use]
    pub fn progress(&self) -> GenerationProgress {
        GenerationProgress {
            pending: self.pending,
            submitted: self.submitted,
            completed: self.completed,
        }
    }

    /// Number of worker threads in the pool.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.worker_handles.len()
    }

    /// Signal workers to drain and exit, then join them. Idempotent; also
    /// run from `Drop` so in-flight jobs are always drained before the data
    /// they reference is torn down.
    pub fn shutdown(&mut self) {
        if self.task_sender.take().is_none() {
            return;
        }
        debug!(workers = self.worker_handles.len(), "joining tile generation workers");
        for handle in self.worker_handles.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for TileJobScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "opaque panic payload".to_string()
    }
}
