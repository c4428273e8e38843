//! Background tile generation: a fixed worker-thread pool producing tile
//! geometry, and a frame-synchronized staging queue for deferred GPU work.

mod gpu_queue;
mod scheduler;

pub use gpu_queue::GpuTaskQueue;
pub use scheduler::{
    GenerationProgress, JobError, JobHandle, JobResult, TerrainTileSource, TileJobScheduler,
    TileMeshSource, default_worker_count,
};
