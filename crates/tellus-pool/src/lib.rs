//! Storage with explicit lifetimes: the persistent tile pool and the
//! per-frame arena.

mod frame_arena;
mod tile_pool;

pub use frame_arena::FrameArena;
pub use tile_pool::{PoolError, TilePool, TileRef};
