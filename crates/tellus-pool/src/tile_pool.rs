//! Fixed-capacity storage for resident tile geometry.
//!
//! Slots are recycled through a free list; a released slot bumps its
//! generation counter so stale [`TileRef`]s read as absent instead of
//! aliasing a newer tile. The pool is mutated only on the main thread and
//! must outlive every structure holding refs into it; the owning session
//! guarantees this by declaration order.

use thiserror::Error;
use tracing::trace;

use tellus_mesh::TileGeometry;

/// Pool admission failure.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    /// Every slot is occupied. Fatal for the new tile only; resident tiles
    /// are untouched and the caller backs off until merges free slots.
    #[error("tile pool exhausted: all {capacity} slots in use")]
    Exhausted {
        /// Total slot count of the pool.
        capacity: usize,
    },
}

/// Non-owning reference to a pooled tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileRef {
    index: u32,
    generation: u32,
}

struct Slot {
    generation: u32,
    uploaded: bool,
    geometry: Option<TileGeometry>,
}

/// Fixed-capacity tile geometry allocator with a free list.
pub struct TilePool {
    slots: Vec<Slot>,
    free: Vec<u32>,
    resident_bytes: usize,
}

impl TilePool {
    /// Create a pool with `capacity` slots.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|_| Slot {
                generation: 0,
                uploaded: false,
                geometry: None,
            })
            .collect();
        Self {
            slots,
            free: (0..capacity as u32).rev().collect(),
            resident_bytes: 0,
        }
    }

    /// Total slot count.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Free slots remaining.
    #[must_use]
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Occupied slots.
    #[must_use]
    pub fn resident_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Bytes of vertex data currently resident.
    #[must_use]
    pub fn resident_bytes(&self) -> usize {
        self.resident_bytes
    }

    /// Admit geometry into a free slot.
    ///
    /// # Errors
    ///
    /// [`PoolError::Exhausted`] when no slot is free; the geometry is
    /// dropped by the caller and regenerated once capacity returns.
    pub fn insert(&mut self, geometry: TileGeometry) -> Result<TileRef, PoolError> {
        let Some(index) = self.free.pop() else {
            return Err(PoolError::Exhausted {
                capacity: self.slots.len(),
            });
        };
        let slot = &mut self.slots[index as usize];
        self.resident_bytes += geometry.vertex_bytes();
        slot.geometry = Some(geometry);
        slot.uploaded = false;
        trace!(slot = index, "tile admitted to pool");
        Ok(TileRef {
            index,
            generation: slot.generation,
        })
    }

    /// Geometry behind a ref, or `None` when the ref is stale or the slot
    /// was released.
    #[must_use]
    pub fn get(&self, tile: TileRef) -> Option<&TileGeometry> {
        let slot = self.slots.get(tile.index as usize)?;
        if slot.generation != tile.generation {
            return None;
        }
        slot.geometry.as_ref()
    }

    /// Return a slot to the free list. Stale refs are ignored. Returns
    /// whether a tile was actually released.
    pub fn release(&mut self, tile: TileRef) -> bool {
        let Some(slot) = self.slots.get_mut(tile.index as usize) else {
            return false;
        };
        if slot.generation != tile.generation || slot.geometry.is_none() {
            return false;
        }
        if let Some(geometry) = slot.geometry.take() {
            self.resident_bytes -= geometry.vertex_bytes();
        }
        slot.uploaded = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(tile.index);
        trace!(slot = tile.index, "tile released to free list");
        true
    }

    /// Record that the render thread has created GPU buffers for this tile.
    pub fn mark_uploaded(&mut self, tile: TileRef) {
        if let Some(slot) = self.slots.get_mut(tile.index as usize) {
            if slot.generation == tile.generation && slot.geometry.is_some() {
                slot.uploaded = true;
            }
        }
    }

    /// Whether the tile's GPU buffers exist (upload batch has joined).
    #[must_use]
    pub fn is_uploaded(&self, tile: TileRef) -> bool {
        self.slots
            .get(tile.index as usize)
            .is_some_and(|slot| slot.generation == tile.generation && slot.uploaded)
    }
}
