//! Frame-synchronized staging queue for GPU-affecting work.
//!
//! Worker threads never touch GPU objects; anything that must run on the
//! render thread (buffer creation for freshly generated tiles, releases
//! after a merge) is staged here. `kick` publishes the batch accumulated
//! this frame; `join` hands back the batch kicked *last* frame for
//! execution, giving uploads a deterministic one-frame latency that never
//! stalls the current frame's CPU work.

/// Double-buffered per-frame task queue.
///
/// Call order is `join` then `kick`, once each per frame; the queue asserts
/// this.
pub struct GpuTaskQueue<T> {
    staged: Vec<T>,
    in_flight: Vec<T>,
    joined_this_frame: bool,
}

impl<T> GpuTaskQueue<T> {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            staged: Vec::new(),
            in_flight: Vec::new(),
            joined_this_frame: false,
        }
    }

    /// Stage one task for the batch kicked at the end of this frame.
    pub fn add(&mut self, task: T) {
        self.staged.push(task);
    }

    /// Take the batch kicked last frame for execution on the render thread.
    ///
    /// # Panics
    ///
    /// Panics if called twice without an intervening [`kick`](Self::kick).
    pub fn join(&mut self) -> Vec<T> {
        assert!(
            !self.joined_this_frame,
            "GpuTaskQueue::join called twice in one frame"
        );
        self.joined_this_frame = true;
        std::mem::take(&mut self.in_flight)
    }

    /// Publish everything staged since the last kick as the next frame's
    /// in-flight batch.
    ///
    /// # Panics
    ///
    /// Panics unless [`join`](Self::join) ran earlier this frame.
    pub fn kick(&mut self) {
        assert!(
            self.joined_this_frame,
            "GpuTaskQueue::kick requires join earlier in the frame"
        );
        debug_assert!(
            self.in_flight.is_empty(),
            "previous batch must be taken by join before kicking"
        );
        self.in_flight = std::mem::take(&mut self.staged);
        self.joined_this_frame = false;
    }

    /// Number of tasks staged for the next kick.
    #[must_use]
    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    /// Number of tasks in the kicked, not-yet-joined batch.
    #[must_use]
    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }
}

impl<T> Default for GpuTaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tasks_arrive_one_frame_late() {
        let mut queue = GpuTaskQueue::new();

        // Frame 1: stage a task. Nothing was kicked before, so join is empty.
        assert!(queue.join().is_empty());
        queue.add(7u32);
        queue.kick();

        // Frame 2: last frame's batch surfaces.
        let batch = queue.join();
        assert_eq!(batch, vec![7]);
        queue.kick();

        // Frame 3: nothing new.
        assert!(queue.join().is_empty());
        queue.kick();
    }

    #[test]
    fn test_batches_do_not_mix() {
        let mut queue = GpuTaskQueue::new();

        assert!(queue.join().is_empty());
        queue.add(1);
        queue.add(2);
        queue.kick();

        queue.add(3); // staged during frame 2
        let batch = queue.join();
        assert_eq!(batch, vec![1, 2]);
        queue.kick();

        let batch = queue.join();
        assert_eq!(batch, vec![3]);
        queue.kick();
    }

    #[test]
    fn test_counters_track_both_buffers() {
        let mut queue = GpuTaskQueue::new();
        assert!(queue.join().is_empty());
        queue.add("a");
        queue.add("b");
        assert_eq!(queue.staged_len(), 2);
        assert_eq!(queue.in_flight_len(), 0);
        queue.kick();
        assert_eq!(queue.staged_len(), 0);
        assert_eq!(queue.in_flight_len(), 2);
    }

    #[test]
    #[should_panic(expected = "join called twice")]
    fn test_double_join_panics() {
        let mut queue: GpuTaskQueue<u32> = GpuTaskQueue::new();
        let _ = queue.join();
        let _ = queue.join();
    }

    #[test]
    #[should_panic(expected = "requires join")]
    fn test_kick_without_join_panics() {
        let mut queue: GpuTaskQueue<u32> = GpuTaskQueue::new();
        queue.kick();
    }
}
