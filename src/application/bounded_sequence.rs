// Storage trait for bounded, append-only time-series buffers

/// Ordered FIFO buffer. Insertion order is chronological order; items are never
/// re-ordered and the oldest item is evicted first.
pub trait BoundedSequence<T>: Send {
    /// Append at the back, evicting from the front when at capacity
    fn append(&mut self, item: T);

    fn pop_front(&mut self) -> Option<T>;

    /// Oldest item
    fn front(&self) -> Option<&T>;

    /// Newest item
    fn back(&self) -> Option<&T>;

    fn to_vec(&self) -> Vec<T>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
