/// Lifecycle of one sample chunk in the cache.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResidencyState {
    /// Fetch and host-side decode in flight.
    Downloading,
    /// Decoded samples held in memory.
    Resident,
    /// Dropped to stay under budget, or invalidated by a version change.
    Evicted,
}
