/// Stable identity of a learned feature.
///
/// Ids are unique and stable across reloads of the same model. They are
/// dense but not guaranteed contiguous, so they must never be used as array
/// positions; see `store::FeatureStore` for the index mapping.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureId(pub u32);

impl FeatureId {
    pub fn new(n: u32) -> Self {
        FeatureId(n)
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
