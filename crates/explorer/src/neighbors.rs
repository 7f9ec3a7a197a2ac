use spatial::Quadtree;
use store::{FeatureRecord, FeatureStore};

/// Window half-width for neighbor queries in the plotted (top-10) embedding
/// space. The projection is normalized upstream, so a unit window is dense
/// enough to yield a full neighbor list everywhere but the sparsest fringe.
pub const DEFAULT_SEARCH_RADIUS: f64 = 1.0;

/// Thin façade over the quadtree for "similar features" lists.
///
/// The search window is fixed, never expanded: in sparse regions fewer than
/// `count` neighbors may come back.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NeighborService {
    pub search_radius: f64,
}

impl Default for NeighborService {
    fn default() -> Self {
        Self {
            search_radius: DEFAULT_SEARCH_RADIUS,
        }
    }
}

impl NeighborService {
    pub fn new(search_radius: f64) -> Self {
        Self { search_radius }
    }

    /// Up to `count` features nearest to `of`, ascending by distance,
    /// never including `of` itself.
    ///
    /// Queries `count + 1` hits to absorb the query point, then drops any
    /// hit sharing its id.
    pub fn neighbors(
        &self,
        store: &FeatureStore,
        tree: &Quadtree,
        of: &FeatureRecord,
        count: usize,
    ) -> Vec<FeatureRecord> {
        tree.find_nearest(of.plot_pos(), count + 1, self.search_radius)
            .into_iter()
            .filter_map(|hit| store.feature_at(hit.index))
            .filter(|r| r.id != of.id)
            .take(count)
            .cloned()
            .collect()
    }
}
