use std::collections::BTreeMap;

use foundation::ids::FeatureId;

use crate::feature::FeatureRecord;

/// Decoded feature table for the active model.
///
/// Ordering contract:
/// - `records()` preserves file order for the lifetime of the store, and
///   that order IS the visualization's index space: `points[i]` rendered by
///   the scatter widget corresponds to `records()[i]`.
/// - Cross-referencing between components uses `FeatureId` only; positional
///   indices never leave the store/widget boundary unmapped.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FeatureStore {
    records: Vec<FeatureRecord>,
    index_by_id: BTreeMap<FeatureId, usize>,
}

impl FeatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from records in file order.
    ///
    /// If an id occurs more than once, the first occurrence wins for id
    /// lookups; iteration order is untouched.
    pub fn from_records(records: Vec<FeatureRecord>) -> Self {
        let mut index_by_id = BTreeMap::new();
        for (i, r) in records.iter().enumerate() {
            index_by_id.entry(r.id).or_insert(i);
        }
        Self {
            records,
            index_by_id,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[FeatureRecord] {
        &self.records
    }

    /// Index space -> identity space.
    pub fn feature_at(&self, index: usize) -> Option<&FeatureRecord> {
        self.records.get(index)
    }

    /// Identity space -> index space.
    pub fn index_of(&self, id: FeatureId) -> Option<usize> {
        self.index_by_id.get(&id).copied()
    }

    pub fn get(&self, id: FeatureId) -> Option<&FeatureRecord> {
        self.index_of(id).and_then(|i| self.records.get(i))
    }

    /// Rows for the scatter widget: `[top10_x, top10_y, order]` per feature,
    /// in index order.
    pub fn plot_points(&self) -> Vec<[f64; 3]> {
        self.records
            .iter()
            .map(|r| [r.top10_x, r.top10_y, r.order])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::FeatureStore;
    use crate::feature::FeatureRecord;
    use foundation::ids::FeatureId;

    fn record(id: u32, x: f64, y: f64) -> FeatureRecord {
        FeatureRecord {
            id: FeatureId(id),
            max_activation: 1.0,
            x,
            y,
            top10_x: x,
            top10_y: y,
            label: format!("feature {id}"),
            order: 0.5,
        }
    }

    #[test]
    fn index_and_identity_round_trip() {
        let store = FeatureStore::from_records(vec![
            record(5, 0.0, 0.0),
            record(9, 1.0, 0.0),
            record(12, 0.0, 1.0),
        ]);

        assert_eq!(store.len(), 3);
        assert_eq!(store.index_of(FeatureId(9)), Some(1));
        assert_eq!(store.feature_at(1).map(|r| r.id), Some(FeatureId(9)));
        assert_eq!(store.get(FeatureId(12)).map(|r| r.top10_y), Some(1.0));
        assert_eq!(store.index_of(FeatureId(7)), None);
        assert!(store.feature_at(3).is_none());
    }

    #[test]
    fn duplicate_ids_resolve_to_first_occurrence() {
        let store = FeatureStore::from_records(vec![record(5, 0.0, 0.0), record(5, 9.0, 9.0)]);
        assert_eq!(store.index_of(FeatureId(5)), Some(0));
        // Iteration order keeps both rows.
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn plot_points_follow_file_order() {
        let store = FeatureStore::from_records(vec![record(9, 1.0, 2.0), record(5, 3.0, 4.0)]);
        assert_eq!(store.plot_points(), vec![[1.0, 2.0, 0.5], [3.0, 4.0, 0.5]]);
    }

    #[test]
    fn empty_store_is_queryable() {
        let store = FeatureStore::new();
        assert!(store.is_empty());
        assert!(store.get(FeatureId(0)).is_none());
        assert!(store.plot_points().is_empty());
    }
}
