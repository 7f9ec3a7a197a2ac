use foundation::ids::FeatureId;
use store::FeatureStore;

/// Text search predicate for the feature select control.
///
/// A feature matches when its label contains the query case-insensitively,
/// or its decimal id contains the query as a substring. Results come back
/// in store order; an empty query matches the full universe.
pub fn filter_features(store: &FeatureStore, query: &str) -> Vec<FeatureId> {
    let needle = query.to_lowercase();
    store
        .records()
        .iter()
        .filter(|r| r.label.to_lowercase().contains(&needle) || r.id.to_string().contains(query))
        .map(|r| r.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::filter_features;
    use foundation::ids::FeatureId;
    use store::{FeatureRecord, FeatureStore};

    fn record(id: u32, label: &str) -> FeatureRecord {
        FeatureRecord {
            id: FeatureId(id),
            max_activation: 1.0,
            x: 0.0,
            y: 0.0,
            top10_x: 0.0,
            top10_y: 0.0,
            label: label.to_string(),
            order: 0.0,
        }
    }

    fn store() -> FeatureStore {
        FeatureStore::from_records(vec![
            record(5, "Prime numbers"),
            record(9, "chemical elements"),
            record(125, "weather phenomena"),
        ])
    }

    #[test]
    fn matches_label_case_insensitively() {
        let ids = filter_features(&store(), "prime");
        assert_eq!(ids, vec![FeatureId(5)]);
    }

    #[test]
    fn matches_id_substring() {
        let ids = filter_features(&store(), "12");
        assert_eq!(ids, vec![FeatureId(125)]);
    }

    #[test]
    fn empty_query_matches_everything_in_store_order() {
        let ids = filter_features(&store(), "");
        assert_eq!(ids, vec![FeatureId(5), FeatureId(9), FeatureId(125)]);
    }

    #[test]
    fn no_match_is_empty() {
        assert!(filter_features(&store(), "zzz").is_empty());
    }
}
