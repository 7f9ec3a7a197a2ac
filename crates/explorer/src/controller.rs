use foundation::ids::FeatureId;
use spatial::{Item, Quadtree};
use store::{FeatureRecord, FeatureStore};

use crate::events::EventLog;
use crate::fragment::{parse_fragment, write_fragment};
use crate::neighbors::NeighborService;
use crate::state::SelectionState;
use crate::tooltip::{PanelSize, TooltipAnchor, derive_hover_tooltip};

/// Highlight overlays cap out at this many search matches.
pub const FILTER_LIMIT: usize = 100;

/// Length of the "similar features" list in the detail panel.
pub const NEIGHBOR_COUNT: usize = 10;

/// Single source of truth for explorer UI state.
///
/// Translates between the three coordinate systems in play:
/// - visualization index space (positional integers emitted by the scatter
///   widget),
/// - feature identity space (stable `FeatureId`s used everywhere else),
/// - serialized URL state (the shareable fragment).
///
/// All operations are synchronous and run to completion on the invoking
/// event; data loading happens elsewhere and lands here via `set_model`.
/// Lookup misses (unknown id, index out of range, stale fragment) degrade
/// to "no selection" or "no hover", never an error.
#[derive(Debug)]
pub struct ExplorerController {
    model: String,
    store: FeatureStore,
    tree: Quadtree,
    state: SelectionState,
    neighbors: Vec<FeatureRecord>,
    neighbor_service: NeighborService,
    events: EventLog,
}

impl ExplorerController {
    pub fn new(model: impl Into<String>, store: FeatureStore) -> Self {
        let model = model.into();
        let tree = build_index(&store);
        let fragment = write_fragment(&model, None);
        Self {
            model,
            store,
            tree,
            state: SelectionState::new(fragment),
            neighbors: Vec::new(),
            neighbor_service: NeighborService::default(),
            events: EventLog::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn store(&self) -> &FeatureStore {
        &self.store
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn selected_feature(&self) -> Option<&FeatureRecord> {
        self.state
            .selected_index
            .and_then(|i| self.store.feature_at(i))
    }

    pub fn hovered_feature(&self) -> Option<&FeatureRecord> {
        self.state
            .hovered_index
            .and_then(|i| self.store.feature_at(i))
    }

    /// Similar-features list for the current selection, nearest first.
    ///
    /// Recomputed only on selection change or model switch, never on hover
    /// or view updates.
    pub fn neighbors(&self) -> &[FeatureRecord] {
        &self.neighbors
    }

    pub fn events(&self) -> &[crate::events::Event] {
        self.events.events()
    }

    pub fn drain_events(&mut self) -> Vec<crate::events::Event> {
        self.events.drain()
    }

    /// Replaces the active model's data, tearing selection state down to
    /// defaults and rebuilding the spatial index.
    pub fn set_model(&mut self, model: impl Into<String>, store: FeatureStore) {
        self.model = model.into();
        self.tree = build_index(&store);
        self.store = store;
        self.neighbors.clear();
        self.state = SelectionState::new(write_fragment(&self.model, None));
        self.events.emit(
            self.state.revision,
            "model",
            format!("{} features loaded for {}", self.store.len(), self.model),
        );
    }

    /// Selection entry point for the scatter widget's `onSelect` callback.
    ///
    /// An out-of-bounds index clears the selection instead of erroring.
    /// Re-selecting the already selected index is a no-op.
    pub fn select_by_index(&mut self, index: usize) {
        let Some(record) = self.store.feature_at(index) else {
            self.clear_selection();
            return;
        };
        if self.state.selected_index == Some(index) {
            return;
        }

        let id = record.id;
        self.state.selected_index = Some(index);
        self.refresh_neighbors();
        self.state.fragment = write_fragment(&self.model, Some(id));
        self.state.revision += 1;
        self.events.emit(
            self.state.revision,
            "select",
            format!("feature {id} at index {index}"),
        );
    }

    /// Selection entry point for non-widget controls (search box, "select
    /// similar"). Resolves the id to an index, hands the index list to
    /// `mirror` so the caller can reflect it onto the widget imperatively,
    /// then applies the same state and fragment updates as
    /// `select_by_index`. `None` (and any unresolvable id) clears.
    pub fn select_by_feature(&mut self, id: Option<FeatureId>, mut mirror: impl FnMut(&[usize])) {
        match id.and_then(|id| self.store.index_of(id)) {
            Some(index) => {
                if self.state.selected_index == Some(index) {
                    return;
                }
                mirror(&[index]);
                self.select_by_index(index);
            }
            None => {
                if self.state.selected_index.is_none() {
                    return;
                }
                mirror(&[]);
                self.clear_selection();
            }
        }
    }

    pub fn clear_selection(&mut self) {
        if self.state.selected_index.is_none() {
            return;
        }
        self.state.selected_index = None;
        self.neighbors.clear();
        self.state.fragment = write_fragment(&self.model, None);
        self.state.revision += 1;
        self.events.emit(self.state.revision, "select-clear", "");
    }

    /// Hover entry point for the widget's `onHover` callback.
    ///
    /// An out-of-range index behaves like `None`: hover (and with it the
    /// tooltip) is cleared, never left stale.
    pub fn set_hovered_index(&mut self, index: Option<usize>) {
        let resolved = index.filter(|i| *i < self.store.len());
        if self.state.hovered_index == resolved {
            return;
        }
        self.state.hovered_index = resolved;
        self.state.revision += 1;
        match resolved {
            Some(i) => self
                .events
                .emit(self.state.revision, "hover", format!("index {i}")),
            None => self.events.emit(self.state.revision, "hover-clear", ""),
        }
    }

    /// Hover entry point for non-widget sources (the similar-features
    /// list); resolves to an index and delegates so hover semantics stay
    /// single-sourced.
    pub fn set_hovered_feature(&mut self, id: Option<FeatureId>) {
        self.set_hovered_index(id.and_then(|id| self.store.index_of(id)));
    }

    /// Called on every pan/zoom frame. Replaces the view domain only; no
    /// neighbor recompute, no event, since this fires at animation rate.
    pub fn update_view(&mut self, x_domain: [f64; 2], y_domain: [f64; 2]) {
        self.state.view_domain.x = x_domain;
        self.state.view_domain.y = y_domain;
        self.state.revision += 1;
    }

    /// Applies the search control's current match set.
    ///
    /// The highlight overlay gets the first `FILTER_LIMIT` match indices;
    /// a match set equal to the full universe means filtering is a no-op
    /// and clears the overlay entirely.
    pub fn apply_text_filter(&mut self, matches: &[FeatureId]) {
        let filtered = if matches.len() == self.store.len() {
            None
        } else {
            Some(
                matches
                    .iter()
                    .filter_map(|id| self.store.index_of(*id))
                    .take(FILTER_LIMIT)
                    .collect::<Vec<usize>>(),
            )
        };

        if self.state.filtered_indices == filtered {
            return;
        }
        let count = filtered.as_ref().map(Vec::len);
        self.state.filtered_indices = filtered;
        self.state.revision += 1;
        match count {
            Some(n) => self
                .events
                .emit(self.state.revision, "filter", format!("{n} matches")),
            None => self.events.emit(self.state.revision, "filter-clear", ""),
        }
    }

    /// Reconstructs selection from a URL fragment.
    ///
    /// Idempotent, and re-evaluated by the caller every time the feature
    /// array transitions from empty to non-empty, because the page may open
    /// with a fragment before the store has loaded. A fragment that does
    /// not resolve (stale id, malformed tokens) degrades to "no selection".
    pub fn restore_from_url(&mut self, fragment: &str, mirror: impl FnMut(&[usize])) {
        let parsed = parse_fragment(fragment);
        let resolvable = parsed.feature.filter(|id| self.store.get(*id).is_some());
        self.select_by_feature(resolvable, mirror);
    }

    /// Tooltip anchor for the current hover, or `None` when nothing is
    /// hovered.
    pub fn hover_tooltip(&self, size: PanelSize) -> Option<TooltipAnchor> {
        derive_hover_tooltip(self.hovered_feature(), &self.state.view_domain, size)
    }

    fn refresh_neighbors(&mut self) {
        let next = match self
            .state
            .selected_index
            .and_then(|i| self.store.feature_at(i))
        {
            Some(record) => {
                self.neighbor_service
                    .neighbors(&self.store, &self.tree, record, NEIGHBOR_COUNT)
            }
            None => Vec::new(),
        };
        self.neighbors = next;
    }
}

fn build_index(store: &FeatureStore) -> Quadtree {
    Quadtree::build(
        store
            .records()
            .iter()
            .enumerate()
            .map(|(index, r)| Item {
                index,
                pos: r.plot_pos(),
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::{ExplorerController, FILTER_LIMIT};
    use crate::state::ViewDomain;
    use crate::tooltip::PanelSize;
    use foundation::ids::FeatureId;
    use pretty_assertions::assert_eq;
    use store::{FeatureRecord, FeatureStore};

    fn record(id: u32, x: f64, y: f64, label: &str) -> FeatureRecord {
        FeatureRecord {
            id: FeatureId(id),
            max_activation: 1.0,
            x,
            y,
            top10_x: x,
            top10_y: y,
            label: label.to_string(),
            order: 0.0,
        }
    }

    fn small_store() -> FeatureStore {
        FeatureStore::from_records(vec![
            record(5, 0.0, 0.0, "five"),
            record(9, 1.0, 0.0, "nine"),
            record(7, 0.0, 1.0, "seven"),
        ])
    }

    #[test]
    fn select_by_index_sets_state_fragment_and_neighbors() {
        let mut c = ExplorerController::new("A", small_store());
        c.select_by_index(0);

        assert_eq!(c.state().selected_indices(), vec![0]);
        assert_eq!(c.selected_feature().map(|r| r.id), Some(FeatureId(5)));
        assert_eq!(c.state().fragment, "model=A&feature=5");

        let ids: Vec<u32> = c.neighbors().iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![9, 7]);
    }

    #[test]
    fn selecting_twice_is_idempotent() {
        let mut c = ExplorerController::new("A", small_store());
        c.select_by_index(1);
        let first = c.state().clone();
        c.select_by_index(1);
        assert_eq!(c.state(), &first);
        assert_eq!(c.state().fragment, first.fragment);
    }

    #[test]
    fn out_of_bounds_select_clears_instead_of_erroring() {
        let mut c = ExplorerController::new("A", small_store());
        c.select_by_index(0);
        c.select_by_index(99);

        assert_eq!(c.state().selected_index, None);
        assert!(c.neighbors().is_empty());
        assert_eq!(c.state().fragment, "model=A&feature=");
    }

    #[test]
    fn select_by_feature_mirrors_to_the_widget() {
        let mut c = ExplorerController::new("A", small_store());
        let mut mirrored: Vec<Vec<usize>> = Vec::new();
        c.select_by_feature(Some(FeatureId(7)), |idxs| mirrored.push(idxs.to_vec()));

        assert_eq!(mirrored, vec![vec![2]]);
        assert_eq!(c.state().selected_indices(), vec![2]);

        c.select_by_feature(None, |idxs| mirrored.push(idxs.to_vec()));
        assert_eq!(mirrored.len(), 2);
        assert!(mirrored[1].is_empty());
        assert_eq!(c.state().selected_index, None);
    }

    #[test]
    fn unknown_feature_id_clears_selection() {
        let mut c = ExplorerController::new("A", small_store());
        c.select_by_index(0);
        c.select_by_feature(Some(FeatureId(999)), |_| {});
        assert_eq!(c.state().selected_index, None);
    }

    #[test]
    fn hover_invariant_holds_and_clears() {
        let mut c = ExplorerController::new("A", small_store());
        let size = PanelSize {
            width: 100.0,
            height: 100.0,
        };

        c.set_hovered_index(Some(1));
        assert_eq!(c.hovered_feature().map(|r| r.id), Some(FeatureId(9)));
        assert!(c.hover_tooltip(size).is_some());

        c.set_hovered_index(None);
        assert_eq!(c.hovered_feature(), None);
        assert!(c.hover_tooltip(size).is_none());

        // Out of range behaves like None.
        c.set_hovered_index(Some(50));
        assert_eq!(c.state().hovered_index, None);
    }

    #[test]
    fn hover_by_feature_delegates_to_index_hover() {
        let mut c = ExplorerController::new("A", small_store());
        c.set_hovered_feature(Some(FeatureId(7)));
        assert_eq!(c.state().hovered_index, Some(2));
        c.set_hovered_feature(Some(FeatureId(999)));
        assert_eq!(c.state().hovered_index, None);
    }

    #[test]
    fn update_view_does_not_touch_selection_or_neighbors() {
        let mut c = ExplorerController::new("A", small_store());
        c.select_by_index(0);
        let neighbors_before = c.neighbors().to_vec();
        let events_before = c.events().len();

        c.update_view([-2.0, 2.0], [-1.0, 3.0]);

        assert_eq!(
            c.state().view_domain,
            ViewDomain {
                x: [-2.0, 2.0],
                y: [-1.0, 3.0],
            }
        );
        assert_eq!(c.neighbors(), neighbors_before.as_slice());
        assert_eq!(c.events().len(), events_before);
    }

    #[test]
    fn full_universe_filter_is_a_noop() {
        let mut c = ExplorerController::new("A", small_store());
        c.apply_text_filter(&[FeatureId(5), FeatureId(9), FeatureId(7)]);
        assert_eq!(c.state().filtered_indices, None);
    }

    #[test]
    fn partial_filter_keeps_the_first_hundred_indices() {
        let records: Vec<FeatureRecord> = (0..300)
            .map(|i| record(i, i as f64, 0.0, "r"))
            .collect();
        let mut c = ExplorerController::new("A", FeatureStore::from_records(records));

        let matches: Vec<FeatureId> = (0..200).map(FeatureId).collect();
        c.apply_text_filter(&matches);

        let filtered = c.state().filtered_indices.as_ref().unwrap();
        assert_eq!(filtered.len(), FILTER_LIMIT);
        assert_eq!(filtered[0], 0);
        assert_eq!(filtered[99], 99);
    }

    #[test]
    fn restore_round_trips_a_produced_fragment() {
        let mut c = ExplorerController::new("A", small_store());
        c.select_by_index(1);
        let fragment = c.state().fragment.clone();

        let mut fresh = ExplorerController::new("A", small_store());
        fresh.restore_from_url(&fragment, |_| {});

        assert_eq!(fresh.state().selected_indices(), vec![1]);
        assert_eq!(fresh.selected_feature().map(|r| r.id), Some(FeatureId(9)));
        assert_eq!(fresh.state().fragment, fragment);

        // Reapplying the same fragment is a no-op.
        let snapshot = fresh.state().clone();
        fresh.restore_from_url(&fragment, |_| {});
        assert_eq!(fresh.state(), &snapshot);
    }

    #[test]
    fn restore_waits_for_the_store_to_load() {
        // Page opens with a fragment before any data has arrived.
        let mut c = ExplorerController::new("A", FeatureStore::new());
        c.restore_from_url("model=A&feature=7", |_| {});
        assert_eq!(c.state().selected_index, None);

        // The load continuation commits the store, then re-applies the
        // fragment.
        let mut mirrored: Vec<Vec<usize>> = Vec::new();
        c.set_model("A", small_store());
        c.restore_from_url("model=A&feature=7", |idxs| mirrored.push(idxs.to_vec()));

        assert_eq!(c.selected_feature().map(|r| r.id), Some(FeatureId(7)));
        assert_eq!(c.state().selected_indices(), vec![2]);
        assert_eq!(mirrored, vec![vec![2]]);
    }

    #[test]
    fn malformed_fragment_degrades_to_no_selection() {
        let mut c = ExplorerController::new("A", small_store());
        c.select_by_index(0);
        c.restore_from_url("feature=not-a-number", |_| {});
        assert_eq!(c.state().selected_index, None);
    }

    #[test]
    fn stale_model_load_never_overwrites_the_new_model() {
        let mut tracker = streaming::LoadTracker::new();
        let mut c = ExplorerController::new("A", FeatureStore::new());

        // A load for model A is in flight when the user switches to B.
        let old = tracker.begin("A");
        let new = tracker.begin("B");

        // B's data arrives and commits.
        if tracker.is_current(&new) {
            c.set_model(
                "B",
                FeatureStore::from_records(vec![record(1, 0.0, 0.0, "b")]),
            );
        }

        // A's slow response arrives after the switch; its ticket is stale,
        // so nothing is committed.
        if tracker.is_current(&old) {
            c.set_model(
                "A",
                FeatureStore::from_records(vec![record(2, 0.0, 0.0, "a")]),
            );
        }

        assert_eq!(c.model(), "B");
        assert_eq!(c.store().len(), 1);
        assert_eq!(c.store().records()[0].id, FeatureId(1));
    }

    #[test]
    fn model_switch_resets_state_and_rebuilds_the_index() {
        let mut c = ExplorerController::new("A", small_store());
        c.select_by_index(0);
        c.set_hovered_index(Some(1));

        c.set_model(
            "B",
            FeatureStore::from_records(vec![record(100, 0.0, 0.0, "b0")]),
        );

        assert_eq!(c.model(), "B");
        assert_eq!(c.state().selected_index, None);
        assert_eq!(c.state().hovered_index, None);
        assert_eq!(c.state().fragment, "model=B&feature=");
        assert!(c.neighbors().is_empty());

        c.select_by_index(0);
        assert_eq!(c.selected_feature().map(|r| r.id), Some(FeatureId(100)));
    }
}
