/// Current pan/zoom extent of the scatter visualization.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewDomain {
    pub x: [f64; 2],
    pub y: [f64; 2],
}

impl Default for ViewDomain {
    fn default() -> Self {
        Self {
            x: [0.0, 1.0],
            y: [0.0, 1.0],
        }
    }
}

/// Canonical UI state for the explorer page.
///
/// One instance per page, owned and mutated exclusively by
/// `ExplorerController`; every other component reads it and re-renders.
///
/// Invariants:
/// - `selected_index` is in bounds of the active store or `None`.
/// - `hovered_index` is in bounds of the active store or `None`.
/// - `filtered_indices` is `None` when no text filter narrows the universe.
/// - `fragment` always serializes the current `(model, selection)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionState {
    pub selected_index: Option<usize>,
    pub hovered_index: Option<usize>,
    pub filtered_indices: Option<Vec<usize>>,
    pub view_domain: ViewDomain,
    pub fragment: String,
    /// Bumped on every mutation; correlates event-log entries with state.
    pub revision: u64,
}

impl SelectionState {
    pub fn new(fragment: String) -> Self {
        Self {
            selected_index: None,
            hovered_index: None,
            filtered_indices: None,
            view_domain: ViewDomain::default(),
            fragment,
            revision: 0,
        }
    }

    /// The selection as the widget consumes it: zero or one index.
    pub fn selected_indices(&self) -> Vec<usize> {
        self.selected_index.into_iter().collect()
    }
}
