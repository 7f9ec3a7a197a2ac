use foundation::ids::FeatureId;

/// One learned feature of the sparse autoencoder.
///
/// `x`/`y` are the primary 2D embedding coordinates; `top10_x`/`top10_y`
/// are derived from the top-activating-sample embeddings and are the
/// coordinates actually plotted and queried.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    pub id: FeatureId,
    /// Upper bound used to normalize activation bars; > 0 for real data.
    pub max_activation: f64,
    pub x: f64,
    pub y: f64,
    pub top10_x: f64,
    pub top10_y: f64,
    /// Human-readable description, possibly empty.
    pub label: String,
    /// Color-scale position; used only for coloring.
    pub order: f64,
}

impl FeatureRecord {
    /// The plotted/query-space position.
    pub fn plot_pos(&self) -> [f64; 2] {
        [self.top10_x, self.top10_y]
    }
}
