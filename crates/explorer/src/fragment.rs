use foundation::ids::FeatureId;

/// Shareable view state parsed from (or serialized into) the URL fragment.
///
/// Form: `model=<label>&feature=<id|empty>`. An empty or absent `feature=`
/// token means "no selection". Fragments are advisory: malformed tokens
/// parse to `None` rather than erroring, and resolution against the loaded
/// store happens later.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentState {
    pub model: Option<String>,
    pub feature: Option<FeatureId>,
}

pub fn write_fragment(model: &str, feature: Option<FeatureId>) -> String {
    match feature {
        Some(id) => format!("model={model}&feature={id}"),
        None => format!("model={model}&feature="),
    }
}

pub fn parse_fragment(fragment: &str) -> FragmentState {
    let mut out = FragmentState::default();
    for token in fragment.trim_start_matches('#').split('&') {
        if let Some(v) = token.strip_prefix("model=") {
            if !v.is_empty() {
                out.model = Some(v.to_string());
            }
        } else if let Some(v) = token.strip_prefix("feature=") {
            out.feature = v.parse::<u32>().ok().map(FeatureId);
        }
    }
    out
}
