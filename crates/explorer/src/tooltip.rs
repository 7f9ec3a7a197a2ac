use store::FeatureRecord;

use crate::state::ViewDomain;

/// Vertical offset for the visualization card header, in pixels.
pub const HEADER_OFFSET_PX: f64 = 57.0;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PanelSize {
    pub width: f64,
    pub height: f64,
}

/// Pixel position anchoring the hover tooltip next to its feature.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TooltipAnchor {
    pub x_px: f64,
    pub y_px: f64,
}

/// Maps the hovered feature's plotted coordinates through the current view
/// domain into pixel space. Pure: the rendering layer calls this instead of
/// keeping its own copy of hover state.
///
/// The y axis is flipped (screen y grows downward) and shifted by the
/// visualization header height. Returns `None` for no hover or a degenerate
/// (zero-area) view domain.
pub fn derive_hover_tooltip(
    hovered: Option<&FeatureRecord>,
    domain: &ViewDomain,
    size: PanelSize,
) -> Option<TooltipAnchor> {
    let record = hovered?;
    let [x0, x1] = domain.x;
    let [y0, y1] = domain.y;
    let span_x = x1 - x0;
    let span_y = y1 - y0;
    if span_x <= 0.0 || span_y <= 0.0 {
        return None;
    }

    let [cx, cy] = record.plot_pos();
    Some(TooltipAnchor {
        x_px: (cx - x0) / span_x * size.width,
        y_px: (y1 - cy) / span_y * size.height + HEADER_OFFSET_PX,
    })
}
