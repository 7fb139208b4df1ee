/// Row color precedence.
use crate::diff::HighlightState;
use crate::model::DeviceItem;
use crate::settings::{Color, TreeConfig};

/// Background color of a row, or `None` for the default.
///
/// A running arrival highlight wins. After that: interface enabled or
/// disabled, problem (other than user-disabled), disconnected, disabled,
/// then the optional upper/lower filter highlight.
pub fn node_color(item: &DeviceItem, highlight: HighlightState, config: &TreeConfig) -> Option<Color> {
    if let Some(color) = highlight.color() {
        return Some(color);
    }

    let colors = &config.colors;
    if item.device_interface {
        return Some(if item.interface_enabled() {
            colors.interface
        } else {
            colors.disabled_interface
        });
    }
    if item.has_problem() && !item.is_problem_disabled() {
        return Some(colors.problem);
    }
    if !item.is_present() {
        return Some(colors.disconnected);
    }
    if item.is_hardware_disabled() || item.is_problem_disabled() {
        return Some(colors.disabled);
    }
    if (config.highlight_upper_filtered && item.has_upper_filters())
        || (config.highlight_lower_filtered && item.has_lower_filters())
    {
        return Some(colors.highlight);
    }
    None
}
