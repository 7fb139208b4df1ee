/// Immutable tree configuration snapshot.
///
/// [`TreeConfig`] is read from a [`SettingsStore`] once and shared as an
/// `Arc<TreeConfig>`. A settings change produces a new config; nothing
/// mutates one that a build or the adapter already holds.
use super::SettingsStore;
use std::time::Duration;

/// An RGB color, stored in settings as `0xRRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn from_u32(value: u32) -> Self {
        Self {
            r: ((value >> 16) & 0xff) as u8,
            g: ((value >> 8) & 0xff) as u8,
            b: (value & 0xff) as u8,
        }
    }

    pub const fn to_u32(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }
}

/// Row background colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorScheme {
    pub problem: Color,
    pub disabled: Color,
    pub disconnected: Color,
    /// Upper/lower-filtered devices.
    pub highlight: Color,
    pub interface: Color,
    pub disabled_interface: Color,
    /// Just-arrived devices while their highlight lasts.
    pub arrived: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            problem: Color::rgb(0xb4, 0x3c, 0x3c),
            disabled: Color::rgb(0x5a, 0x5a, 0x64),
            disconnected: Color::rgb(0x46, 0x46, 0x46),
            highlight: Color::rgb(0x8c, 0x6e, 0x1e),
            interface: Color::rgb(0x32, 0x5a, 0x8c),
            disabled_interface: Color::rgb(0x3c, 0x46, 0x5a),
            arrived: Color::rgb(0x2d, 0x8c, 0x3c),
        }
    }
}

/// Every setting the engine reads, frozen at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeConfig {
    pub auto_refresh: bool,
    pub show_disconnected: bool,
    pub show_software_components: bool,
    pub show_device_interfaces: bool,
    pub show_disabled_device_interfaces: bool,
    pub highlight_upper_filtered: bool,
    pub highlight_lower_filtered: bool,
    /// Wrap everything under the enumerator's root item.
    pub show_root: bool,
    pub sort_children_by_name: bool,
    /// How long a just-arrived device stays highlighted.
    pub highlight_duration: Duration,
    pub colors: ColorScheme,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            auto_refresh: true,
            show_disconnected: false,
            show_software_components: true,
            show_device_interfaces: false,
            show_disabled_device_interfaces: false,
            highlight_upper_filtered: false,
            highlight_lower_filtered: false,
            show_root: true,
            sort_children_by_name: true,
            highlight_duration: Duration::from_millis(3000),
            colors: ColorScheme::default(),
        }
    }
}

impl TreeConfig {
    /// Read the configuration. Missing keys take their defaults.
    pub fn load(store: &dyn SettingsStore) -> Self {
        use super::*;

        let d = Self::default();
        let flag = |key: &str, default: bool| store.get_bool(key).unwrap_or(default);
        let color = |key: &str, default: Color| {
            store
                .get_integer(key)
                .map(|v| Color::from_u32(v as u32))
                .unwrap_or(default)
        };

        let highlight_duration = store
            .get_integer(HIGHLIGHTING_DURATION)
            .map(|ms| Duration::from_millis(ms.max(0) as u64))
            .unwrap_or(d.highlight_duration);

        Self {
            auto_refresh: flag(AUTO_REFRESH, d.auto_refresh),
            show_disconnected: flag(SHOW_DISCONNECTED, d.show_disconnected),
            show_software_components: flag(SHOW_SOFTWARE_COMPONENTS, d.show_software_components),
            show_device_interfaces: flag(SHOW_DEVICE_INTERFACES, d.show_device_interfaces),
            show_disabled_device_interfaces: flag(
                SHOW_DISABLED_DEVICE_INTERFACES,
                d.show_disabled_device_interfaces,
            ),
            highlight_upper_filtered: flag(HIGHLIGHT_UPPER_FILTERED, d.highlight_upper_filtered),
            highlight_lower_filtered: flag(HIGHLIGHT_LOWER_FILTERED, d.highlight_lower_filtered),
            show_root: flag(SHOW_ROOT, d.show_root),
            sort_children_by_name: flag(SORT_CHILDREN_BY_NAME, d.sort_children_by_name),
            highlight_duration,
            colors: ColorScheme {
                problem: color(PROBLEM_COLOR, d.colors.problem),
                disabled: color(DISABLED_COLOR, d.colors.disabled),
                disconnected: color(DISCONNECTED_COLOR, d.colors.disconnected),
                highlight: color(HIGHLIGHT_COLOR, d.colors.highlight),
                interface: color(INTERFACE_COLOR, d.colors.interface),
                disabled_interface: color(DISABLED_INTERFACE_COLOR, d.colors.disabled_interface),
                arrived: color(ARRIVED_COLOR, d.colors.arrived),
            },
        }
    }

    /// `true` if `other` differs in anything that changes which devices
    /// are included or how the tree is shaped (requires a rebuild).
    pub fn inclusion_differs(&self, other: &TreeConfig) -> bool {
        self.show_disconnected != other.show_disconnected
            || self.show_software_components != other.show_software_components
            || self.show_device_interfaces != other.show_device_interfaces
            || self.show_disabled_device_interfaces != other.show_disabled_device_interfaces
            || self.show_root != other.show_root
            || self.sort_children_by_name != other.sort_children_by_name
    }

    /// Current value of a view toggle.
    pub fn toggle(&self, toggle: ViewToggle) -> bool {
        match toggle {
            ViewToggle::AutoRefresh => self.auto_refresh,
            ViewToggle::ShowDisconnected => self.show_disconnected,
            ViewToggle::ShowSoftwareComponents => self.show_software_components,
            ViewToggle::ShowDeviceInterfaces => self.show_device_interfaces,
            ViewToggle::ShowDisabledDeviceInterfaces => self.show_disabled_device_interfaces,
            ViewToggle::HighlightUpperFiltered => self.highlight_upper_filtered,
            ViewToggle::HighlightLowerFiltered => self.highlight_lower_filtered,
        }
    }

    /// A copy with one toggle set to `value`.
    pub fn with_toggle(&self, toggle: ViewToggle, value: bool) -> Self {
        let mut next = self.clone();
        let field = match toggle {
            ViewToggle::AutoRefresh => &mut next.auto_refresh,
            ViewToggle::ShowDisconnected => &mut next.show_disconnected,
            ViewToggle::ShowSoftwareComponents => &mut next.show_software_components,
            ViewToggle::ShowDeviceInterfaces => &mut next.show_device_interfaces,
            ViewToggle::ShowDisabledDeviceInterfaces => &mut next.show_disabled_device_interfaces,
            ViewToggle::HighlightUpperFiltered => &mut next.highlight_upper_filtered,
            ViewToggle::HighlightLowerFiltered => &mut next.highlight_lower_filtered,
        };
        *field = value;
        next
    }
}

/// What the view must do after a toggle flips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleEffect {
    /// Nothing visible changes.
    None,
    /// Rebuild the snapshot (inclusion changed).
    Republish,
    /// Recolor and reapply filters on the current snapshot.
    Invalidate,
}

/// User-facing view toggles offered by the context menu and toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewToggle {
    AutoRefresh,
    ShowDisconnected,
    ShowSoftwareComponents,
    ShowDeviceInterfaces,
    ShowDisabledDeviceInterfaces,
    HighlightUpperFiltered,
    HighlightLowerFiltered,
}

impl ViewToggle {
    pub const ALL: [ViewToggle; 7] = [
        Self::AutoRefresh,
        Self::ShowDisconnected,
        Self::ShowSoftwareComponents,
        Self::ShowDeviceInterfaces,
        Self::ShowDisabledDeviceInterfaces,
        Self::HighlightUpperFiltered,
        Self::HighlightLowerFiltered,
    ];

    /// Settings key the toggle persists under.
    pub fn key(self) -> &'static str {
        use super::*;
        match self {
            Self::AutoRefresh => AUTO_REFRESH,
            Self::ShowDisconnected => SHOW_DISCONNECTED,
            Self::ShowSoftwareComponents => SHOW_SOFTWARE_COMPONENTS,
            Self::ShowDeviceInterfaces => SHOW_DEVICE_INTERFACES,
            Self::ShowDisabledDeviceInterfaces => SHOW_DISABLED_DEVICE_INTERFACES,
            Self::HighlightUpperFiltered => HIGHLIGHT_UPPER_FILTERED,
            Self::HighlightLowerFiltered => HIGHLIGHT_LOWER_FILTERED,
        }
    }

    pub fn effect(self) -> ToggleEffect {
        match self {
            Self::AutoRefresh => ToggleEffect::None,
            Self::ShowDisconnected
            | Self::ShowSoftwareComponents
            | Self::ShowDeviceInterfaces
            | Self::ShowDisabledDeviceInterfaces => ToggleEffect::Republish,
            Self::HighlightUpperFiltered | Self::HighlightLowerFiltered => ToggleEffect::Invalidate,
        }
    }

    /// Human-readable menu label.
    pub fn label(self) -> &'static str {
        match self {
            Self::AutoRefresh => "Auto refresh",
            Self::ShowDisconnected => "Show disconnected devices",
            Self::ShowSoftwareComponents => "Show software components",
            Self::ShowDeviceInterfaces => "Show device interfaces",
            Self::ShowDisabledDeviceInterfaces => "Show disabled device interfaces",
            Self::HighlightUpperFiltered => "Highlight upper filtered",
            Self::HighlightLowerFiltered => "Highlight lower filtered",
        }
    }
}
