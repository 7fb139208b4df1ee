/// Column definitions and the persisted visible-column layout.
use crate::model::PropertyClass;

/// Static description of one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnDef {
    pub class: PropertyClass,
    pub title: &'static str,
    pub default_visible: bool,
    /// Default width in points.
    pub width: f32,
}

/// The column definition for a property class.
pub fn column(class: PropertyClass) -> ColumnDef {
    use PropertyClass as P;
    let (title, default_visible, width) = match class {
        P::Name => ("Name", true, 400.0),
        P::Manufacturer => ("Manufacturer", true, 180.0),
        P::Service => ("Service", true, 120.0),
        P::Class => ("Class", true, 120.0),
        P::EnumeratorName => ("Enumerator", true, 80.0),
        P::InstallDate => ("Installed", true, 160.0),
        P::FirstInstallDate => ("First installed", false, 160.0),
        P::LastArrivalDate => ("Last arrival", false, 160.0),
        P::LastRemovalDate => ("Last removal", false, 160.0),
        P::DeviceDesc => ("Description", false, 280.0),
        P::FriendlyName => ("Friendly name", false, 220.0),
        P::InstanceId => ("Instance ID", false, 240.0),
        P::ParentInstanceId => ("Parent instance ID", false, 240.0),
        P::PdoName => ("PDO name", false, 180.0),
        P::LocationInfo => ("Location info", false, 180.0),
        P::ClassGuid => ("Class GUID", false, 80.0),
        P::Driver => ("Driver", false, 180.0),
        P::DriverVersion => ("Driver version", false, 80.0),
        P::DriverDate => ("Driver date", false, 80.0),
        P::FirmwareVersion => ("Firmware version", false, 80.0),
        P::HasProblem => ("Has problem", false, 80.0),
        P::ProblemCode => ("Problem code", false, 80.0),
        P::ProblemStatus => ("Problem status", false, 80.0),
        P::DevNodeStatus => ("Node status flags", false, 80.0),
        P::DevCapabilities => ("Capabilities", false, 80.0),
        P::UpperFilters => ("Upper filters", false, 80.0),
        P::LowerFilters => ("Lower filters", false, 80.0),
        P::HardwareIds => ("Hardware IDs", false, 80.0),
        P::CompatibleIds => ("Compatible IDs", false, 80.0),
        P::ConfigFlags => ("Config flags", false, 80.0),
        P::UiNumber => ("Number", false, 80.0),
        P::BusTypeGuid => ("Bus type GUID", false, 80.0),
        P::BusNumber => ("Bus number", false, 80.0),
        P::Security => ("Security descriptor (binary)", false, 80.0),
        P::Address => ("Address", false, 80.0),
        P::ExtendedAddress => ("Extended address", false, 80.0),
        P::PowerData => ("Power data", false, 80.0),
        P::RemovalPolicy => ("Removal policy", false, 80.0),
        P::InstallState => ("Install state", false, 80.0),
        P::LocationPaths => ("Location paths", false, 80.0),
        P::ContainerId => ("Container ID", false, 80.0),
        P::IsPresent => ("Present", false, 80.0),
        P::InterfaceEnabled => ("Interface enabled", false, 80.0),
        P::ReportedDeviceIdsHash => ("Reported device IDs hash", false, 80.0),
        P::IsRebootRequired => ("Reboot required", false, 80.0),
        P::DriverRank => ("Driver rank", false, 80.0),
        P::SessionId => ("Session ID", false, 80.0),
    };
    ColumnDef {
        class,
        title,
        default_visible,
        width,
    }
}

/// Ordered set of visible columns. `Name` is always present and first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSet {
    visible: Vec<PropertyClass>,
}

impl Default for ColumnSet {
    fn default() -> Self {
        Self {
            visible: PropertyClass::ALL
                .iter()
                .copied()
                .filter(|&c| column(c).default_visible)
                .collect(),
        }
    }
}

impl ColumnSet {
    /// Visible columns in display order.
    pub fn visible(&self) -> &[PropertyClass] {
        &self.visible
    }

    pub fn is_visible(&self, class: PropertyClass) -> bool {
        self.visible.contains(&class)
    }

    /// Show or hide a column. Hiding `Name` is ignored. Returns `true` if
    /// the set changed.
    pub fn set_visible(&mut self, class: PropertyClass, visible: bool) -> bool {
        match (visible, self.is_visible(class)) {
            (true, false) => {
                self.visible.push(class);
                true
            }
            (false, true) if class != PropertyClass::Name => {
                self.visible.retain(|&c| c != class);
                true
            }
            _ => false,
        }
    }

    /// Persisted form: comma-separated class indices in display order.
    pub fn to_setting(&self) -> String {
        self.visible
            .iter()
            .map(|c| c.index().to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Parse the persisted form. Unknown or duplicate entries are skipped;
    /// an unusable string yields the default layout.
    pub fn from_setting(text: &str) -> Self {
        let mut visible = vec![PropertyClass::Name];
        for class in text
            .split(',')
            .filter_map(|part| part.trim().parse::<usize>().ok())
            .filter_map(PropertyClass::from_index)
        {
            if !visible.contains(&class) {
                visible.push(class);
            }
        }
        if visible.len() == 1 && !text.trim().starts_with('0') {
            return Self::default();
        }
        Self { visible }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_columns() {
        let set = ColumnSet::default();
        assert_eq!(
            set.visible(),
            &[
                PropertyClass::Name,
                PropertyClass::Manufacturer,
                PropertyClass::Service,
                PropertyClass::Class,
                PropertyClass::EnumeratorName,
                PropertyClass::InstallDate,
            ]
        );
    }

    #[test]
    fn test_name_cannot_be_hidden() {
        let mut set = ColumnSet::default();
        assert!(!set.set_visible(PropertyClass::Name, false));
        assert!(set.is_visible(PropertyClass::Name));
        assert!(set.set_visible(PropertyClass::Service, false));
        assert!(set.set_visible(PropertyClass::HardwareIds, true));
        assert_eq!(set.visible().last(), Some(&PropertyClass::HardwareIds));
    }

    #[test]
    fn test_setting_round_trip() {
        let mut set = ColumnSet::default();
        set.set_visible(PropertyClass::ContainerId, true);
        assert_eq!(ColumnSet::from_setting(&set.to_setting()), set);
    }

    #[test]
    fn test_garbage_setting_falls_back_to_default() {
        assert_eq!(ColumnSet::from_setting("what"), ColumnSet::default());
        assert_eq!(ColumnSet::from_setting(""), ColumnSet::default());
        assert_eq!(ColumnSet::from_setting("0").visible(), &[PropertyClass::Name]);
        assert_eq!(ColumnSet::from_setting("11,999,11").visible(), &[PropertyClass::Name, PropertyClass::InstanceId]);
    }
}
