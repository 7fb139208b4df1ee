/// A single device or device interface as reported by the enumerator.
///
/// Items are stored in a flat arena inside [`RawTree`](super::RawTree).
/// Parent-child relationships use indices rather than pointers and children
/// form a `first_child` / `next_sibling` linked list in enumerator order.
use super::property::{Property, PropertyClass, PropertyValue};
use compact_str::CompactString;
use uuid::Uuid;

/// `DN_HAS_PROBLEM` bit of the devnode status.
pub const DN_HAS_PROBLEM: u32 = 0x0000_0400;

/// Problem code reported for devices disabled by the user.
pub const CM_PROB_DISABLED: u32 = 22;

/// `CM_DEVCAP_HARDWAREDISABLED` capability bit.
pub const CM_DEVCAP_HARDWAREDISABLED: u32 = 0x0000_0100;

/// Device setup class of software components.
pub const GUID_DEVCLASS_SOFTWARECOMPONENT: Uuid =
    Uuid::from_u128(0x5c4c3332_344d_483c_8739_259e934c9cc8);

/// Lightweight index into the raw tree's item arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemIndex(pub u32);

impl ItemIndex {
    /// Create a new `ItemIndex` from a `usize`.
    #[inline]
    pub fn new(index: usize) -> Self {
        debug_assert!(index <= u32::MAX as usize, "ItemIndex overflow");
        Self(index as u32)
    }

    /// Return the index as a `usize` for Vec indexing.
    #[inline]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Stable identity of a device instance across refreshes.
///
/// 32-bit FNV-1a over the upper-cased instance id, so the same device
/// hashes identically no matter how the OS cased the id this time.
pub fn instance_id_hash(instance_id: &str) -> u32 {
    const OFFSET: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;

    let mut hash = OFFSET;
    for ch in instance_id.chars().flat_map(char::to_uppercase) {
        let mut buf = [0u8; 4];
        for byte in ch.encode_utf8(&mut buf).bytes() {
            hash ^= u32::from(byte);
            hash = hash.wrapping_mul(PRIME);
        }
    }
    hash
}

/// One device or interface in the enumerator's tree.
#[derive(Debug, Clone)]
pub struct DeviceItem {
    /// OS instance id (or interface path for interfaces).
    pub instance_id: CompactString,

    /// Hash of `instance_id`; the only identity preserved across snapshots.
    pub instance_id_hash: u32,

    /// `true` for device interfaces, `false` for devnodes.
    pub device_interface: bool,

    pub parent: Option<ItemIndex>,
    pub first_child: Option<ItemIndex>,
    pub last_child: Option<ItemIndex>,
    pub next_sibling: Option<ItemIndex>,
    pub children_count: u32,

    /// Dense property array indexed by [`PropertyClass`].
    properties: Box<[Property]>,
}

impl DeviceItem {
    /// Create an item with every property invalid except `InstanceId`.
    pub fn new(instance_id: impl Into<CompactString>, device_interface: bool) -> Self {
        let instance_id = instance_id.into();
        let properties: Box<[Property]> = PropertyClass::ALL
            .iter()
            .map(|class| Property::invalid(class.property_type()))
            .collect();

        let mut item = Self {
            instance_id_hash: instance_id_hash(&instance_id),
            instance_id,
            device_interface,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            children_count: 0,
            properties,
        };
        let id = item.instance_id.to_string();
        item.set_property(PropertyClass::InstanceId, PropertyValue::String(id));
        item
    }

    /// Builder form of [`set_property`](Self::set_property).
    pub fn with_property(mut self, class: PropertyClass, value: PropertyValue) -> Self {
        self.set_property(class, value);
        self
    }

    /// Store a value for `class`. The value's tag must match the class.
    pub fn set_property(&mut self, class: PropertyClass, value: PropertyValue) {
        self.properties[class.index()] = Property::new(class.property_type(), value);
    }

    /// Typed property accessor. Never fails: absent values are invalid.
    #[inline]
    pub fn property(&self, class: PropertyClass) -> &Property {
        &self.properties[class.index()]
    }

    /// Display name: `Name`, then `FriendlyName`, then `DeviceDesc`, then
    /// the instance id.
    pub fn name(&self) -> &str {
        [
            PropertyClass::Name,
            PropertyClass::FriendlyName,
            PropertyClass::DeviceDesc,
        ]
        .iter()
        .map(|class| self.property(*class).as_str())
        .find(|s| !s.is_empty())
        .unwrap_or(self.instance_id.as_str())
    }

    // ── Derived facts ──────────────────────────────────────────────

    pub fn is_present(&self) -> bool {
        self.property(PropertyClass::IsPresent).as_bool()
    }

    pub fn interface_enabled(&self) -> bool {
        self.property(PropertyClass::InterfaceEnabled).as_bool()
    }

    /// `DN_HAS_PROBLEM` set in the devnode status.
    pub fn has_problem(&self) -> bool {
        self.property(PropertyClass::DevNodeStatus)
            .as_u32()
            .is_some_and(|status| status & DN_HAS_PROBLEM != 0)
    }

    pub fn problem_code(&self) -> Option<u32> {
        self.property(PropertyClass::ProblemCode).as_u32()
    }

    /// Problem code says the user disabled the device.
    pub fn is_problem_disabled(&self) -> bool {
        self.problem_code() == Some(CM_PROB_DISABLED)
    }

    pub fn is_hardware_disabled(&self) -> bool {
        self.property(PropertyClass::DevCapabilities)
            .as_u32()
            .is_some_and(|caps| caps & CM_DEVCAP_HARDWAREDISABLED != 0)
    }

    pub fn has_upper_filters(&self) -> bool {
        !self
            .property(PropertyClass::UpperFilters)
            .as_string_list()
            .is_empty()
    }

    pub fn has_lower_filters(&self) -> bool {
        !self
            .property(PropertyClass::LowerFilters)
            .as_string_list()
            .is_empty()
    }

    pub fn class_guid(&self) -> Option<Uuid> {
        self.property(PropertyClass::ClassGuid).as_guid()
    }

    pub fn is_software_component(&self) -> bool {
        self.class_guid() == Some(GUID_DEVCLASS_SOFTWARECOMPONENT)
    }

    /// Last arrival as FILETIME ticks, when known and non-zero.
    pub fn last_arrival(&self) -> Option<i64> {
        self.property(PropertyClass::LastArrivalDate)
            .as_timestamp()
            .filter(|ticks| *ticks > 0)
    }

    pub fn service(&self) -> &str {
        self.property(PropertyClass::Service).as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_ignores_case() {
        assert_eq!(
            instance_id_hash("PCI\\VEN_8086&DEV_A0ED\\3&11583659&0&A0"),
            instance_id_hash("pci\\ven_8086&dev_a0ed\\3&11583659&0&a0")
        );
        assert_ne!(instance_id_hash("USB\\ROOT_HUB30"), instance_id_hash("USB\\ROOT_HUB"));
    }

    #[test]
    fn test_hash_known_value() {
        // FNV-1a of the empty string is the offset basis.
        assert_eq!(instance_id_hash(""), 0x811c_9dc5);
        assert_eq!(instance_id_hash("a"), instance_id_hash("A"));
        assert_eq!(instance_id_hash("A"), 0xc40b_f6cc);
    }

    #[test]
    fn test_new_item_has_instance_id_only() {
        let item = DeviceItem::new("ROOT\\HTREE\\ROOT\\0", false);
        assert_eq!(item.property(PropertyClass::InstanceId).as_str(), "ROOT\\HTREE\\ROOT\\0");
        assert!(!item.property(PropertyClass::Manufacturer).is_valid());
        assert!(!item.is_present());
        assert_eq!(item.name(), "ROOT\\HTREE\\ROOT\\0");
    }

    #[test]
    fn test_name_fallback_order() {
        let item = DeviceItem::new("X", false)
            .with_property(PropertyClass::DeviceDesc, PropertyValue::String("Desc".into()));
        assert_eq!(item.name(), "Desc");

        let item = item.with_property(
            PropertyClass::FriendlyName,
            PropertyValue::String("Friendly".into()),
        );
        assert_eq!(item.name(), "Friendly");

        let item = item.with_property(PropertyClass::Name, PropertyValue::String("Named".into()));
        assert_eq!(item.name(), "Named");
    }

    #[test]
    fn test_derived_facts() {
        let item = DeviceItem::new("X", false)
            .with_property(PropertyClass::DevNodeStatus, PropertyValue::UInt32(0x0180_2400))
            .with_property(PropertyClass::ProblemCode, PropertyValue::UInt32(CM_PROB_DISABLED))
            .with_property(PropertyClass::DevCapabilities, PropertyValue::UInt32(0x100))
            .with_property(
                PropertyClass::UpperFilters,
                PropertyValue::StringList(vec!["fvevol".into()]),
            )
            .with_property(
                PropertyClass::ClassGuid,
                PropertyValue::Guid(GUID_DEVCLASS_SOFTWARECOMPONENT),
            );

        assert!(item.has_problem());
        assert!(item.is_problem_disabled());
        assert!(item.is_hardware_disabled());
        assert!(item.has_upper_filters());
        assert!(!item.has_lower_filters());
        assert!(item.is_software_component());
    }

    #[test]
    fn test_zero_arrival_is_unknown() {
        let item = DeviceItem::new("X", false)
            .with_property(PropertyClass::LastArrivalDate, PropertyValue::TimeStamp(0));
        assert_eq!(item.last_arrival(), None);
    }
}
