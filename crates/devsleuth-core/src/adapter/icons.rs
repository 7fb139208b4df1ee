/// Icon index cache keyed by device setup class.
///
/// The adapter hands out small integer icon indices; the frontend maps an
/// index to whatever it draws. Index 0 is the generic device icon, used for
/// items without a class GUID.
use crate::model::DeviceItem;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IconIndex(pub u32);

impl IconIndex {
    pub const GENERIC: IconIndex = IconIndex(0);
}

#[derive(Debug, Default)]
pub struct IconCache {
    by_class: HashMap<Uuid, IconIndex>,
    classes: Vec<Uuid>,
}

impl IconCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Icon for an item, assigning a new index on first sight of its class.
    pub fn icon_for(&mut self, item: &DeviceItem) -> IconIndex {
        let Some(class) = item.class_guid() else {
            return IconIndex::GENERIC;
        };
        if let Some(&icon) = self.by_class.get(&class) {
            return icon;
        }
        self.classes.push(class);
        let icon = IconIndex(self.classes.len() as u32);
        self.by_class.insert(class, icon);
        icon
    }

    /// The class an icon index was assigned to. `None` for the generic icon.
    pub fn class_of(&self, icon: IconIndex) -> Option<Uuid> {
        let slot = (icon.0 as usize).checked_sub(1)?;
        self.classes.get(slot).copied()
    }

    /// Forget every assignment (e.g. after a DPI change).
    pub fn clear(&mut self) {
        self.by_class.clear();
        self.classes.clear();
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PropertyClass, PropertyValue};

    const USB: Uuid = Uuid::from_u128(0x36fc9e60_c465_11cf_8056_444553540000);
    const HID: Uuid = Uuid::from_u128(0x745a17a0_74d3_11d0_b6fe_00a0c90f57da);

    fn with_class(guid: Uuid) -> DeviceItem {
        DeviceItem::new("X", false).with_property(PropertyClass::ClassGuid, PropertyValue::Guid(guid))
    }

    #[test]
    fn test_icons_assigned_per_class() {
        let mut cache = IconCache::new();
        let usb = cache.icon_for(&with_class(USB));
        let hid = cache.icon_for(&with_class(HID));
        assert_ne!(usb, hid);
        assert_eq!(cache.icon_for(&with_class(USB)), usb);
        assert_eq!(cache.class_of(hid), Some(HID));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_generic_icon_without_class() {
        let mut cache = IconCache::new();
        assert_eq!(cache.icon_for(&DeviceItem::new("X", false)), IconIndex::GENERIC);
        assert_eq!(cache.class_of(IconIndex::GENERIC), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear_resets_assignments() {
        let mut cache = IconCache::new();
        cache.icon_for(&with_class(USB));
        cache.clear();
        assert_eq!(cache.icon_for(&with_class(HID)), IconIndex(1));
    }
}
