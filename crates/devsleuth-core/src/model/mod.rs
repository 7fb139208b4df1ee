/// Data model for the DevSleuth device tree.
///
/// Typed properties, device items and the arena-allocated raw tree that
/// enumerators produce.
pub mod device_item;
pub mod display;
pub mod property;
pub mod raw_tree;

pub use device_item::{instance_id_hash, DeviceItem, ItemIndex};
pub use property::{Property, PropertyClass, PropertyType, PropertyValue};
pub use raw_tree::RawTree;
