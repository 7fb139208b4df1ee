/// Total-order comparator over typed properties.
///
/// Valid values always sort before invalid ones, in both directions. Two
/// valid values compare by their type; remaining ties fall back to the
/// device name and finally to `InstanceIdHash`, so no two distinct nodes
/// ever compare equal.
use super::SortOrder;
use crate::model::display::compare_ignore_case;
use crate::model::{DeviceItem, Property, PropertyClass, PropertyValue};
use std::cmp::Ordering;

/// Compare two valid-or-invalid properties of the same class.
///
/// Returns `Ordering::Equal` when both are invalid. Mismatched tags are a
/// programming error: asserted in debug builds, treated as a tie in
/// release so the caller's name tie-break decides.
pub fn compare_properties(a: &Property, b: &Property) -> Ordering {
    let (a, b) = match (a.value(), b.value()) {
        (None, None) => return Ordering::Equal,
        (Some(_), None) => return Ordering::Less,
        (None, Some(_)) => return Ordering::Greater,
        (Some(a), Some(b)) => (a, b),
    };
    compare_values(a, b)
}

fn compare_values(a: &PropertyValue, b: &PropertyValue) -> Ordering {
    use PropertyValue as V;
    match (a, b) {
        (V::String(a), V::String(b)) => compare_ignore_case(a, b),
        (V::StringList(a), V::StringList(b)) => compare_ignore_case(&a.join(", "), &b.join(", ")),
        (V::UInt32(a), V::UInt32(b)) => a.cmp(b),
        (V::Int32(a), V::Int32(b)) => a.cmp(b),
        (V::UInt64(a), V::UInt64(b)) => a.cmp(b),
        (V::Int64(a), V::Int64(b)) => a.cmp(b),
        (V::StatusCode(a), V::StatusCode(b)) => a.cmp(b),
        (V::Guid(a), V::Guid(b)) => a.as_bytes().cmp(b.as_bytes()),
        (V::Boolean(a), V::Boolean(b)) => a.cmp(b),
        (V::TimeStamp(a), V::TimeStamp(b)) => a.cmp(b),
        (V::Binary(a), V::Binary(b)) => {
            let common = a.len().min(b.len());
            a[..common]
                .cmp(&b[..common])
                .then_with(|| a.len().cmp(&b.len()))
        }
        _ => {
            debug_assert!(false, "compared properties with different tags: {a:?} vs {b:?}");
            Ordering::Equal
        }
    }
}

/// Compare two device items by `class` in the given direction.
///
/// `SortOrder::None` compares nothing and returns `Equal`; the caller keeps
/// hierarchical order in that case.
pub fn compare_items(a: &DeviceItem, b: &DeviceItem, class: PropertyClass, order: SortOrder) -> Ordering {
    if order == SortOrder::None {
        return Ordering::Equal;
    }

    let by_value = if class == PropertyClass::Name {
        // The name column always resolves to a display name.
        Ordering::Equal
    } else {
        let (pa, pb) = (a.property(class), b.property(class));

        // Invalid values stay last regardless of direction.
        match (pa.is_valid(), pb.is_valid()) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => compare_properties(pa, pb),
        }
    };

    let ascending = by_value
        .then_with(|| compare_ignore_case(a.name(), b.name()))
        .then_with(|| a.instance_id_hash.cmp(&b.instance_id_hash));

    match order {
        SortOrder::Descending => ascending.reverse(),
        _ => ascending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropertyType;

    fn prop(value: PropertyValue) -> Property {
        Property::new(value.kind(), value)
    }

    fn item(id: &str, name: &str) -> DeviceItem {
        DeviceItem::new(id, false).with_property(PropertyClass::Name, PropertyValue::String(name.into()))
    }

    #[test]
    fn test_invalid_sorts_last() {
        let valid = prop(PropertyValue::UInt32(5));
        let invalid = Property::invalid(PropertyType::UInt32);
        assert_eq!(compare_properties(&valid, &invalid), Ordering::Less);
        assert_eq!(compare_properties(&invalid, &valid), Ordering::Greater);
        assert_eq!(compare_properties(&invalid, &invalid), Ordering::Equal);
    }

    #[test]
    fn test_value_kinds() {
        let cmp = |a, b| compare_properties(&prop(a), &prop(b));
        assert_eq!(
            cmp(PropertyValue::String("usb".into()), PropertyValue::String("USB".into())),
            Ordering::Equal
        );
        assert_eq!(cmp(PropertyValue::Int32(-1), PropertyValue::Int32(1)), Ordering::Less);
        assert_eq!(cmp(PropertyValue::UInt64(10), PropertyValue::UInt64(9)), Ordering::Greater);
        assert_eq!(cmp(PropertyValue::Boolean(false), PropertyValue::Boolean(true)), Ordering::Less);
        assert_eq!(cmp(PropertyValue::TimeStamp(1), PropertyValue::TimeStamp(2)), Ordering::Less);
        assert_eq!(
            cmp(PropertyValue::Binary(vec![1, 2]), PropertyValue::Binary(vec![1, 2, 0])),
            Ordering::Less
        );
        assert_eq!(
            cmp(PropertyValue::Binary(vec![2]), PropertyValue::Binary(vec![1, 9, 9])),
            Ordering::Greater
        );
        assert_eq!(
            cmp(
                PropertyValue::StringList(vec!["b".into()]),
                PropertyValue::StringList(vec!["A".into(), "z".into()])
            ),
            Ordering::Greater
        );
    }

    #[test]
    fn test_ties_break_on_name_then_hash() {
        let a = item("1", "Alpha").with_property(PropertyClass::Service, PropertyValue::String("usbhub".into()));
        let b = item("2", "beta").with_property(PropertyClass::Service, PropertyValue::String("USBHUB".into()));
        assert_eq!(compare_items(&a, &b, PropertyClass::Service, SortOrder::Ascending), Ordering::Less);
        assert_eq!(compare_items(&a, &b, PropertyClass::Service, SortOrder::Descending), Ordering::Greater);

        let c = item("3", "Same");
        let d = item("4", "same");
        let forward = compare_items(&c, &d, PropertyClass::Service, SortOrder::Ascending);
        assert_ne!(forward, Ordering::Equal);
        assert_eq!(compare_items(&d, &c, PropertyClass::Service, SortOrder::Ascending), forward.reverse());
    }

    #[test]
    fn test_invalid_last_in_both_directions() {
        let valid = item("1", "A").with_property(PropertyClass::UiNumber, PropertyValue::UInt32(3));
        let invalid = item("2", "B");
        for order in [SortOrder::Ascending, SortOrder::Descending] {
            assert_eq!(compare_items(&valid, &invalid, PropertyClass::UiNumber, order), Ordering::Less);
            assert_eq!(compare_items(&invalid, &valid, PropertyClass::UiNumber, order), Ordering::Greater);
        }
    }

    #[test]
    fn test_total_order_is_transitive() {
        let items: Vec<DeviceItem> = [(1, "c"), (2, "a"), (3, "b"), (4, "a"), (5, "")]
            .iter()
            .map(|(n, name)| {
                let item = item(&format!("ID{n}"), name);
                if *n == 5 {
                    item
                } else {
                    item.with_property(PropertyClass::BusNumber, PropertyValue::UInt32(*n % 2))
                }
            })
            .collect();

        for order in [SortOrder::Ascending, SortOrder::Descending] {
            let cmp = |x: &DeviceItem, y: &DeviceItem| compare_items(x, y, PropertyClass::BusNumber, order);
            for x in &items {
                for y in &items {
                    assert_eq!(cmp(x, y), cmp(y, x).reverse());
                    for z in &items {
                        if cmp(x, y) == Ordering::Less && cmp(y, z) == Ordering::Less {
                            assert_eq!(cmp(x, z), Ordering::Less);
                        }
                    }
                }
            }
        }
    }
}
