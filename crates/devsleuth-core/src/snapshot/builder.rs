/// Snapshot builder: raw enumerator tree in, immutable snapshot out.
///
/// The walk is depth-first from the enumerator's root. Items the inclusion
/// policy rejects are pruned together with their whole subtree. Once the
/// tree shape is fixed the arena is re-ordered by `InstanceIdHash` and all
/// links are remapped, so display order (roots/children) and lookup order
/// (arena) are independent.
use super::{Node, NodeIndex, Snapshot};
use crate::enumerator::DeviceEnumerator;
use crate::model::display::compare_ignore_case;
use crate::model::{DeviceItem, ItemIndex, RawTree};
use crate::settings::TreeConfig;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Device inclusion policy.
///
/// Interfaces need "show interfaces", then either "show disabled
/// interfaces" or an enabled interface. Devices are shown when
/// disconnected devices are shown; otherwise software components are
/// hidden unless enabled, and everything else must be present.
pub fn is_included(item: &DeviceItem, config: &TreeConfig) -> bool {
    if item.device_interface {
        if !config.show_device_interfaces {
            return false;
        }
        return config.show_disabled_device_interfaces || item.interface_enabled();
    }

    if config.show_disconnected {
        return true;
    }
    if !config.show_software_components && item.is_software_component() {
        return false;
    }
    item.is_present()
}

/// Build a snapshot of `raw` under `config`.
pub fn build(raw: Arc<RawTree>, config: &TreeConfig) -> Snapshot {
    let start = Instant::now();
    let Some(root_item) = raw.root() else {
        debug!("Raw tree has no root; building empty snapshot");
        return Snapshot::from_parts(raw, Vec::new(), Vec::new());
    };

    let mut builder = Builder {
        raw: &raw,
        config,
        nodes: Vec::with_capacity(raw.allocated_count()),
    };

    let roots = if config.show_root {
        // The root item is always shown when wrapping.
        vec![builder.create_node(root_item, None)]
    } else {
        let mut roots: Vec<NodeIndex> = raw
            .children(root_item)
            .filter(|&child| is_included(raw.item(child), config))
            .map(|child| builder.create_node(child, None))
            .collect();
        builder.sort_by_name(&mut roots);
        roots
    };

    let nodes = builder.nodes;
    let (nodes, roots) = sort_arena_by_hash(nodes, roots);

    debug!(
        nodes = nodes.len(),
        roots = roots.len(),
        items = raw.allocated_count(),
        elapsed_us = start.elapsed().as_micros() as u64,
        "Snapshot built"
    );
    Snapshot::from_parts(raw, nodes, roots)
}

/// Build only if the raw tree changed.
///
/// Builds when `force`, when nothing has been published yet (`active` is
/// `None`), or when the enumerator returns a different tree than the one
/// the active snapshot was built from. Otherwise the reference is released
/// and `None` is returned.
pub fn create_if_stale(
    enumerator: &dyn DeviceEnumerator,
    active: Option<&Arc<RawTree>>,
    force: bool,
    config: &TreeConfig,
) -> Option<Snapshot> {
    let current = enumerator.reference_current_tree(force);
    let stale = match active {
        None => true,
        Some(active) => force || !Arc::ptr_eq(active, &current),
    };
    if !stale {
        return None;
    }
    Some(build(current, config))
}

// ── Internal ───────────────────────────────────────────────────────

struct Builder<'a> {
    raw: &'a RawTree,
    config: &'a TreeConfig,
    nodes: Vec<Node>,
}

impl Builder<'_> {
    /// Add a node for `item` and, recursively, its included children.
    fn create_node(&mut self, item: ItemIndex, parent: Option<NodeIndex>) -> NodeIndex {
        let raw = self.raw;
        let index = NodeIndex::new(self.nodes.len());
        self.nodes.push(Node {
            item,
            instance_id_hash: raw.item(item).instance_id_hash,
            parent,
            children: Vec::new(),
        });

        let mut children = Vec::with_capacity(raw.children_count(item));
        for child in raw.children(item) {
            if is_included(raw.item(child), self.config) {
                children.push(self.create_node(child, Some(index)));
            }
        }
        self.sort_by_name(&mut children);
        self.nodes[index.idx()].children = children;
        index
    }

    /// Stable case-insensitive name sort, if configured.
    fn sort_by_name(&self, list: &mut [NodeIndex]) {
        if !self.config.sort_children_by_name {
            return;
        }
        let raw = self.raw;
        let nodes = &self.nodes;
        list.sort_by(|a, b| {
            let a = raw.item(nodes[a.idx()].item).name();
            let b = raw.item(nodes[b.idx()].item).name();
            compare_ignore_case(a, b)
        });
    }
}

/// Reorder the arena by hash and remap every link into the new order.
fn sort_arena_by_hash(nodes: Vec<Node>, roots: Vec<NodeIndex>) -> (Vec<Node>, Vec<NodeIndex>) {
    let mut order: Vec<usize> = (0..nodes.len()).collect();
    order.sort_by_key(|&i| nodes[i].instance_id_hash);

    let mut remap = vec![NodeIndex(0); nodes.len()];
    for (new, &old) in order.iter().enumerate() {
        remap[old] = NodeIndex::new(new);
    }

    let mut slots: Vec<Option<Node>> = nodes.into_iter().map(Some).collect();
    let sorted = order
        .iter()
        .filter_map(|&old| slots[old].take())
        .map(|mut node| {
            node.parent = node.parent.map(|p| remap[p.idx()]);
            for child in node.children.iter_mut() {
                *child = remap[child.idx()];
            }
            node
        })
        .collect();

    let roots = roots.into_iter().map(|r| remap[r.idx()]).collect();
    (sorted, roots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enumerator::StaticEnumerator;
    use crate::model::{PropertyClass, PropertyValue};

    fn device(id: &str, name: &str, present: bool) -> DeviceItem {
        DeviceItem::new(id, false)
            .with_property(PropertyClass::Name, PropertyValue::String(name.into()))
            .with_property(PropertyClass::IsPresent, PropertyValue::Boolean(present))
    }

    fn interface(id: &str, enabled: bool) -> DeviceItem {
        DeviceItem::new(id, true)
            .with_property(PropertyClass::InterfaceEnabled, PropertyValue::Boolean(enabled))
    }

    fn hidden_root_config() -> TreeConfig {
        TreeConfig {
            show_root: false,
            ..TreeConfig::default()
        }
    }

    /// Root R with children A (present) and B (not present).
    fn scenario_tree() -> Arc<RawTree> {
        let mut raw = RawTree::with_capacity(3);
        let root = raw.add_root(device("ROOT", "R", true));
        raw.add_child(root, device("DEV\\A", "A", true));
        raw.add_child(root, device("DEV\\B", "B", false));
        Arc::new(raw)
    }

    fn names(snapshot: &Snapshot, list: &[NodeIndex]) -> Vec<String> {
        list.iter().map(|&n| snapshot.item(n).name().to_string()).collect()
    }

    #[test]
    fn test_disconnected_hidden() {
        let snapshot = build(scenario_tree(), &hidden_root_config());
        assert_eq!(names(&snapshot, snapshot.roots()), vec!["A"]);
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_disconnected_shown_arena_sorted_by_hash() {
        let config = TreeConfig {
            show_disconnected: true,
            ..hidden_root_config()
        };
        let snapshot = build(scenario_tree(), &config);

        let mut roots = names(&snapshot, snapshot.roots());
        roots.sort();
        assert_eq!(roots, vec!["A", "B"]);
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.nodes()[0].instance_id_hash <= snapshot.nodes()[1].instance_id_hash);
    }

    #[test]
    fn test_show_root_wraps_under_root_item() {
        let snapshot = build(scenario_tree(), &TreeConfig::default());
        assert_eq!(names(&snapshot, snapshot.roots()), vec!["R"]);
        let root = snapshot.roots()[0];
        assert_eq!(names(&snapshot, &snapshot.node(root).children), vec!["A"]);
        let child = snapshot.node(root).children[0];
        assert_eq!(snapshot.node(child).parent, Some(root));
    }

    #[test]
    fn test_excluded_subtree_is_pruned() {
        let mut raw = RawTree::with_capacity(4);
        let root = raw.add_root(device("ROOT", "R", true));
        let gone = raw.add_child(root, device("HUB", "Hub", false));
        raw.add_child(gone, device("PORT", "Port", true));
        let snapshot = build(Arc::new(raw), &hidden_root_config());
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_children_sorted_by_name_when_configured() {
        let mut raw = RawTree::with_capacity(4);
        let root = raw.add_root(device("ROOT", "R", true));
        raw.add_child(root, device("1", "zeta", true));
        raw.add_child(root, device("2", "Alpha", true));
        raw.add_child(root, device("3", "beta", true));
        let raw = Arc::new(raw);

        let sorted = build(Arc::clone(&raw), &hidden_root_config());
        assert_eq!(names(&sorted, sorted.roots()), vec!["Alpha", "beta", "zeta"]);

        let config = TreeConfig {
            sort_children_by_name: false,
            ..hidden_root_config()
        };
        let unsorted = build(raw, &config);
        assert_eq!(names(&unsorted, unsorted.roots()), vec!["zeta", "Alpha", "beta"]);
    }

    #[test]
    fn test_interface_inclusion() {
        let base = TreeConfig::default();
        assert!(!is_included(&interface("I", true), &base));

        let shown = TreeConfig {
            show_device_interfaces: true,
            ..base.clone()
        };
        assert!(is_included(&interface("I", true), &shown));
        assert!(!is_included(&interface("I", false), &shown));

        let all = TreeConfig {
            show_disabled_device_interfaces: true,
            ..shown
        };
        assert!(is_included(&interface("I", false), &all));
    }

    #[test]
    fn test_software_components_policy() {
        let sw = device("SWD\\X", "Sw", true).with_property(
            PropertyClass::ClassGuid,
            PropertyValue::Guid(crate::model::device_item::GUID_DEVCLASS_SOFTWARECOMPONENT),
        );
        let hide = TreeConfig {
            show_software_components: false,
            ..TreeConfig::default()
        };
        assert!(!is_included(&sw, &hide));
        assert!(is_included(&sw, &TreeConfig::default()));

        // Show-disconnected wins over the software component filter.
        let everything = TreeConfig {
            show_disconnected: true,
            ..hide
        };
        assert!(is_included(&sw, &everything));
    }

    #[test]
    fn test_build_is_deterministic() {
        let raw = scenario_tree();
        let config = TreeConfig {
            show_disconnected: true,
            ..hidden_root_config()
        };
        let a = build(Arc::clone(&raw), &config);
        let b = build(raw, &config);
        let hashes = |s: &Snapshot| s.nodes().iter().map(|n| n.instance_id_hash).collect::<Vec<_>>();
        assert_eq!(hashes(&a), hashes(&b));
        assert_eq!(a.roots(), b.roots());
    }

    #[test]
    fn test_lookup_present_and_absent() {
        let config = TreeConfig {
            show_disconnected: true,
            ..TreeConfig::default()
        };
        let snapshot = build(scenario_tree(), &config);
        for node in snapshot.node_indices() {
            let hash = snapshot.node(node).instance_id_hash;
            assert_eq!(snapshot.lookup(hash), Some(node));
        }
        let absent = crate::model::instance_id_hash("DEV\\MISSING");
        assert_eq!(snapshot.lookup(absent), None);
    }

    #[test]
    fn test_empty_raw_tree() {
        let snapshot = build(Arc::new(RawTree::empty()), &TreeConfig::default());
        assert!(snapshot.is_empty());
        assert!(snapshot.roots().is_empty());
    }

    #[test]
    fn test_create_if_stale() {
        let mut raw = RawTree::with_capacity(1);
        raw.add_root(device("ROOT", "R", true));
        let enumerator = StaticEnumerator::new(raw);
        let config = TreeConfig::default();

        let first = create_if_stale(&enumerator, None, false, &config).unwrap();
        let active = Arc::clone(first.raw_tree());

        assert!(create_if_stale(&enumerator, Some(&active), false, &config).is_none());
        assert!(create_if_stale(&enumerator, Some(&active), true, &config).is_some());

        enumerator.replace(RawTree::empty());
        let rebuilt = create_if_stale(&enumerator, Some(&active), false, &config).unwrap();
        assert!(rebuilt.is_empty());
    }
}
