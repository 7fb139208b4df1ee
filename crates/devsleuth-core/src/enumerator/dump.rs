/// JSON device dump enumerator.
///
/// A dump is one root item with nested children:
///
/// ```json
/// {
///   "instance_id": "HTREE\\ROOT\\0",
///   "properties": { "Name": { "String": "Computer" } },
///   "children": [ ... ]
/// }
/// ```
///
/// Property values use the externally tagged [`PropertyValue`] form. Items
/// marked `"interface": true` are device interfaces.
use super::DeviceEnumerator;
use crate::error::{DevSleuthError, Result};
use crate::model::{DeviceItem, ItemIndex, PropertyClass, PropertyValue, RawTree};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// One item in a dump file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DumpItem {
    pub instance_id: String,
    #[serde(default)]
    pub interface: bool,
    #[serde(default)]
    pub properties: BTreeMap<PropertyClass, PropertyValue>,
    #[serde(default)]
    pub children: Vec<DumpItem>,
}

impl DumpItem {
    fn to_device_item(&self) -> DeviceItem {
        let mut item = DeviceItem::new(self.instance_id.as_str(), self.interface);
        for (&class, value) in &self.properties {
            if value.kind() != class.property_type() {
                warn!(
                    instance_id = %self.instance_id,
                    ?class,
                    "Dump property has the wrong type; ignored"
                );
                continue;
            }
            item.set_property(class, value.clone());
        }
        item
    }

    fn count(&self) -> usize {
        1 + self.children.iter().map(DumpItem::count).sum::<usize>()
    }
}

/// Convert a parsed dump into a raw tree.
pub fn raw_tree_from_dump(root: &DumpItem) -> RawTree {
    let mut tree = RawTree::with_capacity(root.count());
    let root_index = tree.add_root(root.to_device_item());

    let mut stack: Vec<(ItemIndex, &DumpItem)> = vec![(root_index, root)];
    while let Some((parent, dump)) = stack.pop() {
        for child in &dump.children {
            let index = tree.add_child(parent, child.to_device_item());
            stack.push((index, child));
        }
    }
    tree
}

/// Read and parse a dump file.
pub fn load_dump(path: &Path) -> Result<RawTree> {
    let text = std::fs::read_to_string(path).map_err(|source| DevSleuthError::DumpIo {
        path: path.to_path_buf(),
        source,
    })?;
    let root: DumpItem =
        serde_json::from_str(&text).map_err(|source| DevSleuthError::DumpFormat {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(raw_tree_from_dump(&root))
}

struct Cached {
    tree: Arc<RawTree>,
    mtime: Option<SystemTime>,
    loaded: bool,
}

/// Enumerator backed by a JSON dump on disk.
///
/// The parsed tree is cached and handed out as the same `Arc` until the
/// file's modification time changes or a forced refresh asks for a
/// re-read.
pub struct JsonDumpEnumerator {
    path: PathBuf,
    cache: Mutex<Cached>,
}

impl JsonDumpEnumerator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(Cached {
                tree: Arc::new(RawTree::empty()),
                mtime: None,
                loaded: false,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn modified(&self) -> Option<SystemTime> {
        std::fs::metadata(&self.path).and_then(|m| m.modified()).ok()
    }
}

impl DeviceEnumerator for JsonDumpEnumerator {
    fn reference_current_tree(&self, force: bool) -> Arc<RawTree> {
        let mut cache = self.cache.lock();
        let mtime = self.modified();
        if cache.loaded && !force && mtime == cache.mtime {
            return Arc::clone(&cache.tree);
        }

        match load_dump(&self.path) {
            Ok(tree) => {
                info!(
                    path = %self.path.display(),
                    items = tree.len(),
                    "Device dump loaded"
                );
                cache.tree = Arc::new(tree);
            }
            Err(e) => {
                warn!("Failed to load device dump: {e}");
                // Keep identity stable across repeated failures.
                if !cache.tree.is_empty() {
                    cache.tree = Arc::new(RawTree::empty());
                }
            }
        }
        cache.mtime = mtime;
        cache.loaded = true;
        debug!(force, "Dump enumerator refreshed");
        Arc::clone(&cache.tree)
    }
}
