/// Device enumerators: the source of raw device trees.
///
/// An enumerator hands out the current raw tree as `Arc<RawTree>`. When
/// nothing changed since the last call it must return the *same* `Arc`,
/// which is how the snapshot builder detects a stale tree without
/// comparing contents.
pub mod dump;

pub use dump::JsonDumpEnumerator;

use crate::model::RawTree;
use parking_lot::Mutex;
use std::sync::Arc;

/// Provider of raw device trees. Called from the refresh worker thread.
pub trait DeviceEnumerator: Send + Sync {
    /// Reference the current tree. `force` asks the provider to re-enumerate
    /// even if it believes its cached tree is current.
    fn reference_current_tree(&self, force: bool) -> Arc<RawTree>;
}

/// In-memory enumerator whose tree is swapped by the caller.
///
/// Used by tests and by embedders that enumerate devices themselves.
#[derive(Debug, Default)]
pub struct StaticEnumerator {
    tree: Mutex<Arc<RawTree>>,
}

impl StaticEnumerator {
    pub fn new(tree: RawTree) -> Self {
        Self {
            tree: Mutex::new(Arc::new(tree)),
        }
    }

    /// Publish a new tree; the next reference returns it.
    pub fn replace(&self, tree: RawTree) {
        *self.tree.lock() = Arc::new(tree);
    }
}

impl DeviceEnumerator for StaticEnumerator {
    fn reference_current_tree(&self, _force: bool) -> Arc<RawTree> {
        Arc::clone(&self.tree.lock())
    }
}

impl<T: DeviceEnumerator + ?Sized> DeviceEnumerator for Arc<T> {
    fn reference_current_tree(&self, force: bool) -> Arc<RawTree> {
        (**self).reference_current_tree(force)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DeviceItem;

    #[test]
    fn test_static_enumerator_identity() {
        let mut tree = RawTree::with_capacity(1);
        tree.add_root(DeviceItem::new("ROOT", false));
        let enumerator = StaticEnumerator::new(tree);

        let a = enumerator.reference_current_tree(false);
        let b = enumerator.reference_current_tree(true);
        assert!(Arc::ptr_eq(&a, &b));

        enumerator.replace(RawTree::empty());
        let c = enumerator.reference_current_tree(false);
        assert!(!Arc::ptr_eq(&a, &c));
        assert!(c.is_empty());
    }
}
