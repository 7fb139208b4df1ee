/// Arena-backed raw device tree, as produced by an enumerator.
///
/// All items live in a single `Vec<DeviceItem>`. Relationships use
/// `ItemIndex` rather than heap pointers. Raw trees are immutable once
/// handed out; enumerators share them as `Arc<RawTree>` and a new
/// enumeration always produces a new tree, so `Arc::ptr_eq` is the
/// "has anything changed" test.
use super::device_item::{DeviceItem, ItemIndex};

/// The complete device forest reported by one enumeration.
#[derive(Debug, Clone, Default)]
pub struct RawTree {
    /// Arena: every item in a flat vector.
    items: Vec<DeviceItem>,

    /// The enumerator's root item (the computer), if any.
    root: Option<ItemIndex>,
}

impl RawTree {
    /// Create an empty tree with pre-allocated capacity.
    pub fn with_capacity(estimated_items: usize) -> Self {
        Self {
            items: Vec::with_capacity(estimated_items),
            root: None,
        }
    }

    /// An empty tree: no root, no items.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Allocate an item in the arena and make it the root.
    pub fn add_root(&mut self, item: DeviceItem) -> ItemIndex {
        let idx = self.add_item(item);
        self.root = Some(idx);
        idx
    }

    /// Allocate an item and attach it as the last child of `parent`.
    ///
    /// Appending keeps children in enumerator order, which is the order
    /// the tree shows when name sorting is off.
    pub fn add_child(&mut self, parent: ItemIndex, item: DeviceItem) -> ItemIndex {
        let child = self.add_item(item);
        self.items[child.idx()].parent = Some(parent);

        match self.items[parent.idx()].last_child {
            Some(last) => self.items[last.idx()].next_sibling = Some(child),
            None => self.items[parent.idx()].first_child = Some(child),
        }
        let parent_item = &mut self.items[parent.idx()];
        parent_item.last_child = Some(child);
        parent_item.children_count += 1;
        child
    }

    fn add_item(&mut self, mut item: DeviceItem) -> ItemIndex {
        item.parent = None;
        item.first_child = None;
        item.last_child = None;
        item.next_sibling = None;
        item.children_count = 0;
        let idx = ItemIndex::new(self.items.len());
        self.items.push(item);
        idx
    }

    /// The root item, if the enumeration produced one.
    #[inline]
    pub fn root(&self) -> Option<ItemIndex> {
        self.root
    }

    /// Get the item at the given index.
    #[inline]
    pub fn item(&self, index: ItemIndex) -> &DeviceItem {
        &self.items[index.idx()]
    }

    /// Iterate the direct children of `parent` in enumerator order.
    pub fn children(&self, parent: ItemIndex) -> Children<'_> {
        Children {
            tree: self,
            next: self.items[parent.idx()].first_child,
        }
    }

    #[inline]
    pub fn children_count(&self, parent: ItemIndex) -> usize {
        self.items[parent.idx()].children_count as usize
    }

    #[inline]
    pub fn parent(&self, index: ItemIndex) -> Option<ItemIndex> {
        self.items[index.idx()].parent
    }

    /// Number of items allocated in the arena, whether reachable or not.
    #[inline]
    pub fn allocated_count(&self) -> usize {
        self.items.len()
    }

    /// All items in arena order.
    pub fn items(&self) -> &[DeviceItem] {
        &self.items
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Iterator over a sibling chain.
pub struct Children<'a> {
    tree: &'a RawTree,
    next: Option<ItemIndex>,
}

impl Iterator for Children<'_> {
    type Item = ItemIndex;

    fn next(&mut self) -> Option<ItemIndex> {
        let current = self.next?;
        self.next = self.tree.items[current.idx()].next_sibling;
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_keep_insertion_order() {
        let mut tree = RawTree::with_capacity(4);
        let root = tree.add_root(DeviceItem::new("ROOT", false));
        let a = tree.add_child(root, DeviceItem::new("A", false));
        let b = tree.add_child(root, DeviceItem::new("B", false));
        let c = tree.add_child(root, DeviceItem::new("C", false));

        assert_eq!(tree.children(root).collect::<Vec<_>>(), vec![a, b, c]);
        assert_eq!(tree.children_count(root), 3);
        assert_eq!(tree.parent(b), Some(root));
        assert_eq!(tree.allocated_count(), 4);
    }

    #[test]
    fn test_nested_children() {
        let mut tree = RawTree::with_capacity(3);
        let root = tree.add_root(DeviceItem::new("ROOT", false));
        let hub = tree.add_child(root, DeviceItem::new("HUB", false));
        let port = tree.add_child(hub, DeviceItem::new("PORT", false));

        assert_eq!(tree.children(hub).collect::<Vec<_>>(), vec![port]);
        assert_eq!(tree.children(port).count(), 0);
        assert_eq!(tree.root(), Some(root));
    }

    #[test]
    fn test_empty_tree() {
        let tree = RawTree::empty();
        assert!(tree.is_empty());
        assert_eq!(tree.root(), None);
    }
}
