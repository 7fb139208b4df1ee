/// Query surface over the published snapshot: sorting, search filtering,
/// visible columns and the selection query.
///
/// Sorting never touches the snapshot's hash-ordered arena. When a sort
/// column is active the query keeps its own flat, sorted index view and the
/// tree is shown as a flat list.
pub mod columns;
pub mod compare;
pub mod search;

pub use columns::{column, ColumnDef, ColumnSet};
pub use compare::{compare_items, compare_properties};
pub use search::SearchTerm;

use crate::model::PropertyClass;
use crate::snapshot::{NodeIndex, PublishedTree, Snapshot};

/// Sort direction of the active sort column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    None,
    Ascending,
    Descending,
}

impl SortOrder {
    fn to_setting(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Ascending => 1,
            Self::Descending => 2,
        }
    }

    fn from_setting(value: u8) -> Self {
        match value {
            1 => Self::Ascending,
            2 => Self::Descending,
            _ => Self::None,
        }
    }

    /// Next order when a column header is clicked repeatedly.
    pub fn cycle(self) -> Self {
        match self {
            Self::None => Self::Ascending,
            Self::Ascending => Self::Descending,
            Self::Descending => Self::None,
        }
    }
}

/// Sort column and order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub column: PropertyClass,
    pub order: SortOrder,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            column: PropertyClass::Name,
            order: SortOrder::None,
        }
    }
}

impl SortState {
    /// `true` when a column sort is in effect (flat mode).
    pub fn is_active(&self) -> bool {
        self.order != SortOrder::None
    }

    /// Persisted form: `"<class index>,<order>"`.
    pub fn to_setting(&self) -> String {
        format!("{},{}", self.column.index(), self.order.to_setting())
    }

    pub fn from_setting(text: &str) -> Self {
        let mut parts = text.split(',').map(str::trim);
        let column = parts
            .next()
            .and_then(|p| p.parse::<usize>().ok())
            .and_then(PropertyClass::from_index);
        let order = parts.next().and_then(|p| p.parse::<u8>().ok());
        match (column, order) {
            (Some(column), Some(order)) => Self {
                column,
                order: SortOrder::from_setting(order),
            },
            _ => Self::default(),
        }
    }
}

/// Sort, search and column state for one tree view.
#[derive(Debug, Clone, Default)]
pub struct QueryState {
    sort: SortState,
    search: Option<SearchTerm>,
    columns: ColumnSet,
    /// Flat sorted view; empty unless a sort is active.
    sorted: Vec<NodeIndex>,
    /// Nodes shown in hierarchical mode: visible, or an ancestor of a
    /// visible node.
    shown: Vec<bool>,
}

impl QueryState {
    pub fn new(columns: ColumnSet, sort: SortState) -> Self {
        Self {
            sort,
            columns,
            ..Self::default()
        }
    }

    pub fn sort(&self) -> SortState {
        self.sort
    }

    /// Flat (sorted) mode rather than hierarchical.
    pub fn is_flat(&self) -> bool {
        self.sort.is_active()
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    pub fn columns_mut(&mut self) -> &mut ColumnSet {
        &mut self.columns
    }

    pub fn search(&self) -> Option<&SearchTerm> {
        self.search.as_ref()
    }

    /// Change the sort and re-derive the flat order.
    pub fn set_sort(&mut self, sort: SortState, snapshot: Option<&Snapshot>) {
        self.sort = sort;
        match snapshot {
            Some(snapshot) => self.resort(snapshot),
            None => self.sorted.clear(),
        }
    }

    /// Recompute the flat sorted ordering for `snapshot`.
    pub fn resort(&mut self, snapshot: &Snapshot) {
        self.sorted.clear();
        if !self.sort.is_active() {
            return;
        }
        let SortState { column, order } = self.sort;
        self.sorted.extend(snapshot.node_indices());
        self.sorted.sort_by(|&a, &b| {
            compare_items(snapshot.item(a), snapshot.item(b), column, order)
        });
    }

    /// The flat sorted view (empty in hierarchical mode).
    pub fn sorted(&self) -> &[NodeIndex] {
        &self.sorted
    }

    /// Children of `parent` as the view shows them: the sorted flat list
    /// for the root in flat mode, nothing below it; the snapshot's
    /// hierarchy otherwise.
    pub fn children<'a>(&'a self, snapshot: &'a Snapshot, parent: Option<NodeIndex>) -> &'a [NodeIndex] {
        if self.is_flat() {
            return match parent {
                None => &self.sorted,
                Some(_) => &[],
            };
        }
        snapshot.children(parent)
    }

    /// Replace the search term. Returns `true` if the filter changed.
    pub fn set_search(&mut self, term: &str) -> bool {
        let next = SearchTerm::new(term);
        if next.as_ref().map(SearchTerm::as_str).map(str::trim)
            == self.search.as_ref().map(SearchTerm::as_str).map(str::trim)
        {
            return false;
        }
        self.search = next;
        true
    }

    /// Recompute the visible flag of every node.
    pub fn apply_filters(&mut self, published: &mut PublishedTree) {
        let snapshot = &published.snapshot;
        let columns = self.columns.visible();

        for node in snapshot.node_indices() {
            published.states[node.idx()].visible = match &self.search {
                None => true,
                Some(term) => term.matches(snapshot.item(node), columns),
            };
        }

        self.shown = published.states.iter().map(|s| s.visible).collect();
        // Keep ancestors of visible nodes so matches stay reachable.
        for node in snapshot.node_indices() {
            if !published.states[node.idx()].visible {
                continue;
            }
            let mut parent = snapshot.node(node).parent;
            while let Some(p) = parent {
                if self.shown[p.idx()] {
                    break;
                }
                self.shown[p.idx()] = true;
                parent = snapshot.node(p).parent;
            }
        }
    }

    /// Whether the view shows `node` in hierarchical mode.
    pub fn is_shown(&self, published: &PublishedTree, node: NodeIndex) -> bool {
        if self.is_flat() {
            return published.state(node).visible;
        }
        self.shown
            .get(node.idx())
            .copied()
            .unwrap_or_else(|| published.state(node).visible)
    }

    /// All visible nodes in display order.
    pub fn display_order(&self, published: &PublishedTree) -> Vec<NodeIndex> {
        let snapshot = &published.snapshot;
        if self.is_flat() {
            return self
                .sorted
                .iter()
                .copied()
                .filter(|&n| published.state(n).visible)
                .collect();
        }

        let mut out = Vec::with_capacity(snapshot.len());
        let mut stack: Vec<NodeIndex> = snapshot.roots().iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            if published.state(node).visible {
                out.push(node);
            }
            stack.extend(snapshot.node(node).children.iter().rev().copied());
        }
        out
    }

    /// Visible and selected nodes, in display order.
    pub fn selected(&self, published: &PublishedTree) -> Vec<NodeIndex> {
        self.display_order(published)
            .into_iter()
            .filter(|&n| published.state(n).selected)
            .collect()
    }
}
