/// Presentation adapter: bridges the published snapshot to a pull-based
/// tree view.
///
/// The view asks for children, leaf-ness, cell text, colors and icons one
/// request at a time through [`TreeNodeProvider`]. [`DeviceTreeAdapter`]
/// answers from the registry's active snapshot and the query state, and
/// owns the UI-thread side of publishing (diff, resort, refilter).
pub mod color;
pub mod icons;
pub mod menu;

pub use color::node_color;
pub use icons::{IconCache, IconIndex};
pub use menu::{
    ActionError, ActionFailure, ContextMenu, DeviceActions, MenuCommand, MenuEntry, MenuItem,
    MenuOutcome, RegistryKey, UnsupportedActions,
};

use crate::diff::HighlightState;
use crate::model::{DeviceItem, PropertyClass};
use crate::query::{ColumnSet, QueryState, SortState};
use crate::settings::{Color, TreeConfig};
use crate::snapshot::{NodeIndex, PublishReport, PublishedTree, Snapshot, SnapshotRegistry};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Text of one cell. The name column shows the resolved display name.
pub fn cell_text(item: &DeviceItem, class: PropertyClass) -> &str {
    match class {
        PropertyClass::Name => item.name(),
        _ => item.property(class).as_str(),
    }
}

/// The tree view's callback protocol, one method per request kind.
pub trait TreeNodeProvider {
    /// Children of `parent` (`None` for the top level). In sorted mode the
    /// top level is the whole flat list and nodes have no children.
    fn children(&self, parent: Option<NodeIndex>) -> &[NodeIndex];

    /// Always `true` in sorted mode.
    fn is_leaf(&self, node: NodeIndex) -> bool;

    fn cell_text(&self, node: NodeIndex, class: PropertyClass) -> &str;

    /// Row background, `None` for the default.
    fn node_color(&self, node: NodeIndex) -> Option<Color>;

    fn node_icon(&mut self, node: NodeIndex) -> IconIndex;

    /// The user changed the sort column or order.
    fn sort_changed(&mut self, sort: SortState);

    /// Build the context menu for a right-click on `node`/`column`.
    fn context_menu(&self, node: Option<NodeIndex>, column: Option<PropertyClass>) -> Option<ContextMenu>;
}

pub struct DeviceTreeAdapter {
    registry: SnapshotRegistry,
    query: QueryState,
    icons: IconCache,
    config: Arc<TreeConfig>,
    elevated: bool,
}

impl DeviceTreeAdapter {
    pub fn new(config: Arc<TreeConfig>, columns: ColumnSet, sort: SortState, elevated: bool) -> Self {
        Self {
            registry: SnapshotRegistry::new(),
            query: QueryState::new(columns, sort),
            icons: IconCache::new(),
            config,
            elevated,
        }
    }

    pub fn config(&self) -> &Arc<TreeConfig> {
        &self.config
    }

    /// Replace the configuration. Takes effect on the next color request;
    /// inclusion changes need a republish, which the caller schedules.
    pub fn set_config(&mut self, config: Arc<TreeConfig>) {
        self.config = config;
    }

    pub fn is_elevated(&self) -> bool {
        self.elevated
    }

    pub fn registry(&self) -> &SnapshotRegistry {
        &self.registry
    }

    pub fn query(&self) -> &QueryState {
        &self.query
    }

    pub fn published(&self) -> Option<&PublishedTree> {
        self.registry.active()
    }

    pub fn snapshot(&self) -> Option<&Arc<Snapshot>> {
        self.registry.active_snapshot()
    }

    /// Publish a new snapshot: swap, diff, resort and reapply the filter.
    pub fn publish(&mut self, snapshot: Arc<Snapshot>, now_ticks: i64) -> PublishReport {
        let report = self.registry.publish(snapshot, &self.config, now_ticks);
        if let Some(published) = self.registry.active_mut() {
            self.query.resort(&published.snapshot);
            self.query.apply_filters(published);
        }
        report
    }

    /// Advance highlight decay; returns nodes whose highlight ended.
    pub fn tick(&mut self, elapsed: Duration) -> Vec<NodeIndex> {
        self.registry.tick(elapsed)
    }

    /// Reapply filters and drop cached presentation state after an
    /// appearance-only change.
    pub fn invalidate(&mut self) {
        if let Some(published) = self.registry.active_mut() {
            self.query.apply_filters(published);
        }
        debug!("Device tree invalidated");
    }

    /// Forget icon assignments (e.g. after a DPI change).
    pub fn clear_icons(&mut self) {
        self.icons.clear();
    }

    pub fn icons(&self) -> &IconCache {
        &self.icons
    }

    // ── Search / columns ───────────────────────────────────────────

    /// Set the search text. Returns `true` if the visible set changed.
    pub fn set_search(&mut self, term: &str) -> bool {
        if !self.query.set_search(term) {
            return false;
        }
        if let Some(published) = self.registry.active_mut() {
            self.query.apply_filters(published);
        }
        true
    }

    pub fn columns(&self) -> &ColumnSet {
        self.query.columns()
    }

    /// Show or hide a column. Search covers visible columns only, so the
    /// filter is reapplied.
    pub fn set_column_visible(&mut self, class: PropertyClass, visible: bool) -> bool {
        if !self.query.columns_mut().set_visible(class, visible) {
            return false;
        }
        if let Some(published) = self.registry.active_mut() {
            self.query.apply_filters(published);
        }
        true
    }

    // ── Nodes ──────────────────────────────────────────────────────

    /// The device item behind a node of the active snapshot.
    pub fn item(&self, node: NodeIndex) -> Option<&DeviceItem> {
        self.snapshot().map(|s| s.item(node))
    }

    /// Passes the search filter.
    pub fn is_visible(&self, node: NodeIndex) -> bool {
        self.published().is_some_and(|p| p.state(node).visible)
    }

    /// Shown by the view: visible, or in tree mode an ancestor of a
    /// visible node.
    pub fn is_shown(&self, node: NodeIndex) -> bool {
        self.published()
            .is_some_and(|p| self.query.is_shown(p, node))
    }

    pub fn highlight(&self, node: NodeIndex) -> HighlightState {
        self.registry.highlight(node)
    }

    /// All visible nodes in display order.
    pub fn display_order(&self) -> Vec<NodeIndex> {
        self.published()
            .map(|p| self.query.display_order(p))
            .unwrap_or_default()
    }

    // ── Selection ──────────────────────────────────────────────────

    pub fn is_selected(&self, node: NodeIndex) -> bool {
        self.published().is_some_and(|p| p.state(node).selected)
    }

    pub fn set_selected(&mut self, node: NodeIndex, selected: bool) {
        if let Some(published) = self.registry.active_mut() {
            published.state_mut(node).selected = selected;
        }
    }

    /// Select exactly one node.
    pub fn select_only(&mut self, node: NodeIndex) {
        self.clear_selection();
        self.set_selected(node, true);
    }

    pub fn clear_selection(&mut self) {
        if let Some(published) = self.registry.active_mut() {
            for state in published.states.iter_mut() {
                state.selected = false;
            }
        }
    }

    /// Visible selected nodes in display order.
    pub fn selected_nodes(&self) -> Vec<NodeIndex> {
        self.published()
            .map(|p| self.query.selected(p))
            .unwrap_or_default()
    }

    /// Visible selected device items in display order.
    pub fn selected_items(&self) -> Vec<&DeviceItem> {
        match self.snapshot() {
            Some(snapshot) => self
                .selected_nodes()
                .into_iter()
                .map(|n| snapshot.item(n))
                .collect(),
            None => Vec::new(),
        }
    }
}

impl TreeNodeProvider for DeviceTreeAdapter {
    fn children(&self, parent: Option<NodeIndex>) -> &[NodeIndex] {
        match self.snapshot() {
            Some(snapshot) => self.query.children(snapshot, parent),
            None => &[],
        }
    }

    fn is_leaf(&self, node: NodeIndex) -> bool {
        if self.query.is_flat() {
            return true;
        }
        self.snapshot()
            .map_or(true, |s| s.node(node).children.is_empty())
    }

    fn cell_text(&self, node: NodeIndex, class: PropertyClass) -> &str {
        self.item(node).map_or("", |item| cell_text(item, class))
    }

    fn node_color(&self, node: NodeIndex) -> Option<Color> {
        let item = self.item(node)?;
        node_color(item, self.registry.highlight(node), &self.config)
    }

    fn node_icon(&mut self, node: NodeIndex) -> IconIndex {
        match self.registry.active_snapshot() {
            Some(snapshot) => self.icons.icon_for(snapshot.item(node)),
            None => IconIndex::GENERIC,
        }
    }

    fn sort_changed(&mut self, sort: SortState) {
        let snapshot = self.registry.active_snapshot().map(Arc::clone);
        self.query.set_sort(sort, snapshot.as_deref());
        debug!(column = ?sort.column, order = ?sort.order, "Sort changed");
    }

    fn context_menu(&self, node: Option<NodeIndex>, column: Option<PropertyClass>) -> Option<ContextMenu> {
        let snapshot = Arc::clone(self.snapshot()?);
        Some(ContextMenu::new(
            snapshot,
            node,
            self.selected_nodes(),
            self.columns().visible().to_vec(),
            column,
            &self.config,
            self.elevated,
        ))
    }
}
