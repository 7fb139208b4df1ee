/// Application state management.
///
/// Centralises all mutable state that the UI reads and writes. The device
/// engine lives in a [`DeviceSession`]; its refresh worker communicates via
/// channels and results are published in [`AppState::frame`], which runs
/// once per frame.
///
/// The tree view renders a flat `rows` list rebuilt after every publish,
/// search, sort or expansion change. Collapsed nodes are remembered by
/// instance-id hash so they stay collapsed across republishes.
use chrono::{DateTime, Local};
use devsleuth_core::adapter::{ContextMenu, MenuCommand, TreeNodeProvider, UnsupportedActions};
use devsleuth_core::enumerator::DeviceEnumerator;
use devsleuth_core::model::{DeviceItem, PropertyClass};
use devsleuth_core::query::{SortOrder, SortState};
use devsleuth_core::session::DeviceSession;
use devsleuth_core::settings::{SettingsStore, ViewToggle};
use devsleuth_core::snapshot::{NodeIndex, PublishReport};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cadence of the highlight decay / auto-refresh tick.
///
/// Highlights fade in whole ticks, so this also bounds how late an expired
/// highlight is repainted.
pub const TICK_INTERVAL: Duration = Duration::from_millis(250);

/// A row in the flattened visible-rows list for the tree view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisibleRow {
    pub node: NodeIndex,
    /// Nesting depth (0 = top level). Always 0 while sorted.
    pub depth: u16,
    pub has_children: bool,
    pub is_expanded: bool,
}

/// All application state.
pub struct AppState {
    pub session: DeviceSession,

    // ── Tree view ──────────────────────────────────────
    pub rows: Vec<VisibleRow>,
    collapsed: HashSet<u32>,
    /// Focused row, by instance-id hash.
    focused: Option<u32>,
    pub search_text: String,

    // ── Status ─────────────────────────────────────────
    pub last_publish: Option<PublishReport>,
    pub last_build_time: Option<Duration>,
    pub last_publish_at: Option<DateTime<Local>>,
    /// One-line result of the last command (failures, export).
    pub notice: Option<String>,
    /// Text waiting to be placed on the system clipboard.
    pub clipboard: Option<String>,
    /// Context menu currently shown. Built when the popup opens and kept
    /// until it closes, so its targets stay on the snapshot it was opened on.
    pub open_menu: Option<ContextMenu>,

    // ── UI ─────────────────────────────────────────────
    pub dark_mode: bool,
    pub show_about: bool,
    pub show_details: bool,
    since_tick: Duration,
    last_frame: Instant,
}

impl AppState {
    /// Start a session and show the device tab (which triggers the first
    /// refresh).
    pub fn new(
        enumerator: Arc<dyn DeviceEnumerator>,
        settings: Box<dyn SettingsStore>,
    ) -> anyhow::Result<Self> {
        let session = DeviceSession::new(enumerator, settings)?;
        Ok(Self::with_session(session))
    }

    pub fn with_session(mut session: DeviceSession) -> Self {
        session.set_tab_visible(true);
        Self {
            session,
            rows: Vec::new(),
            collapsed: HashSet::new(),
            focused: None,
            search_text: String::new(),
            last_publish: None,
            last_build_time: None,
            last_publish_at: None,
            notice: None,
            clipboard: None,
            open_menu: None,
            dark_mode: true,
            show_about: false,
            show_details: true,
            since_tick: Duration::ZERO,
            last_frame: Instant::now(),
        }
    }

    /// Per-frame work: publish finished refreshes and advance the tick.
    ///
    /// Returns `true` if the UI should repaint.
    pub fn frame(&mut self) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame);
        self.last_frame = now;
        self.advance(elapsed)
    }

    /// [`frame`](Self::frame) with an explicit elapsed time.
    pub fn advance(&mut self, elapsed: Duration) -> bool {
        let mut repaint = false;

        let processed = self.session.process_messages();
        if let Some(report) = processed.published {
            self.last_publish = Some(report);
            self.last_build_time = processed.build_time;
            self.last_publish_at = Some(Local::now());
            self.rebuild_rows();
            repaint = true;
        }

        self.since_tick += elapsed;
        while self.since_tick >= TICK_INTERVAL {
            self.since_tick -= TICK_INTERVAL;
            if !self.session.on_tick(TICK_INTERVAL).is_empty() {
                repaint = true;
            }
        }
        repaint || processed.repaint
    }

    pub fn is_refreshing(&self) -> bool {
        self.session.is_refreshing()
    }

    /// Anything still counting down needs periodic repaints.
    pub fn has_highlights(&self) -> bool {
        !self.session.adapter().registry().highlights().is_empty()
    }

    // ── Rows ───────────────────────────────────────────────────────

    /// Rebuild the flat row list from the adapter.
    pub fn rebuild_rows(&mut self) {
        let adapter = self.session.adapter();
        let mut rows = Vec::new();

        if adapter.query().is_flat() {
            rows.extend(
                adapter
                    .children(None)
                    .iter()
                    .filter(|&&n| adapter.is_shown(n))
                    .map(|&node| VisibleRow {
                        node,
                        depth: 0,
                        has_children: false,
                        is_expanded: false,
                    }),
            );
        } else if let Some(snapshot) = adapter.snapshot() {
            let mut stack: Vec<(NodeIndex, u16)> = adapter
                .children(None)
                .iter()
                .rev()
                .map(|&n| (n, 0))
                .collect();
            while let Some((node, depth)) = stack.pop() {
                if !adapter.is_shown(node) {
                    continue;
                }
                let children = adapter.children(Some(node));
                let has_children = children.iter().any(|&c| adapter.is_shown(c));
                let is_expanded =
                    has_children && !self.collapsed.contains(&snapshot.node(node).instance_id_hash);
                rows.push(VisibleRow {
                    node,
                    depth,
                    has_children,
                    is_expanded,
                });
                if is_expanded {
                    stack.extend(children.iter().rev().map(|&c| (c, depth + 1)));
                }
            }
        }
        self.rows = rows;
    }

    /// Expand or collapse the node in `row_index`.
    pub fn toggle_expand(&mut self, row_index: usize) {
        let Some(row) = self.rows.get(row_index).copied() else {
            return;
        };
        if !row.has_children {
            return;
        }
        let Some(hash) = self.hash_of(row.node) else {
            return;
        };
        if !self.collapsed.remove(&hash) {
            self.collapsed.insert(hash);
        }
        self.rebuild_rows();
    }

    // ── Selection ──────────────────────────────────────────────────

    /// Click on a row: plain click selects only it, ctrl-click toggles it.
    pub fn click_row(&mut self, row_index: usize, toggle: bool) {
        let Some(row) = self.rows.get(row_index).copied() else {
            return;
        };
        let adapter = self.session.adapter_mut();
        if toggle {
            let selected = adapter.is_selected(row.node);
            adapter.set_selected(row.node, !selected);
        } else {
            adapter.select_only(row.node);
        }
        self.focused = self.hash_of(row.node);
    }

    pub fn clear_selection(&mut self) {
        self.session.adapter_mut().clear_selection();
        self.focused = None;
    }

    /// The focused node in the current snapshot, if it still exists.
    pub fn focused_node(&self) -> Option<NodeIndex> {
        let hash = self.focused?;
        self.session.adapter().snapshot()?.lookup(hash)
    }

    pub fn focused_item(&self) -> Option<&DeviceItem> {
        let node = self.focused_node()?;
        self.session.adapter().item(node)
    }

    fn hash_of(&self, node: NodeIndex) -> Option<u32> {
        self.session
            .adapter()
            .snapshot()
            .map(|s| s.node(node).instance_id_hash)
    }

    // ── View state ─────────────────────────────────────────────────

    /// Apply `search_text` as the filter.
    pub fn apply_search(&mut self) {
        let text = self.search_text.clone();
        if self.session.set_search(&text) {
            self.rebuild_rows();
        }
    }

    /// Column header clicked: cycle the order on the same column, start
    /// ascending on a new one.
    pub fn header_clicked(&mut self, column: PropertyClass) {
        let current = self.session.adapter().query().sort();
        let order = if current.column == column {
            current.order.cycle()
        } else {
            SortOrder::Ascending
        };
        self.session.set_sort(SortState { column, order });
        self.rebuild_rows();
    }

    pub fn set_column_visible(&mut self, column: PropertyClass, visible: bool) {
        if self.session.set_column_visible(column, visible) {
            self.rebuild_rows();
        }
    }

    pub fn flip_toggle(&mut self, toggle: ViewToggle) {
        self.session.flip_toggle(toggle);
        self.rebuild_rows();
    }

    /// Forced re-enumeration.
    pub fn refresh(&mut self) {
        self.session.request_refresh(true);
    }

    // ── Commands ───────────────────────────────────────────────────

    pub fn context_menu(&self, node: NodeIndex, column: Option<PropertyClass>) -> Option<ContextMenu> {
        self.session.context_menu(Some(node), column)
    }

    /// Right-click: capture the menu for `node` against the current snapshot.
    pub fn open_context_menu(&mut self, node: NodeIndex, column: Option<PropertyClass>) {
        self.open_menu = self.context_menu(node, column);
    }

    pub fn close_context_menu(&mut self) {
        self.open_menu = None;
    }

    /// Run `command` from the open menu and close it.
    pub fn run_open_menu_command(&mut self, command: MenuCommand) {
        if let Some(menu) = self.open_menu.take() {
            self.run_menu_command(&menu, command);
        }
    }

    /// Run a context menu command. Copied text lands in `clipboard`,
    /// failures in `notice`.
    pub fn run_menu_command(&mut self, menu: &ContextMenu, command: MenuCommand) {
        let mut actions = UnsupportedActions::default();
        let outcome = self.session.execute_menu_command(menu, command, &mut actions);

        if let Some(text) = actions.clipboard {
            self.clipboard = Some(text);
        }
        self.notice = match outcome.failures.as_slice() {
            [] => None,
            [only] => Some(format!("{}: {}", display_subject(&only.instance_id), only.error)),
            [first, rest @ ..] => Some(format!(
                "{}: {} (and {} more)",
                display_subject(&first.instance_id),
                first.error,
                rest.len()
            )),
        };
        if outcome.toggle.is_some() {
            self.rebuild_rows();
        }
    }

    /// Export the visible rows to CSV.
    pub fn export_csv(&mut self, path: &Path) -> anyhow::Result<usize> {
        let rows = self.session.export_csv(path)?;
        self.notice = Some(format!("Exported {rows} devices to {}", path.display()));
        Ok(rows)
    }
}

fn display_subject(subject: &str) -> &str {
    if subject.is_empty() {
        "Action failed"
    } else {
        subject
    }
}
