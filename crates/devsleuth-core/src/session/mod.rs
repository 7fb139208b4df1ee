/// Device session: the UI-thread orchestrator.
///
/// Owns the presentation adapter, the refresh worker and the settings
/// store, and turns frontend events (tab shown, device notification,
/// timer tick, menu command, settings change) into refresh requests,
/// publishes and redraw-only invalidations.
use crate::adapter::{
    ContextMenu, DeviceActions, DeviceTreeAdapter, MenuCommand, MenuOutcome, TreeNodeProvider,
};
use crate::enumerator::DeviceEnumerator;
use crate::error::Result;
use crate::model::display::filetime_now;
use crate::model::PropertyClass;
use crate::platform;
use crate::query::{ColumnSet, SortState};
use crate::refresh::{RefreshMessage, RefreshRequest, RefreshWorker};
use crate::settings::{self, SettingsStore, ToggleEffect, TreeConfig, ViewToggle};
use crate::snapshot::{NodeIndex, PublishReport};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Maximum refresh results drained from the worker per frame.
///
/// Each result is a full publish (diff, resort, refilter), so a backlog is
/// spread over several frames instead of stalling one.
pub const MAX_MESSAGES_PER_FRAME: usize = 4;

/// How often the tick source re-checks the enumerator while the device
/// tab is visible and auto refresh is on.
pub const AUTO_REFRESH_INTERVAL: Duration = Duration::from_secs(2);

/// Result of one [`DeviceSession::process_messages`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// Something arrived; repaint.
    pub repaint: bool,
    /// Report of the last publish, if any happened.
    pub published: Option<PublishReport>,
    /// Build time of the last published snapshot.
    pub build_time: Option<Duration>,
}

pub struct DeviceSession {
    adapter: DeviceTreeAdapter,
    worker: RefreshWorker,
    settings: Box<dyn SettingsStore>,
    config: Arc<TreeConfig>,
    tab_visible: bool,
    since_refresh: Duration,
    /// Sequence number of the last refresh requested.
    requested_seq: u64,
    /// Highest sequence number the worker has answered.
    answered_seq: u64,
}

impl DeviceSession {
    /// Load settings, restore the column and sort layout and start the
    /// refresh worker. Nothing is enumerated until the tab becomes visible
    /// or a refresh is requested.
    pub fn new(enumerator: Arc<dyn DeviceEnumerator>, settings: Box<dyn SettingsStore>) -> Result<Self> {
        Self::with_elevation(enumerator, settings, platform::is_elevated())
    }

    /// As [`new`](Self::new) with an explicit elevation state.
    pub fn with_elevation(
        enumerator: Arc<dyn DeviceEnumerator>,
        settings: Box<dyn SettingsStore>,
        elevated: bool,
    ) -> Result<Self> {
        let config = Arc::new(TreeConfig::load(settings.as_ref()));
        let columns = settings
            .get_string(settings::TREE_COLUMNS)
            .map(|text| ColumnSet::from_setting(&text))
            .unwrap_or_default();
        let sort = settings
            .get_string(settings::TREE_SORT)
            .map(|text| SortState::from_setting(&text))
            .unwrap_or_default();

        let worker = RefreshWorker::start(enumerator)?;
        info!(elevated, columns = columns.visible().len(), "Device session started");

        Ok(Self {
            adapter: DeviceTreeAdapter::new(Arc::clone(&config), columns, sort, elevated),
            worker,
            settings,
            config,
            tab_visible: false,
            since_refresh: Duration::ZERO,
            requested_seq: 0,
            answered_seq: 0,
        })
    }

    pub fn adapter(&self) -> &DeviceTreeAdapter {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut DeviceTreeAdapter {
        &mut self.adapter
    }

    pub fn config(&self) -> &Arc<TreeConfig> {
        &self.config
    }

    pub fn settings(&self) -> &dyn SettingsStore {
        self.settings.as_ref()
    }

    /// Write access for a settings editor. Call
    /// [`on_settings_changed`](Self::on_settings_changed) afterwards.
    pub fn settings_mut(&mut self) -> &mut dyn SettingsStore {
        self.settings.as_mut()
    }

    pub fn is_tab_visible(&self) -> bool {
        self.tab_visible
    }

    /// A refresh was requested and its result has not been processed.
    pub fn is_refreshing(&self) -> bool {
        self.is_pending() || self.worker.is_busy()
    }

    /// The latest request has not been answered yet.
    fn is_pending(&self) -> bool {
        self.answered_seq < self.requested_seq
    }

    // ── Refresh triggers ───────────────────────────────────────────

    /// Ask the worker for a new snapshot. Without `force` the worker only
    /// builds when the enumerator's tree changed.
    pub fn request_refresh(&mut self, force: bool) {
        self.requested_seq += 1;
        self.worker.request(RefreshRequest {
            seq: self.requested_seq,
            force,
            config: Arc::clone(&self.config),
            active: self.adapter.registry().active_raw_tree().cloned(),
        });
        self.since_refresh = Duration::ZERO;
        debug!(force, "Refresh requested");
    }

    /// The platform reported a device arrival or removal. Returns `true`
    /// if a refresh was requested.
    pub fn on_device_notification(&mut self) -> bool {
        if self.tab_visible && self.config.auto_refresh {
            self.request_refresh(false);
            return true;
        }
        false
    }

    /// Advance highlight decay by `elapsed` and run the periodic
    /// auto-refresh check. Returns nodes whose highlight ended.
    pub fn on_tick(&mut self, elapsed: Duration) -> Vec<NodeIndex> {
        let expired = self.adapter.tick(elapsed);

        self.since_refresh = self.since_refresh.saturating_add(elapsed);
        if self.tab_visible
            && self.config.auto_refresh
            && !self.is_pending()
            && self.since_refresh >= AUTO_REFRESH_INTERVAL
        {
            self.request_refresh(false);
        }
        expired
    }

    /// The device tab was shown or hidden. Showing it checks for changes
    /// missed while hidden.
    pub fn set_tab_visible(&mut self, visible: bool) {
        let shown = visible && !self.tab_visible;
        self.tab_visible = visible;
        if shown {
            self.request_refresh(false);
        }
    }

    /// Drain finished builds from the worker and publish them.
    pub fn process_messages(&mut self) -> ProcessOutcome {
        let mut outcome = ProcessOutcome::default();

        let mut messages_this_frame = 0usize;
        while messages_this_frame < MAX_MESSAGES_PER_FRAME {
            let msg = match self.worker.result_rx.try_recv() {
                Ok(m) => m,
                Err(_) => break,
            };
            messages_this_frame += 1;
            // Coalesced requests answer with the latest folded-in seq.
            self.answered_seq = self.answered_seq.max(msg.seq());

            match msg {
                RefreshMessage::Built {
                    snapshot,
                    forced,
                    duration,
                    ..
                } => {
                    let report = self.adapter.publish(snapshot, filetime_now());
                    debug!(forced, ms = duration.as_millis() as u64, "Snapshot published");
                    outcome.published = Some(report);
                    outcome.build_time = Some(duration);
                    outcome.repaint = true;
                }
                RefreshMessage::Unchanged { .. } => {}
            }
        }
        outcome
    }

    // ── View state ─────────────────────────────────────────────────

    /// Set the search text. Returns `true` if the visible set changed.
    pub fn set_search(&mut self, term: &str) -> bool {
        self.adapter.set_search(term)
    }

    /// Change the sort column/order and persist it.
    pub fn set_sort(&mut self, sort: SortState) {
        self.adapter.sort_changed(sort);
        self.settings.set_string(settings::TREE_SORT, &sort.to_setting());
        self.flush_settings();
    }

    /// Show or hide a column and persist the layout.
    pub fn set_column_visible(&mut self, class: PropertyClass, visible: bool) -> bool {
        if !self.adapter.set_column_visible(class, visible) {
            return false;
        }
        let layout = self.adapter.columns().to_setting();
        self.settings.set_string(settings::TREE_COLUMNS, &layout);
        self.flush_settings();
        true
    }

    /// Set a view toggle, persist it and apply its effect.
    pub fn set_toggle(&mut self, toggle: ViewToggle, value: bool) {
        if self.config.toggle(toggle) == value {
            return;
        }
        self.settings.set_bool(toggle.key(), value);
        self.flush_settings();
        self.apply_config(Arc::new(self.config.with_toggle(toggle, value)));

        info!(toggle = toggle.label(), value, "View toggle changed");
        match toggle.effect() {
            ToggleEffect::Republish => self.request_refresh(true),
            ToggleEffect::Invalidate => self.adapter.invalidate(),
            ToggleEffect::None => {}
        }
    }

    pub fn flip_toggle(&mut self, toggle: ViewToggle) {
        let value = !self.config.toggle(toggle);
        self.set_toggle(toggle, value);
    }

    /// Settings were edited elsewhere: reload the configuration. Changes
    /// to inclusion rebuild the tree; anything else only redraws.
    pub fn on_settings_changed(&mut self) {
        let next = TreeConfig::load(self.settings.as_ref());
        if next == *self.config {
            return;
        }
        let rebuild = next.inclusion_differs(&self.config);
        self.apply_config(Arc::new(next));
        if rebuild {
            self.request_refresh(true);
        } else {
            self.adapter.invalidate();
        }
    }

    fn apply_config(&mut self, config: Arc<TreeConfig>) {
        self.config = Arc::clone(&config);
        self.adapter.set_config(config);
    }

    fn flush_settings(&mut self) {
        if let Err(e) = self.settings.flush() {
            warn!("Failed to save settings: {e}");
        }
    }

    // ── Menu / export ──────────────────────────────────────────────

    pub fn context_menu(&self, node: Option<NodeIndex>, column: Option<PropertyClass>) -> Option<ContextMenu> {
        self.adapter.context_menu(node, column)
    }

    /// Run a menu command and apply what it asks for: toggles are
    /// persisted, successful device actions force a republish.
    pub fn execute_menu_command(
        &mut self,
        menu: &ContextMenu,
        command: MenuCommand,
        actions: &mut dyn DeviceActions,
    ) -> MenuOutcome {
        let outcome = menu.execute(command, actions);
        if let Some(toggle) = outcome.toggle {
            self.flip_toggle(toggle);
        }
        if outcome.republish {
            self.request_refresh(true);
        }
        outcome
    }

    /// Write the current view as CSV.
    pub fn export_csv(&self, path: &Path) -> Result<usize> {
        crate::export::export_view(&self.adapter, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enumerator::StaticEnumerator;
    use crate::model::{DeviceItem, PropertyValue, RawTree};
    use crate::settings::MemorySettingsStore;
    use std::time::Instant;

    fn raw(ids: &[&str]) -> RawTree {
        let mut raw = RawTree::with_capacity(ids.len() + 1);
        let root = raw.add_root(DeviceItem::new("ROOT", false));
        for id in ids {
            raw.add_child(
                root,
                DeviceItem::new(*id, false)
                    .with_property(PropertyClass::IsPresent, PropertyValue::Boolean(true)),
            );
        }
        raw
    }

    fn session(ids: &[&str]) -> (DeviceSession, Arc<StaticEnumerator>) {
        let enumerator = Arc::new(StaticEnumerator::new(raw(ids)));
        let session = DeviceSession::with_elevation(
            enumerator.clone(),
            Box::new(MemorySettingsStore::new()),
            false,
        )
        .unwrap();
        (session, enumerator)
    }

    /// Pump until a publish arrives or the deadline passes.
    fn pump_publish(session: &mut DeviceSession) -> Option<PublishReport> {
        let deadline = Instant::now() + Duration::from_secs(10);
        while Instant::now() < deadline {
            if let Some(report) = session.process_messages().published {
                return Some(report);
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        None
    }

    #[test]
    fn test_showing_tab_publishes() {
        let (mut session, _) = session(&["A", "B"]);
        assert!(session.adapter().snapshot().is_none());

        session.set_tab_visible(true);
        let report = pump_publish(&mut session).unwrap();
        assert!(report.first);
        assert_eq!(report.nodes, 3);
    }

    #[test]
    fn test_notification_ignored_while_hidden() {
        let (mut session, _) = session(&["A"]);
        assert!(!session.on_device_notification());
        session.set_tab_visible(true);
        assert!(session.on_device_notification());
    }

    #[test]
    fn test_republish_toggle_persists_and_rebuilds() {
        let (mut session, _) = session(&["A"]);
        session.set_tab_visible(true);
        pump_publish(&mut session).unwrap();

        session.set_toggle(ViewToggle::ShowDisconnected, true);
        assert!(session.config().show_disconnected);
        assert_eq!(session.settings().get_bool(settings::SHOW_DISCONNECTED), Some(true));
        let report = pump_publish(&mut session).unwrap();
        assert!(!report.first);
    }

    #[test]
    fn test_settings_change_reloads_config() {
        let (mut session, _) = session(&["A"]);
        session.settings_mut().set_bool(settings::HIGHLIGHT_UPPER_FILTERED, true);
        session.on_settings_changed();
        assert!(session.config().highlight_upper_filtered);
        assert!(session.adapter().config().highlight_upper_filtered);
    }

    #[test]
    fn test_pending_clears_on_latest_answer() {
        let (mut session, _) = session(&["A"]);
        session.set_tab_visible(true);
        pump_publish(&mut session).unwrap();
        assert!(!session.is_pending());

        session.request_refresh(false);
        session.request_refresh(true);
        session.request_refresh(false);
        let latest = session.requested_seq;

        // Pending requests hold back the periodic check.
        session.on_tick(AUTO_REFRESH_INTERVAL * 2);
        assert_eq!(session.requested_seq, latest);

        let deadline = Instant::now() + Duration::from_secs(10);
        while session.is_pending() {
            assert!(Instant::now() < deadline, "latest request never answered");
            session.process_messages();
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(session.answered_seq, latest);
    }

    #[test]
    fn test_sort_and_columns_persist() {
        let (mut session, _) = session(&[]);
        let sort = SortState {
            column: PropertyClass::Service,
            order: crate::query::SortOrder::Descending,
        };
        session.set_sort(sort);
        assert!(session.set_column_visible(PropertyClass::InstanceId, true));

        let stored_sort = session.settings().get_string(settings::TREE_SORT).unwrap();
        assert_eq!(SortState::from_setting(&stored_sort), sort);
        let stored_columns = session.settings().get_string(settings::TREE_COLUMNS).unwrap();
        assert!(ColumnSet::from_setting(&stored_columns).is_visible(PropertyClass::InstanceId));
    }
}
