/// Context menu model and device actions.
///
/// A [`ContextMenu`] is built when the user right-clicks and captures
/// everything it reasons about: the snapshot (by `Arc`, so a publish while
/// the menu is open cannot free it), the clicked node, the selection and
/// the visible columns. The frontend renders [`MenuEntry`] values and hands
/// the chosen [`MenuCommand`] back to [`ContextMenu::execute`].
///
/// Privileged operations go through the [`DeviceActions`] trait; each
/// selected device is attempted independently and failures are collected
/// rather than aborting the batch.
use super::cell_text;
use crate::model::PropertyClass;
use crate::settings::{TreeConfig, ViewToggle};
use crate::snapshot::{NodeIndex, Snapshot};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Registry key of a device that "Open key" can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryKey {
    Hardware,
    Software,
    User,
    Config,
}

impl RegistryKey {
    pub const ALL: [RegistryKey; 4] = [Self::Hardware, Self::Software, Self::User, Self::Config];

    pub fn label(self) -> &'static str {
        match self {
            Self::Hardware => "Hardware",
            Self::Software => "Software",
            Self::User => "User",
            Self::Config => "Config",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuCommand {
    Refresh,
    Toggle(ViewToggle),
    GoToService,
    Enable,
    Disable,
    Restart,
    Uninstall,
    OpenKey(RegistryKey),
    Properties,
    Copy,
    CopyCell(PropertyClass),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub command: MenuCommand,
    pub label: String,
    pub enabled: bool,
    /// `Some` for check items.
    pub checked: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEntry {
    Item(MenuItem),
    Submenu {
        label: &'static str,
        enabled: bool,
        items: Vec<MenuItem>,
    },
    Separator,
}

/// Failure of an external device operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("access denied")]
    AccessDenied,
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),
    #[error("{0}")]
    Failed(String),
}

/// One failed item of a bulk action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionFailure {
    pub instance_id: String,
    pub error: ActionError,
}

/// External collaborators for menu commands.
pub trait DeviceActions {
    fn set_enabled(&mut self, instance_id: &str, enable: bool) -> Result<(), ActionError>;
    fn restart(&mut self, instance_id: &str) -> Result<(), ActionError>;
    fn uninstall(&mut self, instance_id: &str) -> Result<(), ActionError>;
    fn open_key(&mut self, instance_id: &str, key: RegistryKey) -> Result<(), ActionError>;
    fn show_properties(&mut self, instance_id: &str) -> Result<(), ActionError>;
    fn go_to_service(&mut self, service: &str) -> Result<(), ActionError>;
    fn copy_text(&mut self, text: &str) -> Result<(), ActionError>;
}

/// What the caller must do after a command ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuOutcome {
    /// Force a rebuild and publish.
    pub republish: bool,
    /// Toggle to flip and persist (the caller owns settings).
    pub toggle: Option<ViewToggle>,
    pub failures: Vec<ActionFailure>,
}

/// A context menu for one right-click.
#[derive(Debug)]
pub struct ContextMenu {
    snapshot: Arc<Snapshot>,
    node: Option<NodeIndex>,
    selection: Vec<NodeIndex>,
    columns: Vec<PropertyClass>,
    column: Option<PropertyClass>,
    entries: Vec<MenuEntry>,
}

impl ContextMenu {
    /// Build the menu.
    ///
    /// `node` is the clicked row, `column` the clicked column, `selection`
    /// the visible selected nodes in display order and `columns` the
    /// visible columns (what Copy copies).
    pub fn new(
        snapshot: Arc<Snapshot>,
        node: Option<NodeIndex>,
        selection: Vec<NodeIndex>,
        columns: Vec<PropertyClass>,
        column: Option<PropertyClass>,
        config: &TreeConfig,
        elevated: bool,
    ) -> Self {
        let single = node.is_some() && selection.len() == 1;
        let has_service = single
            && node.is_some_and(|n| !snapshot.item(n).service().is_empty());
        let any = !selection.is_empty();

        let item = |command, label: &str, enabled| {
            MenuEntry::Item(MenuItem {
                command,
                label: label.to_owned(),
                enabled,
                checked: None,
            })
        };
        let check = |toggle: ViewToggle| {
            MenuEntry::Item(MenuItem {
                command: MenuCommand::Toggle(toggle),
                label: toggle.label().to_owned(),
                enabled: true,
                checked: Some(config.toggle(toggle)),
            })
        };

        let mut entries = vec![
            item(MenuCommand::Refresh, "Refresh", true),
            check(ViewToggle::AutoRefresh),
            MenuEntry::Separator,
        ];
        entries.extend(
            ViewToggle::ALL
                .iter()
                .filter(|&&t| t != ViewToggle::AutoRefresh)
                .map(|&t| check(t)),
        );
        entries.extend([
            MenuEntry::Separator,
            item(MenuCommand::GoToService, "Go to service...", has_service),
            MenuEntry::Separator,
            item(MenuCommand::Enable, "Enable", elevated && any),
            item(MenuCommand::Disable, "Disable", elevated && any),
            item(MenuCommand::Restart, "Restart", elevated && any),
            item(MenuCommand::Uninstall, "Uninstall", elevated && any),
            MenuEntry::Separator,
            MenuEntry::Submenu {
                label: "Open key",
                enabled: single,
                items: RegistryKey::ALL
                    .iter()
                    .map(|&key| MenuItem {
                        command: MenuCommand::OpenKey(key),
                        label: key.label().to_owned(),
                        enabled: single,
                        checked: None,
                    })
                    .collect(),
            },
            MenuEntry::Separator,
            item(MenuCommand::Properties, "Properties", single),
            MenuEntry::Separator,
            item(MenuCommand::Copy, "Copy", any),
        ]);
        if let (Some(_), Some(column)) = (node, column) {
            let title = crate::query::column(column).title;
            entries.push(item(
                MenuCommand::CopyCell(column),
                &format!("Copy \"{title}\""),
                true,
            ));
        }

        Self {
            snapshot,
            node,
            selection,
            columns,
            column,
            entries,
        }
    }

    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    /// The snapshot this menu was opened on.
    pub fn snapshot(&self) -> &Arc<Snapshot> {
        &self.snapshot
    }

    pub fn node(&self) -> Option<NodeIndex> {
        self.node
    }

    pub fn selection(&self) -> &[NodeIndex] {
        &self.selection
    }

    pub fn column(&self) -> Option<PropertyClass> {
        self.column
    }

    /// Whether `command` is offered and enabled.
    pub fn is_enabled(&self, command: MenuCommand) -> bool {
        self.entries.iter().any(|entry| match entry {
            MenuEntry::Item(item) => item.command == command && item.enabled,
            MenuEntry::Submenu { enabled, items, .. } => {
                *enabled && items.iter().any(|i| i.command == command && i.enabled)
            }
            MenuEntry::Separator => false,
        })
    }

    /// Run `command`. Disabled commands do nothing.
    pub fn execute(&self, command: MenuCommand, actions: &mut dyn DeviceActions) -> MenuOutcome {
        let mut outcome = MenuOutcome::default();
        if !self.is_enabled(command) {
            return outcome;
        }

        match command {
            MenuCommand::Refresh => outcome.republish = true,
            MenuCommand::Toggle(toggle) => outcome.toggle = Some(toggle),
            MenuCommand::Enable => self.bulk(&mut outcome, "enable", |id| actions.set_enabled(id, true)),
            MenuCommand::Disable => {
                self.bulk(&mut outcome, "disable", |id| actions.set_enabled(id, false))
            }
            MenuCommand::Restart => self.bulk(&mut outcome, "restart", |id| actions.restart(id)),
            MenuCommand::Uninstall => self.bulk(&mut outcome, "uninstall", |id| actions.uninstall(id)),
            MenuCommand::GoToService => {
                if let Some(node) = self.node {
                    let service = self.snapshot.item(node).service();
                    record(&mut outcome, service, actions.go_to_service(service));
                }
            }
            MenuCommand::OpenKey(key) => {
                if let Some(node) = self.node {
                    let id = self.snapshot.item(node).instance_id.as_str();
                    record(&mut outcome, id, actions.open_key(id, key));
                }
            }
            MenuCommand::Properties => {
                if let Some(id) = self.node.and_then(|n| self.properties_target(n)) {
                    record(&mut outcome, &id, actions.show_properties(&id));
                }
            }
            MenuCommand::Copy => {
                let text = self.selection_text();
                record(&mut outcome, "", actions.copy_text(&text));
            }
            MenuCommand::CopyCell(class) => {
                if let Some(node) = self.node {
                    let text = cell_text(self.snapshot.item(node), class);
                    record(&mut outcome, "", actions.copy_text(text));
                }
            }
        }
        outcome
    }

    /// Instance id the Properties command opens: the node's own device, or
    /// for an interface the device that exposes it.
    pub fn properties_target(&self, node: NodeIndex) -> Option<String> {
        properties_target(&self.snapshot, node)
    }

    /// Selected rows as tab-separated visible columns, one line per row.
    pub fn selection_text(&self) -> String {
        rows_text(&self.snapshot, &self.selection, &self.columns)
    }

    /// Attempt `action` on every selected device; republish if any succeeded.
    fn bulk(
        &self,
        outcome: &mut MenuOutcome,
        verb: &str,
        mut action: impl FnMut(&str) -> Result<(), ActionError>,
    ) {
        let mut succeeded = 0usize;
        for &node in &self.selection {
            let id = self.snapshot.item(node).instance_id.as_str();
            if id.is_empty() {
                continue;
            }
            match action(id) {
                Ok(()) => succeeded += 1,
                Err(error) => {
                    warn!(instance_id = id, "Failed to {verb} device: {error}");
                    outcome.failures.push(ActionFailure {
                        instance_id: id.to_owned(),
                        error,
                    });
                }
            }
        }
        info!(succeeded, failed = outcome.failures.len(), "Device {verb} finished");
        outcome.republish |= succeeded > 0;
    }
}

/// See [`ContextMenu::properties_target`].
pub fn properties_target(snapshot: &Snapshot, node: NodeIndex) -> Option<String> {
    let raw = snapshot.raw_tree();
    let mut item = snapshot.node(node).item;
    if raw.item(item).device_interface {
        item = raw.parent(item)?;
    }
    let id = raw.item(item).instance_id.as_str();
    (!id.is_empty()).then(|| id.to_owned())
}

/// Tab-separated text of `nodes` over `columns`.
pub fn rows_text(snapshot: &Snapshot, nodes: &[NodeIndex], columns: &[PropertyClass]) -> String {
    let mut text = String::new();
    for &node in nodes {
        let item = snapshot.item(node);
        let row: Vec<&str> = columns.iter().map(|&c| cell_text(item, c)).collect();
        text.push_str(&row.join("\t"));
        text.push('\n');
    }
    text
}

fn record(outcome: &mut MenuOutcome, subject: &str, result: Result<(), ActionError>) {
    if let Err(error) = result {
        warn!(subject, "Device action failed: {error}");
        outcome.failures.push(ActionFailure {
            instance_id: subject.to_owned(),
            error,
        });
    }
}

/// Actions for platforms without device management: privileged operations
/// report `Unsupported`; copy collects text for the frontend's clipboard.
#[derive(Debug, Default)]
pub struct UnsupportedActions {
    pub clipboard: Option<String>,
}

impl DeviceActions for UnsupportedActions {
    fn set_enabled(&mut self, _instance_id: &str, enable: bool) -> Result<(), ActionError> {
        Err(ActionError::Unsupported(if enable { "enable" } else { "disable" }))
    }

    fn restart(&mut self, _instance_id: &str) -> Result<(), ActionError> {
        Err(ActionError::Unsupported("restart"))
    }

    fn uninstall(&mut self, _instance_id: &str) -> Result<(), ActionError> {
        Err(ActionError::Unsupported("uninstall"))
    }

    fn open_key(&mut self, _instance_id: &str, _key: RegistryKey) -> Result<(), ActionError> {
        Err(ActionError::Unsupported("open key"))
    }

    fn show_properties(&mut self, _instance_id: &str) -> Result<(), ActionError> {
        Err(ActionError::Unsupported("properties"))
    }

    fn go_to_service(&mut self, _service: &str) -> Result<(), ActionError> {
        Err(ActionError::Unsupported("go to service"))
    }

    fn copy_text(&mut self, text: &str) -> Result<(), ActionError> {
        self.clipboard = Some(text.to_owned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{instance_id_hash, DeviceItem, PropertyValue, RawTree};
    use crate::snapshot::build;

    /// Records calls; fails for instance ids listed in `fail`.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        fail: Vec<&'static str>,
        clipboard: String,
    }

    impl Recorder {
        fn run(&mut self, what: String, id: &str) -> Result<(), ActionError> {
            self.calls.push(what);
            if self.fail.contains(&id) {
                Err(ActionError::Failed(format!("{id} refused")))
            } else {
                Ok(())
            }
        }
    }

    impl DeviceActions for Recorder {
        fn set_enabled(&mut self, id: &str, enable: bool) -> Result<(), ActionError> {
            self.run(format!("enable={enable} {id}"), id)
        }
        fn restart(&mut self, id: &str) -> Result<(), ActionError> {
            self.run(format!("restart {id}"), id)
        }
        fn uninstall(&mut self, id: &str) -> Result<(), ActionError> {
            self.run(format!("uninstall {id}"), id)
        }
        fn open_key(&mut self, id: &str, key: RegistryKey) -> Result<(), ActionError> {
            self.run(format!("open {key:?} {id}"), id)
        }
        fn show_properties(&mut self, id: &str) -> Result<(), ActionError> {
            self.run(format!("properties {id}"), id)
        }
        fn go_to_service(&mut self, service: &str) -> Result<(), ActionError> {
            self.run(format!("service {service}"), service)
        }
        fn copy_text(&mut self, text: &str) -> Result<(), ActionError> {
            self.clipboard = text.to_owned();
            Ok(())
        }
    }

    fn device(id: &str, name: &str) -> DeviceItem {
        DeviceItem::new(id, false)
            .with_property(PropertyClass::Name, PropertyValue::String(name.into()))
            .with_property(PropertyClass::IsPresent, PropertyValue::Boolean(true))
    }

    fn snapshot() -> Arc<Snapshot> {
        let mut raw = RawTree::with_capacity(4);
        let root = raw.add_root(device("ROOT", "Computer"));
        let disk = raw.add_child(
            root,
            device("SCSI\\DISK", "Disk").with_property(
                PropertyClass::Service,
                PropertyValue::String("disk".into()),
            ),
        );
        raw.add_child(
            disk,
            DeviceItem::new("\\\\?\\SCSI#DISK#{53f56307}", true)
                .with_property(PropertyClass::InterfaceEnabled, PropertyValue::Boolean(true)),
        );
        raw.add_child(root, device("ACPI\\FAN", "Fan"));
        let config = TreeConfig {
            show_device_interfaces: true,
            ..TreeConfig::default()
        };
        Arc::new(build(Arc::new(raw), &config))
    }

    fn node(snapshot: &Snapshot, id: &str) -> NodeIndex {
        snapshot.lookup(instance_id_hash(id)).unwrap()
    }

    fn menu(selection: &[&str], clicked: Option<&str>, elevated: bool) -> ContextMenu {
        let snapshot = snapshot();
        let selection = selection.iter().map(|id| node(&snapshot, id)).collect();
        let clicked = clicked.map(|id| node(&snapshot, id));
        ContextMenu::new(
            snapshot,
            clicked,
            selection,
            vec![PropertyClass::Name, PropertyClass::Service],
            Some(PropertyClass::Service),
            &TreeConfig::default(),
            elevated,
        )
    }

    #[test]
    fn test_privileged_items_need_elevation() {
        let plain = menu(&["SCSI\\DISK"], Some("SCSI\\DISK"), false);
        assert!(!plain.is_enabled(MenuCommand::Enable));
        assert!(!plain.is_enabled(MenuCommand::Uninstall));
        assert!(plain.execute(MenuCommand::Disable, &mut Recorder::default()).failures.is_empty());

        let admin = menu(&["SCSI\\DISK"], Some("SCSI\\DISK"), true);
        assert!(admin.is_enabled(MenuCommand::Enable));
        assert!(admin.is_enabled(MenuCommand::Restart));
    }

    #[test]
    fn test_single_selection_items() {
        let single = menu(&["SCSI\\DISK"], Some("SCSI\\DISK"), false);
        assert!(single.is_enabled(MenuCommand::GoToService));
        assert!(single.is_enabled(MenuCommand::Properties));
        assert!(single.is_enabled(MenuCommand::OpenKey(RegistryKey::Software)));

        let no_service = menu(&["ACPI\\FAN"], Some("ACPI\\FAN"), false);
        assert!(!no_service.is_enabled(MenuCommand::GoToService));

        let multi = menu(&["SCSI\\DISK", "ACPI\\FAN"], Some("SCSI\\DISK"), false);
        assert!(!multi.is_enabled(MenuCommand::Properties));
        assert!(!multi.is_enabled(MenuCommand::OpenKey(RegistryKey::Hardware)));
        assert!(multi.is_enabled(MenuCommand::Copy));
    }

    #[test]
    fn test_toggles_are_checked_from_config() {
        let m = menu(&[], None, false);
        let auto = m.entries().iter().find_map(|e| match e {
            MenuEntry::Item(i) if i.command == MenuCommand::Toggle(ViewToggle::AutoRefresh) => i.checked,
            _ => None,
        });
        assert_eq!(auto, Some(TreeConfig::default().auto_refresh));
        assert_eq!(
            m.execute(MenuCommand::Toggle(ViewToggle::ShowDisconnected), &mut Recorder::default())
                .toggle,
            Some(ViewToggle::ShowDisconnected)
        );
    }

    #[test]
    fn test_bulk_action_continues_past_failures() {
        let m = menu(&["SCSI\\DISK", "ACPI\\FAN"], Some("SCSI\\DISK"), true);
        let mut actions = Recorder {
            fail: vec!["SCSI\\DISK"],
            ..Recorder::default()
        };
        let outcome = m.execute(MenuCommand::Disable, &mut actions);

        assert_eq!(actions.calls.len(), 2);
        assert!(outcome.republish);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].instance_id, "SCSI\\DISK");
    }

    #[test]
    fn test_bulk_action_all_failed_does_not_republish() {
        let m = menu(&["ACPI\\FAN"], Some("ACPI\\FAN"), true);
        let mut actions = Recorder {
            fail: vec!["ACPI\\FAN"],
            ..Recorder::default()
        };
        let outcome = m.execute(MenuCommand::Restart, &mut actions);
        assert!(!outcome.republish);
        assert_eq!(outcome.failures.len(), 1);
    }

    #[test]
    fn test_properties_on_interface_targets_parent() {
        let iface = "\\\\?\\SCSI#DISK#{53f56307}";
        let m = menu(&[iface], Some(iface), false);
        let mut actions = Recorder::default();
        m.execute(MenuCommand::Properties, &mut actions);
        assert_eq!(actions.calls, vec!["properties SCSI\\DISK".to_string()]);
    }

    #[test]
    fn test_copy_and_copy_cell() {
        let m = menu(&["ACPI\\FAN", "SCSI\\DISK"], Some("SCSI\\DISK"), false);
        let mut actions = Recorder::default();
        m.execute(MenuCommand::Copy, &mut actions);
        assert_eq!(actions.clipboard, "Fan\t\nDisk\tdisk\n");

        m.execute(MenuCommand::CopyCell(PropertyClass::Service), &mut actions);
        assert_eq!(actions.clipboard, "disk");
    }

    #[test]
    fn test_menu_keeps_snapshot_alive() {
        let m = menu(&["ACPI\\FAN"], Some("ACPI\\FAN"), false);
        let weak = Arc::downgrade(m.snapshot());
        assert!(weak.upgrade().is_some());
        drop(m);
        assert!(weak.upgrade().is_none());
    }
}
