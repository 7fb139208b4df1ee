/// Device tree view: the core UI component.
///
/// A virtualised multi-column table over `AppState::rows`. Only rows in the
/// viewport are laid out. Clicking a header cycles the sort on that column
/// (ascending, descending, off); while a column is sorted the tree is shown
/// flat.
///
/// Row interactions are collected as [`TreeAction`]s and applied after the
/// table is drawn, so the table can borrow the state immutably. A context
/// menu is captured in `AppState::open_menu` when it opens and rendered
/// from there until it closes, so a republish underneath it cannot change
/// which devices it acts on.
use crate::state::AppState;
use crate::theme::{DevSleuthTheme, ThemeMode};
use devsleuth_core::adapter::{
    ContextMenu, IconIndex, MenuCommand, MenuEntry, MenuItem, TreeNodeProvider,
};
use devsleuth_core::model::PropertyClass;
use devsleuth_core::query::{column, SortOrder};
use devsleuth_core::snapshot::NodeIndex;
use egui::{Align, Layout, RichText, Sense, Ui};
use egui_extras::{Column, TableBuilder};

/// Height of each row in pixels.
const ROW_HEIGHT: f32 = 22.0;

/// Indentation per depth level in pixels.
const INDENT_PX: f32 = 16.0;

/// Glyphs handed out by icon index. Index 0 is the generic device.
const ICON_GLYPHS: [&str; 8] = ["⚙", "🔌", "🖥", "🖱", "🔊", "💾", "📡", "🔋"];

/// Deferred state change from a row interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeAction {
    Click { row: usize, toggle: bool },
    ToggleExpand(usize),
    Sort(PropertyClass),
    OpenMenu {
        node: NodeIndex,
        column: Option<PropertyClass>,
    },
    /// Command chosen from the open menu.
    Command(MenuCommand),
}

/// Draw the tree view and apply what the user did.
pub fn tree_view(ui: &mut Ui, state: &mut AppState) {
    if state.session.adapter().snapshot().is_none() {
        ui.centered_and_justified(|ui| {
            let text = if state.is_refreshing() {
                "Enumerating devices..."
            } else {
                "No devices. Press Refresh to enumerate."
            };
            ui.label(RichText::new(text).color(ui.visuals().weak_text_color()));
        });
        return;
    }

    // Icon assignment mutates the adapter's cache, so resolve it up front.
    let icons: Vec<IconIndex> = {
        let nodes: Vec<NodeIndex> = state.rows.iter().map(|r| r.node).collect();
        let adapter = state.session.adapter_mut();
        nodes.into_iter().map(|n| adapter.node_icon(n)).collect()
    };

    let (actions, menu_shown) = render_table(ui, state, &icons);
    let reopened = actions
        .iter()
        .any(|a| matches!(a, TreeAction::OpenMenu { .. }));
    if !menu_shown && !reopened {
        state.close_context_menu();
    }
    for action in actions {
        apply(state, action);
    }
}

fn apply(state: &mut AppState, action: TreeAction) {
    match action {
        TreeAction::Click { row, toggle } => state.click_row(row, toggle),
        TreeAction::ToggleExpand(row) => state.toggle_expand(row),
        TreeAction::Sort(class) => state.header_clicked(class),
        TreeAction::OpenMenu { node, column } => state.open_context_menu(node, column),
        TreeAction::Command(command) => state.run_open_menu_command(command),
    }
}

/// Returns the collected actions and whether a context menu was drawn.
fn render_table(ui: &mut Ui, state: &AppState, icons: &[IconIndex]) -> (Vec<TreeAction>, bool) {
    let adapter = state.session.adapter();
    let theme = DevSleuthTheme::for_mode(ThemeMode::from_dark(ui.visuals().dark_mode));
    let columns: Vec<PropertyClass> = adapter.columns().visible().to_vec();
    let sort = adapter.query().sort();
    let toggle_modifier = ui.input(|i| i.modifiers.command);
    let color_weak = ui.visuals().weak_text_color();

    let mut actions = Vec::new();
    let mut menu_shown = false;

    let mut table = TableBuilder::new(ui)
        .striped(false)
        .resizable(true)
        .sense(Sense::click())
        .cell_layout(Layout::left_to_right(Align::Center));
    for &class in &columns {
        table = table.column(Column::initial(column(class).width).at_least(40.0).clip(true));
    }

    table
        .header(ROW_HEIGHT, |mut header| {
            for &class in &columns {
                header.col(|ui| {
                    let mut title = column(class).title.to_owned();
                    if sort.column == class {
                        match sort.order {
                            SortOrder::Ascending => title.push_str(" ▲"),
                            SortOrder::Descending => title.push_str(" ▼"),
                            SortOrder::None => {}
                        }
                    }
                    let label = ui.add(
                        egui::Label::new(RichText::new(title).strong()).sense(Sense::click()),
                    );
                    if label.clicked() {
                        actions.push(TreeAction::Sort(class));
                    }
                });
            }
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, state.rows.len(), |mut row| {
                let row_index = row.index();
                let visible = state.rows[row_index];
                let node = visible.node;
                row.set_selected(adapter.is_selected(node));
                let fill = adapter.node_color(node).map(|c| theme.row_fill(c));

                for &class in &columns {
                    let (_, cell) = row.col(|ui| {
                        if let Some(fill) = fill {
                            ui.painter().rect_filled(ui.max_rect(), 0.0, fill);
                        }
                        if class == PropertyClass::Name {
                            ui.add_space(INDENT_PX * visible.depth as f32);
                            if visible.has_children {
                                let arrow = if visible.is_expanded { "▼" } else { "▶" };
                                let arrow = ui.add(
                                    egui::Label::new(RichText::new(arrow).size(10.0).color(color_weak))
                                        .sense(Sense::click()),
                                );
                                if arrow.clicked() {
                                    actions.push(TreeAction::ToggleExpand(row_index));
                                }
                            } else {
                                ui.add_space(12.0);
                            }
                            let glyph = ICON_GLYPHS[icons.get(row_index).map_or(0, |i| i.0 as usize)
                                % ICON_GLYPHS.len()];
                            ui.label(glyph);
                        }
                        ui.add(egui::Label::new(adapter.cell_text(node, class)).truncate());
                    });

                    if cell.clicked() {
                        actions.push(TreeAction::Click {
                            row: row_index,
                            toggle: toggle_modifier,
                        });
                    }
                    if cell.double_clicked() && visible.has_children {
                        actions.push(TreeAction::ToggleExpand(row_index));
                    }
                    if cell.secondary_clicked() {
                        if !adapter.is_selected(node) {
                            actions.push(TreeAction::Click {
                                row: row_index,
                                toggle: false,
                            });
                        }
                        actions.push(TreeAction::OpenMenu {
                            node,
                            column: Some(class),
                        });
                    }
                    cell.context_menu(|ui| {
                        menu_shown = true;
                        // The opening frame draws a preview; the menu is
                        // captured once the actions are applied.
                        let preview;
                        let menu = match &state.open_menu {
                            Some(menu) => menu,
                            None => match state.context_menu(node, Some(class)) {
                                Some(menu) => {
                                    preview = menu;
                                    &preview
                                }
                                None => return,
                            },
                        };
                        if let Some(command) = context_menu(ui, menu) {
                            actions.push(TreeAction::Command(command));
                            ui.close_menu();
                        }
                    });
                }
            });
        });

    (actions, menu_shown)
}

/// Render the device context menu. Returns the chosen command.
fn context_menu(ui: &mut Ui, menu: &ContextMenu) -> Option<MenuCommand> {
    let mut chosen = None;
    for entry in menu.entries() {
        match entry {
            MenuEntry::Item(item) => {
                if menu_item(ui, item) {
                    chosen = Some(item.command);
                }
            }
            MenuEntry::Submenu {
                label,
                enabled,
                items,
            } => {
                ui.add_enabled_ui(*enabled, |ui| {
                    ui.menu_button(*label, |ui| {
                        for item in items {
                            if menu_item(ui, item) {
                                chosen = Some(item.command);
                            }
                        }
                    });
                });
            }
            MenuEntry::Separator => {
                ui.separator();
            }
        }
    }
    chosen
}

fn menu_item(ui: &mut Ui, item: &MenuItem) -> bool {
    match item.checked {
        Some(checked) => {
            let mut value = checked;
            ui.add_enabled(item.enabled, egui::Checkbox::new(&mut value, item.label.as_str()))
                .clicked()
        }
        None => ui
            .add_enabled(item.enabled, egui::Button::new(item.label.as_str()))
            .clicked(),
    }
}
