/// Top action bar: refresh, search, view toggles, columns, export, theme.
use crate::state::AppState;
use devsleuth_core::model::PropertyClass;
use devsleuth_core::query::column;
use devsleuth_core::settings::ViewToggle;
use egui::Ui;
use std::path::PathBuf;

/// File written by the Export button, relative to the working directory.
const EXPORT_FILE: &str = "devices.csv";

/// Draw the toolbar.
pub fn toolbar(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui| {
        ui.label(
            egui::RichText::new("🔌 DevSleuth")
                .size(18.0)
                .strong()
                .color(ui.visuals().hyperlink_color),
        );

        ui.separator();

        let refreshing = state.is_refreshing();
        if ui
            .add_enabled(
                !refreshing,
                egui::Button::new("🔄 Refresh").min_size(egui::vec2(80.0, 28.0)),
            )
            .on_hover_text("Re-enumerate devices")
            .clicked()
        {
            state.refresh();
        }

        ui.separator();

        let search = ui.add(
            egui::TextEdit::singleline(&mut state.search_text)
                .hint_text("🔎 Search devices")
                .desired_width(220.0),
        );
        if search.changed() {
            state.apply_search();
        }
        if !state.search_text.is_empty() && ui.small_button("✖").on_hover_text("Clear search").clicked() {
            state.search_text.clear();
            state.apply_search();
        }

        ui.separator();

        ui.menu_button("View", |ui| {
            for toggle in ViewToggle::ALL {
                let mut value = state.session.config().toggle(toggle);
                if ui.checkbox(&mut value, toggle.label()).clicked() {
                    state.flip_toggle(toggle);
                }
            }
            ui.separator();
            ui.checkbox(&mut state.show_details, "Details panel");
        });

        ui.menu_button("Columns", |ui| {
            for class in PropertyClass::ALL {
                let def = column(class);
                let mut visible = state.session.adapter().columns().is_visible(class);
                // The name column anchors the tree and cannot be hidden.
                let enabled = class != PropertyClass::Name;
                if ui
                    .add_enabled(enabled, egui::Checkbox::new(&mut visible, def.title))
                    .clicked()
                {
                    state.set_column_visible(class, visible);
                }
            }
        });

        let can_export = !state.rows.is_empty();
        if ui
            .add_enabled(can_export, egui::Button::new("📤 Export"))
            .on_hover_text(if can_export {
                "Export the visible rows to devices.csv"
            } else {
                "Nothing to export"
            })
            .clicked()
        {
            let path = PathBuf::from(EXPORT_FILE);
            if let Err(e) = state.export_csv(&path) {
                state.notice = Some(format!("Export failed: {e:#}"));
            }
        }

        // Right-aligned controls.
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("ℹ").on_hover_text("About DevSleuth").clicked() {
                state.show_about = true;
            }

            let theme_label = if state.dark_mode { "☀" } else { "🌙" };
            let theme_tip = if state.dark_mode {
                "Switch to light mode"
            } else {
                "Switch to dark mode"
            };
            if ui.button(theme_label).on_hover_text(theme_tip).clicked() {
                state.dark_mode = !state.dark_mode;
            }

            ui.separator();

            if state.session.adapter().is_elevated() {
                ui.label(
                    egui::RichText::new("🛡 Admin")
                        .color(egui::Color32::from_rgb(0xa6, 0xe3, 0xa1))
                        .size(12.0),
                )
                .on_hover_text("Running elevated: device actions are available");
            } else {
                ui.label(
                    egui::RichText::new("⚠ Standard user")
                        .color(egui::Color32::from_rgb(0xfa, 0xb3, 0x87))
                        .size(12.0),
                )
                .on_hover_text("Enable, disable and uninstall require administrator rights");
            }
        });
    });
}
