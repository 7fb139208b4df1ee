/// Details panel: every known property of the focused device.
use crate::state::AppState;
use devsleuth_core::model::PropertyClass;
use devsleuth_core::query::column;
use egui::Ui;

/// Draw the details panel for the focused device.
pub fn details_panel(ui: &mut Ui, state: &AppState) {
    let color_muted = ui.visuals().weak_text_color();
    let color_normal = ui.visuals().text_color();
    let color_success = egui::Color32::from_rgb(0xa6, 0xe3, 0xa1);

    let (Some(node), Some(item)) = (state.focused_node(), state.focused_item()) else {
        ui.label(
            egui::RichText::new("Select a device to see details")
                .color(color_muted)
                .italics(),
        );
        return;
    };

    ui.label(
        egui::RichText::new(item.name())
            .size(14.0)
            .strong()
            .color(color_normal),
    );
    ui.label(
        egui::RichText::new(item.instance_id.as_str())
            .size(11.0)
            .monospace()
            .color(color_muted),
    );
    if item.device_interface {
        ui.label(egui::RichText::new("Device interface").size(11.0).italics().color(color_muted));
    }
    if state.session.adapter().highlight(node).is_highlighted() {
        ui.label(egui::RichText::new("● Recently arrived").size(11.0).color(color_success));
    }

    ui.add_space(6.0);
    ui.separator();
    ui.add_space(4.0);

    egui::Grid::new("device_properties")
        .num_columns(2)
        .spacing([8.0, 3.0])
        .striped(true)
        .show(ui, |ui| {
            for class in PropertyClass::ALL {
                let property = item.property(class);
                if !property.is_valid() {
                    continue;
                }
                ui.label(egui::RichText::new(column(class).title).size(12.0).color(color_muted));
                // String lists render one entry per line.
                let list = property.as_string_list();
                let text = if list.is_empty() {
                    property.as_str().to_owned()
                } else {
                    list.join("\n")
                };
                ui.label(egui::RichText::new(text).size(12.0).color(color_normal));
                ui.end_row();
            }
        });
}
