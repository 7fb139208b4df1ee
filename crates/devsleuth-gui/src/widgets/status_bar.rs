/// Bottom status bar: device counts, refresh activity and the last notice.
use crate::state::AppState;
use egui::Ui;

/// Draw the status bar at the bottom of the window.
pub fn status_bar(ui: &mut Ui, state: &AppState) {
    let color_accent = ui.visuals().hyperlink_color;
    let color_weak = ui.visuals().weak_text_color();
    let color_normal = ui.visuals().text_color();
    let color_success = egui::Color32::from_rgb(0xa6, 0xe3, 0xa1);

    ui.horizontal(|ui| {
        if state.is_refreshing() {
            ui.spinner();
            ui.label(egui::RichText::new("Refreshing...").size(12.0).color(color_normal));
            ui.separator();
        }

        match state.session.adapter().snapshot() {
            Some(snapshot) => {
                ui.label(
                    egui::RichText::new(format!("{} devices", snapshot.len()))
                        .size(12.0)
                        .color(color_normal),
                );
                if state.rows.len() != snapshot.len() {
                    ui.separator();
                    ui.label(
                        egui::RichText::new(format!("{} shown", state.rows.len()))
                            .size(12.0)
                            .color(color_accent),
                    );
                }
                let selected = state.session.adapter().selected_nodes().len();
                if selected > 0 {
                    ui.separator();
                    ui.label(
                        egui::RichText::new(format!("{selected} selected"))
                            .size(12.0)
                            .color(color_normal),
                    );
                }
            }
            None if !state.is_refreshing() => {
                ui.label(egui::RichText::new("Ready").size(12.0).color(color_weak));
            }
            None => {}
        }

        if let Some(report) = state.last_publish {
            if report.arrived > 0 {
                ui.separator();
                ui.label(
                    egui::RichText::new(format!("{} new", report.arrived))
                        .size(12.0)
                        .color(color_success),
                );
            }
        }

        if let Some(notice) = &state.notice {
            ui.separator();
            ui.label(egui::RichText::new(notice).size(12.0).color(color_normal));
        }

        // Right side: when and how fast the tree was last built.
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if let Some(at) = state.last_publish_at {
                let mut text = format!("Updated {}", at.format("%H:%M:%S"));
                if let Some(build) = state.last_build_time {
                    text.push_str(&format!(" in {} ms", build.as_millis()));
                }
                ui.label(egui::RichText::new(text).size(11.0).color(color_weak));
            }
        });
    });
}
