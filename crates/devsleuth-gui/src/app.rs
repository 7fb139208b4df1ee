/// Main `eframe::App` implementation for DevSleuth.
///
/// This is the top-level UI layout that composes all panels and widgets.
use crate::panels;
use crate::state::AppState;
use crate::theme::{DevSleuthTheme, ThemeMode};
use crate::widgets;
use devsleuth_core::enumerator::DeviceEnumerator;
use devsleuth_core::settings::SettingsStore;
use std::sync::Arc;
use std::time::Duration;

/// Repaint cadence while a refresh is running or highlights are fading.
const ACTIVE_REPAINT: Duration = Duration::from_millis(100);

/// Pre-built application state.
///
/// Construct this **before** calling `eframe::run_native` so that loading
/// settings and starting the refresh worker (which kicks off the first
/// enumeration) happen before the OS window is created.
pub struct DevSleuthState {
    pub(crate) inner: AppState,
}

impl DevSleuthState {
    /// Start the device session and request the first refresh.
    pub fn build(
        enumerator: Arc<dyn DeviceEnumerator>,
        settings: Box<dyn SettingsStore>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            inner: AppState::new(enumerator, settings)?,
        })
    }
}

/// The DevSleuth application.
pub struct DevSleuthApp {
    state: AppState,
    /// Theme currently applied to the context.
    applied_theme: Option<ThemeMode>,
    /// Scale the icon cache was filled at.
    pixels_per_point: f32,
}

impl DevSleuthApp {
    /// Create a new application instance from pre-built state.
    pub fn with_state(cc: &eframe::CreationContext<'_>, state: DevSleuthState) -> Self {
        // ── Font: Segoe UI ────────────────────────────────────────────────
        // Registered as the highest-priority proportional font when present.
        let system_root = std::env::var("SystemRoot").unwrap_or_else(|_| "C:\\Windows".to_string());
        let font_path = format!("{}\\Fonts\\segoeui.ttf", system_root);

        let mut fonts = egui::FontDefinitions::default();
        match std::fs::read(&font_path) {
            Ok(bytes) => {
                fonts.font_data.insert(
                    "SegoeUI".to_owned(),
                    egui::FontData::from_owned(bytes).into(),
                );
                fonts
                    .families
                    .entry(egui::FontFamily::Proportional)
                    .or_default()
                    .insert(0, "SegoeUI".to_owned());
                tracing::info!("Loaded Segoe UI from {}", font_path);
            }
            Err(e) => {
                tracing::debug!("Segoe UI not available at {}: {} -- using default font", font_path, e);
            }
        }
        cc.egui_ctx.set_fonts(fonts);

        Self {
            state: state.inner,
            applied_theme: None,
            pixels_per_point: cc.egui_ctx.pixels_per_point(),
        }
    }

    fn about_window(&mut self, ctx: &egui::Context) {
        let mut show_about = self.state.show_about;
        egui::Window::new("About DevSleuth")
            .open(&mut show_about)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .fixed_size([340.0, 0.0])
            .show(ctx, |ui| {
                let accent = ui.visuals().hyperlink_color;
                let muted = ui.visuals().weak_text_color();
                let normal = ui.visuals().text_color();

                ui.vertical_centered(|ui| {
                    ui.add_space(8.0);
                    ui.label(
                        egui::RichText::new("🔌 DevSleuth")
                            .size(24.0)
                            .strong()
                            .color(accent),
                    );
                    ui.add_space(4.0);
                    ui.label(
                        egui::RichText::new(format!("v{}", env!("CARGO_PKG_VERSION")))
                            .size(13.0)
                            .color(muted),
                    );
                    ui.add_space(12.0);
                    ui.label(
                        egui::RichText::new(
                            "A live hardware device browser.\n\
                             Sortable, searchable device tree with\n\
                             arrival highlighting.",
                        )
                        .size(12.0)
                        .color(normal),
                    );
                    ui.add_space(12.0);
                    ui.separator();
                    ui.add_space(8.0);
                    ui.hyperlink_to(
                        "github.com/Swatto86/DevSleuth",
                        "https://github.com/Swatto86/DevSleuth",
                    );
                    ui.add_space(4.0);
                    ui.label(
                        egui::RichText::new("MIT License - Built with Rust & egui")
                            .size(11.0)
                            .color(muted),
                    );
                    ui.add_space(8.0);
                });
            });
        self.state.show_about = show_about;
    }
}

impl eframe::App for DevSleuthApp {
    /// Override the GPU clear colour to match the active theme background,
    /// preventing a colour mismatch flash between frames.
    fn clear_color(&self, visuals: &egui::Visuals) -> [f32; 4] {
        let [r, g, b, a] = visuals.panel_fill.to_array();
        [
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        ]
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ── Apply theme ───────────────────────────────────────────────────
        let mode = ThemeMode::from_dark(self.state.dark_mode);
        if self.applied_theme != Some(mode) {
            DevSleuthTheme::for_mode(mode).apply(ctx);
            self.applied_theme = Some(mode);
        }

        // Icon indices are per scale; a DPI change starts over.
        let ppp = ctx.pixels_per_point();
        if ppp != self.pixels_per_point {
            self.pixels_per_point = ppp;
            self.state.session.adapter_mut().clear_icons();
        }

        // ── Publish refreshes, advance highlights ─────────────────────────
        if self.state.frame() {
            ctx.request_repaint();
        }
        if self.state.is_refreshing() || self.state.has_highlights() {
            ctx.request_repaint_after(ACTIVE_REPAINT);
        } else {
            // Auto refresh is polled from the tick, so keep ticking slowly.
            ctx.request_repaint_after(crate::state::TICK_INTERVAL);
        }

        // ── Clipboard ─────────────────────────────────────────────────────
        if let Some(text) = self.state.clipboard.take() {
            ctx.copy_text(text);
        }

        // ── Top toolbar ───────────────────────────────────────────────────
        egui::TopBottomPanel::top("toolbar")
            .min_height(36.0)
            .show(ctx, |ui| {
                ui.add_space(4.0);
                widgets::toolbar::toolbar(ui, &mut self.state);
                ui.add_space(4.0);
            });

        self.about_window(ctx);

        // ── Bottom status bar ─────────────────────────────────────────────
        egui::TopBottomPanel::bottom("status_bar")
            .min_height(24.0)
            .show(ctx, |ui| {
                ui.add_space(2.0);
                widgets::status_bar::status_bar(ui, &self.state);
                ui.add_space(2.0);
            });

        // ── Right details panel ───────────────────────────────────────────
        if self.state.show_details {
            egui::SidePanel::right("details_panel")
                .default_width(300.0)
                .min_width(200.0)
                .max_width(500.0)
                .resizable(true)
                .show(ctx, |ui| {
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        panels::details_panel::details_panel(ui, &self.state);
                    });
                });
        }

        // ── Central panel (device tree) ───────────────────────────────────
        egui::CentralPanel::default().show(ctx, |ui| {
            widgets::tree_view::tree_view(ui, &mut self.state);
        });

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.state.clear_selection();
        }
        if ctx.input(|i| i.key_pressed(egui::Key::F5)) {
            self.state.refresh();
        }
    }
}
