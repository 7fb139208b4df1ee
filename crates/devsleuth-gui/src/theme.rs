/// Colour scheme and visual theme for DevSleuth.
///
/// Provides both dark and light themes. Device row colours come from the
/// user's settings (`0xRRGGBB`, tuned for a light background); in dark mode
/// they are blended toward the panel colour so text stays readable.
use devsleuth_core::settings::Color;
use egui::{Color32, Stroke, Visuals};

/// Which theme is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Dark,
    Light,
}

impl ThemeMode {
    pub fn from_dark(dark: bool) -> Self {
        if dark {
            Self::Dark
        } else {
            Self::Light
        }
    }
}

/// Semantic colour palette for DevSleuth.
///
/// Graphite panels with a teal accent, picked so the settings' device row
/// colours (problem red, disabled grey, arrival green) stay distinguishable
/// from selection and hover.
pub struct DevSleuthTheme {
    pub mode: ThemeMode,
    pub panel: Color32,
    /// Windows, popups and idle widgets.
    pub raised: Color32,
    pub hover: Color32,
    pub text: Color32,
    pub text_dim: Color32,
    pub accent: Color32,
    pub outline: Color32,
    pub selection: Color32,
    /// How far device row colours are pulled toward `panel` (0..1).
    pub row_blend: f32,
}

impl DevSleuthTheme {
    /// Dark theme, the default.
    pub fn dark() -> Self {
        Self {
            mode: ThemeMode::Dark,
            panel: Color32::from_rgb(0x1b, 0x1f, 0x24),
            raised: Color32::from_rgb(0x25, 0x2b, 0x32),
            hover: Color32::from_rgb(0x30, 0x38, 0x41),
            text: Color32::from_rgb(0xdc, 0xe2, 0xe8),
            text_dim: Color32::from_rgb(0x9a, 0xa6, 0xb2),
            accent: Color32::from_rgb(0x4f, 0xc1, 0xb6),
            outline: Color32::from_rgb(0x38, 0x41, 0x4b),
            selection: Color32::from_rgb(0x1f, 0x4a, 0x4d),
            row_blend: 0.6,
        }
    }

    pub fn light() -> Self {
        Self {
            mode: ThemeMode::Light,
            panel: Color32::from_rgb(0xf3, 0xf5, 0xf7),
            raised: Color32::from_rgb(0xfd, 0xfd, 0xfe),
            hover: Color32::from_rgb(0xe2, 0xe8, 0xec),
            text: Color32::from_rgb(0x1d, 0x24, 0x2b),
            text_dim: Color32::from_rgb(0x52, 0x5e, 0x6a),
            accent: Color32::from_rgb(0x0f, 0x7f, 0x78),
            outline: Color32::from_rgb(0xc9, 0xd1, 0xd8),
            selection: Color32::from_rgba_premultiplied(0x0f, 0x7f, 0x78, 0x38),
            row_blend: 0.0,
        }
    }

    pub fn for_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Dark => Self::dark(),
            ThemeMode::Light => Self::light(),
        }
    }

    /// Install this palette as the context's style.
    pub fn apply(&self, ctx: &egui::Context) {
        let mut visuals = match self.mode {
            ThemeMode::Dark => Visuals::dark(),
            ThemeMode::Light => Visuals::light(),
        };

        visuals.panel_fill = self.panel;
        visuals.window_fill = self.raised;
        visuals.extreme_bg_color = self.panel;
        visuals.faint_bg_color = self.raised;
        visuals.window_stroke = Stroke::new(1.0, self.outline);
        visuals.selection.bg_fill = self.selection;
        visuals.selection.stroke = Stroke::new(1.0, self.accent);

        let widgets = &mut visuals.widgets;
        for (state, fill, fg) in [
            (&mut widgets.noninteractive, self.raised, self.text),
            (&mut widgets.inactive, self.raised, self.text_dim),
            (&mut widgets.hovered, self.hover, self.accent),
            (&mut widgets.active, self.accent, self.panel),
        ] {
            state.bg_fill = fill;
            state.fg_stroke = Stroke::new(1.0, fg);
        }

        ctx.style_mut(|style| {
            style.visuals = visuals;
            style.spacing.item_spacing = egui::vec2(6.0, 3.0);
            style.spacing.button_padding = egui::vec2(6.0, 3.0);
        });
    }

    /// Row background for a device colour from the settings.
    pub fn row_fill(&self, color: Color) -> Color32 {
        lerp_color(
            Color32::from_rgb(color.r, color.g, color.b),
            self.panel,
            self.row_blend,
        )
    }
}

/// Mix `a` toward `b` by `t`.
fn lerp_color(a: Color32, b: Color32, t: f32) -> Color32 {
    let t = t.clamp(0.0, 1.0);
    Color32::from_rgb(
        (a.r() as f32 * (1.0 - t) + b.r() as f32 * t) as u8,
        (a.g() as f32 * (1.0 - t) + b.g() as f32 * t) as u8,
        (a.b() as f32 * (1.0 - t) + b.b() as f32 * t) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_row_fill_is_setting_colour() {
        let theme = DevSleuthTheme::light();
        assert_eq!(theme.row_fill(Color::rgb(0xff, 0x80, 0x00)), Color32::from_rgb(0xff, 0x80, 0x00));
    }

    #[test]
    fn test_for_mode_matches_mode() {
        assert_eq!(DevSleuthTheme::for_mode(ThemeMode::Dark).mode, ThemeMode::Dark);
        assert_eq!(DevSleuthTheme::for_mode(ThemeMode::Light).mode, ThemeMode::Light);
    }

    #[test]
    fn test_dark_row_fill_is_darker() {
        let theme = DevSleuthTheme::dark();
        let fill = theme.row_fill(Color::rgb(0xff, 0xff, 0xff));
        assert!(fill.r() < 0xff && fill.r() > theme.panel.r());
    }
}
