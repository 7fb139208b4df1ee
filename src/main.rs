//! DevSleuth: live hardware device browser.
//!
//! Thin binary entry point. All logic lives in the `devsleuth-core`
//! and `devsleuth-gui` crates.
//!
//! Usage: `DevSleuth [DEVICE_DUMP.json]`. Without an argument the device
//! dump is read from `devices.json` next to the settings file. A sample
//! dump lives in `demos/devices.json`.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use devsleuth_core::enumerator::JsonDumpEnumerator;
use devsleuth_core::platform;
use devsleuth_core::settings::{JsonSettingsStore, MemorySettingsStore, SettingsStore};
use std::path::PathBuf;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("DevSleuth starting");

    let settings_path = platform::default_settings_path();
    let dump_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| settings_path.with_file_name("devices.json"));

    let settings: Box<dyn SettingsStore> = match JsonSettingsStore::open(&settings_path) {
        Ok(store) => Box::new(store),
        Err(e) => {
            tracing::warn!("Settings unavailable ({e}); changes will not be saved");
            Box::new(MemorySettingsStore::new())
        }
    };

    tracing::info!(dump = %dump_path.display(), "Reading devices");
    let enumerator = Arc::new(JsonDumpEnumerator::new(dump_path));

    let icon = devsleuth_gui::icon::generate_icon(64);

    // Build application state *before* opening the window so the first
    // enumeration is already running when the first frame is drawn.
    let state = devsleuth_gui::DevSleuthState::build(enumerator, settings)?;

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title("DevSleuth -- Device Browser")
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 500.0])
            .with_icon(icon)
            // Avoids the white fill Windows paints before the first frame.
            .with_transparent(true),
        ..Default::default()
    };

    eframe::run_native(
        "DevSleuth",
        options,
        Box::new(|cc| Ok(Box::new(devsleuth_gui::DevSleuthApp::with_state(cc, state)))),
    )
    .map_err(|e| anyhow::anyhow!("eframe error: {e}"))?;

    Ok(())
}
