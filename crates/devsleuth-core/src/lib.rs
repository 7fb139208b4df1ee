/// DevSleuth Core: device tree snapshots, diffing and queries.
///
/// This crate contains all business logic with zero UI dependencies.
/// A frontend drives a [`session::DeviceSession`] and renders through the
/// [`adapter::TreeNodeProvider`] protocol.
///
/// # Modules
///
/// - [`model`]: Typed properties, device items and the raw device tree.
/// - [`enumerator`]: Sources of raw trees (in-memory, JSON dump).
/// - [`snapshot`]: Filtered, hash-ordered snapshots and the registry that publishes them.
/// - [`diff`]: Selection carry-over and arrival highlighting between snapshots.
/// - [`query`]: Sorting, search and column layout.
/// - [`adapter`]: Tree view callbacks, colors, icons and the context menu.
/// - [`refresh`]: Background snapshot builder thread.
/// - [`session`]: UI-thread orchestration of refreshes, settings and commands.
/// - [`settings`]: Persisted settings and the frozen tree configuration.
/// - [`export`]: CSV export of the current view.
/// - [`platform`]: Elevation checks and per-user paths.
pub mod adapter;
pub mod diff;
pub mod enumerator;
pub mod error;
pub mod export;
pub mod model;
pub mod platform;
pub mod query;
pub mod refresh;
pub mod session;
pub mod settings;
pub mod snapshot;

pub use error::{DevSleuthError, Result};
