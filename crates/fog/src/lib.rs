//! Focus fog: dims code outside the block around the cursor.
//!
//! The host editor supplies fold ranges, rendering, commands, a status bar
//! and settings through the traits in [`host`]. [`FogController`] wires them
//! together: on every selection, active-editor or settings signal it waits for
//! the debounce delay, picks the smallest fold range enclosing the cursor and
//! fogs the lines above and below it.
//!
//! ```no_run
//! # async fn run(host: focusfog::Host) -> focusfog::Result<()> {
//! let controller = focusfog::FogController::activate(host)?;
//! // ... the host drives events ...
//! controller.dispose();
//! # Ok(())
//! # }
//! ```

/// The toggle action.
pub mod command;
/// The controller and its recompute rule.
pub mod controller;
/// Cancel-and-reschedule timer.
pub mod debounce;
/// Host collaborator errors.
pub mod error;
/// Host service traits.
pub mod host;
/// In-memory host services.
pub mod memory;
/// Overlay style handle.
pub mod overlay;
/// Status bar item.
pub mod status;
/// Signal subscriptions.
pub mod subscription;

pub use command::{TOGGLE_COMMAND, toggle};
pub use controller::{ControllerState, FogController, FogOutcome};
pub use error::{HostError, Result};
pub use focusfog_config as config;
pub use focusfog_primitives as primitives;
pub use host::{
	CommandHandler, CommandRegistry, DecorationRenderer, EditorEvent, EditorView, FoldingProvider, Host, StatusId,
	StatusLabel, StatusSurface, StatusTone, StyleId, Workbench,
};
