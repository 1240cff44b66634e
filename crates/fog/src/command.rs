//! The toggle action.

use std::sync::Arc;

use focusfog_config::ConfigStore;
use tracing::{debug, info};

use crate::error::Result;
use crate::host::{CommandHandler, CommandRegistry};

/// Command id of the toggle action.
pub const TOGGLE_COMMAND: &str = "focusFog.toggle";

/// Flips `enabled` in the store and returns the new value.
///
/// The store announces the write, which is how the controller hears about it.
pub fn toggle(store: &dyn ConfigStore) -> Result<bool> {
	let enabled = !store.snapshot().enabled;
	store.set_enabled(enabled)?;
	info!(enabled, "focus fog toggled");
	Ok(enabled)
}

/// A registered command, unregistered on drop.
pub struct CommandRegistration {
	id: &'static str,
	registry: Arc<dyn CommandRegistry>,
}

impl CommandRegistration {
	/// Registers `handler` under `id`.
	pub fn register(registry: Arc<dyn CommandRegistry>, id: &'static str, handler: CommandHandler) -> Result<Self> {
		registry.register(id, handler)?;
		debug!(command = id, "command.register");
		Ok(Self { id, registry })
	}

	/// Registers the toggle action against `store`.
	pub fn toggle(registry: Arc<dyn CommandRegistry>, store: Arc<dyn ConfigStore>) -> Result<Self> {
		Self::register(registry, TOGGLE_COMMAND, Arc::new(move || toggle(store.as_ref()).map(|_| ())))
	}

	pub fn id(&self) -> &'static str {
		self.id
	}
}

impl Drop for CommandRegistration {
	fn drop(&mut self) {
		debug!(command = self.id, "command.unregister");
		self.registry.unregister(self.id);
	}
}

impl std::fmt::Debug for CommandRegistration {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("CommandRegistration").field(&self.id).finish()
	}
}
