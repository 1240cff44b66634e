//! Status bar item mirroring the enabled flag.

use std::sync::Arc;

use tracing::debug;

use crate::command::TOGGLE_COMMAND;
use crate::error::Result;
use crate::host::{StatusId, StatusLabel, StatusSurface, StatusTone};

impl StatusLabel {
	/// Label shown for the given enabled state.
	pub fn for_enabled(enabled: bool) -> Self {
		let (text, tone) = if enabled {
			("Fog: On", StatusTone::Neutral)
		} else {
			("Fog: Off", StatusTone::Warning)
		};
		Self {
			text: text.to_string(),
			tone,
			command: TOGGLE_COMMAND,
			tooltip: Some("Toggle focus fog".to_string()),
		}
	}
}

/// The status item, released on drop.
pub struct StatusIndicator {
	id: StatusId,
	enabled: bool,
	surface: Arc<dyn StatusSurface>,
}

impl StatusIndicator {
	pub fn create(surface: Arc<dyn StatusSurface>, enabled: bool) -> Result<Self> {
		let id = surface.create(StatusLabel::for_enabled(enabled))?;
		debug!(enabled, "status.create");
		Ok(Self { id, enabled, surface })
	}

	/// Shows `enabled`; unchanged state is not re-sent.
	pub fn refresh(&mut self, enabled: bool) -> Result<()> {
		if self.enabled == enabled {
			return Ok(());
		}
		self.surface.update(self.id, StatusLabel::for_enabled(enabled))?;
		self.enabled = enabled;
		debug!(enabled, "status.refresh");
		Ok(())
	}

	pub fn enabled(&self) -> bool {
		self.enabled
	}
}

impl Drop for StatusIndicator {
	fn drop(&mut self) {
		self.surface.release(self.id);
	}
}

impl std::fmt::Debug for StatusIndicator {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("StatusIndicator")
			.field("id", &self.id)
			.field("enabled", &self.enabled)
			.finish()
	}
}
