use std::sync::Arc;

use focusfog_primitives::{DocumentId, FogRegions};
use tracing::debug;

use crate::error::Result;
use crate::host::{DecorationRenderer, StyleId};

/// The fog overlay style, owned for as long as the value lives.
///
/// Dropping it releases the renderer style. The controller keeps at most one
/// and drops the old one before creating a replacement.
pub struct OverlayStyle {
	id: StyleId,
	opacity: f32,
	renderer: Arc<dyn DecorationRenderer>,
}

impl OverlayStyle {
	/// Allocates a renderer style at `opacity`.
	pub fn create(renderer: Arc<dyn DecorationRenderer>, opacity: f32) -> Result<Self> {
		let id = renderer.create_style(opacity)?;
		debug!(style = %id, opacity, "overlay.create");
		Ok(Self { id, opacity, renderer })
	}

	pub fn opacity(&self) -> f32 {
		self.opacity
	}

	/// Replaces the fogged regions of `document` in one renderer call.
	pub fn apply(&self, document: DocumentId, regions: &FogRegions) -> Result<()> {
		self.renderer.set_regions(document, self.id, &regions.spans())
	}
}

impl Drop for OverlayStyle {
	fn drop(&mut self) {
		debug!(style = %self.id, "overlay.release");
		self.renderer.release_style(self.id);
	}
}

impl std::fmt::Debug for OverlayStyle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("OverlayStyle")
			.field("id", &self.id)
			.field("opacity", &self.opacity)
			.finish()
	}
}
