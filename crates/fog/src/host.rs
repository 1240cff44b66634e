//! Seams to the host editor.
//!
//! Focus fog computes nothing on its own beyond picking a scope: fold ranges,
//! rendering, commands, the status bar and settings all belong to the host.
//! Each service is a trait so hosts (and tests) can plug in their own.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use focusfog_config::ConfigStore;
use focusfog_primitives::{DocumentId, FoldRange, LineIdx, LineSpan};
use tokio::sync::broadcast;

use crate::error::{HostError, Result};

/// The editor view that currently has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorView {
	/// Document shown in the view.
	pub document: DocumentId,
	/// Line of the primary cursor.
	pub cursor_line: LineIdx,
	/// Number of lines in the document.
	pub line_count: usize,
}

/// Editor signals focus fog reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorEvent {
	/// The selection in the active view moved.
	SelectionChanged,
	/// A different view (or none) became active.
	ActiveEditorChanged,
}

/// Window-level access: the active view and its change signals.
pub trait Workbench: Send + Sync {
	/// The active view, if any.
	fn active_editor(&self) -> Option<EditorView>;

	/// Receiver for selection and active-editor signals.
	fn events(&self) -> broadcast::Receiver<EditorEvent>;

	/// Default handler for faults raised by collaborators during a deferred
	/// update.
	fn report_fault(&self, error: &HostError) {
		tracing::error!(%error, "focus fog update failed");
	}
}

/// Source of semantic fold ranges.
#[async_trait]
pub trait FoldingProvider: Send + Sync {
	/// All fold ranges of `document`, in host order.
	///
	/// `Ok(None)` means the host has no folding data for this document.
	async fn folding_ranges(&self, document: DocumentId) -> Result<Option<Vec<FoldRange>>>;
}

/// Renderer-side identity of an overlay style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StyleId(pub u64);

impl fmt::Display for StyleId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "style#{}", self.0)
	}
}

/// Paints line regions in the active view.
pub trait DecorationRenderer: Send + Sync {
	/// Allocates a style that renders text at `opacity`.
	fn create_style(&self, opacity: f32) -> Result<StyleId>;

	/// Frees a style; regions painted with it disappear.
	fn release_style(&self, style: StyleId);

	/// Replaces every region painted with `style` in `document` by `regions`.
	///
	/// An empty slice clears the style.
	fn set_regions(&self, document: DocumentId, style: StyleId, regions: &[LineSpan]) -> Result<()>;
}

/// Callback run when a command is invoked.
pub type CommandHandler = Arc<dyn Fn() -> Result<()> + Send + Sync>;

/// Named actions bindable to keys and UI.
pub trait CommandRegistry: Send + Sync {
	/// Registers `handler` under `id`.
	fn register(&self, id: &'static str, handler: CommandHandler) -> Result<()>;

	/// Removes the command registered under `id`.
	fn unregister(&self, id: &'static str);
}

/// Renderer-side identity of a status item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusId(pub u64);

/// Styling hint for a status item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusTone {
	#[default]
	Neutral,
	Warning,
}

/// Contents of a status item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLabel {
	pub text: String,
	pub tone: StatusTone,
	/// Command invoked when the item is clicked.
	pub command: &'static str,
	pub tooltip: Option<String>,
}

/// Persistent clickable labels in the host chrome.
pub trait StatusSurface: Send + Sync {
	fn create(&self, label: StatusLabel) -> Result<StatusId>;

	fn update(&self, id: StatusId, label: StatusLabel) -> Result<()>;

	fn release(&self, id: StatusId);
}

/// Every host service focus fog talks to.
#[derive(Clone)]
pub struct Host {
	pub config: Arc<dyn ConfigStore>,
	pub workbench: Arc<dyn Workbench>,
	pub folding: Arc<dyn FoldingProvider>,
	pub renderer: Arc<dyn DecorationRenderer>,
	pub commands: Arc<dyn CommandRegistry>,
	/// Hosts without a status bar leave this unset.
	pub status: Option<Arc<dyn StatusSurface>>,
}

impl fmt::Debug for Host {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Host")
			.field("status", &self.status.is_some())
			.finish_non_exhaustive()
	}
}
