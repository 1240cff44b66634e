//! In-memory host services.
//!
//! Used by the tests and by the headless simulator. Every service records
//! what it was asked to do so callers can inspect it afterwards.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use focusfog_config::{FogConfig, MemoryConfigStore};
use focusfog_primitives::{DocumentId, FoldRange, LineIdx, LineSpan};
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;

use crate::error::{HostError, Result};
use crate::host::{
	CommandHandler, CommandRegistry, DecorationRenderer, EditorEvent, EditorView, FoldingProvider, Host, StatusId,
	StatusLabel, StatusSurface, StyleId, Workbench,
};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// A single window with at most one active view.
#[derive(Debug)]
pub struct MemoryWorkbench {
	active: RwLock<Option<EditorView>>,
	events: broadcast::Sender<EditorEvent>,
	faults: Mutex<Vec<String>>,
}

impl Default for MemoryWorkbench {
	fn default() -> Self {
		let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
		Self {
			active: RwLock::new(None),
			events,
			faults: Mutex::new(Vec::new()),
		}
	}
}

impl MemoryWorkbench {
	/// Makes `view` the active view.
	pub fn open(&self, view: EditorView) {
		*self.active.write() = Some(view);
		self.emit(EditorEvent::ActiveEditorChanged);
	}

	/// Leaves no view active.
	pub fn close(&self) {
		*self.active.write() = None;
		self.emit(EditorEvent::ActiveEditorChanged);
	}

	/// Moves the cursor of the active view. Does nothing without one.
	pub fn move_cursor(&self, line: LineIdx) {
		let moved = match self.active.write().as_mut() {
			Some(view) => {
				view.cursor_line = line;
				true
			}
			None => false,
		};
		if moved {
			self.emit(EditorEvent::SelectionChanged);
		}
	}

	/// Faults handed to [`Workbench::report_fault`], as display strings.
	pub fn faults(&self) -> Vec<String> {
		self.faults.lock().clone()
	}

	fn emit(&self, event: EditorEvent) {
		let _ = self.events.send(event);
	}
}

impl Workbench for MemoryWorkbench {
	fn active_editor(&self) -> Option<EditorView> {
		*self.active.read()
	}

	fn events(&self) -> broadcast::Receiver<EditorEvent> {
		self.events.subscribe()
	}

	fn report_fault(&self, error: &HostError) {
		tracing::warn!(%error, "fault reported to host");
		self.faults.lock().push(error.to_string());
	}
}

/// Fold ranges served from a table.
#[derive(Debug, Default)]
pub struct MemoryFolding {
	ranges: RwLock<HashMap<DocumentId, Vec<FoldRange>>>,
	fail_with: Mutex<Option<String>>,
	queries: AtomicUsize,
}

impl MemoryFolding {
	/// Serves `ranges` for `document`, replacing what was there.
	pub fn set(&self, document: DocumentId, ranges: Vec<FoldRange>) {
		self.ranges.write().insert(document, ranges);
	}

	/// Forgets `document`; queries for it answer `None`.
	pub fn remove(&self, document: DocumentId) {
		self.ranges.write().remove(&document);
	}

	/// Makes the next query fail with `message`.
	pub fn fail_next(&self, message: impl Into<String>) {
		*self.fail_with.lock() = Some(message.into());
	}

	/// Number of queries answered so far, failures included.
	pub fn queries(&self) -> usize {
		self.queries.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl FoldingProvider for MemoryFolding {
	async fn folding_ranges(&self, document: DocumentId) -> Result<Option<Vec<FoldRange>>> {
		self.queries.fetch_add(1, Ordering::SeqCst);
		if let Some(message) = self.fail_with.lock().take() {
			return Err(HostError::Folding(message));
		}
		Ok(self.ranges.read().get(&document).cloned())
	}
}

/// One call made to a [`RecordingRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub enum RendererCall {
	CreateStyle { style: StyleId, opacity: f32 },
	ReleaseStyle(StyleId),
	SetRegions { document: DocumentId, style: StyleId, regions: Vec<LineSpan> },
}

/// Renderer that records calls and tracks live styles.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
	next_style: AtomicU64,
	calls: Mutex<Vec<RendererCall>>,
	live: Mutex<Vec<StyleId>>,
	fail_create: Mutex<Option<String>>,
}

impl RecordingRenderer {
	/// Makes the next `create_style` fail with `message`.
	pub fn fail_next_create(&self, message: impl Into<String>) {
		*self.fail_create.lock() = Some(message.into());
	}

	pub fn calls(&self) -> Vec<RendererCall> {
		self.calls.lock().clone()
	}

	/// Drains the call log.
	pub fn take_calls(&self) -> Vec<RendererCall> {
		std::mem::take(&mut *self.calls.lock())
	}

	/// Styles created and not yet released.
	pub fn live_styles(&self) -> Vec<StyleId> {
		self.live.lock().clone()
	}

	/// Regions of the most recent `set_regions` call.
	pub fn last_regions(&self) -> Option<Vec<LineSpan>> {
		self.calls.lock().iter().rev().find_map(|call| match call {
			RendererCall::SetRegions { regions, .. } => Some(regions.clone()),
			_ => None,
		})
	}

	/// Number of `set_regions` calls so far.
	pub fn applies(&self) -> usize {
		self.calls
			.lock()
			.iter()
			.filter(|call| matches!(call, RendererCall::SetRegions { .. }))
			.count()
	}
}

impl DecorationRenderer for RecordingRenderer {
	fn create_style(&self, opacity: f32) -> Result<StyleId> {
		if let Some(message) = self.fail_create.lock().take() {
			return Err(HostError::Renderer(message));
		}
		let style = StyleId(self.next_style.fetch_add(1, Ordering::SeqCst) + 1);
		self.live.lock().push(style);
		self.calls.lock().push(RendererCall::CreateStyle { style, opacity });
		Ok(style)
	}

	fn release_style(&self, style: StyleId) {
		self.live.lock().retain(|s| *s != style);
		self.calls.lock().push(RendererCall::ReleaseStyle(style));
	}

	fn set_regions(&self, document: DocumentId, style: StyleId, regions: &[LineSpan]) -> Result<()> {
		if !self.live.lock().contains(&style) {
			return Err(HostError::Renderer(format!("{style} is not live")));
		}
		self.calls.lock().push(RendererCall::SetRegions {
			document,
			style,
			regions: regions.to_vec(),
		});
		Ok(())
	}
}

/// Command table.
#[derive(Default)]
pub struct MemoryCommands {
	commands: Mutex<HashMap<&'static str, CommandHandler>>,
}

impl MemoryCommands {
	/// Runs the command registered under `id`.
	pub fn invoke(&self, id: &str) -> Result<()> {
		let handler = self
			.commands
			.lock()
			.get(id)
			.cloned()
			.ok_or_else(|| HostError::UnknownCommand(id.to_string()))?;
		handler()
	}

	pub fn contains(&self, id: &str) -> bool {
		self.commands.lock().contains_key(id)
	}
}

impl CommandRegistry for MemoryCommands {
	fn register(&self, id: &'static str, handler: CommandHandler) -> Result<()> {
		let mut commands = self.commands.lock();
		if commands.contains_key(id) {
			return Err(HostError::CommandConflict(id.to_string()));
		}
		commands.insert(id, handler);
		Ok(())
	}

	fn unregister(&self, id: &'static str) {
		self.commands.lock().remove(id);
	}
}

impl std::fmt::Debug for MemoryCommands {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_set().entries(self.commands.lock().keys()).finish()
	}
}

/// One call made to a [`MemoryStatus`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusCall {
	Create(StatusLabel),
	Update(StatusId, StatusLabel),
	Release(StatusId),
}

/// Status bar with a single slot.
#[derive(Debug, Default)]
pub struct MemoryStatus {
	next_id: AtomicU64,
	calls: Mutex<Vec<StatusCall>>,
	current: Mutex<Option<(StatusId, StatusLabel)>>,
}

impl MemoryStatus {
	pub fn calls(&self) -> Vec<StatusCall> {
		self.calls.lock().clone()
	}

	/// Label currently shown, if any.
	pub fn current(&self) -> Option<StatusLabel> {
		self.current.lock().as_ref().map(|(_, label)| label.clone())
	}
}

impl StatusSurface for MemoryStatus {
	fn create(&self, label: StatusLabel) -> Result<StatusId> {
		let id = StatusId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
		*self.current.lock() = Some((id, label.clone()));
		self.calls.lock().push(StatusCall::Create(label));
		Ok(id)
	}

	fn update(&self, id: StatusId, label: StatusLabel) -> Result<()> {
		let mut current = self.current.lock();
		match current.as_mut() {
			Some((live, shown)) if *live == id => *shown = label.clone(),
			_ => return Err(HostError::Status(format!("unknown status item {}", id.0))),
		}
		self.calls.lock().push(StatusCall::Update(id, label));
		Ok(())
	}

	fn release(&self, id: StatusId) {
		let mut current = self.current.lock();
		if current.as_ref().is_some_and(|(live, _)| *live == id) {
			*current = None;
		}
		self.calls.lock().push(StatusCall::Release(id));
	}
}

/// A complete in-memory host.
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
	pub config: Arc<MemoryConfigStore>,
	pub workbench: Arc<MemoryWorkbench>,
	pub folding: Arc<MemoryFolding>,
	pub renderer: Arc<RecordingRenderer>,
	pub commands: Arc<MemoryCommands>,
	pub status: Arc<MemoryStatus>,
}

impl MemoryHost {
	/// A host starting from `config`.
	pub fn with_config(config: FogConfig) -> Self {
		Self {
			config: Arc::new(MemoryConfigStore::new(config)),
			..Self::default()
		}
	}

	/// Service bundle handed to the controller.
	pub fn host(&self) -> Host {
		Host {
			config: self.config.clone(),
			workbench: self.workbench.clone(),
			folding: self.folding.clone(),
			renderer: self.renderer.clone(),
			commands: self.commands.clone(),
			status: Some(self.status.clone()),
		}
	}
}
