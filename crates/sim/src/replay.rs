//! Drives a [`Session`] through a controller backed by the in-memory host.

use std::fmt;
use std::time::Duration;

use anyhow::Context;
use focusfog::config::{ConfigStore, FogConfig};
use focusfog::memory::{MemoryHost, RendererCall, StatusCall};
use focusfog::primitives::LineSpan;
use focusfog::{EditorView, FogController, FogOutcome, TOGGLE_COMMAND};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::session::{Session, Step};

/// Times the scheduler is yielded to after each step so listeners catch up.
const DRAIN_YIELDS: usize = 8;

/// One observable effect, stamped with virtual time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceLine {
	pub at_ms: u64,
	pub step: String,
	pub event: String,
}

impl fmt::Display for TraceLine {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:>6}ms  {:<18} {}", self.at_ms, self.step, self.event)
	}
}

struct Recorder {
	host: MemoryHost,
	started: Instant,
	status_seen: usize,
	faults_seen: usize,
	lines: Vec<TraceLine>,
}

impl Recorder {
	fn push(&mut self, step: &str, event: String) {
		self.lines.push(TraceLine {
			at_ms: self.started.elapsed().as_millis() as u64,
			step: step.to_string(),
			event,
		});
	}

	/// Moves everything the host saw since the last call into the trace.
	fn collect(&mut self, step: &str) {
		for call in self.host.renderer.take_calls() {
			self.push(step, describe_render(&call));
		}

		let status = self.host.status.calls();
		for call in &status[self.status_seen..] {
			self.push(step, describe_status(call));
		}
		self.status_seen = status.len();

		let faults = self.host.workbench.faults();
		for fault in &faults[self.faults_seen..] {
			self.push(step, format!("fault {fault}"));
		}
		self.faults_seen = faults.len();
	}
}

/// Replays `session` on top of `base` and returns the trace.
///
/// Must run inside a tokio runtime with paused time for stable timestamps.
pub async fn run(session: &Session, base: FogConfig) -> anyhow::Result<Vec<TraceLine>> {
	let mut config = base;
	config.merge(session.settings);
	config.validate().context("invalid session settings")?;

	let host = MemoryHost::with_config(config);
	for doc in &session.documents {
		host.folding.set(doc.document_id(), doc.fold_ranges());
	}

	let mut recorder = Recorder {
		host: host.clone(),
		started: Instant::now(),
		status_seen: 0,
		faults_seen: 0,
		lines: Vec::new(),
	};

	let controller = FogController::activate(host.host()).context("activation failed")?;
	recorder.collect("activate");
	info!(steps = session.steps.len(), "replay.start");

	for step in &session.steps {
		let label = step.to_string();
		debug!(step = %label, "replay.step");
		match step {
			Step::Open { document, cursor } => {
				let doc = session
					.document(*document)
					.with_context(|| format!("document {document} is not declared"))?;
				host.workbench.open(EditorView {
					document: doc.document_id(),
					cursor_line: *cursor,
					line_count: doc.lines,
				});
			}
			Step::Cursor { line } => host.workbench.move_cursor(*line),
			Step::Wait { ms } => tokio::time::sleep(Duration::from_millis(*ms)).await,
			Step::Toggle => host.commands.invoke(TOGGLE_COMMAND)?,
			Step::SetOpacity { value } => {
				host.config.set_opacity(*value)?;
			}
			Step::SetDelay { ms } => {
				host.config.set_delay(*ms)?;
			}
			Step::Close => host.workbench.close(),
			Step::Flush => {
				let outcome = controller.recompute_now().await?;
				recorder.collect(&label);
				recorder.push(&label, describe_outcome(&outcome));
				continue;
			}
		}
		drain().await;
		recorder.collect(&label);
	}

	let delay = host.config.snapshot().delay();
	tokio::time::sleep(delay).await;
	recorder.collect("settle");

	controller.dispose();
	recorder.collect("dispose");
	info!(lines = recorder.lines.len(), "replay.done");

	Ok(recorder.lines)
}

async fn drain() {
	for _ in 0..DRAIN_YIELDS {
		tokio::task::yield_now().await;
	}
}

fn describe_spans(spans: &[LineSpan]) -> String {
	spans.iter().map(LineSpan::to_string).collect::<Vec<_>>().join(" ")
}

fn describe_render(call: &RendererCall) -> String {
	match call {
		RendererCall::CreateStyle { style, opacity } => format!("create {style} opacity={opacity}"),
		RendererCall::ReleaseStyle(style) => format!("release {style}"),
		RendererCall::SetRegions { document, style, regions } if regions.is_empty() => {
			format!("{document} {style} clear")
		}
		RendererCall::SetRegions { document, style, regions } => {
			format!("{document} {style} fog {}", describe_spans(regions))
		}
	}
}

fn describe_status(call: &StatusCall) -> String {
	match call {
		StatusCall::Create(label) | StatusCall::Update(_, label) => format!("status {}", label.text),
		StatusCall::Release(_) => "status released".to_string(),
	}
}

fn describe_outcome(outcome: &FogOutcome) -> String {
	match outcome {
		FogOutcome::NoActiveDocument => "outcome no active document".to_string(),
		FogOutcome::NoOverlay => "outcome no overlay".to_string(),
		FogOutcome::Disabled => "outcome disabled".to_string(),
		FogOutcome::NoFoldData => "outcome no fold data".to_string(),
		FogOutcome::NoContainingRange => "outcome no containing range".to_string(),
		FogOutcome::Fogged { target, .. } => format!("outcome fogged {target}"),
	}
}
