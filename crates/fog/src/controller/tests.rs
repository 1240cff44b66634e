use std::time::Duration;

use focusfog_config::{ConfigStore, DEFAULT_DELAY_MS, FogConfig};
use focusfog_primitives::LineSpan;
use parking_lot::RwLock;
use pretty_assertions::assert_eq;
use tokio::sync::broadcast;

use super::*;
use crate::command::TOGGLE_COMMAND;
use crate::host::{EditorView, Host, StatusTone, StyleId};
use crate::memory::{MemoryHost, RendererCall};

const DOC: DocumentId = DocumentId(1);
const LINES: usize = 20;

fn view(cursor_line: usize) -> EditorView {
	EditorView {
		document: DOC,
		cursor_line,
		line_count: LINES,
	}
}

/// A 20-line document with a function `[5, 15]` holding a block `[7, 10]`.
fn scene(cursor_line: usize) -> MemoryHost {
	scene_with(FogConfig::default(), cursor_line)
}

fn scene_with(config: FogConfig, cursor_line: usize) -> MemoryHost {
	let host = MemoryHost::with_config(config);
	host.folding.set(DOC, vec![FoldRange::new(5, 15), FoldRange::new(7, 10)]);
	host.workbench.open(view(cursor_line));
	host
}

/// Sleeps past the default debounce window so pending timers fire.
async fn settle() {
	tokio::time::sleep(Duration::from_millis(DEFAULT_DELAY_MS + 50)).await;
}

/// Lets listener tasks drain their channels without firing timers.
async fn deliver() {
	tokio::time::sleep(Duration::from_millis(1)).await;
}

fn spans(pairs: &[(usize, usize)]) -> Vec<LineSpan> {
	pairs.iter().map(|&(s, e)| LineSpan::new(s, e)).collect()
}

/// Settings store whose writes are never announced; change sets are handed
/// to the controller directly.
struct SilentStore {
	config: RwLock<FogConfig>,
	changes: broadcast::Sender<ConfigChange>,
}

impl SilentStore {
	fn new() -> Self {
		Self {
			config: RwLock::new(FogConfig::default()),
			changes: broadcast::channel(1).0,
		}
	}
}

impl ConfigStore for SilentStore {
	fn snapshot(&self) -> FogConfig {
		*self.config.read()
	}

	fn set_enabled(&self, enabled: bool) -> focusfog_config::Result<()> {
		self.config.write().enabled = enabled;
		Ok(())
	}

	fn subscribe(&self) -> broadcast::Receiver<ConfigChange> {
		self.changes.subscribe()
	}
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn activation_fogs_around_innermost_scope() {
	let host = scene(8);
	let controller = FogController::activate(host.host()).unwrap();
	assert_eq!(controller.state(), ControllerState::PendingRecompute);
	assert_eq!(host.renderer.applies(), 0);

	settle().await;

	assert_eq!(controller.state(), ControllerState::Idle);
	assert_eq!(host.renderer.last_regions(), Some(spans(&[(0, 7), (11, 20)])));
	assert_eq!(host.renderer.live_styles().len(), 1);
	assert_eq!(controller.overlay_opacity(), Some(0.3));
	assert!(host.commands.contains(TOGGLE_COMMAND));
	let label = host.status.current().unwrap();
	assert_eq!(label.text, "Fog: On");
	assert_eq!(label.tone, StatusTone::Neutral);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn cursor_outside_every_scope_clears() {
	let host = scene(2);
	let controller = FogController::activate(host.host()).unwrap();

	let outcome = controller.recompute_now().await.unwrap();

	assert_eq!(outcome, FogOutcome::NoContainingRange);
	assert_eq!(host.renderer.last_regions(), Some(vec![]));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn disabled_clears_regardless_of_scope() {
	let host = scene_with(
		FogConfig {
			enabled: false,
			..FogConfig::default()
		},
		8,
	);
	let controller = FogController::activate(host.host()).unwrap();

	assert_eq!(controller.recompute_now().await.unwrap(), FogOutcome::Disabled);
	assert_eq!(host.renderer.last_regions(), Some(vec![]));
	assert_eq!(host.folding.queries(), 0);
	assert_eq!(host.status.current().unwrap().text, "Fog: Off");
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn whole_document_scope_leaves_nothing_to_fog() {
	let host = scene(3);
	host.folding.set(DOC, vec![FoldRange::new(0, 19)]);
	let controller = FogController::activate(host.host()).unwrap();

	let outcome = controller.recompute_now().await.unwrap();

	assert_eq!(outcome.regions(), Some(FogRegions::EMPTY));
	assert!(matches!(outcome, FogOutcome::Fogged { target, .. } if target == FoldRange::new(0, 19)));
	assert_eq!(host.renderer.last_regions(), Some(vec![]));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn equal_sizes_resolve_by_provider_order() {
	let host = scene(7);
	host.folding.set(DOC, vec![FoldRange::new(5, 9), FoldRange::new(3, 7)]);
	let controller = FogController::activate(host.host()).unwrap();

	let outcome = controller.recompute_now().await.unwrap();

	assert!(matches!(outcome, FogOutcome::Fogged { target, .. } if target == FoldRange::new(5, 9)));
	assert_eq!(host.renderer.last_regions(), Some(spans(&[(0, 5), (10, 20)])));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn recompute_is_idempotent() {
	let host = scene(8);
	let controller = FogController::activate(host.host()).unwrap();

	let first = controller.recompute_now().await.unwrap();
	let second = controller.recompute_now().await.unwrap();

	assert_eq!(first, second);
	let calls = host.renderer.calls();
	let applied: Vec<_> = calls
		.iter()
		.filter_map(|call| match call {
			RendererCall::SetRegions { regions, .. } => Some(regions.clone()),
			_ => None,
		})
		.collect();
	assert_eq!(applied, vec![spans(&[(0, 7), (11, 20)]); 2]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn burst_of_cursor_moves_recomputes_once_with_last_position() {
	let host = scene(8);
	let controller = FogController::activate(host.host()).unwrap();
	settle().await;
	let queries = host.folding.queries();
	let applies = host.renderer.applies();

	for line in [9, 2, 8, 13, 12] {
		host.workbench.move_cursor(line);
		tokio::time::sleep(Duration::from_millis(50)).await;
	}
	assert_eq!(controller.state(), ControllerState::PendingRecompute);
	assert_eq!(host.folding.queries(), queries);

	settle().await;

	assert_eq!(host.folding.queries(), queries + 1);
	assert_eq!(host.renderer.applies(), applies + 1);
	assert_eq!(host.renderer.last_regions(), Some(spans(&[(0, 5), (16, 20)])));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn delay_is_read_when_triggered() {
	let host = scene(8);
	let controller = FogController::activate(host.host()).unwrap();
	settle().await;
	host.config.set_delay(500).unwrap();
	deliver().await;
	let queries = host.folding.queries();

	host.workbench.move_cursor(12);
	tokio::time::sleep(Duration::from_millis(300)).await;
	assert_eq!(host.folding.queries(), queries);

	tokio::time::sleep(Duration::from_millis(300)).await;
	assert_eq!(host.folding.queries(), queries + 1);
	drop(controller);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn toggle_command_cascades_through_config() {
	let host = scene(8);
	let controller = FogController::activate(host.host()).unwrap();
	settle().await;
	let first_style = host.renderer.live_styles()[0];

	host.commands.invoke(TOGGLE_COMMAND).unwrap();
	deliver().await;

	assert!(!host.config.snapshot().enabled);
	let label = host.status.current().unwrap();
	assert_eq!(label.text, "Fog: Off");
	assert_eq!(label.tone, StatusTone::Warning);
	assert_eq!(controller.state(), ControllerState::PendingRecompute);

	settle().await;

	assert_eq!(host.renderer.last_regions(), Some(vec![]));
	let live = host.renderer.live_styles();
	assert_eq!(live.len(), 1);
	assert_ne!(live[0], first_style);

	host.commands.invoke(TOGGLE_COMMAND).unwrap();
	deliver().await;
	settle().await;
	assert_eq!(host.status.current().unwrap().text, "Fog: On");
	assert_eq!(host.renderer.last_regions(), Some(spans(&[(0, 7), (11, 20)])));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn opacity_change_replaces_style_without_overlap() {
	let host = scene(8);
	let controller = FogController::activate(host.host()).unwrap();
	settle().await;
	host.renderer.take_calls();

	host.config.set_opacity(0.6).unwrap();
	deliver().await;

	assert_eq!(
		host.renderer.calls(),
		vec![
			RendererCall::ReleaseStyle(StyleId(1)),
			RendererCall::CreateStyle {
				style: StyleId(2),
				opacity: 0.6,
			},
		]
	);
	assert_eq!(controller.overlay_opacity(), Some(0.6));
	// Status only follows `enabled`.
	assert_eq!(host.status.calls().len(), 1);

	settle().await;
	assert!(matches!(
		host.renderer.calls().last(),
		Some(RendererCall::SetRegions { style: StyleId(2), .. })
	));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn foreign_settings_are_ignored() {
	let host = scene(8);
	let controller = FogController::activate(host.host()).unwrap();
	settle().await;
	host.renderer.take_calls();

	controller
		.on_configuration_changed(&ConfigChange::new(["editor.tabSize"]))
		.unwrap();

	assert!(host.renderer.calls().is_empty());
	assert_eq!(controller.state(), ControllerState::Idle);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn no_active_document_is_a_no_op() {
	let host = scene(8);
	host.workbench.close();
	let controller = FogController::activate(host.host()).unwrap();

	assert_eq!(controller.recompute_now().await.unwrap(), FogOutcome::NoActiveDocument);
	assert_eq!(host.renderer.applies(), 0);
	assert_eq!(host.folding.queries(), 0);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn missing_fold_data_clears() {
	let host = scene(8);
	let controller = FogController::activate(host.host()).unwrap();
	settle().await;

	host.folding.remove(DOC);
	assert_eq!(controller.recompute_now().await.unwrap(), FogOutcome::NoFoldData);
	assert_eq!(host.renderer.last_regions(), Some(vec![]));

	host.folding.set(DOC, vec![]);
	assert_eq!(controller.recompute_now().await.unwrap(), FogOutcome::NoFoldData);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn folding_failure_is_reported_and_fog_is_kept() {
	let host = scene(8);
	let _controller = FogController::activate(host.host()).unwrap();
	settle().await;
	let applies = host.renderer.applies();

	host.folding.fail_next("provider timed out");
	host.workbench.move_cursor(12);
	deliver().await;
	settle().await;

	assert_eq!(host.renderer.applies(), applies);
	assert_eq!(host.renderer.last_regions(), Some(spans(&[(0, 7), (11, 20)])));
	assert_eq!(host.workbench.faults(), vec!["folding provider failed: provider timed out".to_string()]);

	host.workbench.move_cursor(12);
	deliver().await;
	settle().await;
	assert_eq!(host.renderer.last_regions(), Some(spans(&[(0, 5), (16, 20)])));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn switching_documents_fogs_the_new_one() {
	let host = scene(8);
	let other = DocumentId(2);
	host.folding.set(other, vec![FoldRange::new(2, 4)]);
	let _controller = FogController::activate(host.host()).unwrap();
	settle().await;

	host.workbench.open(EditorView {
		document: other,
		cursor_line: 3,
		line_count: 6,
	});
	deliver().await;
	settle().await;

	match host.renderer.calls().last() {
		Some(RendererCall::SetRegions { document, regions, .. }) => {
			assert_eq!(*document, other);
			assert_eq!(regions, &spans(&[(0, 2), (5, 6)]));
		}
		other => panic!("expected set_regions, got {other:?}"),
	}
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn dispose_releases_everything_and_ignores_later_signals() {
	let host = scene(8);
	let controller = FogController::activate(host.host()).unwrap();
	settle().await;

	controller.dispose();
	controller.dispose();

	assert_eq!(controller.state(), ControllerState::Disposed);
	assert!(host.renderer.live_styles().is_empty());
	assert!(!host.commands.contains(TOGGLE_COMMAND));
	assert_eq!(host.status.current(), None);

	let queries = host.folding.queries();
	host.workbench.move_cursor(12);
	controller.request_update();
	deliver().await;
	settle().await;
	assert_eq!(host.folding.queries(), queries);
	assert_eq!(controller.recompute_now().await.unwrap(), FogOutcome::NoOverlay);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn drop_cancels_pending_update() {
	let host = scene(8);
	let controller = FogController::activate(host.host()).unwrap();
	assert_eq!(controller.state(), ControllerState::PendingRecompute);

	drop(controller);
	settle().await;

	assert_eq!(host.folding.queries(), 0);
	assert!(host.renderer.live_styles().is_empty());
	assert!(!host.commands.contains(TOGGLE_COMMAND));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn failed_activation_releases_partial_state() {
	let host = scene(8);
	let _first = FogController::activate(host.host()).unwrap();

	let second = FogController::activate(host.host());

	assert!(matches!(second, Err(crate::HostError::CommandConflict(_))));
	assert_eq!(host.renderer.live_styles().len(), 1);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn failed_style_rebuild_still_updates_status_and_recovers() {
	let host = scene(8);
	let controller = FogController::activate(host.host()).unwrap();
	settle().await;

	host.renderer.fail_next_create("gpu lost");
	host.commands.invoke(TOGGLE_COMMAND).unwrap();
	deliver().await;

	assert!(!host.config.snapshot().enabled);
	assert_eq!(host.status.current().unwrap().text, "Fog: Off");
	assert_eq!(host.workbench.faults(), vec!["decoration renderer failed: gpu lost".to_string()]);
	assert!(host.renderer.live_styles().is_empty());
	assert_eq!(controller.overlay_opacity(), None);
	assert_eq!(controller.state(), ControllerState::PendingRecompute);

	settle().await;

	assert_eq!(host.renderer.live_styles().len(), 1);
	assert_eq!(controller.overlay_opacity(), Some(0.3));
	assert_eq!(host.renderer.last_regions(), Some(vec![]));

	host.commands.invoke(TOGGLE_COMMAND).unwrap();
	deliver().await;
	settle().await;
	assert_eq!(host.status.current().unwrap().text, "Fog: On");
	assert_eq!(host.renderer.last_regions(), Some(spans(&[(0, 7), (11, 20)])));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn recompute_retries_missing_style() {
	let host = scene(8);
	let controller = FogController::activate(host.host()).unwrap();
	settle().await;

	host.renderer.fail_next_create("gpu lost");
	host.config.set_opacity(0.5).unwrap();
	deliver().await;
	assert_eq!(controller.overlay_opacity(), None);

	let outcome = controller.recompute_now().await.unwrap();

	assert!(matches!(outcome, FogOutcome::Fogged { .. }));
	assert_eq!(controller.overlay_opacity(), Some(0.5));
	assert_eq!(host.renderer.live_styles().len(), 1);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn namespace_change_refreshes_status_and_rebuilds_style() {
	let host = scene(8);
	let store = Arc::new(SilentStore::new());
	let controller = FogController::activate(Host {
		config: store.clone(),
		..host.host()
	})
	.unwrap();
	settle().await;
	host.renderer.take_calls();

	store.config.write().enabled = false;
	controller.on_configuration_changed(&ConfigChange::namespace()).unwrap();

	assert_eq!(host.status.current().unwrap().text, "Fog: Off");
	assert_eq!(
		host.renderer.calls(),
		vec![
			RendererCall::ReleaseStyle(StyleId(1)),
			RendererCall::CreateStyle {
				style: StyleId(2),
				opacity: 0.3,
			},
		]
	);
	assert_eq!(controller.state(), ControllerState::PendingRecompute);

	settle().await;

	assert_eq!(host.renderer.applies(), 1);
	assert_eq!(host.renderer.last_regions(), Some(vec![]));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn lagged_settings_channel_is_treated_as_namespace_change() {
	let host = scene(8);
	let controller = FogController::activate(host.host()).unwrap();
	settle().await;

	// The `enabled` announcement is the oldest and falls out of the channel.
	host.config.set_enabled(false).unwrap();
	for i in 0..70 {
		host.config.set_opacity(if i % 2 == 0 { 0.4 } else { 0.5 }).unwrap();
	}
	deliver().await;

	assert_eq!(host.status.current().unwrap().text, "Fog: Off");
	assert_eq!(controller.overlay_opacity(), Some(0.5));
	assert_eq!(host.renderer.live_styles().len(), 1);

	settle().await;
	assert_eq!(host.renderer.last_regions(), Some(vec![]));
}
