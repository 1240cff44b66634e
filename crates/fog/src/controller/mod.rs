//! The fog controller.
//!
//! Owns the overlay style, the debounce timer, the status item, the toggle
//! registration and the signal subscriptions. Every signal funnels into
//! [`FogController::request_update`]; the deferred recompute then:
//!
//! 1. Does nothing without an active view or an overlay style
//! 2. Clears the fog when disabled
//! 3. Asks the host for fold ranges and picks the smallest one enclosing the cursor
//! 4. Fogs everything above and below it in one renderer call
//!
//! Anything short of a target clears the fog rather than leaving it stale.

use std::sync::{Arc, Weak};

use focusfog_config::{ConfigChange, ConfigKey};
use focusfog_primitives::{DocumentId, FogRegions, FoldRange, select_target};
use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use crate::command::CommandRegistration;
use crate::debounce::{Debouncer, TimerId};
use crate::error::Result;
use crate::host::Host;
use crate::overlay::OverlayStyle;
use crate::status::StatusIndicator;
use crate::subscription::{Delivery, Signal, Subscriptions};

#[cfg(test)]
mod tests;

/// Observable lifecycle of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
	/// Activation has not finished.
	Uninitialized,
	/// Nothing scheduled.
	Idle,
	/// A recompute is armed and waiting for the debounce delay.
	PendingRecompute,
	/// Disposed; signals are ignored.
	Disposed,
}

/// What one recompute did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FogOutcome {
	/// No view is active; nothing was touched.
	NoActiveDocument,
	/// No overlay style exists; nothing was touched.
	NoOverlay,
	/// Fogging is off; the fog was cleared.
	Disabled,
	/// The host had no fold ranges; the fog was cleared.
	NoFoldData,
	/// No fold range encloses the cursor; the fog was cleared.
	NoContainingRange,
	/// `regions` around `target` were applied.
	Fogged { target: FoldRange, regions: FogRegions },
}

impl FogOutcome {
	/// Regions left on screen by this outcome, if the fog was written.
	pub fn regions(&self) -> Option<FogRegions> {
		match self {
			FogOutcome::NoActiveDocument | FogOutcome::NoOverlay => None,
			FogOutcome::Disabled | FogOutcome::NoFoldData | FogOutcome::NoContainingRange => Some(FogRegions::EMPTY),
			FogOutcome::Fogged { regions, .. } => Some(*regions),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Lifecycle {
	#[default]
	Uninitialized,
	Active,
	Disposed,
}

#[derive(Debug, Default)]
struct State {
	lifecycle: Lifecycle,
	overlay: Option<Arc<OverlayStyle>>,
	timer: Debouncer,
	status: Option<StatusIndicator>,
	toggle: Option<CommandRegistration>,
	subscriptions: Subscriptions,
}

struct Inner {
	host: Host,
	state: Mutex<State>,
}

/// Keeps the fog in sync with the cursor of the active view.
///
/// Dropping the controller disposes it.
pub struct FogController {
	inner: Arc<Inner>,
}

impl FogController {
	/// Activates focus fog against `host`.
	///
	/// Creates the overlay style, registers the toggle command, shows the
	/// status item, subscribes to editor and settings signals and schedules a
	/// first update. Must be called inside a tokio runtime.
	///
	/// On failure everything acquired so far is released again.
	pub fn activate(host: Host) -> Result<Self> {
		let controller = Self {
			inner: Arc::new(Inner {
				host,
				state: Mutex::new(State::default()),
			}),
		};
		controller.inner.activate()?;
		Ok(controller)
	}

	/// Schedules a debounced recompute, superseding any pending one.
	pub fn request_update(&self) {
		self.inner.request_update();
	}

	/// Handler for selection moves.
	pub fn on_selection_changed(&self) {
		self.inner.request_update();
	}

	/// Handler for the active view changing.
	pub fn on_active_editor_changed(&self) {
		self.inner.request_update();
	}

	/// Handler for settings changes.
	///
	/// Changes outside the `focusFog` namespace are ignored. Otherwise the
	/// overlay style is rebuilt, the status item follows `enabled`, and an
	/// update is scheduled.
	pub fn on_configuration_changed(&self, change: &ConfigChange) -> Result<()> {
		self.inner.on_configuration_changed(change)
	}

	/// Cancels the pending timer and recomputes right away.
	pub async fn recompute_now(&self) -> Result<FogOutcome> {
		self.inner.state.lock().timer.cancel();
		self.inner.recompute().await
	}

	/// Releases the overlay style, status item, toggle command and
	/// subscriptions, and cancels the pending timer. Idempotent.
	pub fn dispose(&self) {
		self.inner.dispose();
	}

	pub fn state(&self) -> ControllerState {
		let state = self.inner.state.lock();
		match state.lifecycle {
			Lifecycle::Uninitialized => ControllerState::Uninitialized,
			Lifecycle::Disposed => ControllerState::Disposed,
			Lifecycle::Active if state.timer.is_pending() => ControllerState::PendingRecompute,
			Lifecycle::Active => ControllerState::Idle,
		}
	}

	/// Opacity of the live overlay style.
	pub fn overlay_opacity(&self) -> Option<f32> {
		self.inner.state.lock().overlay.as_ref().map(|overlay| overlay.opacity())
	}
}

impl Drop for FogController {
	fn drop(&mut self) {
		self.inner.dispose();
	}
}

impl std::fmt::Debug for FogController {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FogController").field("state", &self.state()).finish()
	}
}

impl Inner {
	fn activate(self: &Arc<Self>) -> Result<()> {
		let config = self.host.config.snapshot();
		self.rebuild_overlay(config.opacity)?;

		let toggle = CommandRegistration::toggle(self.host.commands.clone(), self.host.config.clone())?;
		let status = self
			.host
			.status
			.clone()
			.map(|surface| StatusIndicator::create(surface, config.enabled))
			.transpose()?;
		let subscriptions = self.subscribe();

		{
			let mut state = self.state.lock();
			state.toggle = Some(toggle);
			state.status = status;
			state.subscriptions = subscriptions;
			state.lifecycle = Lifecycle::Active;
		}

		info!(
			enabled = config.enabled,
			opacity = config.opacity,
			delay_ms = config.delay,
			"focus fog is active"
		);
		self.request_update();
		Ok(())
	}

	fn subscribe(self: &Arc<Self>) -> Subscriptions {
		let mut subscriptions = Subscriptions::new();

		let weak = Arc::downgrade(self);
		subscriptions.listen(Signal::Editor, self.host.workbench.events(), move |_| {
			let weak = weak.clone();
			async move {
				let Some(inner) = weak.upgrade() else {
					return false;
				};
				inner.request_update();
				true
			}
		});

		let weak: Weak<Self> = Arc::downgrade(self);
		subscriptions.listen(Signal::Configuration, self.host.config.subscribe(), move |delivery| {
			let weak = weak.clone();
			async move {
				let Some(inner) = weak.upgrade() else {
					return false;
				};
				let change = match delivery {
					Delivery::Message(change) => change,
					Delivery::Lagged(_) => ConfigChange::namespace(),
				};
				if let Err(error) = inner.on_configuration_changed(&change) {
					warn!(%error, "config.apply_failed");
					inner.host.workbench.report_fault(&error);
				}
				true
			}
		});

		subscriptions
	}

	fn request_update(self: &Arc<Self>) {
		let delay = self.host.config.snapshot().delay();
		let mut state = self.state.lock();
		if state.lifecycle == Lifecycle::Disposed {
			return;
		}
		let weak = Arc::downgrade(self);
		state.timer.schedule(delay, move |id| async move {
			if let Some(inner) = weak.upgrade() {
				inner.fire(id).await;
			}
		});
	}

	async fn fire(self: Arc<Self>, id: TimerId) {
		let settled = self.state.lock().timer.settle(id);
		if !settled {
			return;
		}
		match self.recompute().await {
			Ok(outcome) => debug!(?outcome, "fog.update"),
			Err(error) => {
				warn!(%error, "fog.update_failed");
				self.host.workbench.report_fault(&error);
			}
		}
	}

	fn on_configuration_changed(self: &Arc<Self>, change: &ConfigChange) -> Result<()> {
		if !change.affects_namespace() {
			trace!(keys = ?change.keys(), "config.ignored");
			return Ok(());
		}
		if self.state.lock().lifecycle == Lifecycle::Disposed {
			return Ok(());
		}

		// Each step runs even if an earlier one failed; the first error wins.
		let config = self.host.config.snapshot();
		let status = if change.affects(ConfigKey::Enabled) {
			self.refresh_status(config.enabled)
		} else {
			Ok(())
		};
		let overlay = self.rebuild_overlay(config.opacity);
		self.request_update();
		status.and(overlay)
	}

	/// Points the status item at `enabled`. The surface is called without
	/// holding the state lock.
	fn refresh_status(&self, enabled: bool) -> Result<()> {
		let Some(mut status) = self.state.lock().status.take() else {
			return Ok(());
		};
		let result = status.refresh(enabled);
		let displaced = {
			let mut state = self.state.lock();
			match state.lifecycle {
				Lifecycle::Disposed => Some(status),
				_ => state.status.replace(status),
			}
		};
		drop(displaced);
		result
	}

	/// Replaces the overlay style, releasing the old one first.
	///
	/// The renderer is called without holding the state lock. If creation
	/// fails the controller is left without a style and the next recompute
	/// tries again.
	fn rebuild_overlay(&self, opacity: f32) -> Result<()> {
		let old = {
			let mut state = self.state.lock();
			if state.lifecycle == Lifecycle::Disposed {
				return Ok(());
			}
			state.overlay.take()
		};
		drop(old);
		let overlay = Arc::new(OverlayStyle::create(self.host.renderer.clone(), opacity)?);
		self.install_overlay(overlay);
		Ok(())
	}

	fn install_overlay(&self, overlay: Arc<OverlayStyle>) {
		let displaced = {
			let mut state = self.state.lock();
			match state.lifecycle {
				Lifecycle::Disposed => Some(overlay),
				_ => state.overlay.replace(overlay),
			}
		};
		drop(displaced);
	}

	/// Returns true once an overlay style exists, creating one if an earlier
	/// rebuild failed. Never creates one outside the active lifecycle.
	fn ensure_overlay(&self) -> Result<bool> {
		{
			let state = self.state.lock();
			if state.overlay.is_some() {
				return Ok(true);
			}
			if state.lifecycle != Lifecycle::Active {
				return Ok(false);
			}
		}
		let opacity = self.host.config.snapshot().opacity;
		let overlay = Arc::new(OverlayStyle::create(self.host.renderer.clone(), opacity)?);
		debug!(opacity, "overlay.recreated");
		self.install_overlay(overlay);
		Ok(self.state.lock().overlay.is_some())
	}

	async fn recompute(&self) -> Result<FogOutcome> {
		let Some(view) = self.host.workbench.active_editor() else {
			return Ok(FogOutcome::NoActiveDocument);
		};
		if !self.ensure_overlay()? {
			return Ok(FogOutcome::NoOverlay);
		}

		if !self.host.config.snapshot().enabled {
			return self.apply(view.document, FogRegions::EMPTY, FogOutcome::Disabled);
		}

		let ranges = self.host.folding.folding_ranges(view.document).await?.unwrap_or_default();
		if ranges.is_empty() {
			return self.apply(view.document, FogRegions::EMPTY, FogOutcome::NoFoldData);
		}

		let malformed = ranges.iter().filter(|r| !r.is_well_formed()).count();
		if malformed > 0 {
			warn!(document = %view.document, malformed, "ignoring fold ranges with start > end");
		}

		let Some(target) = select_target(&ranges, view.cursor_line) else {
			return self.apply(view.document, FogRegions::EMPTY, FogOutcome::NoContainingRange);
		};
		let regions = FogRegions::around(target, view.line_count);
		trace!(
			document = %view.document,
			cursor = view.cursor_line,
			%target,
			fogged = !regions.is_empty(),
			"fog.target"
		);
		self.apply(view.document, regions, FogOutcome::Fogged { target, regions })
	}

	/// Writes `regions` with the current overlay style.
	///
	/// The style may have been disposed while the fold query was in flight;
	/// then nothing is written.
	fn apply(&self, document: DocumentId, regions: FogRegions, outcome: FogOutcome) -> Result<FogOutcome> {
		let overlay = self.state.lock().overlay.clone();
		match overlay {
			Some(overlay) => {
				overlay.apply(document, &regions)?;
				Ok(outcome)
			}
			None => Ok(FogOutcome::NoOverlay),
		}
	}

	fn dispose(&self) {
		let (overlay, status, toggle, subscriptions) = {
			let mut state = self.state.lock();
			if state.lifecycle == Lifecycle::Disposed {
				return;
			}
			state.lifecycle = Lifecycle::Disposed;
			state.timer.cancel();
			(
				state.overlay.take(),
				state.status.take(),
				state.toggle.take(),
				std::mem::take(&mut state.subscriptions),
			)
		};
		drop(subscriptions);
		drop(toggle);
		drop(status);
		drop(overlay);
		info!("focus fog deactivated");
	}
}
