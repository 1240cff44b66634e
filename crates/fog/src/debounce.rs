//! Cancel-and-reschedule timer.
//!
//! Every [`Debouncer::schedule`] aborts the pending timer and arms a new one,
//! so only the latest trigger inside the window fires. There is no queue.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::trace;

/// Opaque identity of one armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Pending {
	id: TimerId,
	handle: JoinHandle<()>,
}

/// Owner of the single pending timer.
#[derive(Debug, Default)]
pub struct Debouncer {
	next_id: u64,
	pending: Option<Pending>,
}

impl Debouncer {
	pub fn new() -> Self {
		Self::default()
	}

	/// Cancels any pending timer and runs `task(id)` after `delay`.
	///
	/// The task should call [`Debouncer::settle`] with its id once it starts
	/// running so the slot frees up without aborting it.
	pub fn schedule<F, Fut>(&mut self, delay: Duration, task: F) -> TimerId
	where
		F: FnOnce(TimerId) -> Fut,
		Fut: Future<Output = ()> + Send + 'static,
	{
		self.cancel();
		self.next_id = self.next_id.wrapping_add(1);
		let id = TimerId(self.next_id);
		let fut = task(id);
		let handle = tokio::spawn(async move {
			tokio::time::sleep(delay).await;
			fut.await;
		});
		trace!(timer = id.0, delay_ms = delay.as_millis() as u64, "debounce.schedule");
		self.pending = Some(Pending { id, handle });
		id
	}

	/// Aborts the pending timer. Returns true if one was armed.
	pub fn cancel(&mut self) -> bool {
		match self.pending.take() {
			Some(pending) => {
				trace!(timer = pending.id.0, "debounce.cancel");
				pending.handle.abort();
				true
			}
			None => false,
		}
	}

	/// Marks timer `id` as fired.
	///
	/// Returns false if `id` was superseded, in which case the caller should
	/// not run.
	pub fn settle(&mut self, id: TimerId) -> bool {
		match &self.pending {
			Some(pending) if pending.id == id => {
				self.pending = None;
				true
			}
			_ => false,
		}
	}

	/// Returns true while a timer is armed and has not fired.
	pub fn is_pending(&self) -> bool {
		self.pending.is_some()
	}
}

impl Drop for Debouncer {
	fn drop(&mut self) {
		self.cancel();
	}
}
