//! Signal subscriptions released as a unit.

use std::fmt;
use std::future::Future;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Which host signal a subscription listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
	/// Selection and active-editor changes.
	Editor,
	/// Settings changes.
	Configuration,
}

impl fmt::Display for Signal {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Signal::Editor => "editor",
			Signal::Configuration => "configuration",
		})
	}
}

/// What a listener should do after a missed batch of messages.
pub enum Delivery<T> {
	Message(T),
	Lagged(u64),
}

/// The (signal, listener) pairs registered during activation.
///
/// Dropping the set (or calling [`Subscriptions::release`]) stops every
/// listener, so no path out of the owner leaks one.
#[derive(Default)]
pub struct Subscriptions {
	entries: Vec<(Signal, JoinHandle<()>)>,
}

impl Subscriptions {
	pub fn new() -> Self {
		Self::default()
	}

	/// Spawns a listener draining `rx` into `handler` until the channel
	/// closes or the handler returns false.
	pub fn listen<T, F, Fut>(&mut self, signal: Signal, mut rx: broadcast::Receiver<T>, mut handler: F)
	where
		T: Clone + Send + 'static,
		F: FnMut(Delivery<T>) -> Fut + Send + 'static,
		Fut: Future<Output = bool> + Send + 'static,
	{
		let handle = tokio::spawn(async move {
			loop {
				let delivery = match rx.recv().await {
					Ok(message) => Delivery::Message(message),
					Err(RecvError::Lagged(missed)) => {
						warn!(%signal, missed, "subscription.lagged");
						Delivery::Lagged(missed)
					}
					Err(RecvError::Closed) => break,
				};
				if !handler(delivery).await {
					break;
				}
			}
			trace!(%signal, "subscription.closed");
		});
		debug!(%signal, "subscription.add");
		self.entries.push((signal, handle));
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Stops every listener.
	pub fn release(&mut self) {
		for (signal, handle) in self.entries.drain(..) {
			debug!(%signal, "subscription.release");
			handle.abort();
		}
	}
}

impl Drop for Subscriptions {
	fn drop(&mut self) {
		self.release();
	}
}

impl fmt::Debug for Subscriptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(self.entries.iter().map(|(signal, _)| signal)).finish()
	}
}
