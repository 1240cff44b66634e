//! Settings store seam and an in-memory implementation.

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::Result;
use crate::keys::ConfigChange;
use crate::{FogConfig, FogOverrides};

/// Capacity of the change notification channel.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Host-owned settings storage.
///
/// Reads return a snapshot; the only write focus fog performs is flipping
/// `enabled`. Every effective write is announced on [`ConfigStore::subscribe`].
pub trait ConfigStore: Send + Sync {
	/// Current settings.
	fn snapshot(&self) -> FogConfig;

	/// Persists a new value for `enabled`.
	fn set_enabled(&self, enabled: bool) -> Result<()>;

	/// Receiver for change notifications.
	fn subscribe(&self) -> broadcast::Receiver<ConfigChange>;
}

/// A [`ConfigStore`] kept in memory, announcing changes over a broadcast
/// channel.
#[derive(Debug)]
pub struct MemoryConfigStore {
	config: RwLock<FogConfig>,
	changes: broadcast::Sender<ConfigChange>,
}

impl Default for MemoryConfigStore {
	fn default() -> Self {
		Self::new(FogConfig::default())
	}
}

impl MemoryConfigStore {
	pub fn new(config: FogConfig) -> Self {
		let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
		Self {
			config: RwLock::new(config),
			changes,
		}
	}

	/// Validates and stores `config`, announcing the keys that changed.
	///
	/// Writes that change nothing are not announced.
	pub fn replace(&self, config: FogConfig) -> Result<ConfigChange> {
		config.validate()?;
		let change = {
			let mut current = self.config.write();
			let change = current.diff(&config);
			*current = config;
			change
		};
		self.announce(&change);
		Ok(change)
	}

	/// Applies partial overrides on top of the current settings.
	pub fn apply(&self, overrides: FogOverrides) -> Result<ConfigChange> {
		let mut next = self.snapshot();
		next.merge(overrides);
		self.replace(next)
	}

	/// Sets the fog opacity.
	pub fn set_opacity(&self, opacity: f32) -> Result<ConfigChange> {
		self.apply(FogOverrides {
			opacity: Some(opacity),
			..FogOverrides::default()
		})
	}

	/// Sets the debounce delay in milliseconds.
	pub fn set_delay(&self, delay: u64) -> Result<ConfigChange> {
		self.apply(FogOverrides {
			delay: Some(delay),
			..FogOverrides::default()
		})
	}

	fn announce(&self, change: &ConfigChange) {
		if change.is_empty() {
			return;
		}
		debug!(keys = ?change.keys(), "config.changed");
		// No receivers is fine; nobody is listening yet.
		let _ = self.changes.send(change.clone());
	}
}

impl ConfigStore for MemoryConfigStore {
	fn snapshot(&self) -> FogConfig {
		*self.config.read()
	}

	fn set_enabled(&self, enabled: bool) -> Result<()> {
		self.apply(FogOverrides {
			enabled: Some(enabled),
			..FogOverrides::default()
		})
		.map(|_| ())
	}

	fn subscribe(&self) -> broadcast::Receiver<ConfigChange> {
		self.changes.subscribe()
	}
}
