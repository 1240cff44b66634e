//! Configuration for focus fog.
//!
//! Settings live in the `focusFog` namespace of the host's settings store:
//!
//! - **enabled**: whether out-of-scope lines are fogged (default `true`)
//! - **opacity**: opacity of fogged text, `0.0..=1.0` (default `0.3`)
//! - **delay**: debounce delay in milliseconds before recomputing (default `200`)
//!
//! # Configuration Files
//!
//! Standalone hosts (and the simulator) read the same settings from TOML:
//!
//! ```toml
//! [focusFog]
//! enabled = true
//! opacity = 0.25
//! delay = 150
//! ```
//!
//! Missing keys keep their defaults. Unknown keys inside `[focusFog]` are
//! rejected; other tables are left alone for the host.

pub mod error;
pub mod keys;
pub mod store;

use std::path::Path;
use std::time::Duration;

pub use error::{ConfigError, Result};
pub use keys::{ConfigChange, ConfigKey, NAMESPACE};
use serde::{Deserialize, Serialize};
pub use store::{ConfigStore, MemoryConfigStore};

/// Default opacity of fogged text.
pub const DEFAULT_OPACITY: f32 = 0.3;

/// Default debounce delay in milliseconds.
pub const DEFAULT_DELAY_MS: u64 = 200;

/// Snapshot of the focus fog settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FogConfig {
	/// Whether fogging is active.
	pub enabled: bool,
	/// Opacity applied to fogged lines.
	pub opacity: f32,
	/// Debounce delay in milliseconds.
	pub delay: u64,
}

impl Default for FogConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			opacity: DEFAULT_OPACITY,
			delay: DEFAULT_DELAY_MS,
		}
	}
}

/// Partial settings as written in a file; absent keys are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FogOverrides {
	pub enabled: Option<bool>,
	pub opacity: Option<f32>,
	pub delay: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
	#[serde(rename = "focusFog", default)]
	focus_fog: FogOverrides,
}

impl FogOverrides {
	/// Parse the `[focusFog]` table out of a TOML document.
	pub fn parse(input: &str) -> Result<Self> {
		let file: ConfigFile = toml::from_str(input)?;
		Ok(file.focus_fog)
	}
}

impl FogConfig {
	/// Parse a TOML string into a validated [`FogConfig`] over the defaults.
	pub fn parse(input: &str) -> Result<Self> {
		let mut config = Self::default();
		config.merge(FogOverrides::parse(input)?);
		config.validate()?;
		Ok(config)
	}

	/// Load configuration from a file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
			path: path.to_path_buf(),
			error: e,
		})?;
		Self::parse(&content)
	}

	/// Merge overrides into this config.
	///
	/// Values present in `other` replace values in `self`.
	pub fn merge(&mut self, other: FogOverrides) {
		if let Some(enabled) = other.enabled {
			self.enabled = enabled;
		}
		if let Some(opacity) = other.opacity {
			self.opacity = opacity;
		}
		if let Some(delay) = other.delay {
			self.delay = delay;
		}
	}

	/// Checks value ranges.
	pub fn validate(&self) -> Result<()> {
		if !(0.0..=1.0).contains(&self.opacity) {
			return Err(ConfigError::OpacityOutOfRange(self.opacity));
		}
		Ok(())
	}

	/// Debounce delay as a [`Duration`].
	pub fn delay(&self) -> Duration {
		Duration::from_millis(self.delay)
	}

	/// Keys whose values differ between `self` and `other`.
	pub fn diff(&self, other: &FogConfig) -> ConfigChange {
		let mut changed = Vec::new();
		if self.enabled != other.enabled {
			changed.push(ConfigKey::Enabled);
		}
		if self.opacity.to_bits() != other.opacity.to_bits() {
			changed.push(ConfigKey::Opacity);
		}
		if self.delay != other.delay {
			changed.push(ConfigKey::Delay);
		}
		ConfigChange::of(changed)
	}
}
