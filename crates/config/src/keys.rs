//! Setting keys and change notifications.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Namespace every focus fog setting lives under.
pub const NAMESPACE: &str = "focusFog";

/// One of the settings owned by focus fog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
	Enabled,
	Opacity,
	Delay,
}

impl ConfigKey {
	/// All keys in declaration order.
	pub const ALL: [ConfigKey; 3] = [ConfigKey::Enabled, ConfigKey::Opacity, ConfigKey::Delay];

	/// Key name inside the namespace, e.g. `opacity`.
	pub const fn name(self) -> &'static str {
		match self {
			ConfigKey::Enabled => "enabled",
			ConfigKey::Opacity => "opacity",
			ConfigKey::Delay => "delay",
		}
	}

	/// Fully qualified key, e.g. `focusFog.opacity`.
	pub fn qualified(self) -> String {
		format!("{NAMESPACE}.{}", self.name())
	}
}

impl fmt::Display for ConfigKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{NAMESPACE}.{}", self.name())
	}
}

impl FromStr for ConfigKey {
	type Err = ConfigError;

	/// Accepts both bare (`delay`) and qualified (`focusFog.delay`) names.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let bare = s.strip_prefix(NAMESPACE).and_then(|rest| rest.strip_prefix('.')).unwrap_or(s);
		ConfigKey::ALL
			.into_iter()
			.find(|key| key.name() == bare)
			.ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
	}
}

/// Notification that some settings changed.
///
/// Carries fully qualified key names, which may include keys from other
/// namespaces when the host batches unrelated changes together.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigChange {
	keys: Vec<String>,
}

impl ConfigChange {
	/// A change touching the given qualified keys.
	pub fn new<I, S>(keys: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			keys: keys.into_iter().map(Into::into).collect(),
		}
	}

	/// A change covering the whole namespace, used when the exact keys are
	/// unknown (reloads, missed notifications).
	pub fn namespace() -> Self {
		Self::new([NAMESPACE])
	}

	/// A change touching exactly the given focus fog keys.
	pub fn of(keys: impl IntoIterator<Item = ConfigKey>) -> Self {
		Self::new(keys.into_iter().map(ConfigKey::qualified))
	}

	/// Changed keys as reported.
	pub fn keys(&self) -> &[String] {
		&self.keys
	}

	/// Returns true if nothing changed.
	pub fn is_empty(&self) -> bool {
		self.keys.is_empty()
	}

	/// Returns true if any changed key belongs to the focus fog namespace.
	pub fn affects_namespace(&self) -> bool {
		self.keys.iter().any(|k| in_namespace(k))
	}

	/// Returns true if `key` changed, either directly or through a
	/// namespace-wide change.
	pub fn affects(&self, key: ConfigKey) -> bool {
		self.keys
			.iter()
			.any(|k| k == NAMESPACE || (in_namespace(k) && k.parse::<ConfigKey>().is_ok_and(|parsed| parsed == key)))
	}
}

fn in_namespace(key: &str) -> bool {
	key == NAMESPACE || key.strip_prefix(NAMESPACE).is_some_and(|rest| rest.starts_with('.'))
}
