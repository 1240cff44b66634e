//! Scripted editor sessions.
//!
//! A session file declares documents with their fold ranges and a list of
//! steps to replay:
//!
//! ```toml
//! [focusFog]
//! delay = 150
//!
//! [[document]]
//! id = 1
//! lines = 20
//! folds = [[5, 15], [7, 10]]
//!
//! [[step]]
//! action = "open"
//! document = 1
//! cursor = 8
//!
//! [[step]]
//! action = "wait"
//! ms = 200
//! ```

use std::fmt;
use std::path::Path;

use anyhow::{Context, bail};
use focusfog::config::FogOverrides;
use focusfog::primitives::{DocumentId, FoldRange};
use serde::Deserialize;

/// A document known to the simulated host.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentSpec {
	pub id: u64,
	pub lines: usize,
	/// Fold ranges as `[start, end]` pairs, in provider order.
	#[serde(default)]
	pub folds: Vec<(usize, usize)>,
}

impl DocumentSpec {
	pub fn document_id(&self) -> DocumentId {
		DocumentId(self.id)
	}

	pub fn fold_ranges(&self) -> Vec<FoldRange> {
		self.folds.iter().map(|&(start, end)| FoldRange::new(start, end)).collect()
	}
}

/// One scripted action.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Step {
	/// Make a document the active view.
	Open { document: u64, cursor: usize },
	/// Move the cursor of the active view.
	Cursor { line: usize },
	/// Let virtual time pass.
	Wait { ms: u64 },
	/// Run the toggle command.
	Toggle,
	/// Change the fog opacity.
	SetOpacity { value: f32 },
	/// Change the debounce delay.
	SetDelay { ms: u64 },
	/// Leave no view active.
	Close,
	/// Recompute immediately, bypassing the debounce.
	Flush,
}

impl fmt::Display for Step {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Step::Open { document, cursor } => write!(f, "open doc#{document} @{cursor}"),
			Step::Cursor { line } => write!(f, "cursor @{line}"),
			Step::Wait { ms } => write!(f, "wait {ms}ms"),
			Step::Toggle => f.write_str("toggle"),
			Step::SetOpacity { value } => write!(f, "set-opacity {value}"),
			Step::SetDelay { ms } => write!(f, "set-delay {ms}ms"),
			Step::Close => f.write_str("close"),
			Step::Flush => f.write_str("flush"),
		}
	}
}

/// A parsed session.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Session {
	/// Settings applied on top of the base configuration.
	#[serde(rename = "focusFog", default)]
	pub settings: FogOverrides,
	#[serde(rename = "document", default)]
	pub documents: Vec<DocumentSpec>,
	#[serde(rename = "step", default)]
	pub steps: Vec<Step>,
}

impl Session {
	/// Parse and validate a session from TOML.
	pub fn parse(input: &str) -> anyhow::Result<Self> {
		let session: Session = toml::from_str(input).context("invalid session file")?;
		session.validate()?;
		Ok(session)
	}

	/// Load a session from a file.
	pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
		Self::parse(&content).with_context(|| format!("in {}", path.display()))
	}

	pub fn document(&self, id: u64) -> Option<&DocumentSpec> {
		self.documents.iter().find(|doc| doc.id == id)
	}

	fn validate(&self) -> anyhow::Result<()> {
		for (i, doc) in self.documents.iter().enumerate() {
			if self.documents[..i].iter().any(|other| other.id == doc.id) {
				bail!("document {} declared twice", doc.id);
			}
		}
		for step in &self.steps {
			if let Step::Open { document, .. } = step
				&& self.document(*document).is_none()
			{
				bail!("step `{step}` opens undeclared document {document}");
			}
		}
		Ok(())
	}
}
