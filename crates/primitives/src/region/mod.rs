//! Fog regions around a focus target.
//!
//! Given the fold range chosen as the current scope, everything above its
//! first line and everything below its last line is fogged. At most one span
//! is produced on each side.

use smallvec::SmallVec;

use crate::fold::FoldRange;
use crate::range::LineSpan;


/// The line spans dimmed for one update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FogRegions {
	/// Lines from the top of the document up to the target's first line.
	pub before: Option<LineSpan>,
	/// Lines after the target's last line through the end of the document.
	pub after: Option<LineSpan>,
}

impl FogRegions {
	/// No fog at all.
	pub const EMPTY: Self = Self {
		before: None,
		after: None,
	};

	/// Derives the regions surrounding `target` in a document of
	/// `line_count` lines.
	pub fn around(target: FoldRange, line_count: usize) -> Self {
		let Some(last_line) = line_count.checked_sub(1) else {
			return Self::EMPTY;
		};

		let before = (target.start > 0).then(|| LineSpan::new(0, target.start.min(line_count)));
		let after = (target.end < last_line).then(|| LineSpan::new(target.end + 1, line_count));

		Self { before, after }
	}

	/// Returns true if nothing is fogged.
	pub fn is_empty(&self) -> bool {
		self.before.is_none() && self.after.is_none()
	}

	/// The spans in document order, ready for a single renderer call.
	pub fn spans(&self) -> SmallVec<[LineSpan; 2]> {
		self.before.into_iter().chain(self.after).collect()
	}
}
