use std::fmt;

use crate::range::LineIdx;

/// A collapsible block of lines reported by the host, `start..=end`.
///
/// Both ends are inclusive 0-based line indices. Hosts are expected to report
/// `start <= end`; [`FoldRange::is_well_formed`] lets callers skip ranges that
/// do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FoldRange {
	/// First line of the block.
	pub start: LineIdx,
	/// Last line of the block (inclusive).
	pub end: LineIdx,
}

impl FoldRange {
	pub const fn new(start: LineIdx, end: LineIdx) -> Self {
		Self { start, end }
	}

	/// Returns true if `start <= end`.
	#[inline]
	pub fn is_well_formed(&self) -> bool {
		self.start <= self.end
	}

	/// Scope size used to rank candidates, `end - start`.
	#[inline]
	pub fn size(&self) -> usize {
		self.end.saturating_sub(self.start)
	}

	/// Returns true if `line` lies within the block, both ends inclusive.
	#[inline]
	pub fn contains_line(&self, line: LineIdx) -> bool {
		self.start <= line && line <= self.end
	}
}

impl fmt::Display for FoldRange {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "[{}, {}]", self.start, self.end)
	}
}

/// Picks the smallest fold range enclosing `cursor`.
///
/// Ranges are considered in the order given. Among equally sized candidates
/// the first one wins. Malformed ranges never match.
pub fn select_target(ranges: &[FoldRange], cursor: LineIdx) -> Option<FoldRange> {
	ranges
		.iter()
		.filter(|r| r.is_well_formed() && r.contains_line(cursor))
		.min_by_key(|r| r.size())
		.copied()
}
