use std::fmt;

/// A 0-based line index.
pub type LineIdx = usize;

/// A half-open span of whole lines, `start..end`.
///
/// This is the unit handed to the decoration renderer: every line in the span
/// is painted, `end` itself is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineSpan {
	/// First line in the span.
	pub start: LineIdx,
	/// One past the last line in the span.
	pub end: LineIdx,
}

impl LineSpan {
	/// Creates a span covering `start..end`.
	///
	/// An inverted pair collapses to an empty span at `start`.
	pub fn new(start: LineIdx, end: LineIdx) -> Self {
		Self {
			start,
			end: end.max(start),
		}
	}
}

impl fmt::Display for LineSpan {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "[{}, {})", self.start, self.end)
	}
}
