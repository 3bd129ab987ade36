//! Byte offset and row/column conversion.
//!
//! Tree-sitter positions are zero-based rows with byte columns. `#offset!`
//! works in that coordinate system, so the interpreter needs to move between
//! points and byte offsets of the text being searched.

/// A zero-based row and byte column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TextPoint {
    /// Zero-based line number.
    pub row: usize,
    /// Zero-based byte column within the line.
    pub column: usize,
}

impl TextPoint {
    /// Creates a point.
    #[must_use]
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// Applies signed row and column deltas, returning `None` on underflow.
    #[must_use]
    pub fn shifted(self, row_delta: i64, column_delta: i64) -> Option<Self> {
        Some(Self {
            row: apply_delta(self.row, row_delta)?,
            column: apply_delta(self.column, column_delta)?,
        })
    }
}

impl From<tree_sitter::Point> for TextPoint {
    fn from(point: tree_sitter::Point) -> Self {
        Self::new(point.row, point.column)
    }
}

fn apply_delta(value: usize, delta: i64) -> Option<usize> {
    let magnitude = usize::try_from(delta.unsigned_abs()).ok()?;
    if delta < 0 {
        value.checked_sub(magnitude)
    } else {
        value.checked_add(magnitude)
    }
}

/// Line start table for a piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    /// Builds the index for `text`.
    #[must_use]
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, byte)| *byte == b'\n')
                .map(|(index, _)| index.saturating_add(1)),
        );
        Self {
            line_starts,
            len: text.len(),
        }
    }

    /// Returns the number of lines in the text.
    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Converts a byte offset into a point.
    ///
    /// Returns `None` when the offset lies beyond the end of the text.
    #[must_use]
    pub fn point(&self, offset: usize) -> Option<TextPoint> {
        if offset > self.len {
            return None;
        }
        let row = self
            .line_starts
            .partition_point(|start| *start <= offset)
            .checked_sub(1)?;
        let start = self.line_starts.get(row)?;
        Some(TextPoint::new(row, offset.saturating_sub(*start)))
    }

    /// Converts a point into a byte offset.
    ///
    /// A column may address the line terminator but never run into the next
    /// line. Returns `None` for rows or columns outside the text.
    #[must_use]
    pub fn offset(&self, point: TextPoint) -> Option<usize> {
        let start = *self.line_starts.get(point.row)?;
        let limit = self
            .line_starts
            .get(point.row.saturating_add(1))
            .map_or(self.len, |next| next.saturating_sub(1));
        let offset = start.checked_add(point.column)?;
        (offset <= limit).then_some(offset)
    }
}

/// Converts a Tree-sitter position (0-based) to one-based display coordinates.
#[must_use]
pub(crate) fn point_to_one_based(pos: tree_sitter::Point) -> (u32, u32) {
    // Line/column numbers will realistically never exceed u32::MAX.
    let line = u32::try_from(pos.row.saturating_add(1)).unwrap_or(u32::MAX);
    let column = u32::try_from(pos.column.saturating_add(1)).unwrap_or(u32::MAX);
    (line, column)
}
