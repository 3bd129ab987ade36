//! Splicing formatted replacements into text.

use std::ops::Range;

use crate::error::AssemblyError;

/// Replaces each range of `text` with its replacement in one ascending walk.
///
/// `replacements` must be sorted by start offset and must not overlap.
/// Untouched text is copied verbatim; the output is contiguous.
///
/// # Errors
///
/// Returns an [`AssemblyError`] when a range is out of order, out of bounds
/// or does not fall on character boundaries.
pub fn splice<S: AsRef<str>>(
    text: &str,
    replacements: &[(Range<usize>, S)],
) -> Result<String, AssemblyError> {
    let added: usize = replacements.iter().map(|(_, r)| r.as_ref().len()).sum();
    let mut out = String::with_capacity(text.len() + added);
    let mut cursor = 0;
    for (range, replacement) in replacements {
        let kept = (cursor <= range.start)
            .then(|| text.get(cursor..range.start))
            .flatten()
            .filter(|_| text.is_char_boundary(range.end))
            .ok_or_else(|| AssemblyError {
                range: range.clone(),
            })?;
        out.push_str(kept);
        out.push_str(replacement.as_ref());
        cursor = range.end;
    }
    let rest = text.get(cursor..).ok_or(AssemblyError {
        range: cursor..text.len(),
    })?;
    out.push_str(rest);
    Ok(out)
}
