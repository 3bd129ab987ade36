//! Escape handling for region text.
//!
//! A region registered with `#escape!` stores its text in the host with the
//! escape character written as `\c`. Extraction rewrites each `\c` to `c` so
//! the formatter sees plain source; re-injection rewrites every `c` back to
//! `\c`. Other backslash sequences are left untouched in both directions.
//!
//! [`Unescaped`] remembers where backslashes were removed so ranges found in
//! the escaped text can be mapped into the unescaped text.

use std::ops::Range;

/// Text with escape sequences removed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Unescaped {
    text: String,
    removed: Vec<usize>,
}

impl Unescaped {
    /// Returns the unescaped text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Consumes the value, returning the unescaped text.
    #[must_use]
    pub fn into_text(self) -> String {
        self.text
    }

    /// Maps a byte offset in the escaped text to the unescaped text.
    ///
    /// Returns `None` when the offset falls between a removed backslash and
    /// the character it escaped.
    #[must_use]
    pub fn map_offset(&self, escaped: usize) -> Option<usize> {
        let before = self.removed.partition_point(|&at| at < escaped);
        let splits = escaped
            .checked_sub(1)
            .is_some_and(|previous| self.removed.binary_search(&previous).is_ok());
        if splits { None } else { Some(escaped - before) }
    }

    /// Maps a range in the escaped text to the unescaped text.
    #[must_use]
    pub fn map_range(&self, escaped: &Range<usize>) -> Option<Range<usize>> {
        Some(self.map_offset(escaped.start)?..self.map_offset(escaped.end)?)
    }
}

/// Removes the escaping of `escape` from `raw`.
///
/// Without an escape character the text is returned as is.
#[must_use]
pub fn unescape(raw: &str, escape: Option<char>) -> Unescaped {
    let Some(escaped) = escape else {
        return Unescaped {
            text: raw.to_owned(),
            removed: Vec::new(),
        };
    };

    let mut text = String::with_capacity(raw.len());
    let mut removed = Vec::new();
    let mut chars = raw.char_indices().peekable();
    while let Some((at, ch)) = chars.next() {
        if ch == '\\' && chars.next_if(|&(_, next)| next == escaped).is_some() {
            removed.push(at);
            text.push(escaped);
        } else {
            text.push(ch);
        }
    }
    Unescaped { text, removed }
}

/// Escapes every occurrence of `escape` in `text` for re-injection.
#[must_use]
pub fn reescape(text: &str, escape: Option<char>) -> String {
    let Some(escaped) = escape else {
        return text.to_owned();
    };
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch == escaped {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::quote(r#"SELECT \"id\" FROM t"#, Some('"'), r#"SELECT "id" FROM t"#)]
    #[case::other_sequences_kept(r"a\nb\'c", Some('\''), r"a\nb'c")]
    #[case::backslash_escape(r"C:\\temp", Some('\\'), r"C:\temp")]
    #[case::no_escape(r#"a\"b"#, None, r#"a\"b"#)]
    #[case::trailing_backslash(r"abc\", Some('"'), r"abc\")]
    fn unescape_rewrites_escaped_characters(
        #[case] raw: &str,
        #[case] escape: Option<char>,
        #[case] expected: &str,
    ) {
        assert_eq!(unescape(raw, escape).text(), expected);
    }

    #[rstest]
    #[case(r#"SELECT \"id\" FROM t"#, Some('"'))]
    #[case(r"path \\ here", Some('\\'))]
    #[case("héllo \\\"wörld\\\"", Some('"'))]
    fn escaping_round_trips(#[case] raw: &str, #[case] escape: Option<char>) {
        let plain = unescape(raw, escape);
        assert_eq!(reescape(plain.text(), escape), raw);
    }

    #[test]
    fn offsets_account_for_removed_backslashes() {
        // a \" b \" c
        // 0 12 3 45 6
        let plain = unescape(r#"a\"b\"c"#, Some('"'));
        assert_eq!(plain.text(), r#"a"b"c"#);
        assert_eq!(plain.map_offset(0), Some(0));
        assert_eq!(plain.map_offset(1), Some(1));
        assert_eq!(plain.map_offset(3), Some(2));
        assert_eq!(plain.map_offset(7), Some(5));
        assert_eq!(plain.map_range(&(3..4)), Some(2..3));
    }

    #[test]
    fn offsets_inside_escape_sequences_are_rejected() {
        let plain = unescape(r#"a\"b"#, Some('"'));
        assert_eq!(plain.map_offset(2), None);
        assert_eq!(plain.map_range(&(0..2)), None);
    }
}
