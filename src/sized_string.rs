//! A non-owning view into text owned elsewhere, plus the line-splitting
//! helper that turns a whole source buffer into a sequence of such views.

use std::fmt;

/// A borrowed slice of source text. Never null-terminated; comparisons and
/// splits never copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizedString<'a> {
    text: &'a str,
}

impl<'a> SizedString<'a> {
    pub fn new(text: &'a str) -> Self {
        SizedString { text }
    }

    pub fn as_str(&self) -> &'a str {
        self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn trim(&self) -> Self {
        SizedString::new(self.text.trim())
    }

    pub fn starts_with(&self, pat: &str) -> bool {
        self.text.starts_with(pat)
    }
}

impl<'a> fmt::Display for SizedString<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text)
    }
}

impl<'a> From<&'a str> for SizedString<'a> {
    fn from(text: &'a str) -> Self {
        SizedString::new(text)
    }
}

/// One physical line of source text together with its 1-based line number.
/// Source files are split on CR, LF, or CRLF; a lone CR (old Mac convention)
/// is honored alongside the two more common terminators.
#[derive(Debug, Clone, Copy)]
pub struct SourceLine<'a> {
    pub number: usize,
    pub text: &'a str,
}

/// Splits a whole source buffer into [`SourceLine`]s, tolerating any mix of
/// CR, LF, and CRLF terminators. Lines longer than 255 bytes are still
/// returned in full; enforcing the 255-byte maximum is left to the caller so
/// that the split itself never fails.
pub fn split_source_lines(source: &str) -> Vec<SourceLine<'_>> {
    let bytes = source.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0usize;
    let mut number = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                number += 1;
                lines.push(SourceLine {
                    number,
                    text: &source[start..i],
                });
                i += 1;
                start = i;
            }
            b'\r' => {
                number += 1;
                lines.push(SourceLine {
                    number,
                    text: &source[start..i],
                });
                i += 1;
                if i < bytes.len() && bytes[i] == b'\n' {
                    i += 1;
                }
                start = i;
            }
            _ => i += 1,
        }
    }
    if start < bytes.len() {
        number += 1;
        lines.push(SourceLine {
            number,
            text: &source[start..],
        });
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_mixed_terminators() {
        let src = "one\ntwo\r\nthree\rfour";
        let lines = split_source_lines(src);
        let texts: Vec<&str> = lines.iter().map(|l| l.text).collect();
        assert_eq!(texts, vec!["one", "two", "three", "four"]);
        assert_eq!(lines.iter().map(|l| l.number).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn trailing_line_without_terminator_is_kept() {
        let lines = split_source_lines("a\nb");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].text, "b");
    }

    #[test]
    fn sized_string_trims_without_copy() {
        let s = SizedString::new("  LABEL  ");
        assert_eq!(s.trim().as_str(), "LABEL");
    }
}
