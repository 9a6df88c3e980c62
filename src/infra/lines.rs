//! Filepath: src/infra/lines.rs
//! Line splitting over the full set of line boundaries.
//!
//! `\n`, `\r\n` and a lone `\r` all end a line, as do `\x0b`, `\x0c`,
//! `\x1c`..`\x1e`, NEL (`\u{85}`) and the Unicode line/paragraph separators.
//! `\r\n` counts as a single boundary. A trailing boundary does not start an
//! extra empty line.

/// True for every character that ends a line.
pub fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Iterator over lines with their terminators kept.
#[derive(Debug, Clone)]
pub struct LinesInclusive<'a> {
    rest: &'a str,
}

impl<'a> Iterator for LinesInclusive<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }

        let end = match self.rest.char_indices().find(|&(_, c)| is_line_break(c)) {
            Some((i, '\r')) if self.rest[i + 1..].starts_with('\n') => i + 2,
            Some((i, c)) => i + c.len_utf8(),
            None => self.rest.len(),
        };

        let (line, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(line)
    }
}

/// Lines of `text`, terminators included.
pub fn lines_inclusive(text: &str) -> LinesInclusive<'_> {
    LinesInclusive { rest: text }
}

/// Lines of `text` without their terminators.
pub fn lines(text: &str) -> impl Iterator<Item = &str> {
    lines_inclusive(text).map(trim_line_break)
}

/// Drop one trailing line boundary, if present.
pub fn trim_line_break(line: &str) -> &str {
    line.strip_suffix("\r\n")
        .or_else(|| line.strip_suffix(is_line_break))
        .unwrap_or(line)
}
