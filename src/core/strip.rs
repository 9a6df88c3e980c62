//! Filepath: src/core/strip.rs
//! Comment stripper used by the flatten direction.
//!
//! Two passes:
//! 1. `/** ... */` blocks are removed across the whole text (non-greedy,
//!    may span lines). This pass does not look at string literals, so a
//!    block token inside a string is still removed.
//! 2. Each remaining line is scanned left to right with single-line quote
//!    tracking; a `//` outside quotes cuts the rest of the line.
//!
//! Lines end at any boundary known to [`crate::infra::lines`], a lone `\r`
//! or form feed included. Lines left blank are dropped and the survivors are
//! joined with `\n` (no trailing newline).

use std::sync::LazyLock;

use regex::Regex;

use crate::infra::lines::lines;

/// Opening token of a removable block comment.
pub const BLOCK_OPEN: &str = "/**";

/// Closing token of a removable block comment.
pub const BLOCK_CLOSE: &str = "*/";

/// Line comment token.
pub const LINE_COMMENT: &str = "//";

/// Characters that open and close a quoted run on a single line.
pub const QUOTES: [u8; 2] = [b'"', b'\''];

static BLOCK_COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        "(?s){}.*?{}",
        regex::escape(BLOCK_OPEN),
        regex::escape(BLOCK_CLOSE)
    );
    Regex::new(&pattern).expect("block comment pattern")
});

/// Per-line quote tracking. Only one delimiter is tracked at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    Unset,
    Open(u8),
}

impl QuoteState {
    /// Feed a quote character. A quote of a different kind than the open
    /// one leaves the state untouched.
    fn observe(self, quote: u8) -> Self {
        match self {
            QuoteState::Unset => QuoteState::Open(quote),
            QuoteState::Open(open) if open == quote => QuoteState::Unset,
            open => open,
        }
    }
}

/// Strip documentation blocks and line comments from `content`.
pub fn strip(content: &str) -> String {
    let without_blocks = BLOCK_COMMENT.replace_all(content, "");
    let mut out = String::with_capacity(without_blocks.len());

    for line in lines(&without_blocks) {
        let kept = match line_comment_start(line) {
            Some(at) => &line[..at],
            None => line,
        };

        // Trailing whitespace goes too; an empty remainder drops the line
        let kept = kept.trim_end();
        if kept.is_empty() {
            continue;
        }

        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(kept);
    }

    out
}

/// Byte offset where a line comment starts, ignoring `//` inside a quoted
/// run. Quote state never carries over from a previous line.
pub fn line_comment_start(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let token = LINE_COMMENT.as_bytes();
    let mut state = QuoteState::Unset;

    for (i, &b) in bytes.iter().enumerate() {
        if QUOTES.contains(&b) {
            state = state.observe(b);
        } else if state == QuoteState::Unset && bytes[i..].starts_with(token) {
            // Token is ASCII, so `i` is a char boundary
            return Some(i);
        }
    }

    None
}
