//! Filepath: src/core/segment.rs
//! Segment extraction for generated blobs.
//!
//! A generated blob interleaves annotation lines such as
//! `// src/models/user.ts` or `# scripts/seed.py` with the content that
//! belongs at that path. The extractor walks the blob with an explicit
//! cursor and returns the segments in the order their annotations appear.
//!
//! Grammar (kept stable for existing blobs):
//! `^[ \t]*(?://|#)\s*(?P<path>@?[\w\-./]+\.\w+)`

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::infra::lines::{lines_inclusive, trim_line_break};

/// Line-comment tokens that may introduce an annotation.
pub const COMMENT_PREFIXES: [&str; 2] = ["//", "#"];

/// Shape of an annotated path: optional alias marker, path characters,
/// and a trailing `.ext`.
pub const PATH_SHAPE: &str = r"@?[\w\-./]+\.\w+";

static ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    let prefixes = COMMENT_PREFIXES
        .iter()
        .map(|p| regex::escape(p))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(r"^[ \t]*(?:{prefixes})\s*(?P<path>{PATH_SHAPE})");
    Regex::new(&pattern).expect("annotation pattern")
});

/// Rewrites a leading alias (e.g. `@/`) to a directory prefix (e.g. `src/`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRule {
    pub prefix: String,
    pub replacement: String,
}

impl AliasRule {
    pub fn new(prefix: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            replacement: replacement.into(),
        }
    }

    /// Rewrite `path` if it starts with this rule's prefix.
    pub fn apply(&self, path: &str) -> Option<String> {
        path.strip_prefix(self.prefix.as_str())
            .map(|rest| format!("{}{}", self.replacement, rest))
    }
}

/// The `@/` → `src/` alias used by generated TypeScript code.
pub fn default_aliases() -> Vec<AliasRule> {
    vec![AliasRule::new("@/", "src/")]
}

/// A recognized annotation line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Path token as written in the blob
    pub raw: String,
    /// Path after alias normalization
    pub path: String,
}

/// Content destined for one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub path: String,
    /// Annotation token before alias rewriting
    pub raw: String,
    /// Verbatim lines, terminators included
    pub content: String,
}

impl Segment {
    pub fn line_count(&self) -> usize {
        lines_inclusive(&self.content).count()
    }
}

/// Splits generated blobs into segments keyed by annotated path.
#[derive(Debug, Clone)]
pub struct SegmentExtractor {
    aliases: Vec<AliasRule>,
}

impl Default for SegmentExtractor {
    fn default() -> Self {
        Self::new(default_aliases())
    }
}

impl SegmentExtractor {
    pub fn new(aliases: Vec<AliasRule>) -> Self {
        Self { aliases }
    }

    /// Apply the first matching alias rule; other paths pass through.
    pub fn normalize(&self, raw: &str) -> String {
        self.aliases
            .iter()
            .find_map(|rule| rule.apply(raw))
            .unwrap_or_else(|| raw.to_string())
    }

    /// Match a single line against the annotation grammar.
    pub fn annotation(&self, line: &str) -> Option<Annotation> {
        let caps = ANNOTATION.captures(line)?;
        let raw = caps.name("path")?.as_str();

        Some(Annotation {
            raw: raw.to_string(),
            path: self.normalize(raw),
        })
    }

    /// Split `content` into segments.
    ///
    /// Lines before the first annotation are dropped, one blank line
    /// directly after an annotation is consumed, and an annotation with no
    /// content before the next one yields nothing.
    pub fn extract(&self, content: &str) -> Vec<Segment> {
        let lines: Vec<&str> = lines_inclusive(content).collect();

        let mut segments = Vec::new();
        let mut current: Option<Annotation> = None;
        let mut current_lines: Vec<&str> = Vec::new();

        let mut i = 0;
        while i < lines.len() {
            let line = lines[i];

            if let Some(annotation) = self.annotation(line) {
                finish(&mut segments, current.take(), &mut current_lines);
                current = Some(annotation);

                i += 1;
                if lines
                    .get(i)
                    .is_some_and(|next| trim_line_break(next).trim().is_empty())
                {
                    i += 1;
                }
                continue;
            }

            if current.is_some() {
                current_lines.push(line);
            }
            i += 1;
        }

        finish(&mut segments, current, &mut current_lines);
        segments
    }
}

/// Close the pending segment, if it has a path and at least one line.
fn finish(segments: &mut Vec<Segment>, annotation: Option<Annotation>, lines: &mut Vec<&str>) {
    match annotation {
        Some(Annotation { raw, path }) if !lines.is_empty() => segments.push(Segment {
            path,
            raw,
            content: lines.concat(),
        }),
        _ => {}
    }
    lines.clear();
}

/// Extract segments using the default alias rules.
pub fn extract(content: &str) -> Vec<Segment> {
    SegmentExtractor::default().extract(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pairs(segments: &[Segment]) -> Vec<(&str, &str)> {
        segments
            .iter()
            .map(|s| (s.path.as_str(), s.content.as_str()))
            .collect()
    }

    #[test]
    fn splits_two_annotated_files() {
        let blob = "// a/b.ts\nX\n// c/d.ts\nY";
        let segments = extract(blob);
        assert_eq!(pairs(&segments), vec![("a/b.ts", "X\n"), ("c/d.ts", "Y")]);
    }

    #[test]
    fn alias_prefix_is_normalized() {
        let segments = extract("// @/models/user.ts\nexport class User {}\n");
        assert_eq!(
            pairs(&segments),
            vec![("src/models/user.ts", "export class User {}\n")]
        );

        let ex = SegmentExtractor::default();
        assert_eq!(ex.normalize("@/models/user.ts"), "src/models/user.ts");
        assert_eq!(ex.normalize("lib/@/x.ts"), "lib/@/x.ts");
        // Only the leading alias is rewritten
        assert_eq!(ex.normalize("@/a/@/b.ts"), "src/a/@/b.ts");
    }

    #[test]
    fn custom_alias_rules_apply_first_match() {
        let ex = SegmentExtractor::new(vec![
            AliasRule::new("@/", "backend/src/"),
            AliasRule::new("~/", "shared/"),
        ]);
        assert_eq!(ex.normalize("@/a.ts"), "backend/src/a.ts");
        assert_eq!(ex.normalize("~/b.ts"), "shared/b.ts");

        let no_alias = SegmentExtractor::new(Vec::new());
        assert_eq!(no_alias.normalize("@/a.ts"), "@/a.ts");
    }

    #[test]
    fn hash_prefix_and_indentation_are_recognized() {
        let ex = SegmentExtractor::default();
        let a = ex.annotation("   # scripts/seed.py\n").unwrap();
        assert_eq!(a.raw, "scripts/seed.py");

        let b = ex.annotation("\t//src/index.ts  (entry point)\n").unwrap();
        assert_eq!(b.path, "src/index.ts");
    }

    #[test]
    fn non_annotation_lines_do_not_match() {
        let ex = SegmentExtractor::default();
        assert!(ex.annotation("// just a remark\n").is_none());
        assert!(ex.annotation("#[derive(Debug)]\n").is_none());
        assert!(ex.annotation("let x = 1; // a/b.ts\n").is_none());
        assert!(ex.annotation("/* a/b.ts */\n").is_none());
        assert!(ex.annotation("// src/Makefile\n").is_none());
    }

    #[test]
    fn blank_line_after_annotation_is_consumed_once() {
        let blob = "// a.ts\n\n\nbody\n";
        assert_eq!(pairs(&extract(blob)), vec![("a.ts", "\nbody\n")]);

        let ws = "// a.ts\n   \t\nbody\n";
        assert_eq!(pairs(&extract(ws)), vec![("a.ts", "body\n")]);
    }

    #[test]
    fn preamble_before_first_annotation_is_dropped() {
        let blob = "Here are the files:\n\n// x/y.ts\ncode\n";
        assert_eq!(pairs(&extract(blob)), vec![("x/y.ts", "code\n")]);
    }

    #[test]
    fn empty_segments_are_not_emitted() {
        let blob = "// first.ts\n\n// second.ts\n\nbody\n";
        assert_eq!(pairs(&extract(blob)), vec![("second.ts", "body\n")]);

        assert!(extract("// lonely.ts\n").is_empty());
        assert!(extract("// lonely.ts\n\n").is_empty());
    }

    #[test]
    fn repeated_path_yields_ordered_segments() {
        let blob = "// a.ts\n\nold\n// b.ts\n\nmid\n// a.ts\n\nnew\n";
        assert_eq!(
            pairs(&extract(blob)),
            vec![("a.ts", "old\n"), ("b.ts", "mid\n"), ("a.ts", "new\n")]
        );
    }

    #[test]
    fn no_annotation_yields_no_segments() {
        assert!(extract("").is_empty());
        assert!(extract("plain text\nwith lines\n").is_empty());
    }

    #[test]
    fn crlf_terminators_are_preserved() {
        let blob = "// a.ts\r\n\r\nline one\r\nline two\r\n";
        assert_eq!(pairs(&extract(blob)), vec![("a.ts", "line one\r\nline two\r\n")]);
    }

    #[test]
    fn lone_cr_and_separator_blobs_still_split() {
        let blob = "// a.ts\r\rone\r// b.ts\rtwo\r";
        assert_eq!(pairs(&extract(blob)), vec![("a.ts", "one\r"), ("b.ts", "two\r")]);

        let ls = "# c.py\u{2028}\x1cbody\u{2028}";
        assert_eq!(pairs(&extract(ls)), vec![("c.py", "body\u{2028}")]);
    }

    #[test]
    fn segment_reports_line_count() {
        let seg = &extract("// a.ts\none\ntwo\nthree")[0];
        assert_eq!(seg.line_count(), 3);
    }

    fn arb_segment() -> impl Strategy<Value = (String, Vec<String>)> {
        (
            "[a-z]{1,6}(/[a-z]{1,6}){0,2}\\.(ts|py|rs)",
            proptest::collection::vec("[a-z0-9 =;(){}]{1,20}", 1..5),
        )
    }

    proptest! {
        #[test]
        fn reinserting_annotations_reconstructs_input(
            parts in proptest::collection::vec(arb_segment(), 0..6)
        ) {
            let mut blob = String::new();
            for (path, lines) in &parts {
                blob.push_str(&format!("// {path}\n\n"));
                for line in lines {
                    blob.push_str(line);
                    blob.push('\n');
                }
            }

            let segments = extract(&blob);
            prop_assert_eq!(segments.len(), parts.len());

            let mut rebuilt = String::new();
            for seg in &segments {
                rebuilt.push_str(&format!("// {}\n\n", seg.path));
                rebuilt.push_str(&seg.content);
            }
            prop_assert_eq!(rebuilt, blob);
        }
    }
}
