//! Lexical tag/text splitting.
//!
//! Content is cut at every `<...>` run (no `>` inside), with the runs kept
//! as their own spans. This is not an HTML parser: comments, CDATA and
//! attribute values containing `>` are not understood.

use once_cell::sync::Lazy;
use regex::Regex;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

/// Split `content` into alternating text and tag spans, in order.
///
/// Concatenating the returned spans yields `content` exactly. Empty spans
/// are not emitted.
pub fn split_spans(content: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut last = 0;

    for m in TAG_RE.find_iter(content) {
        if m.start() > last {
            spans.push(&content[last..m.start()]);
        }
        spans.push(m.as_str());
        last = m.end();
    }
    if last < content.len() {
        spans.push(&content[last..]);
    }

    spans
}

/// A span is markup when it starts with `<`; everything else is text.
pub fn is_tag_span(span: &str) -> bool {
    span.starts_with('<')
}
