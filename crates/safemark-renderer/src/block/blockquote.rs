//! Blockquotes.

use std::sync::LazyLock;

use regex::Regex;

use crate::placeholder::{PlaceholderKind, PlaceholderRegistry};

/// `>` marker with up to three spaces of indentation and one optional space.
static QUOTE_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^ {0,3}> ?").unwrap());

/// Replace each run of contiguous `>` lines with a block placeholder.
///
/// The dequoted content of every run is handed to `render`, which is
/// expected to run the pipeline with nested blockquotes disabled. The
/// recorded payload is the finished `<blockquote>` element.
pub(crate) fn extract_blockquotes<F>(
    text: &str,
    registry: &mut PlaceholderRegistry,
    mut render: F,
) -> String
where
    F: FnMut(&str, &mut PlaceholderRegistry) -> String,
{
    let lines: Vec<&str> = text.split('\n').collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        if !QUOTE_MARKER_RE.is_match(lines[i]) {
            out.push(lines[i].to_owned());
            i += 1;
            continue;
        }

        let mut quoted: Vec<&str> = Vec::new();
        while let Some(marker) = lines.get(i).and_then(|line| QUOTE_MARKER_RE.find(line)) {
            quoted.push(&lines[i][marker.end()..]);
            i += 1;
        }

        let inner = render(&quoted.join("\n"), registry);
        let token = registry.insert(
            PlaceholderKind::Blockquote,
            format!("<blockquote>{inner}</blockquote>"),
        );
        out.push(token.to_string());
    }

    out.join("\n")
}
