//! Fenced code blocks.
//!
//! Fences are matched by a line scanner rather than a regex: an opening fence
//! of N backticks is closed only by a line of at least N backticks, so a
//! 4-backtick block can show a 3-backtick fence verbatim. A fence that is
//! never closed runs to the end of the input, which keeps half-typed
//! documents readable.

use serde::{Deserialize, Serialize};

use crate::placeholder::{PlaceholderKind, PlaceholderRegistry};
use crate::util::escape_html;

/// Recorded payload of a code block placeholder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct CodePayload {
    pub language: Option<String>,
    pub content: String,
}

/// Opening fence: backtick count and language.
fn opening_fence(line: &str) -> Option<(usize, Option<String>)> {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    let ticks = trimmed.bytes().take_while(|&b| b == b'`').count();
    if ticks < 3 {
        return None;
    }
    let info = trimmed[ticks..].trim();
    if info.contains('`') {
        return None;
    }
    let language = info.split_whitespace().next().map(str::to_owned);
    Some((ticks, language))
}

fn is_closing_fence(line: &str, ticks: usize) -> bool {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return false;
    }
    let trimmed = trimmed.trim_end();
    trimmed.len() >= ticks && trimmed.bytes().all(|b| b == b'`')
}

/// Replace every fenced code block with a block placeholder.
pub(crate) fn extract_code_blocks(text: &str, registry: &mut PlaceholderRegistry) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        let Some((ticks, language)) = opening_fence(lines[i]) else {
            out.push(lines[i].to_owned());
            i += 1;
            continue;
        };

        let close = (i + 1..lines.len()).find(|&j| is_closing_fence(lines[j], ticks));
        let body_end = close.unwrap_or(lines.len());
        let payload = CodePayload {
            language,
            content: lines[i + 1..body_end].join("\n"),
        };

        match registry.insert_json(PlaceholderKind::CodeBlock, &payload) {
            Some(token) => out.push(token.to_string()),
            None => out.extend(lines[i..body_end].iter().map(|&l| l.to_owned())),
        }
        i = close.map_or(lines.len(), |j| j + 1);
    }

    out.join("\n")
}

/// HTML for a code block element.
///
/// `body` must already be safe: sanitized highlighter output or escaped
/// source. `copy_label` must already be escaped.
pub(crate) fn code_block_html(
    id: &str,
    language: Option<&str>,
    body: &str,
    copy_label: Option<&str>,
) -> String {
    let mut html = String::from(r#"<div class="code-wrapper">"#);
    if let Some(label) = copy_label {
        html.push_str(&format!(
            r#"<button type="button" class="btn btn-circle btn-sm btn-tertiary element-copy copy-code-btn" data-code-id="{id}" aria-label="{label}"></button>"#
        ));
    }
    html.push_str(&format!(r#"<pre><code id="{id}""#));
    if let Some(language) = language {
        html.push_str(&format!(r#" class="language-{}""#, escape_html(language)));
    }
    html.push('>');
    html.push_str(body);
    html.push_str("</code></pre></div>");
    html
}
