//! Inline code spans.

use crate::placeholder::{PlaceholderKind, PlaceholderRegistry};
use crate::util::is_escaped;

/// Replace every `` `code` `` span with an inline placeholder.
///
/// A span opens on an unescaped run of backticks and closes on the next run
/// of the same length on the same line. Unmatched runs stay literal.
pub(crate) fn extract_inline_code(text: &str, registry: &mut PlaceholderRegistry) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'`' || is_escaped(text, i) {
            i += 1;
            continue;
        }
        let run = run_length(bytes, i);
        let content_start = i + run;

        let Some(close) = find_closing_run(bytes, content_start, run) else {
            i = content_start;
            continue;
        };
        let content = text[content_start..close].trim();
        if content.is_empty() {
            i = close + run;
            continue;
        }

        out.push_str(&text[last..i]);
        let token = registry.insert(PlaceholderKind::InlineCode, content);
        out.push_str(&token.to_string());
        i = close + run;
        last = i;
    }

    out.push_str(&text[last..]);
    out
}

fn run_length(bytes: &[u8], start: usize) -> usize {
    bytes[start..].iter().take_while(|&&b| b == b'`').count()
}

/// Start of the next backtick run of exactly `run` on the current line.
fn find_closing_run(bytes: &[u8], from: usize, run: usize) -> Option<usize> {
    let mut j = from;
    while j < bytes.len() {
        match bytes[j] {
            b'\n' => return None,
            b'`' => {
                let len = run_length(bytes, j);
                if len == run {
                    return Some(j);
                }
                j += len;
            }
            _ => j += 1,
        }
    }
    None
}
