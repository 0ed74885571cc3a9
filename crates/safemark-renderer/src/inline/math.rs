//! Display (`$$…$$`) and inline (`$…$`) math.

use std::sync::LazyLock;

use regex::Regex;

use crate::placeholder::{PlaceholderKind, PlaceholderRegistry};
use crate::util::find_unescaped;

/// `$x$`: no whitespace just inside the delimiters, single line.
static INLINE_MATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([^\s$](?:[^$\n]*?[^\s$])?)\$").unwrap());

/// Replace every unescaped `$$…$$` span with a display-math placeholder.
///
/// Spans may cover several lines. An unclosed `$$` stays literal.
pub(crate) fn extract_display_math(text: &str, registry: &mut PlaceholderRegistry) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut from = 0;

    while let Some(open) = find_unescaped(text, "$$", from) {
        let Some(close) = find_unescaped(text, "$$", open + 2) else {
            break;
        };
        let latex = text[open + 2..close].trim();
        if latex.is_empty() {
            from = close + 2;
            continue;
        }

        out.push_str(&text[last..open]);
        out.push_str(&registry.insert(PlaceholderKind::DisplayMath, latex).to_string());
        last = close + 2;
        from = last;
    }

    out.push_str(&text[last..]);
    out
}

/// Replace every `$…$` span with an inline-math placeholder.
///
/// `\$` is protected by a temporary token while matching. It comes back as a
/// plain `$` in prose and as `\$` inside a span. A span directly followed by
/// a digit (`$5 and $6`) is treated as currency and skipped.
pub(crate) fn extract_inline_math(text: &str, registry: &mut PlaceholderRegistry) -> String {
    let escaped = registry.new_token(PlaceholderKind::EscapedDollar).to_string();
    let text = text.replace(r"\$", &escaped);

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut from = 0;

    while let Some(caps) = INLINE_MATH_RE.captures_at(&text, from) {
        let (Some(whole), Some(latex)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        if text[whole.end()..].starts_with(|c: char| c.is_ascii_digit()) {
            from = whole.start() + 1;
            continue;
        }

        out.push_str(&text[last..whole.start()]);
        let latex = latex.as_str().replace(&escaped, r"\$");
        let token = registry.insert(PlaceholderKind::InlineMath, &latex);
        out.push_str(&token.to_string());
        last = whole.end();
        from = last;
    }

    out.push_str(&text[last..]);
    out.replace(&escaped, "$")
}
