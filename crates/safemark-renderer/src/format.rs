//! Text segmenter and inline formatter.
//!
//! By the time this runs, every block region is a placeholder comment on its
//! own line. The segmenter splits around those comments so heading, emphasis
//! and list regexes only ever see prose, formats each prose segment and runs
//! it through the HTML sanitizer.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::pass::RecursionContext;
use crate::placeholder::{PlaceholderKind, PlaceholderRegistry, block_tokens};
use crate::sanitize::{SanitizationGate, Sanitizer};

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(#{1,6})[ \t]+(.+?)[ \t]*$").unwrap());

static HR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^ {0,3}(?:-{3,}|\*{3,}|_{3,})[ \t]*$").unwrap());

static BOLD_STAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^\s*](?:.*?[^\s])?)\*\*").unwrap());

static BOLD_UNDERSCORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__([^\s_](?:.*?[^\s])?)__").unwrap());

static ITALIC_STAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^\s*](?:[^*\n]*?[^\s*])?)\*").unwrap());

static ITALIC_UNDERSCORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b_([^_\n]+?)_\b").unwrap());

static UNORDERED_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-*•+][ \t]+(.+)$").unwrap());

static ORDERED_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+[.)][ \t]+(.+)$").unwrap());

static PARAGRAPH_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{2,}").unwrap());

/// Paragraph that starts with a block element.
static BLOCK_START_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*<(?:h[1-6]|pre|blockquote|ul|ol|hr|table|div|p)\b").unwrap()
});

/// Any block element tag.
static BLOCK_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"</?(?:h[1-6]|pre|blockquote|ul|ol|hr|table|div|p)\b").unwrap()
});

/// Newline just after a closing block tag or `<hr>`.
static NEWLINE_AFTER_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(</(?:h[1-6]|pre|blockquote|ul|ol|table|div|p)>|<hr>)\n").unwrap()
});

/// Newline just before an opening block tag.
static NEWLINE_BEFORE_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\n(<(?:h[1-6]|pre|blockquote|ul|ol|hr|table|div|p)\b)").unwrap()
});

#[derive(Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    const fn tag(self) -> &'static str {
        match self {
            Self::Unordered => "ul",
            Self::Ordered => "ol",
        }
    }
}

/// Format all prose in `text`, keeping block placeholders untouched.
pub(crate) fn format_text<S: Sanitizer>(
    text: &str,
    ctx: RecursionContext,
    gate: &SanitizationGate<S>,
    registry: &PlaceholderRegistry,
) -> String {
    let mut parts: Vec<String> = Vec::new();
    let push_prose = |prose: &str, parts: &mut Vec<String>| {
        let prose = prose.trim_matches('\n');
        if !prose.trim().is_empty() {
            parts.push(format_segment(prose, ctx.keeps_newlines(), gate, registry));
        }
    };

    let mut last = 0;
    for (start, end, _, _) in block_tokens(text) {
        push_prose(&text[last..start], &mut parts);
        parts.push(text[start..end].to_owned());
        last = end;
    }
    push_prose(&text[last..], &mut parts);

    parts.join(if ctx.keeps_newlines() { "\n" } else { "" })
}

/// Format one prose segment and sanitize it.
///
/// A rejected segment renders as nothing.
fn format_segment<S: Sanitizer>(
    text: &str,
    keep_newlines: bool,
    gate: &SanitizationGate<S>,
    registry: &PlaceholderRegistry,
) -> String {
    let escapes = EscapeTokens::new(registry);
    let text = escapes.protect(text);
    let text = format_headings(&text);
    let text = HR_RE.replace_all(&text, "<hr>");
    let text = format_emphasis_unprotected(&text);
    let text = format_lists(&text);
    let newline = registry.new_token(PlaceholderKind::Newline).to_string();
    let text = assemble_paragraphs(&text, &newline, keep_newlines);
    let text = escapes.restore(&text);
    gate.sanitize_html(&text).unwrap_or_default()
}

/// Apply bold and italic formatting only, honouring `\*` and `\_`.
///
/// Used for link labels, which skip block-level formatting.
pub(crate) fn format_emphasis(text: &str, registry: &PlaceholderRegistry) -> String {
    let escapes = EscapeTokens::new(registry);
    let text = escapes.protect(text);
    let text = format_emphasis_unprotected(&text);
    escapes.restore(&text)
}

/// Tokens standing in for `\*` and `\_` while emphasis regexes run.
struct EscapeTokens {
    asterisk: String,
    underscore: String,
}

impl EscapeTokens {
    fn new(registry: &PlaceholderRegistry) -> Self {
        Self {
            asterisk: registry.new_token(PlaceholderKind::EscapedAsterisk).to_string(),
            underscore: registry.new_token(PlaceholderKind::EscapedUnderscore).to_string(),
        }
    }

    fn protect(&self, text: &str) -> String {
        text.replace(r"\*", &self.asterisk)
            .replace(r"\_", &self.underscore)
    }

    fn restore(&self, text: &str) -> String {
        text.replace(&self.asterisk, "*")
            .replace(&self.underscore, "_")
    }
}

fn format_headings(text: &str) -> String {
    HEADING_RE
        .replace_all(text, |caps: &Captures| {
            let content = &caps[2];
            match caps[1].len() {
                1 => format!("<h2><strong>{content}</strong></h2>"),
                2 => format!("<h2>{content}</h2>"),
                3 => format!("<h3>{content}</h3>"),
                4 => format!("<h4>{content}</h4>"),
                5 => format!("<h5>{content}</h5>"),
                _ => format!("<strong>{content}</strong>"),
            }
        })
        .into_owned()
}

fn format_emphasis_unprotected(text: &str) -> String {
    let text = BOLD_STAR_RE.replace_all(text, "<strong>$1</strong>");
    let text = BOLD_UNDERSCORE_RE.replace_all(&text, "<strong>$1</strong>");
    let text = ITALIC_STAR_RE.replace_all(&text, "<em>$1</em>");
    ITALIC_UNDERSCORE_RE
        .replace_all(&text, "<em>$1</em>")
        .into_owned()
}

fn list_item(line: &str) -> Option<(ListKind, &str)> {
    if let Some(caps) = UNORDERED_ITEM_RE.captures(line) {
        return caps.get(1).map(|m| (ListKind::Unordered, m.as_str()));
    }
    ORDERED_ITEM_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| (ListKind::Ordered, m.as_str()))
}

/// Tag list items and merge runs of the same kind into one list.
///
/// Blank lines between items of the same kind do not split the list.
fn format_lists(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut list: Option<(ListKind, Vec<&str>)> = None;

    for (i, line) in lines.iter().enumerate() {
        if let Some((kind, item)) = list_item(line) {
            match &mut list {
                Some((current, items)) if *current == kind => items.push(item),
                _ => {
                    if let Some(done) = list.take() {
                        out.push(close_list(done));
                    }
                    list = Some((kind, vec![item]));
                }
            }
            continue;
        }

        if line.trim().is_empty() {
            if let Some((kind, _)) = &list {
                let next_item = lines[i + 1..]
                    .iter()
                    .find(|l| !l.trim().is_empty())
                    .and_then(|l| list_item(l));
                if next_item.is_some_and(|(next, _)| next == *kind) {
                    continue;
                }
            }
        }

        if let Some(done) = list.take() {
            out.push(close_list(done));
        }
        out.push((*line).to_owned());
    }

    if let Some(done) = list.take() {
        out.push(close_list(done));
    }
    out.join("\n")
}

fn close_list((kind, items): (ListKind, Vec<&str>)) -> String {
    let tag = kind.tag();
    let items: String = items.iter().map(|item| format!("<li>{item}</li>")).collect();
    format!("<{tag}>{items}</{tag}>")
}

/// Turn blank-line separated chunks into paragraphs and newlines into `<br>`.
///
/// A single chunk is not wrapped in `<p>`. Newlines that separate block
/// elements become `newline` tokens, later replaced with `\n` (or a space
/// inside table cells) instead of `<br>`.
fn assemble_paragraphs(text: &str, newline: &str, keep_newlines: bool) -> String {
    let chunks: Vec<&str> = PARAGRAPH_BREAK_RE
        .split(text)
        .map(|chunk| chunk.trim_matches('\n'))
        .filter(|chunk| !chunk.trim().is_empty())
        .collect();
    let wrap = chunks.len() > 1;

    let assembled: Vec<String> = chunks
        .iter()
        .map(|chunk| {
            if BLOCK_START_RE.is_match(chunk) {
                return chunk.replace('\n', newline);
            }
            let chunk = NEWLINE_AFTER_BLOCK_RE.replace_all(chunk, format!("${{1}}{newline}"));
            let chunk = NEWLINE_BEFORE_BLOCK_RE.replace_all(&chunk, format!("{newline}${{1}}"));
            let chunk = chunk.replace('\n', "<br>");
            if wrap && !BLOCK_TAG_RE.is_match(&chunk) {
                format!("<p>{chunk}</p>")
            } else {
                chunk
            }
        })
        .collect();

    assembled
        .join(newline)
        .replace(newline, if keep_newlines { "\n" } else { " " })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitize::SecurityContext;
    use pretty_assertions::assert_eq;

    fn format(text: &str) -> String {
        format_with(text, RecursionContext::top_level())
    }

    fn format_with(text: &str, ctx: RecursionContext) -> String {
        let gate = SanitizationGate::new(|_: SecurityContext, v: &str| Some(v.to_owned()));
        let registry = PlaceholderRegistry::new();
        format_text(text, ctx, &gate, &registry)
    }

    #[test]
    fn test_line_break_without_paragraph() {
        assert_eq!(format("Line 1\nLine 2"), "Line 1<br>Line 2");
    }

    #[test]
    fn test_paragraphs() {
        assert_eq!(format("one\n\ntwo"), "<p>one</p>\n<p>two</p>");
    }

    #[test]
    fn test_headings() {
        assert_eq!(format("# Title"), "<h2><strong>Title</strong></h2>");
        assert_eq!(format("## Sub"), "<h2>Sub</h2>");
        assert_eq!(format("### A"), "<h3>A</h3>");
        assert_eq!(format("#### A"), "<h4>A</h4>");
        assert_eq!(format("##### A"), "<h5>A</h5>");
        assert_eq!(format("###### A"), "<strong>A</strong>");
        assert_eq!(format("#nospace"), "#nospace");
    }

    #[test]
    fn test_heading_then_text_keeps_newline() {
        assert_eq!(format("## Sub\ntext"), "<h2>Sub</h2>\ntext");
    }

    #[test]
    fn test_emphasis() {
        assert_eq!(
            format("**b** __c__ *i* _j_"),
            "<strong>b</strong> <strong>c</strong> <em>i</em> <em>j</em>"
        );
    }

    #[test]
    fn test_escaped_emphasis() {
        assert_eq!(format(r"\*text\*"), "*text*");
        assert_eq!(format(r"\_text\_"), "_text_");
    }

    #[test]
    fn test_snake_case_is_not_italic() {
        assert_eq!(format("snake_case_name"), "snake_case_name");
    }

    #[test]
    fn test_horizontal_rule() {
        assert_eq!(format("a\n\n---\n\nb"), "<p>a</p>\n<hr>\n<p>b</p>");
    }

    #[test]
    fn test_unordered_list() {
        assert_eq!(
            format("- a\n* b\n• c\n+ d"),
            "<ul><li>a</li><li>b</li><li>c</li><li>d</li></ul>"
        );
    }

    #[test]
    fn test_ordered_list() {
        assert_eq!(format("1. a\n2) b"), "<ol><li>a</li><li>b</li></ol>");
    }

    #[test]
    fn test_list_merges_across_blank_lines() {
        assert_eq!(format("- a\n\n- b"), "<ul><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn test_list_kinds_do_not_merge() {
        assert_eq!(
            format("- a\n1. b"),
            "<ul><li>a</li></ul>\n<ol><li>b</li></ol>"
        );
    }

    #[test]
    fn test_text_then_list() {
        assert_eq!(format("Intro\n- a"), "Intro\n<ul><li>a</li></ul>");
    }

    #[test]
    fn test_block_placeholders_are_not_formatted() {
        let mut registry = PlaceholderRegistry::new();
        let token = registry.insert(PlaceholderKind::CodeBlock, "{}").to_string();
        let gate = SanitizationGate::new(|_: SecurityContext, v: &str| Some(v.to_owned()));
        let text = format!("**a**\n{token}\n*b*");

        let out = format_text(&text, RecursionContext::top_level(), &gate, &registry);

        assert_eq!(out, format!("<strong>a</strong>\n{token}\n<em>b</em>"));
    }

    #[test]
    fn test_table_cell_joins_with_space() {
        let ctx = RecursionContext::top_level().table_cell();
        assert_eq!(format_with("a\n\nb", ctx), "<p>a</p> <p>b</p>");
    }

    #[test]
    fn test_rejected_segment_is_empty() {
        let gate = SanitizationGate::new(|_: SecurityContext, _: &str| None);
        let registry = PlaceholderRegistry::new();
        let out = format_text("text", RecursionContext::top_level(), &gate, &registry);
        assert_eq!(out, "");
    }

    #[test]
    fn test_format_emphasis_only() {
        let registry = PlaceholderRegistry::new();
        assert_eq!(
            format_emphasis(r"# **a** \*b\*", &registry),
            "# <strong>a</strong> *b*"
        );
    }
}
