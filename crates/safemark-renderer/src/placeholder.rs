//! Placeholder tokens that protect extracted regions from later passes.
//!
//! Every extractor swaps the region it owns for an opaque token and records
//! the region's payload in a [`PlaceholderRegistry`]. Tokens use only
//! uppercase letters, hex digits and `-`, so no markdown or HTML pass can
//! match inside them.
//!
//! Two token shapes exist:
//!
//! - inline tokens `--INLINE-CODE-<hex>--`, restored into the text stream;
//! - block tokens `<!--CODE-BLOCK-PLACEHOLDER-<hex>-->`, which the
//!   segmenter treats as opaque block boundaries.
//!
//! A registry lives for exactly one top-level render and is then dropped.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::PayloadError;
use crate::util::markup_ranges;

/// Class-name prefix used by the style-preserving sanitizer detour.
pub(crate) const STYLE_CLASS_PREFIX: &str = "STYLE-PH";

static INLINE_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"--([A-Z]+(?:-[A-Z]+)*)-([0-9a-f]{32})--").unwrap());

static BLOCK_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--([A-Z]+(?:-[A-Z]+)*)-PLACEHOLDER-([0-9a-f]{32})-->").unwrap()
});

/// Family of an extracted region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlaceholderKind {
    /// Fenced code block, payload `{language, content}` as JSON.
    CodeBlock,
    /// Blockquote, payload is the recursively rendered HTML.
    Blockquote,
    /// Pipe table, payload `{rows, has_separator}` as JSON.
    Table,
    /// `$$…$$`, payload is the raw LaTeX.
    DisplayMath,
    /// `` `…` ``, payload is the raw code.
    InlineCode,
    /// `$…$`, payload is the raw LaTeX.
    InlineMath,
    /// Link, autolink or image, payload `{kind, text, url}` as JSON.
    Link,
    /// `\$` while inline math is matched.
    EscapedDollar,
    /// `\*` while emphasis is matched.
    EscapedAsterisk,
    /// `\_` while emphasis is matched.
    EscapedUnderscore,
    /// Newline that paragraph assembly must not turn into `<br>`.
    Newline,
}

impl PlaceholderKind {
    /// Every kind, used by the prefix collision check.
    pub const ALL: [Self; 11] = [
        Self::CodeBlock,
        Self::Blockquote,
        Self::Table,
        Self::DisplayMath,
        Self::InlineCode,
        Self::InlineMath,
        Self::Link,
        Self::EscapedDollar,
        Self::EscapedAsterisk,
        Self::EscapedUnderscore,
        Self::Newline,
    ];

    /// Token prefix for this kind.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::CodeBlock => "CODE-BLOCK",
            Self::Blockquote => "BLOCKQUOTE",
            Self::Table => "TABLE",
            Self::DisplayMath => "DISPLAY-MATH",
            Self::InlineCode => "INLINE-CODE",
            Self::InlineMath => "INLINE-MATH",
            Self::Link => "LINK",
            Self::EscapedDollar => "ESCAPED-DOLLAR",
            Self::EscapedAsterisk => "ASTERISK",
            Self::EscapedUnderscore => "UNDERSCORE",
            Self::Newline => "NEWLINE",
        }
    }

    /// Whether tokens of this kind are HTML comments standing on their own line.
    #[must_use]
    pub const fn is_block(self) -> bool {
        matches!(self, Self::CodeBlock | Self::Blockquote | Self::Table)
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.prefix() == prefix)
    }
}

/// Check that no two placeholder prefixes are equal or extend one another.
///
/// Equal prefixes would let one pass restore another pass's tokens.
#[must_use]
pub fn prefixes_are_disjoint() -> bool {
    let prefixes: Vec<&str> = PlaceholderKind::ALL
        .iter()
        .map(|kind| kind.prefix())
        .chain([STYLE_CLASS_PREFIX])
        .collect();

    prefixes.iter().enumerate().all(|(i, a)| {
        prefixes
            .iter()
            .enumerate()
            .all(|(j, b)| i == j || !b.starts_with(a))
    })
}

/// Where a token sits in sanitized HTML.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Site {
    /// Between tags; markup may be inserted.
    Text,
    /// Inside a tag (attribute value); only escaped text may be inserted.
    Markup,
}

/// An issued placeholder.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Token {
    kind: PlaceholderKind,
    id: String,
}

impl Token {
    /// Kind of region this token stands for.
    #[must_use]
    pub fn kind(&self) -> PlaceholderKind {
        self.kind
    }

    /// Random hex id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind.is_block() {
            write!(f, "<!--{}-PLACEHOLDER-{}-->", self.kind.prefix(), self.id)
        } else {
            write!(f, "--{}-{}--", self.kind.prefix(), self.id)
        }
    }
}

/// Token → payload map for one render.
#[derive(Debug, Default)]
pub struct PlaceholderRegistry {
    payloads: HashMap<String, (PlaceholderKind, String)>,
}

impl PlaceholderRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        debug_assert!(prefixes_are_disjoint(), "placeholder prefixes collide");
        Self::default()
    }

    /// Issue a fresh token. Ids are random v4 UUIDs in simple hex form.
    #[must_use]
    pub fn new_token(&self, kind: PlaceholderKind) -> Token {
        Token {
            kind,
            id: Uuid::new_v4().simple().to_string(),
        }
    }

    /// Record the payload a token stands for.
    pub fn record(&mut self, token: &Token, payload: impl Into<String>) {
        self.payloads
            .insert(token.id.clone(), (token.kind, payload.into()));
    }

    /// Issue a token and record its payload in one step.
    pub fn insert(&mut self, kind: PlaceholderKind, payload: impl Into<String>) -> Token {
        let token = self.new_token(kind);
        self.record(&token, payload);
        token
    }

    /// Serialize `payload` as JSON and record it under a fresh token.
    ///
    /// Returns `None` (and logs) if serialization fails; the caller keeps the
    /// source text in that case.
    pub(crate) fn insert_json<T: Serialize>(
        &mut self,
        kind: PlaceholderKind,
        payload: &T,
    ) -> Option<Token> {
        match serde_json::to_string(payload) {
            Ok(json) => Some(self.insert(kind, json)),
            Err(e) => {
                tracing::error!(kind = kind.prefix(), error = %e, "Failed to encode placeholder payload");
                None
            }
        }
    }

    /// Decode the JSON payload recorded for the token of `kind` with `id`.
    pub(crate) fn resolve_json<T: DeserializeOwned>(
        &self,
        kind: PlaceholderKind,
        id: &str,
    ) -> Result<T, PayloadError> {
        let payload = self
            .resolve_id(kind, id)
            .ok_or_else(|| PayloadError::Missing {
                kind: kind.prefix(),
                id: id.to_owned(),
            })?;
        serde_json::from_str(payload).map_err(|source| PayloadError::Malformed {
            kind: kind.prefix(),
            source,
        })
    }

    /// Payload recorded for `token`.
    #[must_use]
    pub fn resolve(&self, token: &Token) -> Option<&str> {
        self.resolve_id(token.kind, &token.id)
    }

    /// Payload recorded for the token of `kind` with `id`.
    #[must_use]
    pub fn resolve_id(&self, kind: PlaceholderKind, id: &str) -> Option<&str> {
        match self.payloads.get(id) {
            Some((recorded, payload)) if *recorded == kind => Some(payload),
            _ => None,
        }
    }

    /// Number of recorded payloads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    /// Check whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    /// Replace every token of `kind` in `text` with `render(payload, site)`.
    ///
    /// Tokens with no recorded payload are left untouched.
    pub fn restore<F>(&self, text: &str, kind: PlaceholderKind, mut render: F) -> String
    where
        F: FnMut(&str, Site) -> String,
    {
        let re: &Regex = if kind.is_block() {
            &BLOCK_TOKEN_RE
        } else {
            &INLINE_TOKEN_RE
        };
        if !text.contains(kind.prefix()) {
            return text.to_owned();
        }

        let ranges = markup_ranges(text);
        re.replace_all(text, |caps: &Captures| {
            let whole = caps.get(0).map_or(0, |m| m.start());
            if PlaceholderKind::from_prefix(&caps[1]) != Some(kind) {
                return caps[0].to_owned();
            }
            let Some(payload) = self.resolve_id(kind, &caps[2]) else {
                tracing::debug!(kind = kind.prefix(), id = &caps[2], "Unresolved placeholder");
                return caps[0].to_owned();
            };
            let site = if !kind.is_block() && ranges.iter().any(|&(s, e)| s < whole && whole < e) {
                Site::Markup
            } else {
                Site::Text
            };
            render(payload, site)
        })
        .into_owned()
    }
}

/// Block tokens (any block kind) as `(kind, id)` pairs in document order.
pub(crate) fn block_tokens(text: &str) -> impl Iterator<Item = (usize, usize, PlaceholderKind, &str)> {
    BLOCK_TOKEN_RE.captures_iter(text).filter_map(|caps| {
        let whole = caps.get(0)?;
        let kind = PlaceholderKind::from_prefix(caps.get(1)?.as_str())?;
        let id = caps.get(2)?.as_str();
        Some((whole.start(), whole.end(), kind, id))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes_are_disjoint() {
        assert!(prefixes_are_disjoint());
    }

    #[test]
    fn test_token_shapes() {
        let registry = PlaceholderRegistry::new();
        let inline = registry.new_token(PlaceholderKind::InlineCode).to_string();
        let block = registry.new_token(PlaceholderKind::Table).to_string();

        assert!(inline.starts_with("--INLINE-CODE-"));
        assert!(inline.ends_with("--"));
        assert!(block.starts_with("<!--TABLE-PLACEHOLDER-"));
        assert!(block.ends_with("-->"));
    }

    #[test]
    fn test_tokens_avoid_markdown_characters() {
        let registry = PlaceholderRegistry::new();
        for kind in PlaceholderKind::ALL {
            let token = registry.new_token(kind);
            assert!(!token.id().contains(['*', '_', '`', '$', '[', ']', '|']));
            assert_eq!(token.id().len(), 32);
        }
    }

    #[test]
    fn test_tokens_are_unique() {
        let registry = PlaceholderRegistry::new();
        let a = registry.new_token(PlaceholderKind::Link);
        let b = registry.new_token(PlaceholderKind::Link);
        assert_ne!(a, b);
    }

    #[test]
    fn test_record_and_resolve() {
        let mut registry = PlaceholderRegistry::new();
        let token = registry.insert(PlaceholderKind::InlineMath, "x^2");
        assert_eq!(registry.resolve(&token), Some("x^2"));
        assert_eq!(registry.resolve_id(PlaceholderKind::DisplayMath, token.id()), None);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_resolve_json_errors() {
        let mut registry = PlaceholderRegistry::new();
        let broken = registry.insert(PlaceholderKind::Table, "{not json");

        let malformed = registry.resolve_json::<Vec<String>>(PlaceholderKind::Table, broken.id());
        assert!(matches!(malformed, Err(PayloadError::Malformed { kind: "TABLE", .. })));

        let missing = registry.resolve_json::<Vec<String>>(PlaceholderKind::Table, "0");
        assert!(matches!(missing, Err(PayloadError::Missing { .. })));
    }

    #[test]
    fn test_json_payload_round_trip() {
        let mut registry = PlaceholderRegistry::new();
        let token = registry
            .insert_json(PlaceholderKind::Link, &vec!["a".to_owned()])
            .unwrap();
        let decoded: Vec<String> = registry.resolve_json(PlaceholderKind::Link, token.id()).unwrap();
        assert_eq!(decoded, vec!["a".to_owned()]);
    }

    #[test]
    fn test_restore_only_requested_kind() {
        let mut registry = PlaceholderRegistry::new();
        let code = registry.insert(PlaceholderKind::InlineCode, "a");
        let math = registry.insert(PlaceholderKind::InlineMath, "b");
        let text = format!("{code} and {math}");

        let restored = registry.restore(&text, PlaceholderKind::InlineCode, |payload, _| {
            format!("<code>{payload}</code>")
        });

        assert_eq!(restored, format!("<code>a</code> and {math}"));
    }

    #[test]
    fn test_restore_leaves_unknown_tokens() {
        let registry = PlaceholderRegistry::new();
        let orphan = registry.new_token(PlaceholderKind::Link).to_string();
        let restored = registry.restore(&orphan, PlaceholderKind::Link, |_, _| String::new());
        assert_eq!(restored, orphan);
    }

    #[test]
    fn test_restore_reports_markup_site() {
        let mut registry = PlaceholderRegistry::new();
        let token = registry.insert(PlaceholderKind::Link, "x");
        let text = format!(r#"<span title="{token}">{token}</span>"#);

        let mut sites = Vec::new();
        registry.restore(&text, PlaceholderKind::Link, |_, site| {
            sites.push(site);
            String::new()
        });

        assert_eq!(sites, vec![Site::Markup, Site::Text]);
    }

    #[test]
    fn test_block_tokens_in_order() {
        let mut registry = PlaceholderRegistry::new();
        let table = registry.insert(PlaceholderKind::Table, "{}");
        let code = registry.insert(PlaceholderKind::CodeBlock, "{}");
        let text = format!("a\n{table}\nb\n{code}");

        let found: Vec<(PlaceholderKind, &str)> = block_tokens(&text)
            .map(|(_, _, kind, id)| (kind, id))
            .collect();

        assert_eq!(
            found,
            vec![
                (PlaceholderKind::Table, table.id()),
                (PlaceholderKind::CodeBlock, code.id())
            ]
        );
    }
}
