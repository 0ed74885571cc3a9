//! Links, autolinks, bare URLs and images.
//!
//! All four forms are deferred: the match is replaced with a `LINK`
//! placeholder and rendered only after inline formatting and sanitization,
//! so the label is never touched by paragraph or line-break logic.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::placeholder::{PlaceholderKind, PlaceholderRegistry};
use crate::util::markup_ranges;

static AUTOLINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(https?://[^>\s]+)>").unwrap());

static IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)\s]+)\)").unwrap());

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)\s]+)\)").unwrap());

/// Bare URL; trailing punctuation is left to the sentence.
static BARE_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<]*[^\s<.,;:!?"')\]]"#).unwrap());

/// Form a deferred link was written in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum LinkKind {
    /// `[text](url)`
    Anchor,
    /// `<https://…>`
    Autolink,
    /// `https://…` in running text.
    BareUrl,
    /// `![alt](url)`
    Image,
}

/// Recorded payload of a link placeholder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct LinkPayload {
    pub kind: LinkKind,
    pub text: String,
    pub url: String,
}

impl LinkPayload {
    /// The markdown this link was written as.
    pub(crate) fn source(&self) -> String {
        match self.kind {
            LinkKind::Anchor => format!("[{}]({})", self.text, self.url),
            LinkKind::Autolink => format!("<{}>", self.url),
            LinkKind::BareUrl => self.url.clone(),
            LinkKind::Image => format!("![{}]({})", self.text, self.url),
        }
    }
}

/// Replace every link form with a placeholder.
///
/// Order matters: autolinks first, then images (so `![…]` is not read as a
/// link preceded by `!`), then links, then bare URLs in whatever text is
/// left. Bare URLs inside HTML tags or directly after `"`, `'`, `=`, `(`,
/// `<` or `[` are left alone.
pub(crate) fn extract_links(text: &str, registry: &mut PlaceholderRegistry) -> String {
    let text = replace_with_tokens(text, &AUTOLINK_RE, registry, |caps| LinkPayload {
        kind: LinkKind::Autolink,
        text: caps[1].to_owned(),
        url: caps[1].to_owned(),
    });
    let text = replace_with_tokens(&text, &IMAGE_RE, registry, |caps| LinkPayload {
        kind: LinkKind::Image,
        text: caps[1].to_owned(),
        url: caps[2].to_owned(),
    });
    let text = replace_with_tokens(&text, &LINK_RE, registry, |caps| LinkPayload {
        kind: LinkKind::Anchor,
        text: caps[1].to_owned(),
        url: caps[2].to_owned(),
    });
    extract_bare_urls(&text, registry)
}

fn replace_with_tokens<F>(
    text: &str,
    re: &Regex,
    registry: &mut PlaceholderRegistry,
    payload: F,
) -> String
where
    F: Fn(&Captures) -> LinkPayload,
{
    re.replace_all(text, |caps: &Captures| {
        match registry.insert_json(PlaceholderKind::Link, &payload(caps)) {
            Some(token) => token.to_string(),
            None => caps[0].to_owned(),
        }
    })
    .into_owned()
}

fn extract_bare_urls(text: &str, registry: &mut PlaceholderRegistry) -> String {
    if !text.contains("http") {
        return text.to_owned();
    }
    let tags = markup_ranges(text);
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for m in BARE_URL_RE.find_iter(text) {
        let preceded_by_delimiter = text[..m.start()]
            .chars()
            .next_back()
            .is_some_and(|c| matches!(c, '"' | '\'' | '=' | '(' | '<' | '['));
        let in_tag = tags.iter().any(|&(s, e)| s < m.start() && m.start() < e);
        if preceded_by_delimiter || in_tag {
            continue;
        }

        let payload = LinkPayload {
            kind: LinkKind::BareUrl,
            text: m.as_str().to_owned(),
            url: m.as_str().to_owned(),
        };
        if let Some(token) = registry.insert_json(PlaceholderKind::Link, &payload) {
            out.push_str(&text[last..m.start()]);
            out.push_str(&token.to_string());
            last = m.end();
        }
    }

    out.push_str(&text[last..]);
    out
}
