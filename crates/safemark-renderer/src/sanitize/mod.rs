//! Sanitization gate.
//!
//! The renderer never trusts its own string shuffling: every piece of prose
//! is passed through an injected [`Sanitizer`] before it reaches the output,
//! and every URL goes through a scheme allow-list first. Fragments the
//! renderer builds itself (code blocks, tables, links) only ever contain
//! escaped user text.

#[cfg(feature = "ammonia")]
mod ammonia;

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use uuid::Uuid;

use crate::placeholder::STYLE_CLASS_PREFIX;
use crate::util::escape_html;

#[cfg(feature = "ammonia")]
pub use self::ammonia::AmmoniaSanitizer;

/// URLs allowed before the injected sanitizer is consulted.
static ALLOWED_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:https?://|mailto:|/(?:[^/]|$)|\.{1,2}/|#)").unwrap());

/// Opening tag fragment followed by a double-quoted style attribute.
static STYLE_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(<[a-z][a-z0-9]*[^>]*?)\s+style\s*=\s*"([^"]*)""#).unwrap()
});

/// Any style attribute left after extraction.
static LEFTOVER_STYLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\s+style\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#).unwrap()
});

static CLASS_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\sclass="([^"]*)""#).unwrap());

/// Context a value is sanitized for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SecurityContext {
    /// HTML markup.
    Html,
    /// The value of a `style` attribute.
    Style,
    /// A URL destined for `href` or `src`.
    Url,
}

/// Injected sanitization capability.
///
/// Returning `None` rejects the value; the renderer then emits nothing for
/// the fragment rather than the unsanitized original.
pub trait Sanitizer {
    /// Sanitize `value` for `context`.
    fn sanitize(&self, context: SecurityContext, value: &str) -> Option<String>;
}

impl<F> Sanitizer for F
where
    F: Fn(SecurityContext, &str) -> Option<String>,
{
    fn sanitize(&self, context: SecurityContext, value: &str) -> Option<String> {
        self(context, value)
    }
}

/// Wrapper enforcing the renderer's rules around a [`Sanitizer`].
#[derive(Debug)]
pub struct SanitizationGate<S> {
    sanitizer: S,
}

impl<S: Sanitizer> SanitizationGate<S> {
    /// Wrap a sanitizer.
    pub fn new(sanitizer: S) -> Self {
        Self { sanitizer }
    }

    /// The wrapped sanitizer.
    pub fn sanitizer(&self) -> &S {
        &self.sanitizer
    }

    /// Sanitize HTML. Rejected or empty results become `None`.
    pub fn sanitize_html(&self, html: &str) -> Option<String> {
        self.sanitizer
            .sanitize(SecurityContext::Html, html)
            .filter(|s| !s.is_empty())
    }

    /// Sanitize a style declaration list.
    pub fn sanitize_style(&self, style: &str) -> Option<String> {
        self.sanitizer
            .sanitize(SecurityContext::Style, style)
            .filter(|s| !s.trim().is_empty())
    }

    /// Sanitize a URL, returning `#` for anything not allowed.
    ///
    /// Only `http(s)://`, `mailto:`, root-relative `/path`, `./` and `../`
    /// relative paths and `#fragment` pass the allow-list; the injected
    /// sanitizer sees only those. The result is not attribute-escaped.
    pub fn sanitize_url(&self, url: &str) -> String {
        let url = url.trim();
        if !ALLOWED_URL_RE.is_match(url) {
            return "#".to_owned();
        }
        match self.sanitizer.sanitize(SecurityContext::Url, url) {
            Some(sanitized) if !sanitized.is_empty() => sanitized,
            _ => "#".to_owned(),
        }
    }

    /// Sanitize HTML while keeping (sanitized) inline styles.
    ///
    /// Generic HTML sanitizers drop `style` attributes, which breaks
    /// renderer output such as KaTeX. Each `style="…"` is swapped for a
    /// placeholder class, the markup is sanitized, and every placeholder class
    /// is replaced by a `style` attribute holding the individually sanitized
    /// and escaped declarations.
    pub fn sanitize_html_with_styles(&self, html: &str) -> Option<String> {
        let run_id = Uuid::new_v4().simple().to_string();
        let mut styles: HashMap<String, String> = HashMap::new();

        let extracted = STYLE_ATTR_RE.replace_all(html, |caps: &Captures| {
            let placeholder = format!("{STYLE_CLASS_PREFIX}-{run_id}-{}", styles.len());
            styles.insert(placeholder.clone(), caps[2].to_owned());

            let tag_start = &caps[1];
            if CLASS_ATTR_RE.is_match(tag_start) {
                CLASS_ATTR_RE
                    .replace(tag_start, |class: &Captures| {
                        format!(r#" class="{} {placeholder}""#, &class[1])
                    })
                    .into_owned()
            } else {
                format!(r#"{tag_start} class="{placeholder}""#)
            }
        });
        let stripped = LEFTOVER_STYLE_RE.replace_all(&extracted, "");

        let sanitized = self.sanitize_html(&stripped)?;
        if styles.is_empty() {
            return Some(sanitized);
        }

        let restored = CLASS_ATTR_RE.replace_all(&sanitized, |caps: &Captures| {
            let mut classes = Vec::new();
            let mut style = None;
            for class in caps[1].split_whitespace() {
                match styles.get(class) {
                    Some(raw) => style = self.sanitize_style(raw),
                    None if class.starts_with(STYLE_CLASS_PREFIX) => {}
                    None => classes.push(class),
                }
            }

            let mut attrs = String::new();
            if !classes.is_empty() {
                attrs.push_str(&format!(r#" class="{}""#, classes.join(" ")));
            }
            if let Some(style) = style {
                attrs.push_str(&format!(r#" style="{}""#, escape_html(&style)));
            }
            attrs
        });

        Some(restored.into_owned())
    }
}
