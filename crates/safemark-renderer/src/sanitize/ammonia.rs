//! Default [`Sanitizer`] backed by `ammonia`.

use ammonia::Builder;

use super::{SecurityContext, Sanitizer};

/// MathML elements emitted by common LaTeX renderers.
const MATHML_TAGS: &[&str] = &[
    "math",
    "semantics",
    "annotation",
    "mrow",
    "mi",
    "mo",
    "mn",
    "ms",
    "mtext",
    "mspace",
    "msup",
    "msub",
    "msubsup",
    "mfrac",
    "msqrt",
    "mroot",
    "munder",
    "mover",
    "munderover",
    "mtable",
    "mtr",
    "mtd",
    "mstyle",
    "mpadded",
    "mphantom",
    "menclose",
];

/// Style values that can load resources or run script.
const FORBIDDEN_STYLE_PATTERNS: &[&str] = &[
    "url(",
    "expression(",
    "javascript:",
    "@import",
    "behavior",
    "-moz-binding",
    "<",
    ">",
    "\\",
];

/// Sanitizer allowing the markup the renderer and LaTeX renderers produce.
///
/// HTML goes through an `ammonia` allow-list; `class`, `id` and `data-*`
/// attributes are kept on every element. Style declarations are filtered one
/// by one. URLs are only checked for whitespace and control characters
/// since the scheme allow-list is applied before a sanitizer is asked.
#[derive(Debug)]
pub struct AmmoniaSanitizer {
    builder: Builder<'static>,
}

impl AmmoniaSanitizer {
    /// Create a sanitizer with the default allow-list.
    pub fn new() -> Self {
        let mut builder = Builder::default();
        builder
            .add_tags(MATHML_TAGS)
            .add_generic_attributes(&["class", "id", "aria-hidden", "aria-label"])
            .add_generic_attribute_prefixes(&["data-"])
            .add_tag_attributes("a", &["target"])
            .add_tag_attributes("math", &["xmlns", "display"])
            .add_tag_attributes("annotation", &["encoding"])
            .add_tag_attributes("mo", &["stretchy", "fence", "separator", "lspace", "rspace"])
            .add_tag_attributes("mspace", &["width"])
            .add_tag_attributes("mstyle", &["displaystyle", "scriptlevel"])
            .link_rel(Some("noopener noreferrer"))
            .strip_comments(true);
        Self { builder }
    }

    /// Wrap a custom `ammonia` builder.
    pub fn with_builder(builder: Builder<'static>) -> Self {
        Self { builder }
    }

    fn clean_style(style: &str) -> Option<String> {
        let declarations: Vec<String> = style
            .split(';')
            .filter_map(|decl| {
                let (property, value) = decl.split_once(':')?;
                let property = property.trim().to_ascii_lowercase();
                let value = value.trim();
                if property.is_empty()
                    || value.is_empty()
                    || !property.chars().all(|c| c.is_ascii_alphabetic() || c == '-')
                {
                    return None;
                }
                let lowered = value.to_ascii_lowercase();
                if FORBIDDEN_STYLE_PATTERNS.iter().any(|p| lowered.contains(p)) {
                    return None;
                }
                Some(format!("{property}: {value}"))
            })
            .collect();

        (!declarations.is_empty()).then(|| declarations.join("; "))
    }

    fn clean_url(url: &str) -> Option<String> {
        if url.is_empty() || url.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return None;
        }
        Some(url.to_owned())
    }
}

impl Default for AmmoniaSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sanitizer for AmmoniaSanitizer {
    fn sanitize(&self, context: SecurityContext, value: &str) -> Option<String> {
        match context {
            SecurityContext::Html => Some(self.builder.clean(value).to_string()),
            SecurityContext::Style => Self::clean_style(value),
            SecurityContext::Url => Self::clean_url(value),
        }
    }
}
