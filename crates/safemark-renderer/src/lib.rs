//! Placeholder-based markdown to sanitized HTML renderer.
//!
//! This crate converts a constrained markdown dialect (headings, emphasis,
//! lists, fenced code, pipe tables, blockquotes, inline and display math,
//! links and images) into HTML that has passed through an injected
//! [`Sanitizer`].
//!
//! # Architecture
//!
//! Rendering is a fixed sequence of string passes (see [`Pass`]). Each
//! extractor swaps the region it owns for an opaque placeholder token so later
//! passes cannot reinterpret `$`, `|` or `*` inside it:
//!
//! - Block extractors (code blocks, blockquotes, tables) leave HTML comment
//!   tokens on their own line.
//! - Inline extractors (display math, inline code, inline math, links) leave
//!   `--KIND-<hex>--` tokens.
//! - The segmenter formats and sanitizes only the prose between block tokens.
//! - Inline tokens are restored after sanitization, into fragments that are
//!   escaped or sanitized on their own.
//! - Code block and table tokens become cached elements in the returned
//!   [`RenderedNode`].
//!
//! Blockquote content and table cells re-enter the pipeline with a
//! [`RecursionContext`] that disables nested blockquotes and tables.
//!
//! # Example
//!
//! ```
//! use safemark_renderer::{AmmoniaSanitizer, RendererOptions, create_renderer};
//!
//! let mut render = create_renderer(
//!     AmmoniaSanitizer::new(),
//!     RendererOptions::new().with_download_table_button("Download"),
//! );
//!
//! let node = render("# Title\n\nHello <script>alert(1)</script>**world**");
//! let html = node.to_html();
//! assert!(html.starts_with(r#"<div class="markdown-content">"#));
//! assert!(html.contains("<strong>world</strong>"));
//! assert!(!html.contains("<script"));
//! ```

mod block;
mod csv;
mod error;
mod fingerprint;
mod format;
mod inline;
mod node;
mod options;
mod pass;
mod placeholder;
mod renderer;
mod sanitize;
mod util;

pub use csv::to_csv;
pub use error::{ClipboardError, PayloadError};
pub use fingerprint::{CodeBlockKey, MathKey, TableKey};
pub use node::{CONTAINER_CLASS, Clipboard, CodeBlockElement, Fragment, RenderedNode, TableElement};
pub use options::{LatexRenderer, RendererOptions, SyntaxHighlighter, Translate};
pub use pass::{Pass, RecursionContext};
pub use placeholder::{PlaceholderKind, PlaceholderRegistry, Site, Token, prefixes_are_disjoint};
pub use renderer::{MarkdownRenderer, RendererCacheStats, create_renderer};
#[cfg(feature = "ammonia")]
pub use sanitize::AmmoniaSanitizer;
pub use sanitize::{SanitizationGate, Sanitizer, SecurityContext};
pub use util::escape_html;
