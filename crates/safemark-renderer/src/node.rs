//! Output tree returned by a render.
//!
//! A render produces a flat list of fragments: sanitized HTML strings
//! interleaved with code block and table elements. Elements come from the
//! renderer's caches and are shared with them through `Rc`, so the same
//! element can appear at several places and in later renders.

use std::fmt;
use std::rc::Rc;

use crate::error::ClipboardError;

/// Class of the container element.
pub const CONTAINER_CLASS: &str = "markdown-content";

/// A rendered fenced code block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeBlockElement {
    pub(crate) id: String,
    pub(crate) language: Option<String>,
    pub(crate) text: String,
    pub(crate) html: String,
}

impl CodeBlockElement {
    /// Element id of the `<code>` element, referenced by the copy button.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Language from the fence info string.
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Text content of the code element (the raw code).
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Serialized element.
    pub fn html(&self) -> &str {
        &self.html
    }
}

/// A rendered pipe table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableElement {
    pub(crate) id: String,
    pub(crate) index: usize,
    pub(crate) html: String,
}

impl TableElement {
    /// Element id of the `<table>` element.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Index of the retained cell data, see
    /// [`MarkdownRenderer::table_csv`](crate::MarkdownRenderer::table_csv).
    pub fn index(&self) -> usize {
        self.index
    }

    /// Serialized element.
    pub fn html(&self) -> &str {
        &self.html
    }
}

/// A child of the container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fragment {
    /// Sanitized markup.
    Html(String),
    /// Cached code block element.
    CodeBlock(Rc<CodeBlockElement>),
    /// Cached table element.
    Table(Rc<TableElement>),
}

impl Fragment {
    /// Serialized fragment.
    pub fn html(&self) -> &str {
        match self {
            Self::Html(html) => html,
            Self::CodeBlock(code) => code.html(),
            Self::Table(table) => table.html(),
        }
    }
}

/// Destination for the copy-code affordance.
pub trait Clipboard {
    /// Write `text` to the clipboard.
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// Container node with class `markdown-content`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderedNode {
    children: Vec<Fragment>,
}

impl RenderedNode {
    /// Container without children.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_children(children: Vec<Fragment>) -> Self {
        Self { children }
    }

    /// Children in document order.
    pub fn children(&self) -> &[Fragment] {
        &self.children
    }

    /// Check whether the container has no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Serialized children without the container element.
    pub fn inner_html(&self) -> String {
        self.children.iter().map(Fragment::html).collect()
    }

    /// Serialized container element.
    pub fn to_html(&self) -> String {
        format!(r#"<div class="{CONTAINER_CLASS}">{}</div>"#, self.inner_html())
    }

    /// Code block elements in document order.
    pub fn code_blocks(&self) -> impl Iterator<Item = &CodeBlockElement> {
        self.children.iter().filter_map(|child| match child {
            Fragment::CodeBlock(code) => Some(code.as_ref()),
            _ => None,
        })
    }

    /// Table elements in document order.
    pub fn tables(&self) -> impl Iterator<Item = &TableElement> {
        self.children.iter().filter_map(|child| match child {
            Fragment::Table(table) => Some(table.as_ref()),
            _ => None,
        })
    }

    /// Copy the text of the code element with `code_id` to `clipboard`.
    ///
    /// Returns whether the text was written. Clipboard failures are logged
    /// and otherwise ignored.
    pub fn copy_code(&self, code_id: &str, clipboard: &mut impl Clipboard) -> bool {
        let Some(code) = self.code_blocks().find(|code| code.id == code_id) else {
            tracing::debug!(code_id, "No code block with this id");
            return false;
        };
        match clipboard.write_text(&code.text) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, code_id, "Failed to copy code");
                false
            }
        }
    }
}

impl fmt::Display for RenderedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}
