//! Renderer options.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use safemark_cache::DEFAULT_CAPACITY;

use crate::util::escape_html;

/// Syntax highlighter callback: `(code, language) -> html`.
pub type SyntaxHighlighter = Box<dyn Fn(&str, Option<&str>) -> Option<String>>;

/// LaTeX renderer callback: `(latex, display_mode) -> html`.
pub type LatexRenderer = Box<dyn Fn(&str, bool) -> Option<String>>;

/// Label translation callback.
pub type Translate = Box<dyn Fn(&str) -> String>;

/// Configuration snapshot for one renderer instance.
///
/// Absent options disable the corresponding feature: no copy button without
/// `copy_code_button`, no highlighting without `syntax_highlighter`, and so on.
pub struct RendererOptions {
    /// Label of the copy-code button. Enables the button.
    pub copy_code_button: Option<String>,
    /// Label of the table download button. Enables the button.
    pub download_table_button: Option<String>,
    /// Returns highlighted HTML for a code block.
    pub syntax_highlighter: Option<SyntaxHighlighter>,
    /// Returns HTML for a LaTeX fragment.
    pub latex_renderer: Option<LatexRenderer>,
    /// Translates button labels.
    pub translate: Option<Translate>,
    /// Capacity of each of the three fragment caches.
    pub cache_capacity: usize,
}

impl RendererOptions {
    /// Options with every feature disabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            copy_code_button: None,
            download_table_button: None,
            syntax_highlighter: None,
            latex_renderer: None,
            translate: None,
            cache_capacity: DEFAULT_CAPACITY,
        }
    }

    /// Enable the copy-code button with `label`.
    #[must_use]
    pub fn with_copy_code_button(mut self, label: impl Into<String>) -> Self {
        self.copy_code_button = Some(label.into());
        self
    }

    /// Enable the table download button with `label`.
    #[must_use]
    pub fn with_download_table_button(mut self, label: impl Into<String>) -> Self {
        self.download_table_button = Some(label.into());
        self
    }

    /// Set the syntax highlighter.
    #[must_use]
    pub fn with_syntax_highlighter<F>(mut self, highlighter: F) -> Self
    where
        F: Fn(&str, Option<&str>) -> Option<String> + 'static,
    {
        self.syntax_highlighter = Some(Box::new(highlighter));
        self
    }

    /// Set the LaTeX renderer.
    #[must_use]
    pub fn with_latex_renderer<F>(mut self, renderer: F) -> Self
    where
        F: Fn(&str, bool) -> Option<String> + 'static,
    {
        self.latex_renderer = Some(Box::new(renderer));
        self
    }

    /// Set the label translation.
    #[must_use]
    pub fn with_translate<F>(mut self, translate: F) -> Self
    where
        F: Fn(&str) -> String + 'static,
    {
        self.translate = Some(Box::new(translate));
        self
    }

    /// Set the capacity of each fragment cache.
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Translated, HTML-escaped copy button label.
    pub(crate) fn copy_label(&self) -> Option<String> {
        self.copy_code_button.as_deref().map(|l| self.label(l))
    }

    /// Translated, HTML-escaped download button label.
    pub(crate) fn download_label(&self) -> Option<String> {
        self.download_table_button.as_deref().map(|l| self.label(l))
    }

    fn label(&self, label: &str) -> String {
        let translated = match &self.translate {
            Some(translate) => catch_unwind(AssertUnwindSafe(|| translate(label)))
                .unwrap_or_else(|_| {
                    tracing::warn!(label, "Label translation panicked");
                    label.to_owned()
                }),
            None => label.to_owned(),
        };
        escape_html(&translated)
    }

    /// Run the syntax highlighter, treating a panic like `None`.
    pub(crate) fn highlight(&self, code: &str, language: Option<&str>) -> Option<String> {
        let highlighter = self.syntax_highlighter.as_ref()?;
        match catch_unwind(AssertUnwindSafe(|| highlighter(code, language))) {
            Ok(html) => html.filter(|h| !h.is_empty()),
            Err(_) => {
                tracing::warn!(language, "Syntax highlighter panicked");
                None
            }
        }
    }

    /// Run the LaTeX renderer, treating a panic like `None`.
    pub(crate) fn render_latex(&self, latex: &str, display_mode: bool) -> Option<String> {
        let renderer = self.latex_renderer.as_ref()?;
        match catch_unwind(AssertUnwindSafe(|| renderer(latex, display_mode))) {
            Ok(html) => html.filter(|h| !h.is_empty()),
            Err(_) => {
                tracing::warn!(display_mode, "LaTeX renderer panicked");
                None
            }
        }
    }
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RendererOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererOptions")
            .field("copy_code_button", &self.copy_code_button)
            .field("download_table_button", &self.download_table_button)
            .field("syntax_highlighter", &self.syntax_highlighter.is_some())
            .field("latex_renderer", &self.latex_renderer.is_some())
            .field("translate", &self.translate.is_some())
            .field("cache_capacity", &self.cache_capacity)
            .finish()
    }
}
