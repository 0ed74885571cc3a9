//! Pipeline orchestrator.

use std::rc::Rc;

use safemark_cache::{CacheStats, LruCache};

use crate::block::{
    CodePayload, TablePayload, code_block_html, extract_blockquotes, extract_code_blocks,
    extract_tables, prepare_cell, split_cells, table_html,
};
use crate::csv::{TableCellStore, to_csv};
use crate::error::PayloadError;
use crate::fingerprint::{CodeBlockKey, MathKey, TableKey, element_id};
use crate::format::{format_emphasis, format_text};
use crate::inline::{
    LinkKind, LinkPayload, extract_display_math, extract_inline_code, extract_inline_math,
    extract_links,
};
use crate::node::{CodeBlockElement, Fragment, RenderedNode, TableElement};
use crate::options::RendererOptions;
use crate::pass::{Pass, RecursionContext};
use crate::placeholder::{PlaceholderKind, PlaceholderRegistry, Site, block_tokens};
use crate::sanitize::{SanitizationGate, Sanitizer};
use crate::util::escape_html;

/// Hit/miss/eviction counters of the three fragment caches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RendererCacheStats {
    pub code: CacheStats,
    pub table: CacheStats,
    pub latex: CacheStats,
}

/// Markdown renderer owning its caches and table cell data.
///
/// One instance serves many renders; caches carry over between them. The
/// placeholder registry is created per [`render`](Self::render) call and
/// dropped when it returns.
///
/// # Example
///
/// ```
/// use safemark_renderer::{MarkdownRenderer, RendererOptions, SecurityContext};
///
/// let sanitizer = |_: SecurityContext, value: &str| Some(value.to_owned());
/// let mut renderer = MarkdownRenderer::with_options(
///     sanitizer,
///     RendererOptions::new().with_copy_code_button("Copy"),
/// );
///
/// let node = renderer.render("Some **bold** text");
/// assert_eq!(node.inner_html(), "Some <strong>bold</strong> text");
/// ```
#[derive(Debug)]
pub struct MarkdownRenderer<S: Sanitizer> {
    gate: SanitizationGate<S>,
    options: RendererOptions,
    code_cache: LruCache<Rc<CodeBlockElement>>,
    table_cache: LruCache<Rc<TableElement>>,
    latex_cache: LruCache<String>,
    table_cells: TableCellStore,
}

impl<S: Sanitizer> MarkdownRenderer<S> {
    /// Create a renderer with default options.
    pub fn new(sanitizer: S) -> Self {
        Self::with_options(sanitizer, RendererOptions::default())
    }

    /// Create a renderer with `options`.
    ///
    /// A cache capacity of zero is raised to one.
    pub fn with_options(sanitizer: S, options: RendererOptions) -> Self {
        let capacity = options.cache_capacity.max(1);
        Self {
            gate: SanitizationGate::new(sanitizer),
            options,
            code_cache: LruCache::new("code", capacity),
            table_cache: LruCache::new("table", capacity),
            latex_cache: LruCache::new("latex", capacity),
            table_cells: TableCellStore::default(),
        }
    }

    /// Options this renderer was created with.
    pub fn options(&self) -> &RendererOptions {
        &self.options
    }

    /// Render markdown into a `markdown-content` container.
    ///
    /// Never fails: sanitizer rejections, callback failures and malformed
    /// internal payloads degrade the affected fragment only.
    pub fn render(&mut self, text: &str) -> RenderedNode {
        if text.trim().is_empty() {
            return RenderedNode::empty();
        }

        let mut registry = PlaceholderRegistry::new();
        let html = self.process(text, RecursionContext::top_level(), &mut registry);
        let node = self.materialize(&html, &registry);
        tracing::debug!(
            placeholders = registry.len(),
            children = node.children().len(),
            "Rendered markdown"
        );
        node
    }

    /// Retained cell text of the table with `index`, as CSV.
    pub fn table_csv(&self, index: usize) -> Option<String> {
        self.table_cells.get(index).map(to_csv)
    }

    /// Number of tables whose cell data is retained.
    pub fn table_count(&self) -> usize {
        self.table_cells.len()
    }

    /// Cache usage counters.
    pub fn cache_stats(&self) -> RendererCacheStats {
        RendererCacheStats {
            code: self.code_cache.stats(),
            table: self.table_cache.stats(),
            latex: self.latex_cache.stats(),
        }
    }

    /// Run the enabled passes over `text` and restore inline placeholders.
    ///
    /// Code block and table placeholders are left in place for
    /// [`materialize`](Self::materialize).
    fn process(
        &mut self,
        text: &str,
        ctx: RecursionContext,
        registry: &mut PlaceholderRegistry,
    ) -> String {
        let mut text = text.replace("\r\n", "\n");

        for pass in ctx.passes() {
            text = match pass {
                Pass::CodeBlocks => extract_code_blocks(&text, registry),
                Pass::Blockquotes => extract_blockquotes(&text, registry, |inner, registry| {
                    self.process(inner, ctx.blockquote(), registry)
                }),
                Pass::Tables => extract_tables(&text, registry),
                Pass::DisplayMath => extract_display_math(&text, registry),
                Pass::InlineCode => extract_inline_code(&text, registry),
                Pass::InlineMath => extract_inline_math(&text, registry),
                Pass::Links => extract_links(&text, registry),
                Pass::InlineFormatting => format_text(&text, ctx, &self.gate, registry),
            };
        }

        let registry = &*registry;
        let text = registry.restore(&text, PlaceholderKind::Blockquote, |html, _| {
            html.to_owned()
        });
        let text = self.restore_inline(&text, registry);
        registry.restore(&text, PlaceholderKind::Link, |json, site| {
            self.render_link(json, site, registry)
        })
    }

    /// Restore display math, inline code and inline math, in that order.
    fn restore_inline(&mut self, text: &str, registry: &PlaceholderRegistry) -> String {
        let text = registry.restore(text, PlaceholderKind::DisplayMath, |latex, site| {
            self.render_math(latex, true, site)
        });
        let text = registry.restore(&text, PlaceholderKind::InlineCode, |code, site| {
            match site {
                Site::Text => format!("<code>{}</code>", escape_html(code)),
                Site::Markup => escape_html(&format!("`{code}`")),
            }
        });
        registry.restore(&text, PlaceholderKind::InlineMath, |latex, site| {
            self.render_math(latex, false, site)
        })
    }

    /// LaTeX fragment HTML, or the escaped source if it cannot be rendered.
    fn render_math(&mut self, latex: &str, display: bool, site: Site) -> String {
        let delimiter = if display { "$$" } else { "$" };
        let fallback = || escape_html(&format!("{delimiter}{latex}{delimiter}"));
        if site == Site::Markup || self.options.latex_renderer.is_none() {
            return fallback();
        }

        let hash = MathKey { latex, display }.compute_hash();
        let (gate, options) = (&self.gate, &self.options);
        let html = self.latex_cache.get_or_create(&hash, || {
            options
                .render_latex(latex, display)
                .and_then(|html| gate.sanitize_html_with_styles(&html))
                .unwrap_or_default()
        });

        if html.is_empty() { fallback() } else { html }
    }

    fn render_link(&mut self, json: &str, site: Site, registry: &PlaceholderRegistry) -> String {
        let link: LinkPayload = match serde_json::from_str(json) {
            Ok(link) => link,
            Err(e) => {
                tracing::error!(error = %e, "Malformed link payload");
                return String::new();
            }
        };
        if site == Site::Markup {
            let source = self.restore_source(&link.source(), registry);
            return escape_html(&source);
        }

        let url = escape_html(&self.gate.sanitize_url(&link.url));
        match link.kind {
            LinkKind::Anchor => {
                let label = format_emphasis(&link.text, registry);
                let label = self.gate.sanitize_html(&label).unwrap_or_default();
                let label = self.restore_inline(&label, registry);
                // images and autolinks nested in the label were tokenized first
                let label = registry.restore(&label, PlaceholderKind::Link, |json, site| {
                    self.render_link(json, site, registry)
                });
                format!(r#"<a href="{url}" target="_blank" rel="noopener noreferrer">{label}</a>"#)
            }
            LinkKind::Autolink | LinkKind::BareUrl => {
                let label = escape_html(&link.text);
                format!(r#"<a href="{url}" target="_blank" rel="noopener noreferrer">{label}</a>"#)
            }
            LinkKind::Image => {
                let alt = escape_html(&self.restore_source(&link.text, registry));
                format!(r#"<img src="{url}" alt="{alt}">"#)
            }
        }
    }

    /// Put links, inline code and math back as the markdown they were written as.
    fn restore_source(&self, text: &str, registry: &PlaceholderRegistry) -> String {
        let text = registry.restore(text, PlaceholderKind::Link, |json, _| {
            match serde_json::from_str::<LinkPayload>(json) {
                Ok(link) => self.restore_source(&link.source(), registry),
                Err(e) => {
                    tracing::error!(error = %e, "Malformed link payload");
                    String::new()
                }
            }
        });
        let text = registry.restore(&text, PlaceholderKind::InlineCode, |code, _| {
            format!("`{code}`")
        });
        registry.restore(&text, PlaceholderKind::InlineMath, |latex, _| {
            format!("${latex}$")
        })
    }

    /// Split the final HTML at block placeholders and resolve them.
    fn materialize(&mut self, html: &str, registry: &PlaceholderRegistry) -> RenderedNode {
        let mut children = Vec::new();
        let mut last = 0;

        for (start, end, kind, id) in block_tokens(html) {
            push_html(&mut children, &html[last..start]);
            last = end;

            let resolved = match kind {
                PlaceholderKind::CodeBlock => {
                    self.build_code_block(id, registry).map(Fragment::CodeBlock)
                }
                PlaceholderKind::Table => self.build_table(id, registry).map(Fragment::Table),
                _ => {
                    push_html(&mut children, &html[start..end]);
                    continue;
                }
            };
            match resolved {
                Ok(fragment) => children.push(fragment),
                Err(e) => tracing::error!(error = %e, "Dropping unresolvable block"),
            }
        }
        push_html(&mut children, &html[last..]);

        RenderedNode::from_children(children)
    }

    fn build_code_block(
        &mut self,
        id: &str,
        registry: &PlaceholderRegistry,
    ) -> Result<Rc<CodeBlockElement>, PayloadError> {
        let payload: CodePayload = registry.resolve_json(PlaceholderKind::CodeBlock, id)?;
        let copy_label = self.options.copy_label();
        let key = CodeBlockKey {
            language: payload.language.as_deref(),
            content: &payload.content,
            copy_label: copy_label.as_deref(),
            highlighted: self.options.syntax_highlighter.is_some(),
        };
        let hash = key.compute_hash();

        let (gate, options) = (&self.gate, &self.options);
        Ok(self.code_cache.get_or_create(&hash, || {
            let dom_id = element_id("code", &hash);
            let language = payload.language.as_deref();
            let body = options
                .highlight(&payload.content, language)
                .and_then(|html| gate.sanitize_html_with_styles(&html))
                .unwrap_or_else(|| escape_html(&payload.content));
            let html = code_block_html(&dom_id, language, &body, copy_label.as_deref());
            Rc::new(CodeBlockElement {
                id: dom_id,
                language: payload.language.clone(),
                text: payload.content.clone(),
                html,
            })
        }))
    }

    fn build_table(
        &mut self,
        id: &str,
        registry: &PlaceholderRegistry,
    ) -> Result<Rc<TableElement>, PayloadError> {
        let payload: TablePayload = registry.resolve_json(PlaceholderKind::Table, id)?;
        let download_label = self.options.download_label();
        let key = TableKey {
            rows: &payload.rows,
            has_separator: payload.has_separator,
            download_label: download_label.as_deref(),
        };
        let hash = key.compute_hash();
        if let Some(table) = self.table_cache.get(&hash) {
            return Ok(table);
        }

        let mut header = None;
        let mut body = Vec::new();
        let mut original = Vec::new();
        for (i, row) in payload.rows.iter().enumerate() {
            let cells = split_cells(row);
            let rendered: Vec<String> = cells.iter().map(|cell| self.render_cell(cell)).collect();
            let is_header = i == 0 && payload.has_separator;
            if rendered.iter().all(String::is_empty) {
                if is_header {
                    header = Some(Vec::new());
                }
                continue;
            }
            original.push(cells);
            if is_header {
                header = Some(rendered);
            } else {
                body.push(rendered);
            }
        }
        let header = header.filter(|cells| !cells.is_empty());

        let index = self.table_cells.push(original);
        let dom_id = element_id("table", &hash);
        let html = table_html(
            &dom_id,
            index,
            header.as_deref(),
            &body,
            download_label.as_deref(),
        );
        let table = Rc::new(TableElement {
            id: dom_id,
            index,
            html,
        });
        self.table_cache.insert(hash, Rc::clone(&table));
        Ok(table)
    }

    /// Run one cell through the inline-only pipeline.
    fn render_cell(&mut self, cell: &str) -> String {
        if cell.is_empty() {
            return String::new();
        }
        let mut registry = PlaceholderRegistry::new();
        let ctx = RecursionContext::top_level().table_cell();
        self.process(&prepare_cell(cell), ctx, &mut registry)
    }
}

fn push_html(children: &mut Vec<Fragment>, html: &str) {
    let html = html.trim_matches('\n');
    if !html.is_empty() {
        children.push(Fragment::Html(html.to_owned()));
    }
}

/// Create a render function bound to one renderer instance.
///
/// The returned closure owns the renderer, so caches persist across calls.
pub fn create_renderer<S: Sanitizer>(
    sanitizer: S,
    options: RendererOptions,
) -> impl FnMut(&str) -> RenderedNode {
    let mut renderer = MarkdownRenderer::with_options(sanitizer, options);
    move |text: &str| renderer.render(text)
}
