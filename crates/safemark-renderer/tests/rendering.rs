//! End-to-end rendering scenarios.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use pretty_assertions::assert_eq;
use safemark_renderer::{MarkdownRenderer, RendererOptions, SecurityContext, create_renderer};

type Passthrough = fn(SecurityContext, &str) -> Option<String>;

fn passthrough(_: SecurityContext, value: &str) -> Option<String> {
    Some(value.to_owned())
}

fn renderer(options: RendererOptions) -> MarkdownRenderer<Passthrough> {
    MarkdownRenderer::with_options(passthrough as Passthrough, options)
}

#[test]
fn test_line_break_without_paragraph() {
    let html = renderer(RendererOptions::new()).render("Line 1\nLine 2").inner_html();
    assert_eq!(html.matches("<br>").count(), 1);
    assert!(!html.contains("<p>"));
}

#[test]
fn test_code_block_text_has_no_fence() {
    let node = renderer(RendererOptions::new()).render("```\nconst x = 1;\n```");
    let blocks: Vec<_> = node.code_blocks().collect();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].text(), "const x = 1;");
    assert_eq!(node.inner_html().matches("<pre><code").count(), 1);
    assert!(!node.inner_html().contains("```"));
}

#[test]
fn test_longer_fence_shows_inner_fence_literally() {
    let input = "````markdown\n```js\nlet a = 1;\n```\n````";
    let node = renderer(RendererOptions::new()).render(input);

    let blocks: Vec<_> = node.code_blocks().collect();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].text(), "```js\nlet a = 1;\n```");
    assert_eq!(blocks[0].language(), Some("markdown"));
}

#[test]
fn test_math_in_code_never_reaches_latex_renderer() {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let recorded = Rc::clone(&calls);
    let options = RendererOptions::new().with_latex_renderer(move |latex, display| {
        recorded.borrow_mut().push((latex.to_owned(), display));
        Some(format!("<span>{latex}</span>"))
    });
    let mut r = renderer(options);

    let html = r.render("`$100`").inner_html();
    assert_eq!(html, "<code>$100</code>");
    assert!(calls.borrow().is_empty());

    r.render("$x^2$");
    assert_eq!(*calls.borrow(), vec![("x^2".to_owned(), false)]);
}

#[test]
fn test_escaped_dollar_is_not_math() {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let options = RendererOptions::new().with_latex_renderer(move |_, _| {
        counter.set(counter.get() + 1);
        None
    });
    let html = renderer(options).render(r"It costs \$100.").inner_html();

    assert_eq!(calls.get(), 0);
    assert_eq!(html, "It costs $100.");
}

#[test]
fn test_escaped_asterisks_are_not_emphasis() {
    let html = renderer(RendererOptions::new()).render(r"\*text\*").inner_html();
    assert_eq!(html, "*text*");
}

#[test]
fn test_identical_renders_are_byte_identical_and_cached() {
    let builds = Rc::new(Cell::new(0));
    let counter = Rc::clone(&builds);
    let options = RendererOptions::new()
        .with_copy_code_button("Copy")
        .with_download_table_button("Download")
        .with_syntax_highlighter(move |code, _| {
            counter.set(counter.get() + 1);
            Some(format!("<span>{code}</span>"))
        })
        .with_latex_renderer(|latex, _| Some(format!("<span>{latex}</span>")));
    let mut r = renderer(options);
    let input = "```rust\nfn main() {}\n```\n\n| a | b |\n|---|---|\n| 1 | 2 |\n\n$$E = mc^2$$";

    let first = r.render(input).to_html();
    let after_first = r.cache_stats();
    let second = r.render(input).to_html();
    let after_second = r.cache_stats();

    assert_eq!(first, second);
    assert_eq!(builds.get(), 1);
    assert_eq!(after_second.code.misses, after_first.code.misses);
    assert_eq!(after_second.table.misses, after_first.table.misses);
    assert_eq!(after_second.latex.misses, after_first.latex.misses);
    assert_eq!(after_second.code.hits, after_first.code.hits + 1);
}

#[test]
fn test_lru_bound_and_rebuild() {
    let builds = Rc::new(Cell::new(0));
    let counter = Rc::clone(&builds);
    let options = RendererOptions::new().with_syntax_highlighter(move |code, _| {
        counter.set(counter.get() + 1);
        Some(code.to_owned())
    });
    let mut r = renderer(options);

    for i in 0..=100 {
        r.render(&format!("```\nblock {i}\n```"));
    }
    let stats = r.cache_stats().code;
    assert_eq!(stats.misses, 101);
    assert_eq!(stats.evictions, 1);
    assert_eq!(builds.get(), 101);

    // Block 0 was the least recently used and has been evicted.
    r.render("```\nblock 0\n```");
    assert_eq!(builds.get(), 102);

    // Block 100 is still cached.
    r.render("```\nblock 100\n```");
    assert_eq!(builds.get(), 102);
}

#[test]
fn test_table_csv_quotes_cells() {
    let mut r = renderer(RendererOptions::new().with_download_table_button("Download"));
    let node = r.render("| name | value |\n|---|---|\n| a,b\"c | x<br>y |");

    let table = node.tables().next().expect("table rendered");
    assert!(node.inner_html().contains(&format!(
        r#"data-table-index="{}""#,
        table.index()
    )));
    assert_eq!(
        r.table_csv(table.index()).as_deref(),
        Some("name,value\n\"a,b\"\"c\",\"x\ny\"")
    );
}

#[test]
fn test_table_cells_use_inline_pipeline_only() {
    let node = renderer(RendererOptions::new()).render("| `a` | [x](/y) |\n| > q | **b** |");
    let html = node.inner_html();
    assert!(html.contains("<td><code>a</code></td>"));
    assert!(html.contains(r#"<a href="/y""#));
    assert!(html.contains("<strong>b</strong>"));
    assert!(!html.contains("<blockquote>"));
}

#[test]
fn test_table_cell_fence_and_breaks() {
    let node = renderer(RendererOptions::new()).render("| ```x = 1``` | a<br>b |");
    let html = node.inner_html();
    assert!(html.contains("<td><code>x = 1</code></td>"));
    assert!(html.contains("<td>a<br>b</td>"));
}

#[test]
fn test_document_structure() {
    let input = "# Title\n\nIntro with *emphasis* and `code`.\n\n- one\n- two\n\n1. first\n2. second\n\n> quote\n\n---\n\nSee <https://example.com>.";
    let html = renderer(RendererOptions::new()).render(input).inner_html();

    assert_eq!(
        html,
        concat!(
            "<h2><strong>Title</strong></h2>\n",
            "<p>Intro with <em>emphasis</em> and <code>code</code>.</p>\n",
            "<ul><li>one</li><li>two</li></ul>\n",
            "<ol><li>first</li><li>second</li></ol>\n",
            "<blockquote>quote</blockquote>\n",
            "<hr>\n",
            r#"<p>See <a href="https://example.com" target="_blank" rel="noopener noreferrer">https://example.com</a>.</p>"#
        )
    );
}

#[test]
fn test_copy_button_and_clipboard() {
    use safemark_renderer::{Clipboard, ClipboardError};

    struct Recorder(Vec<String>);

    impl Clipboard for Recorder {
        fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            self.0.push(text.to_owned());
            Ok(())
        }
    }

    let options = RendererOptions::new()
        .with_copy_code_button("copy")
        .with_translate(|label| label.to_uppercase());
    let node = renderer(options).render("```\na < b\n```");
    let code = node.code_blocks().next().unwrap();

    assert!(node.inner_html().contains(&format!(r#"data-code-id="{}""#, code.id())));
    assert!(node.inner_html().contains(r#"aria-label="COPY""#));

    let mut clipboard = Recorder(Vec::new());
    assert!(node.copy_code(code.id(), &mut clipboard));
    assert_eq!(clipboard.0, vec!["a < b".to_owned()]);
}

#[test]
fn test_repeated_code_block_shares_element() {
    let node = renderer(RendererOptions::new()).render("```\nx\n```\n\ntext\n\n```\nx\n```");
    let blocks: Vec<_> = node.code_blocks().collect();

    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].id(), blocks[1].id());
    assert!(std::ptr::eq(blocks[0], blocks[1]));
}

#[test]
fn test_create_renderer_shares_caches() {
    let builds = Rc::new(Cell::new(0));
    let counter = Rc::clone(&builds);
    let options = RendererOptions::new().with_syntax_highlighter(move |code, _| {
        counter.set(counter.get() + 1);
        Some(code.to_owned())
    });
    let mut render = create_renderer(passthrough as Passthrough, options);

    render("```\nx\n```");
    render("```\nx\n```");
    assert_eq!(builds.get(), 1);
}

#[test]
fn test_unterminated_fence_renders_partial_code() {
    let node = renderer(RendererOptions::new()).render("Typing:\n```py\nprint(1)");
    assert_eq!(node.code_blocks().next().map(|c| c.text()), Some("print(1)"));
    assert!(node.inner_html().starts_with("Typing:"));
}

#[test]
fn test_large_adversarial_input_completes() {
    let input = format!(
        "{}{}{}",
        "*".repeat(20_000),
        "[".repeat(20_000),
        "$a ".repeat(20_000)
    );
    let node = renderer(RendererOptions::new()).render(&input);
    assert!(!node.is_empty());
}
