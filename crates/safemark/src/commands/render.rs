//! `safemark render` command implementation.

use std::path::PathBuf;

use clap::Args;
use safemark_config::{CliSettings, Config};
use safemark_renderer::{AmmoniaSanitizer, MarkdownRenderer};

use super::{read_input, renderer_from_config, write_stdout};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Markdown files to render (`-` reads stdin).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Write HTML to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover safemark.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Copy-code button label (overrides config).
    #[arg(long, env = "SAFEMARK_COPY_LABEL")]
    copy_label: Option<String>,

    /// Table download button label (overrides config).
    #[arg(long, env = "SAFEMARK_DOWNLOAD_LABEL")]
    download_label: Option<String>,

    /// Entries kept by each fragment cache (overrides config).
    #[arg(long)]
    cache_capacity: Option<usize>,

    /// Emit inner HTML without the container element.
    #[arg(long)]
    fragment: bool,

    /// Enable verbose output (cache statistics and renderer logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or an input cannot be read.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            copy_label: self.copy_label,
            download_label: self.download_label,
            cache_capacity: self.cache_capacity,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        if let Some(path) = &config.config_path {
            output.info(&format!("Config: {}", path.display()));
        }

        // One renderer for every input so the caches are shared.
        let mut renderer = renderer_from_config(&config);
        let html = render_inputs(&mut renderer, &self.inputs, self.fragment)?;

        if self.verbose {
            let stats = renderer.cache_stats();
            tracing::info!(
                code_hits = stats.code.hits,
                code_misses = stats.code.misses,
                table_hits = stats.table.hits,
                table_misses = stats.table.misses,
                latex_hits = stats.latex.hits,
                latex_misses = stats.latex.misses,
                "Cache statistics"
            );
        }

        match &self.output {
            Some(path) => {
                std::fs::write(path, html)?;
                output.success(&format!(
                    "Rendered {} file(s) to {}",
                    self.inputs.len(),
                    path.display()
                ));
            }
            None => write_stdout(&html)?,
        }

        Ok(())
    }
}

/// Render every input with `renderer`, one document per line.
fn render_inputs(
    renderer: &mut MarkdownRenderer<AmmoniaSanitizer>,
    inputs: &[PathBuf],
    fragment: bool,
) -> Result<String, CliError> {
    let mut html = String::new();
    for input in inputs {
        let text = read_input(input)?;
        let node = renderer.render(&text);
        tracing::debug!(
            input = %input.display(),
            code_blocks = node.code_blocks().count(),
            tables = node.tables().count(),
            "Rendered input"
        );
        if fragment {
            html.push_str(&node.inner_html());
        } else {
            html.push_str(&node.to_html());
        }
        html.push('\n');
    }
    Ok(html)
}
