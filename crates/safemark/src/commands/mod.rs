//! CLI command implementations.

pub(crate) mod render;
pub(crate) mod tables;

pub(crate) use render::RenderArgs;
pub(crate) use tables::TablesArgs;

use std::io::{Read, Write};
use std::path::Path;

use safemark_config::Config;
use safemark_renderer::{AmmoniaSanitizer, MarkdownRenderer, RendererOptions};

use crate::error::CliError;

/// Input path that reads from stdin.
const STDIN_PATH: &str = "-";

/// Build a renderer from loaded configuration.
pub(crate) fn renderer_from_config(config: &Config) -> MarkdownRenderer<AmmoniaSanitizer> {
    let mut options = RendererOptions::new().with_cache_capacity(config.cache.capacity);
    if let Some(label) = &config.renderer.copy_code_button {
        options = options.with_copy_code_button(label.as_str());
    }
    if let Some(label) = &config.renderer.download_table_button {
        options = options.with_download_table_button(label.as_str());
    }
    MarkdownRenderer::with_options(AmmoniaSanitizer::default(), options)
}

/// Read a markdown input, treating `-` as stdin.
pub(crate) fn read_input(path: &Path) -> Result<String, CliError> {
    if path == Path::new(STDIN_PATH) {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    if !path.is_file() {
        return Err(CliError::Validation(format!(
            "Input file not found: {}",
            path.display()
        )));
    }
    Ok(std::fs::read_to_string(path)?)
}

/// Write command output to stdout.
pub(crate) fn write_stdout(content: &str) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(content.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
