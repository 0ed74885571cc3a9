//! `safemark tables` command implementation.

use std::path::PathBuf;

use clap::Args;
use safemark_config::Config;
use safemark_renderer::{AmmoniaSanitizer, MarkdownRenderer};

use super::{read_input, renderer_from_config, write_stdout};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the tables command.
#[derive(Args)]
pub(crate) struct TablesArgs {
    /// Markdown file to extract tables from (`-` reads stdin).
    input: PathBuf,

    /// Export only the table at this position (0-based, document order).
    #[arg(short, long)]
    index: Option<usize>,

    /// Path to configuration file (default: auto-discover safemark.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl TablesArgs {
    /// Execute the tables command.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be read or `--index` is out of range.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(self.config.as_deref(), None)?;
        let mut renderer = renderer_from_config(&config);

        let text = read_input(&self.input)?;
        let tables = export_tables(&mut renderer, &text, self.index)?;

        if tables.is_empty() {
            output.info("No tables found");
            return Ok(());
        }

        let show_headers = tables.len() > 1;
        for (position, csv) in tables {
            if show_headers {
                output.highlight(&format!("Table {position}"));
            }
            write_stdout(&csv)?;
            write_stdout("\n")?;
        }
        Ok(())
    }
}

/// Render `text` and export its tables as `(position, csv)` pairs.
fn export_tables(
    renderer: &mut MarkdownRenderer<AmmoniaSanitizer>,
    text: &str,
    only: Option<usize>,
) -> Result<Vec<(usize, String)>, CliError> {
    let node = renderer.render(text);
    let indexes: Vec<usize> = node.tables().map(|table| table.index()).collect();

    let selected: Vec<(usize, usize)> = match only {
        Some(position) => {
            let index = indexes.get(position).ok_or_else(|| {
                CliError::Validation(format!(
                    "Table index {position} out of range (document has {} tables)",
                    indexes.len()
                ))
            })?;
            vec![(position, *index)]
        }
        None => indexes.into_iter().enumerate().collect(),
    };

    selected
        .into_iter()
        .map(|(position, index)| {
            renderer
                .table_csv(index)
                .map(|csv| (position, csv))
                .ok_or_else(|| CliError::Validation(format!("Table {position} has no cell data")))
        })
        .collect()
}
