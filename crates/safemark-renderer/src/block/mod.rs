//! Block extractors: fenced code, blockquotes and pipe tables.
//!
//! Each extractor works line by line, replaces the region it owns with a
//! block placeholder on a line of its own, and records what is needed to
//! build the final element later.

mod blockquote;
mod code;
mod table;

pub(crate) use blockquote::extract_blockquotes;
pub(crate) use code::{CodePayload, code_block_html, extract_code_blocks};
pub(crate) use table::{TablePayload, extract_tables, prepare_cell, split_cells, table_html};
