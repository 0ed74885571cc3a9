//! Inline extractors.
//!
//! These run over the text left between block placeholders. Each replaces its
//! spans with inline placeholders that the orchestrator restores after
//! formatting and sanitization.

mod code;
mod link;
mod math;

pub(crate) use code::extract_inline_code;
pub(crate) use link::{LinkKind, LinkPayload, extract_links};
pub(crate) use math::{extract_display_math, extract_inline_math};
