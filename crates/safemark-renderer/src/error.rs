//! Error types for the recoverable failures inside the pipeline.
//!
//! None of these escape [`MarkdownRenderer::render`](crate::MarkdownRenderer::render):
//! the orchestrator logs them and degrades the affected fragment.

/// Failure to resolve an internally serialized placeholder payload.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    /// No payload was recorded for the placeholder.
    #[error("no payload recorded for {kind} placeholder {id}")]
    Missing {
        /// Placeholder family (e.g., "TABLE").
        kind: &'static str,
        /// Random placeholder id.
        id: String,
    },
    /// The payload could not be decoded.
    #[error("malformed {kind} payload: {source}")]
    Malformed {
        /// Placeholder family (e.g., "TABLE").
        kind: &'static str,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Failure reported by a [`Clipboard`](crate::Clipboard) implementation.
#[derive(Debug, thiserror::Error)]
#[error("clipboard write failed: {0}")]
pub struct ClipboardError(pub String);
