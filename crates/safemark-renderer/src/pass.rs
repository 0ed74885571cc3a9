//! Pass ordering and the recursion context.

/// One extraction or formatting pass, in pipeline order.
///
/// Code and blockquote content is removed before anything else can read `$`,
/// `|` or `*` inside it. Tables are carved out before inline passes run over
/// cell boundaries. Display math precedes inline math, and inline code
/// precedes both math passes so `$` inside code is never a delimiter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pass {
    CodeBlocks,
    Blockquotes,
    Tables,
    DisplayMath,
    InlineCode,
    InlineMath,
    Links,
    InlineFormatting,
}

impl Pass {
    /// Execution order.
    pub const ORDER: [Self; 8] = [
        Self::CodeBlocks,
        Self::Blockquotes,
        Self::Tables,
        Self::DisplayMath,
        Self::InlineCode,
        Self::InlineMath,
        Self::Links,
        Self::InlineFormatting,
    ];

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Immutable capability set handed down when the pipeline recurses.
///
/// Blockquote content cannot contain blockquotes or tables; table cells
/// cannot contain code blocks, blockquotes or tables. Recursion depth is
/// therefore at most two.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecursionContext {
    disabled: u8,
    keep_newlines: bool,
    depth: u8,
}

impl RecursionContext {
    /// Context for a top-level render: every pass enabled.
    pub const fn top_level() -> Self {
        Self {
            disabled: 0,
            keep_newlines: true,
            depth: 0,
        }
    }

    /// Context for the dequoted content of a blockquote.
    #[must_use]
    pub const fn blockquote(self) -> Self {
        Self {
            disabled: self.disabled | Pass::Blockquotes.bit() | Pass::Tables.bit(),
            keep_newlines: self.keep_newlines,
            depth: self.depth + 1,
        }
    }

    /// Context for a single table cell.
    #[must_use]
    pub const fn table_cell(self) -> Self {
        Self {
            disabled: self.disabled
                | Pass::CodeBlocks.bit()
                | Pass::Blockquotes.bit()
                | Pass::Tables.bit(),
            keep_newlines: false,
            depth: self.depth + 1,
        }
    }

    /// Whether `pass` runs in this context.
    pub const fn allows(self, pass: Pass) -> bool {
        self.disabled & pass.bit() == 0
    }

    /// Whether segments are joined with a newline (otherwise nothing).
    pub const fn keeps_newlines(self) -> bool {
        self.keep_newlines
    }

    /// Recursion depth, 0 for a top-level render.
    pub const fn depth(self) -> u8 {
        self.depth
    }

    /// Passes enabled in this context, in execution order.
    pub fn passes(self) -> impl Iterator<Item = Pass> {
        Pass::ORDER.into_iter().filter(move |&pass| self.allows(pass))
    }
}

impl Default for RecursionContext {
    fn default() -> Self {
        Self::top_level()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_level_allows_everything() {
        let ctx = RecursionContext::top_level();
        assert_eq!(ctx.passes().collect::<Vec<_>>(), Pass::ORDER.to_vec());
        assert!(ctx.keeps_newlines());
    }

    #[test]
    fn test_blockquote_disables_nesting() {
        let ctx = RecursionContext::top_level().blockquote();
        assert!(ctx.allows(Pass::CodeBlocks));
        assert!(!ctx.allows(Pass::Blockquotes));
        assert!(!ctx.allows(Pass::Tables));
        assert!(ctx.allows(Pass::InlineMath));
        assert_eq!(ctx.depth(), 1);
    }

    #[test]
    fn test_table_cell_is_inline_only() {
        let ctx = RecursionContext::top_level().table_cell();
        assert_eq!(
            ctx.passes().collect::<Vec<_>>(),
            vec![
                Pass::DisplayMath,
                Pass::InlineCode,
                Pass::InlineMath,
                Pass::Links,
                Pass::InlineFormatting
            ]
        );
        assert!(!ctx.keeps_newlines());
    }

    #[test]
    fn test_depth_is_bounded() {
        // A table inside a blockquote is impossible, so the deepest chain is
        // blockquote followed by nothing, or table cell followed by nothing.
        let ctx = RecursionContext::top_level().blockquote();
        assert!(!ctx.allows(Pass::Tables));
        assert!(!ctx.allows(Pass::Blockquotes));
    }
}
