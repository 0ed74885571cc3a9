//! Cache keys for rendered fragments.
//!
//! A key covers every input that changes a fragment's HTML: the content, its
//! shape and the option values (button labels, highlighter presence) that
//! flow into the markup. Fields are length-prefixed before hashing so
//! `("ab", "c")` and `("a", "bc")` never collide.

use sha2::{Digest, Sha256};

/// Length of the hash prefix used in element ids.
pub const ID_HASH_LEN: usize = 12;

/// Cache key for a fenced code block.
#[derive(Clone, Copy, Debug)]
pub struct CodeBlockKey<'a> {
    pub language: Option<&'a str>,
    pub content: &'a str,
    /// Escaped copy-button label, if the button is enabled.
    pub copy_label: Option<&'a str>,
    /// Whether a syntax highlighter is configured.
    pub highlighted: bool,
}

impl CodeBlockKey<'_> {
    /// Compute SHA-256 hash of the key.
    pub fn compute_hash(&self) -> String {
        let mut hasher = Sha256::new();
        update_field(&mut hasher, "code");
        update_optional(&mut hasher, self.language);
        update_field(&mut hasher, self.content);
        update_optional(&mut hasher, self.copy_label);
        hasher.update([u8::from(self.highlighted)]);
        hex::encode(hasher.finalize())
    }
}

/// Cache key for a pipe table.
#[derive(Clone, Copy, Debug)]
pub struct TableKey<'a> {
    pub rows: &'a [String],
    pub has_separator: bool,
    /// Escaped download-button label, if the button is enabled.
    pub download_label: Option<&'a str>,
}

impl TableKey<'_> {
    /// Compute SHA-256 hash of the key.
    pub fn compute_hash(&self) -> String {
        let mut hasher = Sha256::new();
        update_field(&mut hasher, "table");
        hasher.update((self.rows.len() as u64).to_le_bytes());
        for row in self.rows {
            update_field(&mut hasher, row);
        }
        hasher.update([u8::from(self.has_separator)]);
        update_optional(&mut hasher, self.download_label);
        hex::encode(hasher.finalize())
    }
}

/// Cache key for a LaTeX fragment.
#[derive(Clone, Copy, Debug)]
pub struct MathKey<'a> {
    pub latex: &'a str,
    pub display: bool,
}

impl MathKey<'_> {
    /// Compute SHA-256 hash of the key.
    pub fn compute_hash(&self) -> String {
        let mut hasher = Sha256::new();
        update_field(&mut hasher, "math");
        update_field(&mut hasher, self.latex);
        hasher.update([u8::from(self.display)]);
        hex::encode(hasher.finalize())
    }
}

/// Element id derived from a key hash: `<prefix>-<first 12 hex chars>`.
///
/// Ids depend only on content, so a code block or table repeated within one
/// document repeats its id as well. Both copies are the same shared element;
/// a copy button addressing that id copies the identical text either way.
pub(crate) fn element_id(prefix: &str, hash: &str) -> String {
    format!("{prefix}-{}", &hash[..ID_HASH_LEN.min(hash.len())])
}

fn update_field(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

fn update_optional(hasher: &mut Sha256, value: Option<&str>) {
    match value {
        Some(value) => {
            hasher.update([1u8]);
            update_field(hasher, value);
        }
        None => hasher.update([0u8]),
    }
}
