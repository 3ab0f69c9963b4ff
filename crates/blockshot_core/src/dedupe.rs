use std::collections::HashSet;

use sha2::{Digest, Sha256};

use crate::TextFragment;

/// SHA-256 digest of the exact fragment bytes.
pub fn content_hash(fragment: &TextFragment) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(fragment.as_str().as_bytes());
    hasher.finalize().into()
}

/// Drop every fragment whose content was already seen earlier in the
/// sequence. Survivors keep their first-occurrence order.
pub fn dedupe(fragments: Vec<TextFragment>) -> Vec<TextFragment> {
    let mut seen = HashSet::with_capacity(fragments.len());
    fragments
        .into_iter()
        .filter(|fragment| seen.insert(content_hash(fragment)))
        .collect()
}
