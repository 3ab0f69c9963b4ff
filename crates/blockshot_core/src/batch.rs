use crate::TextFragment;

/// Per-fragment framing cost added to the fragment length when estimating
/// the size of a request.
pub const FRAGMENT_OVERHEAD: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Batch {
    pub fragments: Vec<TextFragment>,
    /// Sum of `len + FRAGMENT_OVERHEAD` over `fragments`.
    pub size: usize,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    fn push(&mut self, fragment: TextFragment) {
        self.size += estimated_size(&fragment);
        self.fragments.push(fragment);
    }
}

fn estimated_size(fragment: &TextFragment) -> usize {
    fragment.len() + FRAGMENT_OVERHEAD
}

/// Greedy, order-preserving packing into batches of at most `max_bytes`
/// estimated size and `max_blocks` fragments.
///
/// A fragment larger than `max_bytes` on its own is never dropped; it opens a
/// batch of its own and the next fragment rolls over immediately.
pub fn pack(fragments: Vec<TextFragment>, max_bytes: usize, max_blocks: usize) -> Vec<Batch> {
    let max_blocks = max_blocks.max(1);
    let mut batches = Vec::new();
    let mut current = Batch::default();

    for fragment in fragments {
        let size = estimated_size(&fragment);
        if !current.is_empty()
            && (current.size + size > max_bytes || current.len() + 1 > max_blocks)
        {
            batches.push(std::mem::take(&mut current));
        }
        current.push(fragment);
    }

    if !current.is_empty() {
        batches.push(current);
    }
    batches
}
