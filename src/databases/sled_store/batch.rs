use crate::error::DatastoneResult;

/// Batch of removals applied to one collection in a single step.
///
/// sled applies a batch atomically, so a commit either removes every queued
/// key or none of them.
pub struct SledDeleteBatch {
    tree: sled::Tree,
    batch: sled::Batch,
    len: usize,
}

impl SledDeleteBatch {
    pub(crate) fn new(tree: sled::Tree) -> Self {
        Self {
            tree,
            batch: sled::Batch::default(),
            len: 0,
        }
    }

    pub fn remove(&mut self, tree_key: [u8; 8]) {
        self.batch.remove(&tree_key[..]);
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Apply the batch and return the number of queued removals.
    pub fn commit(self) -> DatastoneResult<usize> {
        if self.len > 0 {
            self.tree.apply_batch(self.batch)?;
        }
        Ok(self.len)
    }
}
