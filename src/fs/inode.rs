use serde::{Deserialize, Serialize};

use crate::utils::fs_size_calculator::blocks_needed;

use super::MAX_DIRECT_BLOCKS;

/// per-file metadata: content size, direct block list and content hash
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Inode {
    /// content size in bytes
    pub size: u32,
    /// direct block pointers, only the first [Inode::block_count] are meaningful
    pub blocks: [u32; MAX_DIRECT_BLOCKS],
    /// [content_hash] of the content, computed on write and never verified
    pub hash: u32,
}

impl Inode {
    /// number of blocks the content occupies
    pub fn block_count(&self) -> usize {
        blocks_needed(self.size as usize).min(MAX_DIRECT_BLOCKS)
    }

    /// the meaningful part of the direct block list, in content order
    pub fn direct_blocks(&self) -> &[u32] {
        &self.blocks[..self.block_count()]
    }

    /// reset size, hash and block list
    /// # Return
    /// the blocks this inode held
    pub fn truncate(&mut self) -> Vec<u32> {
        let blocks = self.direct_blocks().to_vec();
        *self = Inode::default();
        blocks
    }
}

/// djb2: `h = 5381; h = h * 33 + b` with 32-bit wraparound
pub fn content_hash(data: &[u8]) -> u32 {
    data.iter().fold(5381u32, |h, b| {
        (h << 5).wrapping_add(h).wrapping_add(*b as u32)
    })
}
