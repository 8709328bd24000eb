use bitvec::prelude::*;
use log::{debug, warn};

use super::{FsError, Result, MAX_BLOCKS};

/// free/used flags for the block pool, a set bit marks a used block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockBitmap {
    bits: BitVec<u8, Lsb0>,
}

impl Default for BlockBitmap {
    fn default() -> Self {
        Self::new()
    }
}

/// for serialize and deserialize
impl BlockBitmap {
    /// a bitmap with every block free
    pub fn new() -> Self {
        Self {
            bits: BitVec::repeat(false, MAX_BLOCKS),
        }
    }

    /// restore a bitmap from its raw bytes, extra bits are ignored
    pub fn from_raw(raw: &[u8]) -> Result<Self> {
        let mut bits = BitVec::<u8, Lsb0>::from_slice(raw);
        if bits.len() < MAX_BLOCKS {
            return Err(FsError::Corrupt(format!(
                "block bitmap has {} bits, expected {MAX_BLOCKS}",
                bits.len()
            )));
        }
        bits.truncate(MAX_BLOCKS);
        Ok(Self { bits })
    }

    pub fn as_raw_slice(&self) -> &[u8] {
        self.bits.as_raw_slice()
    }
}

/// for block allocation
impl BlockBitmap {
    /// check if block `i` is free
    pub fn is_free(&self, i: usize) -> bool {
        self.bits.get(i).as_deref() == Some(&false)
    }

    /// calculate the number of free blocks
    pub fn free_count(&self) -> usize {
        self.bits.count_zeros()
    }

    /// calculate the number of used blocks
    pub fn used_count(&self) -> usize {
        self.bits.count_ones()
    }

    /// claim the first `n` free blocks, scanning from block 0
    /// # Return
    /// the claimed indices in ascending order,
    /// or [FsError::OutOfSpace] with nothing claimed
    pub fn allocate(&mut self, n: usize) -> Result<Vec<u32>> {
        let claimed: Vec<usize> = self.bits.iter_zeros().take(n).collect();
        if claimed.len() < n {
            debug!(
                "allocate({n}) refused, only {} blocks free",
                claimed.len()
            );
            return Err(FsError::OutOfSpace);
        }
        for &i in &claimed {
            self.bits.set(i, true);
        }
        debug!("allocated blocks {claimed:?}");
        Ok(claimed.into_iter().map(|i| i as u32).collect())
    }

    /// set the flag of one block directly, used when repairing a loaded image
    pub(crate) fn mark(&mut self, block: u32, used: bool) {
        let i = block as usize;
        if i < MAX_BLOCKS {
            self.bits.set(i, used);
        }
    }

    /// release blocks back to the pool
    pub fn free(&mut self, blocks: &[u32]) {
        for &block in blocks {
            let i = block as usize;
            if i >= MAX_BLOCKS {
                warn!("ignoring release of block {block}, outside the block pool");
                continue;
            }
            self.bits.set(i, false);
        }
    }
}
