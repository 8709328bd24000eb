//! where the KnixFS image and the file table live on a sector device
use std::ops::Range;

use crate::utils::fs_size_calculator::{self, fs_region_sectors, table_region_sectors};

use super::MAX_BLOCKS;

pub const DEFAULT_START_SECTOR: u64 = 100;

/// The on-device layout, starting at `start_sector`:
/// - data blocks, block `i` in sector `start_sector + i`
/// - block bitmap
/// - superblock
/// - reserved sectors
/// - file table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub start_sector: u64,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            start_sector: DEFAULT_START_SECTOR,
        }
    }
}

impl Layout {
    pub const fn new(start_sector: u64) -> Self {
        Self { start_sector }
    }

    #[inline]
    pub fn block_sector(&self, block: u32) -> u64 {
        self.start_sector + block as u64
    }

    #[inline]
    pub fn bitmap_sector(&self) -> u64 {
        self.start_sector + MAX_BLOCKS as u64
    }

    #[inline]
    pub fn superblock_sector(&self) -> u64 {
        self.bitmap_sector() + 1
    }

    pub fn fs_region(&self) -> Range<u64> {
        self.start_sector..self.start_sector + fs_region_sectors()
    }

    pub fn table_region(&self) -> Range<u64> {
        let start = self.fs_region().end;
        start..start + table_region_sectors()
    }

    /// first sector past the layout, the device must have at least this many sectors
    pub fn end_sector(&self) -> u64 {
        self.table_region().end
    }

    /// bytes an image file needs to hold this layout
    pub fn image_size(&self) -> u64 {
        fs_size_calculator::image_size(self.start_sector)
    }
}
