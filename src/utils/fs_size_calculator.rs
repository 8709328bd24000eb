//! This module contains functions to calculate the size of different KnixFS regions

use crate::{
    device::SECTOR_SIZE,
    fs::{BLOCK_SIZE, MAX_BLOCKS, MAX_FILES},
};

/// sectors after the data blocks holding the bitmap, the superblock and reserved space
pub const FS_METADATA_SECTORS: u64 = 8;
/// encoded size of one file table entry
pub const FILE_ENTRY_SIZE: usize = 89;

/// calculate how many blocks a content of `len` bytes occupies
/// # Example
/// ```
/// use knixfs::utils::fs_size_calculator::blocks_needed;
/// assert_eq!(blocks_needed(0), 0);
/// assert_eq!(blocks_needed(1), 1);
/// assert_eq!(blocks_needed(512), 1);
/// assert_eq!(blocks_needed(513), 2);
/// ```
pub const fn blocks_needed(len: usize) -> usize {
    len.div_ceil(BLOCK_SIZE)
}

/// calculate needed bitmap size in bytes
/// # Example
/// ```
/// use knixfs::utils::fs_size_calculator::bitmap_size;
/// assert_eq!(bitmap_size(1024), 128);
/// assert_eq!(bitmap_size(100), 13);
/// ```
pub const fn bitmap_size(element_count: usize) -> usize {
    element_count.div_ceil(8)
}

/// calculate how many sectors hold `bytes` bytes
pub const fn sectors_for(bytes: usize) -> u64 {
    bytes.div_ceil(SECTOR_SIZE) as u64
}

/// calculate the KnixFS region size in sectors:
/// one sector per block plus the metadata sectors
/// # Example
/// ```
/// use knixfs::utils::fs_size_calculator::fs_region_sectors;
/// assert_eq!(fs_region_sectors(), 1032);
/// ```
pub const fn fs_region_sectors() -> u64 {
    MAX_BLOCKS as u64 + FS_METADATA_SECTORS
}

/// calculate the file table region size in sectors
/// # Example
/// ```
/// use knixfs::utils::fs_size_calculator::table_region_sectors;
/// assert_eq!(table_region_sectors(), 3);
/// ```
pub const fn table_region_sectors() -> u64 {
    sectors_for(MAX_FILES * FILE_ENTRY_SIZE)
}

/// calculate the image size in bytes when the KnixFS region starts at `start_sector`
/// # Example
/// ```
/// use knixfs::utils::fs_size_calculator::image_size;
/// assert_eq!(image_size(0), 1035 * 512);
/// assert_eq!(image_size(100), 1135 * 512);
/// ```
pub const fn image_size(start_sector: u64) -> u64 {
    (start_sector + fs_region_sectors() + table_region_sectors()) * SECTOR_SIZE as u64
}
