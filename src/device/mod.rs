//! the raw sector devices KnixFS is persisted on
mod image_file;
mod mem_disk;
pub use image_file::ImageFile;
pub use mem_disk::MemDisk;

use crate::fs::BLOCK_SIZE;

/// one sector is exactly one block
pub const SECTOR_SIZE: usize = BLOCK_SIZE;
pub type Sector = [u8; SECTOR_SIZE];

/// A device addressed in fixed-size sectors.
///
/// Calls are synchronous; a failure is reported once and never retried.
pub trait SectorDevice {
    /// number of addressable sectors
    fn sector_count(&self) -> u64;

    fn read_sector(&self, index: u64, buf: &mut Sector) -> std::io::Result<()>;

    fn write_sector(&mut self, index: u64, buf: &Sector) -> std::io::Result<()>;

    /// push buffered writes to stable storage
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<T: SectorDevice + ?Sized> SectorDevice for Box<T> {
    fn sector_count(&self) -> u64 {
        (**self).sector_count()
    }

    fn read_sector(&self, index: u64, buf: &mut Sector) -> std::io::Result<()> {
        (**self).read_sector(index, buf)
    }

    fn write_sector(&mut self, index: u64, buf: &Sector) -> std::io::Result<()> {
        (**self).write_sector(index, buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        (**self).flush()
    }
}

/// byte range of sector `index` inside a flat buffer of `len` bytes
pub(crate) fn sector_range(index: u64, len: usize) -> std::io::Result<std::ops::Range<usize>> {
    let sector_count = (len / SECTOR_SIZE) as u64;
    if index >= sector_count {
        return Err(crate::fs::sector_out_of_range(index, sector_count));
    }
    let start = index as usize * SECTOR_SIZE;
    Ok(start..start + SECTOR_SIZE)
}
