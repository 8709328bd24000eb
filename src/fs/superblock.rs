use serde::{Deserialize, Serialize};

use crate::utils::{time_util, traits::SerializeFixed};

use super::{FsError, Result, BLOCK_SIZE, FS_MAGIC, FS_VERSION, MAX_BLOCKS, MAX_FILES};

/// The superblock of a KnixFS image, stored right after the block bitmap
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SuperBlock {
    /// magic number, zero on a blank device
    pub magic: u32,
    pub version: u16,
    /// data block size
    pub block_size: u32,
    pub block_count: u32,
    pub max_files: u32,
    /// must agree with the block bitmap
    pub free_blocks: u32,
    /// seconds since the unix epoch
    pub formatted_at: u64,
    pub mounted_at: u64,
}

impl SuperBlock {
    pub fn new() -> Self {
        let now = time_util::now();
        Self {
            magic: FS_MAGIC,
            version: FS_VERSION,
            block_size: BLOCK_SIZE as u32,
            block_count: MAX_BLOCKS as u32,
            max_files: MAX_FILES as u32,
            free_blocks: MAX_BLOCKS as u32,
            formatted_at: now,
            mounted_at: now,
        }
    }

    /// whether this sector holds a KnixFS superblock at all
    pub fn is_formatted(&self) -> bool {
        self.magic == FS_MAGIC
    }

    /// check the image was made with the geometry this build uses
    pub fn check_geometry(&self) -> Result<()> {
        if self.version != FS_VERSION
            || self.block_size != BLOCK_SIZE as u32
            || self.block_count != MAX_BLOCKS as u32
            || self.max_files != MAX_FILES as u32
        {
            return Err(FsError::Corrupt(format!(
                "unsupported image: version {}, {} blocks of {} bytes, {} files",
                self.version, self.block_count, self.block_size, self.max_files
            )));
        }
        Ok(())
    }

    pub fn update_mounted_at(&mut self) {
        self.mounted_at = time_util::now();
    }
}

impl SerializeFixed for SuperBlock {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_superblock_fits_in_a_sector() {
        let superblock = SuperBlock::new();
        let bytes = superblock.encode().unwrap();
        assert_eq!(bytes.len(), 38);
        assert!(bytes.len() <= BLOCK_SIZE);
        assert_eq!(&bytes[..4], &FS_MAGIC.to_le_bytes());

        let mut sector = bytes.clone();
        sector.resize(BLOCK_SIZE, 0);
        let (decoded, _) = SuperBlock::decode(&sector).unwrap();
        assert_eq!(decoded, superblock);
        assert!(decoded.is_formatted());
        assert!(decoded.check_geometry().is_ok());
    }

    #[test]
    fn test_blank_sector_is_not_formatted() {
        let (superblock, _) = SuperBlock::decode(&[0u8; BLOCK_SIZE]).unwrap();
        assert!(!superblock.is_formatted());
    }

    #[test]
    fn test_foreign_geometry_is_rejected() {
        let superblock = SuperBlock {
            block_count: 2048,
            ..SuperBlock::new()
        };
        assert!(matches!(
            superblock.check_geometry(),
            Err(FsError::Corrupt(_))
        ));
    }
}
