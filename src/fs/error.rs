use thiserror::Error;

use super::{BLOCK_SIZE, MAX_FILE_SIZE};

/// Every way a File Service call can fail.
/// The core never formats these for users, the command layer does.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("no such file")]
    NotFound,
    #[error("a file with this name already exists")]
    AlreadyExists,
    #[error("the file table is full")]
    TableFull,
    #[error("not enough free blocks")]
    OutOfSpace,
    #[error("content exceeds the {} byte file size limit", MAX_FILE_SIZE)]
    TooLarge,
    #[error("output buffer holds {capacity} bytes but the file needs {needed}")]
    BufferTooSmall { needed: usize, capacity: usize },
    #[error("sector I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("inode references block {0}, outside the block pool")]
    CorruptInode(u32),
    #[error("corrupt image: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, FsError>;

impl From<bincode::error::EncodeError> for FsError {
    fn from(e: bincode::error::EncodeError) -> Self {
        FsError::Corrupt(format!("failed to encode image: {e}"))
    }
}

impl From<bincode::error::DecodeError> for FsError {
    fn from(e: bincode::error::DecodeError) -> Self {
        FsError::Corrupt(format!("failed to decode image: {e}"))
    }
}

/// an I/O error for a sector index the device does not have
pub(crate) fn sector_out_of_range(index: u64, sector_count: u64) -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        format!(
            "sector {index} is out of range, device has {sector_count} sectors of {BLOCK_SIZE} bytes"
        ),
    )
}
