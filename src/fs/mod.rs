//! the KnixFS storage engine
pub mod block_bitmap;
pub mod error;
pub mod file_service;
pub mod file_table;
pub mod inode;
pub mod knixfs;
pub mod layout;
pub mod shared;
pub mod superblock;
mod volume;
pub use block_bitmap::*;
pub use error::*;
pub use file_service::*;
pub use file_table::*;
pub use inode::*;
pub use knixfs::*;
pub use layout::*;
pub use shared::*;
pub use superblock::*;
pub(crate) use volume::*;

const FS_MAGIC: u32 = 0x4B4E_4958;
const FS_VERSION: u16 = 1;
/// size of a block, equal to one device sector
pub const BLOCK_SIZE: usize = 512;
/// number of blocks in the pool
pub const MAX_BLOCKS: usize = 1024;
/// direct block pointers per inode, there is no indirection
pub const MAX_DIRECT_BLOCKS: usize = 10;
/// the hard per-file content ceiling
pub const MAX_FILE_SIZE: usize = BLOCK_SIZE * MAX_DIRECT_BLOCKS;
/// slots in the file table
pub const MAX_FILES: usize = 16;
/// stored name field, including the terminating NUL
pub const MAX_FILENAME_LEN: usize = 32;
pub const DEFAULT_MODE: u32 = 644;
pub const DEFAULT_OWNER: u32 = 0;
