//! what does KnixFS look like in the memory

use log::{debug, warn};

use crate::{
    device::SectorDevice,
    utils::{fs_size_calculator::blocks_needed, traits::SerializeFixed},
};

use super::{
    content_hash, BlockBitmap, FsError, Inode, Result, SuperBlock, Volume, BLOCK_SIZE,
    MAX_BLOCKS, MAX_DIRECT_BLOCKS, MAX_FILE_SIZE,
};

/// opaque fixed-size storage unit
pub type Block = [u8; BLOCK_SIZE];

/// it has the following layout:
/// - data blocks
/// - block bitmap
/// - superblock
#[derive(Debug, Clone)]
pub struct KnixFs {
    blocks: Vec<Block>,
    bitmap: BlockBitmap,
    superblock: SuperBlock,
}

impl Default for KnixFs {
    fn default() -> Self {
        Self::new()
    }
}

impl KnixFs {
    /// a fresh image with every block free
    pub fn new() -> Self {
        Self {
            blocks: vec![[0u8; BLOCK_SIZE]; MAX_BLOCKS],
            bitmap: BlockBitmap::new(),
            superblock: SuperBlock::new(),
        }
    }

    #[inline]
    pub fn bitmap(&self) -> &BlockBitmap {
        &self.bitmap
    }

    #[inline]
    pub fn superblock(&self) -> &SuperBlock {
        &self.superblock
    }

    #[inline]
    pub(crate) fn superblock_mut(&mut self) -> &mut SuperBlock {
        &mut self.superblock
    }

    #[inline]
    pub(crate) fn bitmap_mut(&mut self) -> &mut BlockBitmap {
        &mut self.bitmap
    }

    #[inline]
    pub fn free_blocks(&self) -> usize {
        self.bitmap.free_count()
    }

    #[inline]
    pub fn used_blocks(&self) -> usize {
        self.bitmap.used_count()
    }
}

/// block allocation
impl KnixFs {
    pub fn allocate(&mut self, n: usize) -> Result<Vec<u32>> {
        self.bitmap.allocate(n)
    }

    pub fn release(&mut self, blocks: &[u32]) {
        self.bitmap.free(blocks)
    }

    /// return the blocks of `inode` to the pool without persisting
    pub(crate) fn release_inode(&mut self, inode: &mut Inode) {
        let blocks = inode.truncate();
        self.release(&blocks);
    }
}

/// [Inode] read, write and free
impl KnixFs {
    /// Store `data` in freshly allocated blocks and persist the image.
    ///
    /// The blocks `inode` held before are not looked at, callers free them first.
    /// If persisting fails the allocation stays in memory.
    pub(crate) fn write<D: SectorDevice>(
        &mut self,
        volume: &mut Volume<D>,
        inode: &mut Inode,
        data: &[u8],
    ) -> Result<()> {
        if data.len() > MAX_FILE_SIZE {
            return Err(FsError::TooLarge);
        }
        let blocks = self.allocate(blocks_needed(data.len()))?;
        for (block, chunk) in blocks.iter().zip(data.chunks(BLOCK_SIZE)) {
            self.blocks[*block as usize][..chunk.len()].copy_from_slice(chunk);
        }

        inode.blocks = [0u32; MAX_DIRECT_BLOCKS];
        inode.blocks[..blocks.len()].copy_from_slice(&blocks);
        inode.size = data.len() as u32;
        inode.hash = content_hash(data);
        debug!(
            "wrote {} bytes into blocks {blocks:?}, hash {:#010x}",
            inode.size, inode.hash
        );

        self.save(volume)
    }

    /// copy the content of `inode` into `out`
    /// # Return
    /// the number of bytes copied, always the inode size
    pub fn read(&self, inode: &Inode, out: &mut [u8]) -> Result<usize> {
        let size = inode.size as usize;
        if out.len() < size {
            return Err(FsError::BufferTooSmall {
                needed: size,
                capacity: out.len(),
            });
        }
        if size > MAX_FILE_SIZE {
            return Err(FsError::Corrupt(format!(
                "inode claims {size} bytes, more than {MAX_FILE_SIZE}"
            )));
        }

        let mut offset = 0;
        for &block in inode.direct_blocks() {
            let data = self
                .blocks
                .get(block as usize)
                .ok_or(FsError::CorruptInode(block))?;
            let to_copy = (size - offset).min(BLOCK_SIZE);
            out[offset..offset + to_copy].copy_from_slice(&data[..to_copy]);
            offset += to_copy;
        }
        Ok(size)
    }

    pub fn read_to_vec(&self, inode: &Inode) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; inode.size as usize];
        self.read(inode, &mut buf)?;
        Ok(buf)
    }

    /// release the blocks of `inode`, zero its size and hash, persist the image
    pub(crate) fn free<D: SectorDevice>(
        &mut self,
        volume: &mut Volume<D>,
        inode: &mut Inode,
    ) -> Result<()> {
        debug!("freeing blocks {:?}", inode.direct_blocks());
        self.release_inode(inode);
        self.save(volume)
    }
}

/// persistence
impl KnixFs {
    /// write the whole image: every block, the bitmap and the superblock
    pub(crate) fn save<D: SectorDevice>(&mut self, volume: &mut Volume<D>) -> Result<()> {
        let layout = *volume.layout();
        for (i, block) in self.blocks.iter().enumerate() {
            volume.write_sector(layout.block_sector(i as u32), block)?;
        }
        self.save_bitmap(volume)?;
        self.save_superblock(volume)?;
        volume.flush()
    }

    /// write the bitmap sector only, without flushing
    pub(crate) fn save_bitmap<D: SectorDevice>(&self, volume: &mut Volume<D>) -> Result<()> {
        let bitmap_sector = volume.layout().bitmap_sector();
        volume.write_region(bitmap_sector, self.bitmap.as_raw_slice())
    }

    /// write the superblock sector only, without flushing,
    /// its free count is taken from the bitmap
    pub(crate) fn save_superblock<D: SectorDevice>(
        &mut self,
        volume: &mut Volume<D>,
    ) -> Result<()> {
        self.superblock.free_blocks = self.bitmap.free_count() as u32;
        let superblock = self.superblock.encode()?;
        let superblock_sector = volume.layout().superblock_sector();
        volume.write_region(superblock_sector, &superblock)
    }

    /// Read the image back.
    ///
    /// A free count disagreeing with the bitmap is left by a save that stopped
    /// between the two sectors; the bitmap wins.
    /// # Return
    /// `None` if the device holds no KnixFS superblock
    pub(crate) fn load<D: SectorDevice>(volume: &Volume<D>) -> Result<Option<Self>> {
        let layout = *volume.layout();
        let (mut superblock, _) =
            SuperBlock::decode(&volume.read_sector(layout.superblock_sector())?)?;
        if !superblock.is_formatted() {
            return Ok(None);
        }
        superblock.check_geometry()?;

        let bitmap = BlockBitmap::from_raw(&volume.read_sector(layout.bitmap_sector())?)?;
        if bitmap.free_count() != superblock.free_blocks as usize {
            warn!(
                "superblock counts {} free blocks, bitmap has {}, using the bitmap",
                superblock.free_blocks,
                bitmap.free_count()
            );
            superblock.free_blocks = bitmap.free_count() as u32;
        }

        let mut blocks = Vec::with_capacity(MAX_BLOCKS);
        for i in 0..MAX_BLOCKS {
            blocks.push(volume.read_sector(layout.block_sector(i as u32))?);
        }
        Ok(Some(Self {
            blocks,
            bitmap,
            superblock,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{device::MemDisk, fs::Layout};

    fn volume() -> Volume<MemDisk> {
        let layout = Layout::new(0);
        Volume::new(MemDisk::new(layout.end_sector()), layout).unwrap()
    }

    #[test]
    fn test_write_and_read_across_blocks() {
        let mut volume = volume();
        let mut fs = KnixFs::new();
        let mut inode = Inode::default();
        let data: Vec<u8> = (0..1500u32).map(|i| (i % 251) as u8).collect();

        fs.write(&mut volume, &mut inode, &data).unwrap();
        assert_eq!(inode.size, 1500);
        assert_eq!(inode.direct_blocks(), &[0, 1, 2]);
        assert_eq!(inode.hash, content_hash(&data));
        assert_eq!(fs.used_blocks(), 3);

        let mut out = vec![0u8; MAX_FILE_SIZE];
        assert_eq!(fs.read(&inode, &mut out).unwrap(), 1500);
        assert_eq!(&out[..1500], data.as_slice());
        assert_eq!(fs.read_to_vec(&inode).unwrap(), data);
    }

    #[test]
    fn test_write_persists_blocks_to_device() {
        let mut volume = volume();
        let mut fs = KnixFs::new();
        let mut inode = Inode::default();
        fs.write(&mut volume, &mut inode, b"on disk").unwrap();

        let sector = volume.read_sector(volume.layout().block_sector(inode.blocks[0])).unwrap();
        assert_eq!(&sector[..7], b"on disk");
    }

    #[test]
    fn test_empty_content_takes_no_blocks() {
        let mut volume = volume();
        let mut fs = KnixFs::new();
        let mut inode = Inode::default();
        fs.write(&mut volume, &mut inode, b"").unwrap();
        assert_eq!(inode.size, 0);
        assert_eq!(inode.hash, 5381);
        assert_eq!(fs.used_blocks(), 0);
        assert!(fs.read_to_vec(&inode).unwrap().is_empty());
    }

    #[test]
    fn test_write_too_large() {
        let mut volume = volume();
        let mut fs = KnixFs::new();
        let mut inode = Inode::default();
        let err = fs
            .write(&mut volume, &mut inode, &vec![1u8; MAX_FILE_SIZE + 1])
            .unwrap_err();
        assert!(matches!(err, FsError::TooLarge));
        assert_eq!(fs.used_blocks(), 0);

        fs.write(&mut volume, &mut inode, &vec![1u8; MAX_FILE_SIZE])
            .unwrap();
        assert_eq!(inode.block_count(), MAX_DIRECT_BLOCKS);
    }

    #[test]
    fn test_read_buffer_too_small() {
        let mut volume = volume();
        let mut fs = KnixFs::new();
        let mut inode = Inode::default();
        fs.write(&mut volume, &mut inode, b"hello").unwrap();
        let mut out = [0u8; 4];
        assert!(matches!(
            fs.read(&inode, &mut out),
            Err(FsError::BufferTooSmall {
                needed: 5,
                capacity: 4
            })
        ));
    }

    #[test]
    fn test_read_out_of_range_block_is_an_error() {
        let fs = KnixFs::new();
        let mut inode = Inode {
            size: 600,
            ..Inode::default()
        };
        inode.blocks[1] = MAX_BLOCKS as u32;
        let mut out = vec![0u8; 600];
        assert!(matches!(
            fs.read(&inode, &mut out),
            Err(FsError::CorruptInode(1024))
        ));
    }

    #[test]
    fn test_free_releases_blocks() {
        let mut volume = volume();
        let mut fs = KnixFs::new();
        let mut first = Inode::default();
        let mut second = Inode::default();
        fs.write(&mut volume, &mut first, &[1u8; 1024]).unwrap();
        fs.write(&mut volume, &mut second, &[2u8; 10]).unwrap();
        assert_eq!(second.direct_blocks(), &[2]);

        fs.free(&mut volume, &mut first).unwrap();
        assert_eq!(first, Inode::default());
        assert!(fs.bitmap().is_free(0) && fs.bitmap().is_free(1));
        assert!(!fs.bitmap().is_free(2));

        // freed blocks are reused first
        let mut third = Inode::default();
        fs.write(&mut volume, &mut third, &[3u8; 700]).unwrap();
        assert_eq!(third.direct_blocks(), &[0, 1]);
        assert_eq!(fs.read_to_vec(&second).unwrap(), vec![2u8; 10]);
    }

    #[test]
    fn test_save_and_load() {
        let mut volume = volume();
        assert!(KnixFs::load(&volume).unwrap().is_none());

        let mut fs = KnixFs::new();
        let mut inode = Inode::default();
        fs.write(&mut volume, &mut inode, b"persisted").unwrap();

        let loaded = KnixFs::load(&volume).unwrap().expect("image was saved");
        assert_eq!(loaded.bitmap(), fs.bitmap());
        assert_eq!(loaded.superblock().free_blocks as usize, MAX_BLOCKS - 1);
        assert_eq!(loaded.read_to_vec(&inode).unwrap(), b"persisted");
    }

    #[test]
    fn test_load_trusts_bitmap_over_free_count() {
        let mut volume = volume();
        let mut fs = KnixFs::new();
        fs.save(&mut volume).unwrap();

        // mark block 0 used behind the superblock's back
        let bitmap_sector = volume.layout().bitmap_sector();
        let mut sector = volume.read_sector(bitmap_sector).unwrap();
        sector[0] = 1;
        volume.write_sector(bitmap_sector, &sector).unwrap();

        let loaded = KnixFs::load(&volume).unwrap().expect("image was saved");
        assert_eq!(loaded.free_blocks(), MAX_BLOCKS - 1);
        assert_eq!(loaded.superblock().free_blocks as usize, MAX_BLOCKS - 1);
    }

    #[test]
    fn test_save_superblock_leaves_blocks_alone() {
        let mut volume = volume();
        let mut fs = KnixFs::new();
        let mut inode = Inode::default();
        fs.write(&mut volume, &mut inode, b"data").unwrap();

        // an in-memory change a full save would persist
        fs.blocks[0][0] = b'X';
        fs.superblock_mut().mounted_at += 1;
        fs.save_superblock(&mut volume).unwrap();

        let loaded = KnixFs::load(&volume).unwrap().expect("image was saved");
        assert_eq!(loaded.superblock(), fs.superblock());
        assert_eq!(loaded.read_to_vec(&inode).unwrap(), b"data");
    }
}
