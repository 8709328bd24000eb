//! name based operations over a KnixFS image and its file table
use log::{info, warn};

use crate::device::SectorDevice;

use super::{
    FileStat, FileTable, FsError, KnixFs, Layout, Result, SlotId, SuperBlock, Volume,
    DEFAULT_MODE, DEFAULT_OWNER, MAX_BLOCKS, MAX_FILE_SIZE,
};

/// A mounted store: the device, the KnixFS image and the file table.
///
/// Every operation runs to completion under `&mut self`, leaving both
/// persisted images self-consistent or reporting an error.
/// See [SharedFileService](super::SharedFileService) for use across threads.
#[derive(Debug)]
pub struct FileService<D> {
    volume: Volume<D>,
    fs: KnixFs,
    table: FileTable,
}

/// mount and format
impl<D: SectorDevice> FileService<D> {
    /// write a fresh, empty store to `device`
    pub fn format(device: D, layout: Layout) -> Result<Self> {
        let volume = Volume::new(device, layout)?;
        Self::format_volume(volume)
    }

    /// Load the store on `device`.
    ///
    /// A device without a KnixFS superblock is formatted.
    pub fn mount(device: D, layout: Layout) -> Result<Self> {
        let volume = Volume::new(device, layout)?;
        match KnixFs::load(&volume)? {
            Some(fs) => Self::load_volume(volume, fs),
            None => {
                info!(
                    "no KnixFS image at sector {}, formatting a new one",
                    layout.start_sector
                );
                Self::format_volume(volume)
            }
        }
    }

    /// Load the store on `device`, never formatting it.
    pub fn open(device: D, layout: Layout) -> Result<Self> {
        let volume = Volume::new(device, layout)?;
        match KnixFs::load(&volume)? {
            Some(fs) => Self::load_volume(volume, fs),
            None => Err(FsError::Corrupt(format!(
                "no KnixFS image at sector {}",
                layout.start_sector
            ))),
        }
    }

    fn format_volume(mut volume: Volume<D>) -> Result<Self> {
        let mut fs = KnixFs::new();
        let table = FileTable::new();
        fs.save(&mut volume)?;
        table.save(&mut volume)?;
        info!(
            "formatted KnixFS: {MAX_BLOCKS} blocks, file table at sector {}",
            volume.layout().table_region().start
        );
        Ok(Self { volume, fs, table })
    }

    fn load_volume(mut volume: Volume<D>, mut fs: KnixFs) -> Result<Self> {
        let table = FileTable::load(&volume)?;
        if reconcile_blocks(&mut fs, &table)? {
            fs.save_bitmap(&mut volume)?;
        }
        fs.superblock_mut().update_mounted_at();
        fs.save_superblock(&mut volume)?;
        volume.flush()?;
        info!(
            "mounted KnixFS: {} files, {} free blocks",
            table.len(),
            fs.free_blocks()
        );
        Ok(Self { volume, fs, table })
    }

    pub fn layout(&self) -> &Layout {
        self.volume.layout()
    }

    pub fn superblock(&self) -> &SuperBlock {
        self.fs.superblock()
    }

    pub fn knixfs(&self) -> &KnixFs {
        &self.fs
    }

    pub fn file_table(&self) -> &FileTable {
        &self.table
    }

    pub fn device(&self) -> &D {
        self.volume.device()
    }

    /// unmount, handing the device back
    pub fn into_device(self) -> D {
        self.volume.into_device()
    }
}

/// read only accessors
impl<D: SectorDevice> FileService<D> {
    pub fn find(&self, name: &str) -> Result<SlotId> {
        self.table.find(name)
    }

    /// copy the content of `name` into `out`
    /// # Return
    /// the number of bytes copied
    pub fn read(&self, name: &str, out: &mut [u8]) -> Result<usize> {
        let slot = self.table.find(name)?;
        self.fs.read(&self.table.entry(slot).inode, out)
    }

    pub fn read_to_vec(&self, name: &str) -> Result<Vec<u8>> {
        let slot = self.table.find(name)?;
        self.fs.read_to_vec(&self.table.entry(slot).inode)
    }

    pub fn stat(&self, name: &str) -> Result<FileStat> {
        let slot = self.table.find(name)?;
        Ok(self.table.entry(slot).stat(slot))
    }

    /// every in-use entry in slot order
    pub fn list(&self) -> Vec<FileStat> {
        self.table
            .in_use()
            .map(|(slot, entry)| entry.stat(slot))
            .collect()
    }

    /// in-use names containing `pattern`, an empty pattern matches all
    pub fn find_matching(&self, pattern: &str) -> Vec<String> {
        self.table
            .in_use()
            .map(|(_, entry)| entry.name())
            .filter(|name| name.contains(pattern))
            .collect()
    }

    pub fn free_blocks(&self) -> usize {
        self.fs.free_blocks()
    }

    pub fn used_blocks(&self) -> usize {
        self.fs.used_blocks()
    }
}

/// mutating operations
impl<D: SectorDevice> FileService<D> {
    /// create `name` holding `data`
    /// # Return
    /// the slot the file was stored in
    pub fn create(&mut self, name: &str, data: &[u8]) -> Result<SlotId> {
        if self.table.contains(name) {
            return Err(FsError::AlreadyExists);
        }
        let slot = self.table.free_slot()?;

        let entry = self.table.entry_mut(slot);
        entry.in_use = true;
        entry.set_name(name);
        entry.mode = DEFAULT_MODE;
        entry.owner = DEFAULT_OWNER;
        if let Err(e) = self.fs.write(&mut self.volume, &mut entry.inode, data) {
            // hand back the slot and whatever the failed write claimed
            warn!("create({name}) failed, releasing slot {slot}: {e}");
            self.fs.release_inode(&mut entry.inode);
            entry.in_use = false;
            return Err(e);
        }

        self.table.save(&mut self.volume)?;
        info!("created {name} in slot {slot}, {} bytes", data.len());
        Ok(slot)
    }

    /// create an empty file
    pub fn touch(&mut self, name: &str) -> Result<SlotId> {
        self.create(name, &[])
    }

    /// replace the content of `name`
    pub fn update(&mut self, name: &str, data: &[u8]) -> Result<()> {
        let slot = self.table.find(name)?;
        if data.len() > MAX_FILE_SIZE {
            return Err(FsError::TooLarge);
        }

        let entry = self.table.entry_mut(slot);
        self.fs.free(&mut self.volume, &mut entry.inode)?;
        if let Err(e) = self.fs.write(&mut self.volume, &mut entry.inode, data) {
            // the old blocks are gone, leave the file empty
            warn!("update({name}) failed, {name} is now empty: {e}");
            self.fs.release_inode(&mut entry.inode);
            self.table.save(&mut self.volume)?;
            return Err(e);
        }
        self.table.save(&mut self.volume)?;
        info!("updated {name}, {} bytes", data.len());
        Ok(())
    }

    pub fn delete(&mut self, name: &str) -> Result<()> {
        let slot = self.table.find(name)?;
        let entry = self.table.entry_mut(slot);
        self.fs.free(&mut self.volume, &mut entry.inode)?;
        entry.in_use = false;
        self.table.save(&mut self.volume)?;
        info!("deleted {name} from slot {slot}");
        Ok(())
    }

    /// create `dst` with a copy of the content of `src` in its own blocks
    pub fn copy(&mut self, src: &str, dst: &str) -> Result<SlotId> {
        let slot = self.table.find(src)?;
        let mut buffer = [0u8; MAX_FILE_SIZE];
        let size = self.fs.read(&self.table.entry(slot).inode, &mut buffer)?;
        self.create(dst, &buffer[..size])
    }

    pub fn rename(&mut self, src: &str, dst: &str) -> Result<()> {
        let slot = self.table.find(src)?;
        if self.table.contains(dst) {
            return Err(FsError::AlreadyExists);
        }
        self.table.entry_mut(slot).set_name(dst);
        self.table.save(&mut self.volume)?;
        info!("renamed {src} to {dst}");
        Ok(())
    }

    /// add `data` to the end of `name`
    pub fn append(&mut self, name: &str, data: &[u8]) -> Result<()> {
        let slot = self.table.find(name)?;
        let mut buffer = [0u8; MAX_FILE_SIZE];
        let old_size = self.fs.read(&self.table.entry(slot).inode, &mut buffer)?;
        let new_size = old_size + data.len();
        if new_size > MAX_FILE_SIZE {
            return Err(FsError::TooLarge);
        }
        buffer[old_size..new_size].copy_from_slice(data);
        self.update(name, &buffer[..new_size])
    }

    pub fn chmod(&mut self, name: &str, mode: u32) -> Result<()> {
        let slot = self.table.find(name)?;
        self.table.entry_mut(slot).mode = mode;
        self.table.save(&mut self.volume)
    }

    pub fn chown(&mut self, name: &str, owner: u32) -> Result<()> {
        let slot = self.table.find(name)?;
        self.table.entry_mut(slot).owner = owner;
        self.table.save(&mut self.volume)
    }
}

/// Rebuild the bitmap from the blocks in-use entries list.
///
/// A save that stopped between the KnixFS image and the file table leaves
/// listed blocks marked free or unlisted blocks marked used; both are
/// repaired. Out-of-range or shared blocks cannot come from that and fail.
/// # Return
/// whether the bitmap changed
fn reconcile_blocks(fs: &mut KnixFs, table: &FileTable) -> Result<bool> {
    let mut listed = vec![false; MAX_BLOCKS];
    for (slot, entry) in table.in_use() {
        if entry.inode.size as usize > MAX_FILE_SIZE {
            return Err(FsError::Corrupt(format!(
                "slot {slot} claims {} bytes",
                entry.inode.size
            )));
        }
        for &block in entry.inode.direct_blocks() {
            let i = block as usize;
            if i >= MAX_BLOCKS {
                return Err(FsError::CorruptInode(block));
            }
            if std::mem::replace(&mut listed[i], true) {
                return Err(FsError::Corrupt(format!(
                    "block {block} is listed by more than one file"
                )));
            }
        }
    }

    let mut repaired = false;
    for (i, &used) in listed.iter().enumerate() {
        if fs.bitmap().is_free(i) == used {
            if used {
                warn!("block {i} belongs to a file but was marked free, reclaiming it");
            } else {
                warn!("block {i} belongs to no file but was marked used, freeing it");
            }
            fs.bitmap_mut().mark(i as u32, used);
            repaired = true;
        }
    }
    Ok(repaired)
}
