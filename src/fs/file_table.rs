use log::debug;
use serde::{Deserialize, Serialize};

use crate::{device::SectorDevice, utils::traits::SerializeFixed};

use super::{
    FsError, Inode, Result, Volume, DEFAULT_MODE, DEFAULT_OWNER, MAX_FILENAME_LEN, MAX_FILES,
};

/// index of a slot in the file table
pub type SlotId = usize;

/// store `name` the way a slot keeps it:
/// at most 31 bytes, cut at an embedded NUL, NUL padded
pub fn encode_name(name: &str) -> [u8; MAX_FILENAME_LEN] {
    let mut encoded = [0u8; MAX_FILENAME_LEN];
    for (dst, src) in encoded
        .iter_mut()
        .zip(name.bytes().take_while(|b| *b != 0))
        .take(MAX_FILENAME_LEN - 1)
    {
        *dst = src;
    }
    encoded
}

/// one directory slot
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileEntry {
    pub name: [u8; MAX_FILENAME_LEN],
    pub inode: Inode,
    pub in_use: bool,
    pub mode: u32,
    pub owner: u32,
}

impl Default for FileEntry {
    fn default() -> Self {
        Self {
            name: [0u8; MAX_FILENAME_LEN],
            inode: Inode::default(),
            in_use: false,
            mode: DEFAULT_MODE,
            owner: DEFAULT_OWNER,
        }
    }
}

impl FileEntry {
    /// the stored name bytes, without the NUL padding
    pub fn name_bytes(&self) -> &[u8] {
        let len = self
            .name
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(MAX_FILENAME_LEN);
        &self.name[..len]
    }

    pub fn name(&self) -> String {
        String::from_utf8_lossy(self.name_bytes()).into_owned()
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = encode_name(name);
    }

    pub fn stat(&self, slot: SlotId) -> FileStat {
        FileStat {
            slot,
            name: self.name(),
            size: self.inode.size,
            hash: self.inode.hash,
            mode: self.mode,
            owner: self.owner,
            blocks: self.inode.direct_blocks().to_vec(),
        }
    }
}

/// a snapshot of one in-use entry, as reported by `stat` and `ls`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    pub slot: SlotId,
    pub name: String,
    pub size: u32,
    pub hash: u32,
    pub mode: u32,
    pub owner: u32,
    pub blocks: Vec<u32>,
}

/// the bounded directory binding unique names to inodes
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct FileTable {
    entries: [FileEntry; MAX_FILES],
}

impl SerializeFixed for FileTable {}

impl FileTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// the entry in `slot`, in use or not
    pub fn get(&self, slot: SlotId) -> Option<&FileEntry> {
        self.entries.get(slot)
    }

    /// `slot` must come from [find](Self::find) or [free_slot](Self::free_slot)
    pub(crate) fn entry(&self, slot: SlotId) -> &FileEntry {
        &self.entries[slot]
    }

    pub(crate) fn entry_mut(&mut self, slot: SlotId) -> &mut FileEntry {
        &mut self.entries[slot]
    }

    /// first in-use slot named `name`
    pub fn find(&self, name: &str) -> Result<SlotId> {
        let wanted = encode_name(name);
        self.entries
            .iter()
            .position(|e| e.in_use && e.name == wanted)
            .ok_or(FsError::NotFound)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_ok()
    }

    /// lowest free slot
    pub fn free_slot(&self) -> Result<SlotId> {
        self.entries
            .iter()
            .position(|e| !e.in_use)
            .ok_or(FsError::TableFull)
    }

    /// in-use slots in slot order
    pub fn in_use(&self) -> impl Iterator<Item = (SlotId, &FileEntry)> {
        self.entries.iter().enumerate().filter(|(_, e)| e.in_use)
    }

    pub fn len(&self) -> usize {
        self.in_use().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// persistence
impl FileTable {
    pub(crate) fn save<D: SectorDevice>(&self, volume: &mut Volume<D>) -> Result<()> {
        let bytes = self.encode()?;
        let region = volume.layout().table_region();
        debug!("saving file table, {} bytes", bytes.len());
        volume.write_region(region.start, &bytes)?;
        volume.flush()
    }

    pub(crate) fn load<D: SectorDevice>(volume: &Volume<D>) -> Result<Self> {
        let region = volume.layout().table_region();
        let bytes = volume.read_region(region.start, region.end - region.start)?;
        let (table, _) = Self::decode(&bytes)?;
        Ok(table)
    }
}
