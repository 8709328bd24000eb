use super::{sector_range, Sector, SectorDevice, SECTOR_SIZE};

/// a RAM backed sector device, its content is lost on drop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemDisk {
    data: Vec<u8>,
}

impl MemDisk {
    /// create a zeroed disk of `sectors` sectors
    pub fn new(sectors: u64) -> Self {
        Self {
            data: vec![0u8; sectors as usize * SECTOR_SIZE],
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl SectorDevice for MemDisk {
    fn sector_count(&self) -> u64 {
        (self.data.len() / SECTOR_SIZE) as u64
    }

    fn read_sector(&self, index: u64, buf: &mut Sector) -> std::io::Result<()> {
        let range = sector_range(index, self.data.len())?;
        buf.copy_from_slice(&self.data[range]);
        Ok(())
    }

    fn write_sector(&mut self, index: u64, buf: &Sector) -> std::io::Result<()> {
        let range = sector_range(index, self.data.len())?;
        self.data[range].copy_from_slice(buf);
        Ok(())
    }
}
