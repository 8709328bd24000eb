use log::debug;

use crate::device::{SectorDevice, SECTOR_SIZE};

use super::{FsError, Layout, Result};

/// a sector device together with the layout KnixFS uses on it
#[derive(Debug)]
pub(crate) struct Volume<D> {
    device: D,
    layout: Layout,
}

impl<D: SectorDevice> Volume<D> {
    /// fails if the device is too small to hold `layout`
    pub fn new(device: D, layout: Layout) -> Result<Self> {
        let sector_count = device.sector_count();
        if sector_count < layout.end_sector() {
            return Err(FsError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!(
                    "device has {sector_count} sectors, the layout needs {}",
                    layout.end_sector()
                ),
            )));
        }
        Ok(Self { device, layout })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn into_device(self) -> D {
        self.device
    }

    pub fn read_sector(&self, index: u64) -> Result<[u8; SECTOR_SIZE]> {
        let mut sector = [0u8; SECTOR_SIZE];
        self.device.read_sector(index, &mut sector)?;
        Ok(sector)
    }

    pub fn write_sector(&mut self, index: u64, sector: &[u8; SECTOR_SIZE]) -> Result<()> {
        Ok(self.device.write_sector(index, sector)?)
    }

    /// write `bytes` to consecutive sectors from `start`,
    /// the last sector is padded with zeros
    pub fn write_region(&mut self, start: u64, bytes: &[u8]) -> Result<()> {
        for (i, chunk) in bytes.chunks(SECTOR_SIZE).enumerate() {
            let mut sector = [0u8; SECTOR_SIZE];
            sector[..chunk.len()].copy_from_slice(chunk);
            self.device.write_sector(start + i as u64, &sector)?;
        }
        debug!("wrote {} bytes from sector {start}", bytes.len());
        Ok(())
    }

    /// read `count` consecutive sectors from `start`
    pub fn read_region(&self, start: u64, count: u64) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(count as usize * SECTOR_SIZE);
        for index in start..start + count {
            bytes.extend_from_slice(&self.read_sector(index)?);
        }
        Ok(bytes)
    }

    pub fn flush(&mut self) -> Result<()> {
        Ok(self.device.flush()?)
    }
}
