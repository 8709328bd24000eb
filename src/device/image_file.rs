use std::{fs::OpenOptions, path::Path};

use memmap2::MmapMut;

use super::{sector_range, Sector, SectorDevice, SECTOR_SIZE};

/// A disk image file used as a sector device.
///
/// The whole file is memory mapped, [flush](SectorDevice::flush) syncs it back.
#[derive(Debug)]
pub struct ImageFile {
    mmap: MmapMut,
}

impl ImageFile {
    /// map an existing image file for read and write
    pub fn open<P>(image_path: P) -> std::io::Result<Self>
    where
        P: AsRef<Path>,
    {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(image_path.as_ref())?;
        if file.metadata()?.len() < SECTOR_SIZE as u64 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "{} is smaller than one sector",
                    image_path.as_ref().display()
                ),
            ));
        }
        // Safety
        // the mapping is only valid while no other process resizes the image,
        // the image is owned by this program for as long as the device lives.
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        Ok(Self { mmap })
    }

    /// create a new zero filled image of `len` bytes, failing if it exists
    pub fn create<P>(image_path: P, len: u64) -> std::io::Result<Self>
    where
        P: AsRef<Path>,
    {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(image_path.as_ref())?;
        // all other region are set to zero by `set_len`
        file.set_len(len)?;
        drop(file);
        Self::open(image_path)
    }
}

impl SectorDevice for ImageFile {
    fn sector_count(&self) -> u64 {
        (self.mmap.len() / SECTOR_SIZE) as u64
    }

    fn read_sector(&self, index: u64, buf: &mut Sector) -> std::io::Result<()> {
        let range = sector_range(index, self.mmap.len())?;
        buf.copy_from_slice(&self.mmap[range]);
        Ok(())
    }

    fn write_sector(&mut self, index: u64, buf: &Sector) -> std::io::Result<()> {
        let range = sector_range(index, self.mmap.len())?;
        self.mmap[range].copy_from_slice(buf);
        Ok(())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.mmap.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_file_persists_sectors() {
        let dir = tempfile::tempdir().expect("create temp dir failed");
        let path = dir.path().join("disk.img");

        let mut image = ImageFile::create(&path, 8 * SECTOR_SIZE as u64).unwrap();
        assert_eq!(image.sector_count(), 8);
        image.write_sector(5, &[0xAB; SECTOR_SIZE]).unwrap();
        image.flush().unwrap();
        drop(image);

        let raw = std::fs::read(&path).unwrap();
        assert_eq!(raw.len(), 8 * SECTOR_SIZE);
        assert!(raw[5 * SECTOR_SIZE..6 * SECTOR_SIZE].iter().all(|b| *b == 0xAB));

        let image = ImageFile::open(&path).unwrap();
        let mut buf = [0u8; SECTOR_SIZE];
        image.read_sector(5, &mut buf).unwrap();
        assert_eq!(buf, [0xAB; SECTOR_SIZE]);
        assert!(image.read_sector(8, &mut buf).is_err());
    }

    #[test]
    fn test_create_refuses_existing_image() {
        let dir = tempfile::tempdir().expect("create temp dir failed");
        let path = dir.path().join("disk.img");
        ImageFile::create(&path, SECTOR_SIZE as u64).unwrap();
        let err = ImageFile::create(&path, SECTOR_SIZE as u64).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::AlreadyExists);
    }

    #[test]
    fn test_open_rejects_empty_image() {
        let dir = tempfile::tempdir().expect("create temp dir failed");
        let path = dir.path().join("empty.img");
        std::fs::File::create(&path).unwrap();
        assert!(ImageFile::open(&path).is_err());
    }
}
