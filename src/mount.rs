//! open an existing image file
use anyhow::Context;
use std::path::Path;

use crate::{
    device::ImageFile,
    fs::{FileService, Layout},
};

/// Open the KnixFS store inside `image_path`.
///
/// Unlike [FileService::mount] this never formats: an image without a
/// store is an error, so a mistyped path or start sector cannot wipe data.
pub fn mount<P>(image_path: P, layout: Layout) -> anyhow::Result<FileService<ImageFile>>
where
    P: AsRef<Path>,
{
    let image_path = image_path.as_ref();
    let device = ImageFile::open(image_path)
        .with_context(|| format!("cannot open image {}", image_path.display()))?;
    FileService::open(device, layout).with_context(|| {
        format!(
            "no usable KnixFS store in {} at sector {}",
            image_path.display(),
            layout.start_sector
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fs::FsError, mkfs::mkfs};

    #[test]
    fn test_mount_keeps_files() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("fs.img");
        let layout = Layout::new(8);

        let mut fs = mkfs(&image, layout).unwrap();
        fs.create("kept", b"across mounts").unwrap();
        drop(fs);

        let fs = mount(&image, layout).unwrap();
        assert_eq!(fs.read_to_vec("kept").unwrap(), b"across mounts");
    }

    #[test]
    fn test_mount_blank_image_fails() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("blank.img");
        let layout = Layout::default();
        std::fs::write(&image, vec![0u8; layout.image_size() as usize]).unwrap();

        let err = mount(&image, layout).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FsError>(),
            Some(FsError::Corrupt(_))
        ));
        // nothing was written
        assert!(std::fs::read(&image).unwrap().iter().all(|b| *b == 0));
    }

    #[test]
    fn test_mount_missing_image_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(mount(dir.path().join("missing.img"), Layout::default()).is_err());
    }
}
