//! create our filesystem
use crate::{
    device::ImageFile,
    fs::{FileService, Layout, MAX_BLOCKS, MAX_FILES},
};
use anyhow::anyhow;
use byte_unit::Byte;
use log::info;
use std::path::Path;

/// create a new image file holding an empty KnixFS store
/// # Params
/// - `image_file_path`: the path of the image file, must not exist yet
/// - `layout`: where the store lives inside the image
///
/// # Return
/// the freshly formatted store, backed by the new image file
pub fn mkfs<P>(image_file_path: P, layout: Layout) -> anyhow::Result<FileService<ImageFile>>
where
    P: AsRef<Path>,
{
    let image_file_path = image_file_path.as_ref();
    if image_file_path.exists() {
        return Err(anyhow!(
            "{} already exists, refusing to overwrite it",
            image_file_path.display()
        ));
    }

    // everything before `start_sector` is left zeroed
    let file_len = layout.image_size();
    let device = ImageFile::create(image_file_path, file_len)?;
    let service = FileService::format(device, layout)?;
    info!(
        "created {} ({}): {MAX_BLOCKS} blocks, {MAX_FILES} file slots, starting at sector {}",
        image_file_path.display(),
        Byte::from_bytes(file_len as _).get_appropriate_unit(true),
        layout.start_sector
    );
    Ok(service)
}
