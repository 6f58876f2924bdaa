//! create our filesystem
use crate::{
    fs::{format_device, BlockStore, ImageDevice},
    utils::fs_size_calculator,
};
use anyhow::{anyhow, Context};
use byte_unit::Byte;
use log::info;
use std::{fs::OpenOptions, path::Path};

/// create a new filesystem on the given image file or device
/// # Params
/// - `image_file_path`: the path of the image file, created if missing
///
/// # Return
/// an [anyhow::Result] type to indicate whether the operation is successful
pub fn mkfs<P>(image_file_path: P) -> anyhow::Result<()>
where
    P: AsRef<Path>,
{
    let image_file_path = image_file_path.as_ref();
    let image_size = fs_size_calculator::image_size();
    // open the device for reading and writing
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .open(image_file_path)
        .with_context(|| format!("can't open {image_file_path:?}"))?;

    // a plain image file is grown to fit, a real device must already be big enough
    let metadata = file.metadata()?;
    if metadata.is_file() && metadata.len() < image_size {
        file.set_len(image_size)
            .with_context(|| format!("can't resize {image_file_path:?}"))?;
    }
    drop(file);

    let device = ImageDevice::open(image_file_path).map_err(|e| {
        anyhow!(
            "{image_file_path:?} can't hold {}: {e}",
            Byte::from_bytes(image_size as _).get_appropriate_unit(true)
        )
    })?;
    let mut store = BlockStore::new(device);
    format_device(&mut store).context("inode write failed")?;
    info!(
        "formatted {image_file_path:?}: {} blocks, {}",
        crate::fs::NUM_BLOCKS,
        Byte::from_bytes(image_size as _).get_appropriate_unit(true)
    );
    Ok(())
}
