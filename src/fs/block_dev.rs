//! whole-block access to the backing "device"
use std::{
    fs::OpenOptions,
    io::{Error, ErrorKind},
    path::Path,
};

use log::debug;
use memmap2::MmapMut;

use super::{BLOCK_SIZE, NUM_BLOCKS};
use crate::utils::fs_size_calculator;

/// API the engine needs from a block device
///
/// the block is the unit of transfer, there are no partial-block operations
pub trait BlockDevice {
    /// read block `index` into `buf`
    fn read_block(&self, index: usize, buf: &mut [u8; BLOCK_SIZE]) -> std::io::Result<()>;

    /// write `buf` to block `index`, returning once the block is durable
    fn write_block(&mut self, index: usize, buf: &[u8; BLOCK_SIZE]) -> std::io::Result<()>;

    /// how many whole blocks the device holds
    fn block_count(&self) -> usize;
}

/// an image file (or a real block device) mapped into memory
#[derive(Debug)]
pub struct ImageDevice {
    mmap: MmapMut,
    /// anonymous maps have nothing to sync
    file_backed: bool,
}

impl ImageDevice {
    /// open an existing image for read and write
    /// # Params
    /// - `image_path`: the path of the image file,\
    /// something like `Block Device`,like **/dev/sda1**
    pub fn open<P>(image_path: P) -> std::io::Result<Self>
    where
        P: AsRef<Path>,
    {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(image_path.as_ref())?;

        // Safety
        // the map is only ever accessed through this struct,
        // and the image must not be resized while it is mapped
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        if (mmap.len() as u64) < fs_size_calculator::image_size() {
            return Err(Error::new(
                ErrorKind::UnexpectedEof,
                format!(
                    "image holds {} bytes, at least {} are needed",
                    mmap.len(),
                    fs_size_calculator::image_size()
                ),
            ));
        }
        debug!("mapped {} bytes of {:?}", mmap.len(), image_path.as_ref());
        Ok(ImageDevice {
            mmap,
            file_backed: true,
        })
    }

    /// a zero-filled device living only in memory
    pub fn anonymous() -> std::io::Result<Self> {
        let mmap = MmapMut::map_anon(fs_size_calculator::image_size() as usize)?;
        Ok(ImageDevice {
            mmap,
            file_backed: false,
        })
    }

    fn range_of(&self, index: usize) -> std::io::Result<std::ops::Range<usize>> {
        if index >= self.block_count() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("block {index} is past the end of the device"),
            ));
        }
        let start = fs_size_calculator::block_offset(index) as usize;
        Ok(start..start + BLOCK_SIZE)
    }
}

impl BlockDevice for ImageDevice {
    fn read_block(&self, index: usize, buf: &mut [u8; BLOCK_SIZE]) -> std::io::Result<()> {
        let range = self.range_of(index)?;
        buf.copy_from_slice(&self.mmap[range]);
        Ok(())
    }

    fn write_block(&mut self, index: usize, buf: &[u8; BLOCK_SIZE]) -> std::io::Result<()> {
        let range = self.range_of(index)?;
        let offset = range.start;
        self.mmap[range].copy_from_slice(buf);
        if self.file_backed {
            // msync(MS_SYNC) on just this block
            self.mmap.flush_range(offset, BLOCK_SIZE)?;
        }
        Ok(())
    }

    fn block_count(&self) -> usize {
        (self.mmap.len() / BLOCK_SIZE).min(NUM_BLOCKS)
    }
}
