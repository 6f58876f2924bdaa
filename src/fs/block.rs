//! on-disk block format and whole-block access
use std::io::{Error, ErrorKind};

use log::{debug, error};
use serde::{Deserialize, Serialize};

use super::{BlockDevice, FsError, FsResult, BLOCK_SIZE, HEADER_SIZE, MAX_DATA_SIZE, NUM_BLOCKS};
use crate::utils::traits::FixedCodec;

/// the header exactly as it sits on disk
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RawHeader {
    is_empty: i32,
    is_directory: i32,
    size: i32,
}

impl FixedCodec for RawHeader {
    const ENCODED_SIZE: usize = HEADER_SIZE;
}

/// metadata of the inode whose id is the block index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InodeHeader {
    pub is_empty: bool,
    pub is_directory: bool,
    /// bytes of file data, or `entries * DIR_ENTRY_SIZE` for a directory
    pub size: u32,
}

impl InodeHeader {
    /// an unallocated inode
    pub const fn free() -> Self {
        InodeHeader {
            is_empty: true,
            is_directory: false,
            size: 0,
        }
    }

    /// a freshly allocated, empty regular file
    pub const fn regular_file() -> Self {
        InodeHeader {
            is_empty: false,
            is_directory: false,
            size: 0,
        }
    }

    /// an empty directory
    pub const fn directory() -> Self {
        InodeHeader {
            is_empty: false,
            is_directory: true,
            size: 0,
        }
    }
}

impl From<InodeHeader> for RawHeader {
    fn from(header: InodeHeader) -> Self {
        RawHeader {
            is_empty: header.is_empty as i32,
            is_directory: header.is_directory as i32,
            size: header.size as i32,
        }
    }
}

impl TryFrom<RawHeader> for InodeHeader {
    type Error = Error;
    fn try_from(raw: RawHeader) -> Result<Self, Self::Error> {
        // nothing on a formatted device can be larger than the block count
        if raw.size < 0 || raw.size as usize > NUM_BLOCKS {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!("corrupt inode size {}", raw.size),
            ));
        }
        Ok(InodeHeader {
            is_empty: raw.is_empty != 0,
            is_directory: raw.is_directory != 0,
            size: raw.size as u32,
        })
    }
}

/// one 512 byte block: a header followed by one payload slot per inode id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub header: InodeHeader,
    pub payload: [u8; MAX_DATA_SIZE],
}

impl Block {
    pub fn new(header: InodeHeader) -> Self {
        Block {
            header,
            payload: [0u8; MAX_DATA_SIZE],
        }
    }

    pub fn to_bytes(&self) -> std::io::Result<[u8; BLOCK_SIZE]> {
        let mut buf = [0u8; BLOCK_SIZE];
        RawHeader::from(self.header).encode_into(&mut buf[..HEADER_SIZE])?;
        buf[HEADER_SIZE..].copy_from_slice(&self.payload);
        Ok(buf)
    }

    pub fn from_bytes(buf: &[u8; BLOCK_SIZE]) -> std::io::Result<Self> {
        let header = RawHeader::decode_from(&buf[..HEADER_SIZE])?.try_into()?;
        let mut payload = [0u8; MAX_DATA_SIZE];
        payload.copy_from_slice(&buf[HEADER_SIZE..]);
        Ok(Block { header, payload })
    }
}

/// check that `index` names one of the device's blocks (and therefore an inode id)
pub fn check_index(index: u64) -> FsResult<usize> {
    if index < NUM_BLOCKS as u64 {
        Ok(index as usize)
    } else {
        Err(FsError::OutOfBounds { index })
    }
}

/// bounds-checked, decoded block access on top of a [BlockDevice]
#[derive(Debug)]
pub struct BlockStore<D> {
    device: D,
}

impl<D: BlockDevice> BlockStore<D> {
    pub fn new(device: D) -> Self {
        BlockStore { device }
    }

    pub fn into_inner(self) -> D {
        self.device
    }

    #[inline]
    pub(crate) fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn read(&self, index: usize) -> FsResult<Block> {
        let index = check_index(index as u64)?;
        let mut buf = [0u8; BLOCK_SIZE];
        self.device.read_block(index, &mut buf).map_err(|e| {
            error!("reading block {index} failed: {e}");
            FsError::Io(e)
        })?;
        Ok(Block::from_bytes(&buf)?)
    }

    /// write-through: returns once the device reports the block durable
    pub fn write(&mut self, index: usize, block: &Block) -> FsResult<()> {
        let index = check_index(index as u64)?;
        debug!("writeblock : {index}");
        let buf = block.to_bytes()?;
        self.device.write_block(index, &buf).map_err(|e| {
            error!("writing block {index} failed: {e}");
            FsError::Io(e)
        })
    }

    pub fn read_header(&self, index: usize) -> FsResult<InodeHeader> {
        Ok(self.read(index)?.header)
    }

    /// replace only the header of block `index`, keeping its payload slots
    pub fn write_header(&mut self, index: usize, header: InodeHeader) -> FsResult<()> {
        let mut block = self.read(index)?;
        block.header = header;
        self.write(index, &block)
    }
}
