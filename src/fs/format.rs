//! the only on-disk state the engine accepts
use log::debug;

use super::{Block, BlockDevice, BlockStore, FsResult, InodeHeader, NUM_BLOCKS, ROOT_INODE};

/// write a fresh filesystem: block 0 an empty root directory,
/// every other block a free inode, all payload slots zeroed
pub fn format_device<D: BlockDevice>(store: &mut BlockStore<D>) -> FsResult<()> {
    for index in 0..NUM_BLOCKS {
        debug!("writing : {index}");
        let header = if index == ROOT_INODE as usize {
            InodeHeader::directory()
        } else {
            InodeHeader::free()
        };
        store.write(index, &Block::new(header))?;
    }
    Ok(())
}
