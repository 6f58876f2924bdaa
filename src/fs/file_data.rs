//! file contents: byte `p` of inode `id` lives in slot `id` of block `p`
use log::{debug, warn};

use super::{check_index, BlockDevice, Dfs, FsError, FsResult, Inode, NUM_BLOCKS};

/// read and write data in the filesystem
impl<D: BlockDevice> Dfs<D> {
    /// read up to `buf.len()` bytes of `inode` starting at `offset`
    /// # Return
    /// the number of bytes read, 0 at or past the end of the file
    pub fn read_at(&self, inode: &Inode, offset: u64, buf: &mut [u8]) -> FsResult<usize> {
        let slot = check_index(inode.id as u64)?;
        if inode.is_dir() {
            return Err(FsError::NotAFile);
        }
        let len = (buf.len() as u64).min(inode.size().saturating_sub(offset)) as usize;
        if len == 0 {
            return Ok(0);
        }
        // refuse the whole range rather than read a slot of some other block
        let end = offset + len as u64;
        if end > NUM_BLOCKS as u64 {
            return Err(FsError::OutOfBounds { index: end - 1 });
        }
        for (i, byte) in buf[..len].iter_mut().enumerate() {
            let block = self.store().read(offset as usize + i)?;
            *byte = block.payload[slot];
        }
        Ok(len)
    }

    /// write `data` into `inode` at `offset`, or at its end when `append` is set
    ///
    /// `inode` is refreshed from disk first and carries the new size afterwards.
    /// If a block write fails part way, the size still covers the bytes
    /// that did reach the disk.
    /// # Return
    /// the number of bytes written
    pub fn write_at(
        &mut self,
        inode: &mut Inode,
        offset: u64,
        data: &[u8],
        append: bool,
    ) -> FsResult<usize> {
        let slot = check_index(inode.id as u64)?;
        *inode = self.existing_inode(inode.id)?;
        if inode.is_dir() {
            return Err(FsError::NotAFile);
        }
        if data.is_empty() {
            return Ok(0);
        }
        let offset = if append { inode.size() } else { offset };
        let end = offset.saturating_add(data.len() as u64);
        if end > NUM_BLOCKS as u64 {
            warn!(
                "write of {} bytes at {offset} to inode {} passes the last block",
                data.len(),
                inode.id
            );
            return Err(FsError::NoSpace);
        }

        for (i, byte) in data.iter().enumerate() {
            let index = offset as usize + i;
            if let Err(e) = self.write_slot(index, slot, *byte) {
                // nothing landed, a gap write must not move the size
                if i > 0 {
                    if let Err(checkpoint) = self.grow_size(inode, offset + i as u64) {
                        warn!("inode {} size checkpoint failed: {checkpoint}", inode.id);
                    }
                }
                return Err(e);
            }
        }
        self.grow_size(inode, end)?;
        debug!(
            "dfs - file write done : {} bytes at {offset}, size {}",
            data.len(),
            inode.size()
        );
        Ok(data.len())
    }

    /// read-modify-write of one payload slot, the other 499 slots belong to other inodes
    fn write_slot(&mut self, index: usize, slot: usize, byte: u8) -> FsResult<()> {
        let mut block = self.store().read(index)?;
        block.payload[slot] = byte;
        self.store_mut().write(index, &block)
    }

    /// raise the stored size of `inode` to `end`, sizes never shrink
    fn grow_size(&mut self, inode: &mut Inode, end: u64) -> FsResult<()> {
        if end <= inode.size() {
            return Ok(());
        }
        let mut updated = *inode;
        updated.header.size = end as u32;
        self.save_header(&updated)?;
        *inode = updated;
        Ok(())
    }
}
