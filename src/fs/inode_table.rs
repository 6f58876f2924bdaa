//! the inode table: every block header doubles as an inode
use log::{debug, warn};

use super::{check_index, BlockDevice, Dfs, FsResult, Inode, InodeHeader, FsError, NUM_BLOCKS};

/// [Inode] allocation and metadata queries
impl<D: BlockDevice> Dfs<D> {
    /// claim the lowest-numbered free inode as an empty regular file
    /// # Return
    /// the new inode id, or [FsError::NoSpace] when every header is in use
    pub fn allocate_inode(&mut self) -> FsResult<u32> {
        for index in 0..NUM_BLOCKS {
            let mut block = self.store().read(index)?;
            if !block.header.is_empty {
                continue;
            }
            block.header = InodeHeader::regular_file();
            self.store_mut().write(index, &block)?;
            debug!("allocated inode {index}");
            return Ok(index as u32);
        }
        warn!("dfs - inode table is full.");
        Err(FsError::NoSpace)
    }

    /// fetch the header fields of inode `id`
    /// # Return
    /// `None` when `id` is not allocated
    pub fn inode(&self, id: u32) -> FsResult<Option<Inode>> {
        let index = check_index(id as u64)?;
        let header = self.store().read_header(index)?;
        if header.is_empty {
            Ok(None)
        } else {
            Ok(Some(Inode::new(id, header)))
        }
    }

    /// like [Dfs::inode] but an unallocated id is an error
    pub fn existing_inode(&self, id: u32) -> FsResult<Inode> {
        self.inode(id)?.ok_or(FsError::NotFound)
    }

    /// count the headers still marked empty
    pub fn free_inodes(&self) -> FsResult<usize> {
        let mut free = 0;
        for index in 0..NUM_BLOCKS {
            if self.store().read_header(index)?.is_empty {
                free += 1;
            }
        }
        Ok(free)
    }

    /// persist the in-memory header of `inode`, payload of its block untouched
    pub(crate) fn save_header(&mut self, inode: &Inode) -> FsResult<()> {
        let index = check_index(inode.id as u64)?;
        self.store_mut().write_header(index, inode.header)
    }
}
