use std::time::SystemTime;

use super::{filekind::FileKind, InodeHeader, BLOCK_SIZE, NUM_BLOCKS};

/// an allocated inode: its id (the block index) and that block's header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inode {
    pub id: u32,
    pub header: InodeHeader,
}

impl Inode {
    pub fn new(id: u32, header: InodeHeader) -> Self {
        Inode { id, header }
    }

    #[inline]
    pub fn size(&self) -> u64 {
        self.header.size as u64
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.header.is_directory
    }

    pub fn kind(&self) -> FileKind {
        if self.is_dir() {
            FileKind::Directory
        } else {
            FileKind::RegularFile
        }
    }
}

/// FUSE reserves inode number 1 for the root, ours is 0
/// # Example
/// ```
/// use dfs::fuse_ino;
/// assert_eq!(fuse_ino(0), fuser::FUSE_ROOT_ID);
/// ```
pub const fn fuse_ino(id: u32) -> u64 {
    id as u64 + 1
}

/// inverse of [fuse_ino], `None` for numbers no inode can have
/// # Example
/// ```
/// use dfs::inode_id;
/// assert_eq!(inode_id(1), Some(0));
/// assert_eq!(inode_id(0), None);
/// assert_eq!(inode_id(101), None);
/// ```
pub fn inode_id(ino: u64) -> Option<u32> {
    match ino.checked_sub(1) {
        Some(id) if id < NUM_BLOCKS as u64 => Some(id as u32),
        _ => None,
    }
}

/// Convert [Inode] to [FileAttr](fuser::FileAttr)
/// # Params
/// - `uid`,`gid`: owner reported for every file, there is no owner on disk
/// - `at`: used for every timestamp, there are no times on disk either
pub fn file_attr(inode: &Inode, uid: u32, gid: u32, at: SystemTime) -> fuser::FileAttr {
    let kind = inode.kind();
    fuser::FileAttr {
        ino: fuse_ino(inode.id),
        size: inode.size(),
        // every byte of a file lands in a different block
        blocks: inode.size(),
        atime: at,
        mtime: at,
        ctime: at,
        crtime: at,
        kind: kind.into(),
        perm: (kind.mode() & 0o7777) as u16,
        nlink: if inode.is_dir() { 2 } else { 1 },
        uid,
        gid,
        rdev: 0,
        blksize: BLOCK_SIZE as u32,
        flags: 0,
    }
}
