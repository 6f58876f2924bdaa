use std::{
    ffi::OsStr,
    os::unix::prelude::OsStrExt,
    time::{Duration, SystemTime},
};

use fuser::{FileAttr, Filesystem};
use libc::c_int;
use log::{info, warn};

use super::{
    file_attr, fuse_ino, inode_id, BlockDevice, Dfs, FileKind, Inode, BLOCK_SIZE,
    MAX_NAME, NUM_BLOCKS,
};

/// attributes are always read fresh from the device
const TTL: Duration = Duration::new(0, 0);

/// bridges `FUSE` requests to a [Dfs]
pub struct DfsFuse<D> {
    fs: Dfs<D>,
    uid: u32,
    gid: u32,
    mounted_at: SystemTime,
}

impl<D: BlockDevice> DfsFuse<D> {
    /// every file is reported as owned by the user who mounts the filesystem
    pub fn new(fs: Dfs<D>) -> Self {
        DfsFuse {
            fs,
            uid: users::get_effective_uid(),
            gid: users::get_effective_gid(),
            mounted_at: SystemTime::now(),
        }
    }

    fn attr(&self, inode: &Inode) -> FileAttr {
        file_attr(inode, self.uid, self.gid, self.mounted_at)
    }

    /// the allocated inode behind a `FUSE` inode number
    fn find_inode(&self, ino: u64) -> Result<Inode, c_int> {
        let id = inode_id(ino).ok_or(libc::ENOENT)?;
        self.fs
            .inode(id)
            .map_err(|e| e.errno())?
            .ok_or(libc::ENOENT)
    }

    fn do_lookup(&self, parent: u64, name: &OsStr) -> Result<FileAttr, c_int> {
        let dir = self.find_inode(parent)?;
        match self.fs.lookup(&dir, name.as_bytes()) {
            Ok(Some(inode)) => Ok(self.attr(&inode)),
            Ok(None) => Err(libc::ENOENT),
            Err(e) => Err(e.errno()),
        }
    }

    fn do_create(&mut self, parent: u64, name: &OsStr, mode: u32) -> Result<FileAttr, c_int> {
        let file_type = mode & libc::S_IFMT as u32;
        if file_type != 0 && file_type != libc::S_IFREG as u32 {
            warn!("dfs - only regular files can be created, mode {mode:o}");
            return Err(libc::EINVAL);
        }
        let mut dir = self.find_inode(parent)?;
        let inode = self
            .fs
            .create(&mut dir, name.as_bytes())
            .map_err(|e| e.errno())?;
        Ok(self.attr(&inode))
    }

    fn do_read(&self, ino: u64, offset: i64, size: u32) -> Result<Vec<u8>, c_int> {
        let offset = u64::try_from(offset).map_err(|_| libc::EINVAL)?;
        let inode = self.find_inode(ino)?;
        // nothing is longer than the device
        let mut buf = vec![0u8; (size as usize).min(NUM_BLOCKS)];
        let read = self
            .fs
            .read_at(&inode, offset, &mut buf)
            .map_err(|e| e.errno())?;
        buf.truncate(read);
        Ok(buf)
    }

    fn do_write(&mut self, ino: u64, offset: i64, data: &[u8], flags: i32) -> Result<u32, c_int> {
        let offset = u64::try_from(offset).map_err(|_| libc::EINVAL)?;
        let mut inode = self.find_inode(ino)?;
        let append = flags & libc::O_APPEND != 0;
        let written = self
            .fs
            .write_at(&mut inode, offset, data, append)
            .map_err(|e| e.errno())?;
        Ok(written as u32)
    }

    fn do_setattr(&self, ino: u64, size: Option<u64>) -> Result<FileAttr, c_int> {
        let inode = self.find_inode(ino)?;
        // truncation is not supported, only a no-op size change is accepted
        if matches!(size, Some(size) if size != inode.size()) {
            return Err(libc::EPERM);
        }
        Ok(self.attr(&inode))
    }

    /// entries of directory `ino` from ordinal `offset` on, as `(ino, next offset, kind, name)`
    fn do_readdir(
        &self,
        ino: u64,
        offset: i64,
    ) -> Result<Vec<(u64, i64, FileKind, Vec<u8>)>, c_int> {
        let start = usize::try_from(offset).map_err(|_| libc::EINVAL)?;
        let dir = self.find_inode(ino)?;
        let entries = self.fs.read_dir(&dir, start).map_err(|e| e.errno())?;
        let mut listed = Vec::new();
        for item in entries {
            let (next, entry) = item.map_err(|e| e.errno())?;
            let Ok(id) = u32::try_from(entry.inode_number()) else {
                warn!("dfs - skipping entry with inode {}", entry.inode_number());
                continue;
            };
            let kind = match self.fs.inode(id) {
                Ok(Some(inode)) => inode.kind(),
                _ => {
                    warn!("dfs - entry points at unusable inode {id}");
                    continue;
                }
            };
            listed.push((fuse_ino(id), next as i64, kind, entry.name().to_vec()));
        }
        Ok(listed)
    }
}

impl<D: BlockDevice> Filesystem for DfsFuse<D> {
    fn init(
        &mut self,
        _req: &fuser::Request<'_>,
        _config: &mut fuser::KernelConfig,
    ) -> Result<(), c_int> {
        info!("dfs - fill super");
        Ok(())
    }

    fn destroy(&mut self) {
        info!("dfs - put_super");
    }

    // to show FS information
    fn statfs(&mut self, _req: &fuser::Request<'_>, _ino: u64, reply: fuser::ReplyStatfs) {
        info!("dfs - statfs");
        let free = match self.fs.free_inodes() {
            Ok(free) => free as u64,
            Err(e) => {
                reply.error(e.errno());
                return;
            }
        };
        reply.statfs(
            NUM_BLOCKS as u64,
            free,
            free,
            NUM_BLOCKS as u64 - free,
            free,
            BLOCK_SIZE as u32,
            MAX_NAME as u32,
            BLOCK_SIZE as u32,
        )
    }

    // to look up a file
    fn lookup(
        &mut self,
        _req: &fuser::Request<'_>,
        parent: u64,
        name: &OsStr,
        reply: fuser::ReplyEntry,
    ) {
        info!("lookup() called with parent inode number: {parent} and name: {name:?}");
        match self.do_lookup(parent, name) {
            Ok(attr) => reply.entry(&TTL, &attr, 0),
            Err(errno) => reply.error(errno),
        }
    }

    fn getattr(&mut self, _req: &fuser::Request<'_>, ino: u64, reply: fuser::ReplyAttr) {
        info!("getattr() called with inode number: {:?}", ino);
        match self.find_inode(ino) {
            Ok(inode) => reply.attr(&TTL, &self.attr(&inode)),
            Err(errno) => reply.error(errno),
        }
    }

    // to set file attributes
    fn setattr(
        &mut self,
        _req: &fuser::Request<'_>,
        ino: u64,
        mode: Option<u32>,
        uid: Option<u32>,
        gid: Option<u32>,
        size: Option<u64>,
        _atime: Option<fuser::TimeOrNow>,
        _mtime: Option<fuser::TimeOrNow>,
        _ctime: Option<SystemTime>,
        fh: Option<u64>,
        _crtime: Option<SystemTime>,
        _chgtime: Option<SystemTime>,
        _bkuptime: Option<SystemTime>,
        _flags: Option<u32>,
        reply: fuser::ReplyAttr,
    ) {
        info!(
            "setattr() called with inode number: {:?}, mode: {:?}, uid: {:?}, gid: {:?}, size: {:?}, fh: {:?}",
            ino, mode, uid, gid, size, fh
        );
        match self.do_setattr(ino, size) {
            Ok(attr) => reply.attr(&TTL, &attr),
            Err(errno) => reply.error(errno),
        }
    }

    fn open(&mut self, _req: &fuser::Request<'_>, ino: u64, flags: i32, reply: fuser::ReplyOpen) {
        info!("open() called with inode number: {ino}, flags: {flags:#o}");
        match self.find_inode(ino) {
            Ok(_) => reply.opened(0, 0),
            Err(errno) => reply.error(errno),
        }
    }

    // to read from a file
    fn read(
        &mut self,
        _req: &fuser::Request<'_>,
        ino: u64,
        fh: u64,
        offset: i64,
        size: u32,
        flags: i32,
        _lock_owner: Option<u64>,
        reply: fuser::ReplyData,
    ) {
        info!(
            "read() called with inode number: {:?}, fh: {:?}, offset: {:?}, size: {:?}, flags: {:?}",
            ino, fh, offset, size, flags
        );
        match self.do_read(ino, offset, size) {
            Ok(buf) => reply.data(&buf),
            Err(errno) => reply.error(errno),
        }
    }

    // to write to a file
    fn write(
        &mut self,
        _req: &fuser::Request<'_>,
        ino: u64,
        fh: u64,
        offset: i64,
        data: &[u8],
        write_flags: u32,
        flags: i32,
        _lock_owner: Option<u64>,
        reply: fuser::ReplyWrite,
    ) {
        info!(
            "write() called with inode number: {:?}, fh: {:?}, offset: {:?}, len: {:?}, write_flags: {:?}, flags: {:?}",
            ino, fh, offset, data.len(), write_flags, flags
        );
        match self.do_write(ino, offset, data, flags) {
            Ok(written) => reply.written(written),
            Err(errno) => reply.error(errno),
        }
    }

    // to read a dir
    fn readdir(
        &mut self,
        _req: &fuser::Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: fuser::ReplyDirectory,
    ) {
        info!("readdir() called with inode number: {ino}, offset: {offset}");
        let entries = match self.do_readdir(ino, offset) {
            Ok(entries) => entries,
            Err(errno) => {
                reply.error(errno);
                return;
            }
        };
        for (entry_ino, next, kind, name) in entries {
            let buffer_full: bool = reply.add(entry_ino, next, kind.into(), OsStr::from_bytes(&name));
            if buffer_full {
                break;
            }
        }
        reply.ok();
    }

    // to create a new file
    fn create(
        &mut self,
        _req: &fuser::Request<'_>,
        parent: u64,
        name: &OsStr,
        mode: u32,
        _umask: u32,
        _flags: i32,
        reply: fuser::ReplyCreate,
    ) {
        info!("create() called with parent inode number: {parent} and name: {name:?}");
        match self.do_create(parent, name, mode) {
            Ok(attr) => reply.created(&TTL, &attr, 0, 0, 0),
            Err(errno) => reply.error(errno),
        }
    }
}
