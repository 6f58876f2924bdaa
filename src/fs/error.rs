//! errors raised by the storage engine
use std::fmt;

/// every engine operation reports failures with this type
pub type FsResult<T> = Result<T, FsError>;

#[derive(Debug)]
pub enum FsError {
    /// the backing device failed, or a block did not decode
    Io(std::io::Error),
    /// no inode or entry answers to the request
    NotFound,
    /// the inode table is full, or the byte range passes the last block
    NoSpace,
    /// an inode id or block index outside `[0, NUM_BLOCKS)`
    OutOfBounds { index: u64 },
    /// a name longer than [MAX_NAME](super::MAX_NAME) bytes
    NameTooLong,
    /// an empty name, or one containing a NUL byte
    InvalidName,
    /// entry operations only apply to directories
    NotADirectory,
    /// file data operations only apply to regular files
    NotAFile,
    /// block 0 is not an allocated directory
    NotFormatted,
}

impl FsError {
    /// the errno handed back to `FUSE`
    pub fn errno(&self) -> libc::c_int {
        match self {
            FsError::Io(_) | FsError::NotFormatted => libc::EIO,
            FsError::NotFound => libc::ENOENT,
            FsError::NoSpace => libc::ENOSPC,
            FsError::OutOfBounds { .. } | FsError::InvalidName | FsError::NotAFile => {
                libc::EINVAL
            }
            FsError::NameTooLong => libc::ENAMETOOLONG,
            FsError::NotADirectory => libc::ENOTDIR,
        }
    }
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsError::Io(e) => write!(f, "device I/O failed: {e}"),
            FsError::NotFound => write!(f, "no such inode or entry"),
            FsError::NoSpace => write!(f, "no space left on device"),
            FsError::OutOfBounds { index } => write!(f, "index {index} is out of bounds"),
            FsError::NameTooLong => write!(f, "file name is too long"),
            FsError::InvalidName => write!(f, "file name is invalid"),
            FsError::NotADirectory => write!(f, "not a directory"),
            FsError::NotAFile => write!(f, "not a regular file"),
            FsError::NotFormatted => write!(f, "device does not hold a formatted filesystem"),
        }
    }
}

impl std::error::Error for FsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FsError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for FsError {
    fn from(e: std::io::Error) -> Self {
        FsError::Io(e)
    }
}
