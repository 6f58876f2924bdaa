/// an enum to describe the type of a file
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum FileKind {
    /// an regular file
    #[default]
    RegularFile,
    /// a directory, only the root exists
    Directory,
}

impl FileKind {
    /// the `st_mode` permission and type bits reported for this kind
    pub fn mode(self) -> u32 {
        match self {
            FileKind::RegularFile => libc::S_IFREG as u32 | 0o666,
            FileKind::Directory => libc::S_IFDIR as u32 | 0o777,
        }
    }
}

/// implement a trait to convert [FileKind] to [fuser::FileType]
impl From<FileKind> for fuser::FileType {
    fn from(kind: FileKind) -> Self {
        match kind {
            FileKind::RegularFile => fuser::FileType::RegularFile,
            FileKind::Directory => fuser::FileType::Directory,
        }
    }
}
