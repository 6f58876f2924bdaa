//! what does our filesystem look like in the memory

use log::{debug, info};

use super::{
    format_device, BlockDevice, BlockStore, DirEntry, FsError, FsResult, ImageDevice, Inode, ROOT_INODE,
};
use std::path::Path;

/// the storage engine: a [BlockStore] interpreted as one flat directory of files
///
/// it has the following layout:
/// - block `i` header: inode `i`
/// - block `p` payload slot `id`: byte `p` of inode `id`
///
/// nothing is cached, every call goes to the device
#[derive(Debug)]
pub struct Dfs<D> {
    store: BlockStore<D>,
}

impl Dfs<ImageDevice> {
    /// open the filesystem held in an image file
    /// # Params
    /// - `image_path`: the path of the image file,\
    /// something like `Block Device`,like **/dev/sda1**
    pub fn open_image<P>(image_path: P) -> FsResult<Self>
    where
        P: AsRef<Path>,
    {
        Dfs::open(ImageDevice::open(image_path)?)
    }
}

impl<D: BlockDevice> Dfs<D> {
    /// take over an already formatted device
    /// # Errors
    /// [FsError::NotFormatted] if block 0 is not an allocated directory
    pub fn open(device: D) -> FsResult<Self> {
        let fs = Dfs {
            store: BlockStore::new(device),
        };
        let root = fs.store.read_header(ROOT_INODE as usize)?;
        if root.is_empty || !root.is_directory {
            return Err(FsError::NotFormatted);
        }
        info!("dfs - opened, root holds {} bytes of entries", root.size);
        Ok(fs)
    }

    /// format `device` and open it
    pub fn format(device: D) -> FsResult<Self> {
        let mut store = BlockStore::new(device);
        format_device(&mut store)?;
        Dfs::open(store.into_inner())
    }

    /// give back the device
    pub fn into_inner(self) -> D {
        self.store.into_inner()
    }

    #[inline]
    pub fn store(&self) -> &BlockStore<D> {
        &self.store
    }

    #[inline]
    pub(crate) fn store_mut(&mut self) -> &mut BlockStore<D> {
        &mut self.store
    }

    /// the root directory "/"
    pub fn root(&self) -> FsResult<Inode> {
        self.existing_inode(ROOT_INODE)
    }
}

/// name resolution and file creation
impl<D: BlockDevice> Dfs<D> {
    /// resolve `name` inside `dir`
    /// # Return
    /// `None` when no entry has that name
    pub fn lookup(&self, dir: &Inode, name: &[u8]) -> FsResult<Option<Inode>> {
        let Some(entry) = self.find_entry(dir, name)? else {
            return Ok(None);
        };
        let id = u32::try_from(entry.inode_number()).map_err(|_| FsError::OutOfBounds {
            index: entry.inode_number() as u64,
        })?;
        self.inode(id)
    }

    /// create an empty regular file called `name` in `dir`
    ///
    /// names are not checked for duplicates: an existing entry with the same
    /// name keeps answering lookups, the new file is only reachable by listing
    /// # Return
    /// the new inode, `dir` is refreshed with its new size
    pub fn create(&mut self, dir: &mut Inode, name: &[u8]) -> FsResult<Inode> {
        // validate the name before anything is allocated
        DirEntry::new(name, 0)?;
        *dir = self.existing_inode(dir.id)?;
        if !dir.is_dir() {
            return Err(FsError::NotADirectory);
        }
        if !self.has_room_for_entry(dir) {
            return Err(FsError::NoSpace);
        }

        let id = self.allocate_inode()?;
        let entry = DirEntry::new(name, id)?;
        self.append_entry(dir, &entry)?;
        debug!(
            "File created {id} as {} in {}",
            String::from_utf8_lossy(name),
            dir.id
        );
        self.existing_inode(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fs::{FileKind, InodeHeader, NUM_BLOCKS},
        utils::init_test_environment::init_test_environment,
    };

    #[test]
    fn test_open_rejects_unformatted_device() {
        let device = ImageDevice::anonymous().unwrap();
        assert!(matches!(Dfs::open(device), Err(FsError::NotFormatted)));
    }

    #[test]
    fn test_create_and_lookup() {
        let mut fs = init_test_environment();
        let mut root = fs.root().unwrap();
        let a = fs.create(&mut root, b"a").unwrap();
        let b = fs.create(&mut root, b"b").unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.header, InodeHeader::regular_file());
        assert_eq!(a.kind(), FileKind::RegularFile);

        assert_eq!(fs.lookup(&root, b"a").unwrap(), Some(a));
        assert_eq!(fs.lookup(&root, b"b").unwrap(), Some(b));
        assert_eq!(fs.lookup(&root, b"c").unwrap(), None);
        // names must match exactly, not by prefix
        assert_eq!(fs.lookup(&root, b"").unwrap(), None);
        let _ab = fs.create(&mut root, b"ab").unwrap();
        assert_eq!(fs.lookup(&root, b"a").unwrap(), Some(a));
    }

    #[test]
    fn test_listing_in_creation_order() {
        let mut fs = init_test_environment();
        let mut root = fs.root().unwrap();
        let a = fs.create(&mut root, b"a").unwrap();
        let b = fs.create(&mut root, b"b").unwrap();
        let expected = vec![(b"a".to_vec(), a.id as i32), (b"b".to_vec(), b.id as i32)];

        for chunk in 1..=3 {
            let mut listed = Vec::new();
            let mut resume = 0;
            loop {
                let batch: Vec<_> = fs
                    .read_dir(&root, resume)
                    .unwrap()
                    .take(chunk)
                    .map(|item| item.unwrap())
                    .collect();
                if batch.is_empty() {
                    break;
                }
                resume = batch.last().unwrap().0;
                listed.extend(
                    batch
                        .into_iter()
                        .map(|(_, entry)| (entry.name().to_vec(), entry.inode_number())),
                );
            }
            assert_eq!(listed, expected, "chunk size {chunk}");
        }
    }

    #[test]
    fn test_duplicate_names_shadow() {
        let mut fs = init_test_environment();
        let mut root = fs.root().unwrap();
        let first = fs.create(&mut root, b"dup").unwrap();
        let second = fs.create(&mut root, b"dup").unwrap();
        assert_ne!(first.id, second.id);

        // the second file is listed but can never be found by name
        for _ in 0..3 {
            assert_eq!(fs.lookup(&root, b"dup").unwrap().unwrap().id, first.id);
        }
        let listed: Vec<_> = fs
            .read_dir(&root, 0)
            .unwrap()
            .map(|item| item.unwrap().1.inode_number())
            .collect();
        assert_eq!(listed, vec![first.id as i32, second.id as i32]);
    }

    #[test]
    fn test_create_checks_room_before_allocating() {
        let mut fs = init_test_environment();
        let mut root = fs.root().unwrap();
        for i in 0..5 {
            fs.create(&mut root, format!("f{i}").as_bytes()).unwrap();
        }
        let free = fs.free_inodes().unwrap();
        assert!(matches!(fs.create(&mut root, b"f5"), Err(FsError::NoSpace)));
        assert_eq!(fs.free_inodes().unwrap(), free);
        assert_eq!(free, NUM_BLOCKS - 6);
    }

    #[test]
    fn test_create_rejects_bad_names_without_allocating() {
        let mut fs = init_test_environment();
        let mut root = fs.root().unwrap();
        assert!(matches!(
            fs.create(&mut root, b"a-name-that-is-too-long"),
            Err(FsError::NameTooLong)
        ));
        assert!(matches!(fs.create(&mut root, b""), Err(FsError::InvalidName)));
        assert_eq!(fs.free_inodes().unwrap(), NUM_BLOCKS - 1);
    }

    #[test]
    fn test_create_inside_a_file_fails() {
        let mut fs = init_test_environment();
        let mut root = fs.root().unwrap();
        let mut file = fs.create(&mut root, b"a").unwrap();
        assert!(matches!(
            fs.create(&mut file, b"b"),
            Err(FsError::NotADirectory)
        ));
    }

    #[test]
    fn test_reopen_sees_the_same_tree() {
        let mut fs = init_test_environment();
        let mut root = fs.root().unwrap();
        let mut a = fs.create(&mut root, b"kept").unwrap();
        fs.write_at(&mut a, 0, b"data", false).unwrap();

        let fs = Dfs::open(fs.into_inner()).unwrap();
        let root = fs.root().unwrap();
        let a = fs.lookup(&root, b"kept").unwrap().unwrap();
        let mut buf = [0u8; 4];
        fs.read_at(&a, 0, &mut buf).unwrap();
        assert_eq!(&buf, b"data");
    }
}
