//! directory entries, stored one byte per block in the directory's payload slot
use log::debug;
use serde::{Deserialize, Serialize};

use super::{
    check_index, BlockDevice, Dfs, FsError, FsResult, Inode, DIR_ENTRY_SIZE, MAX_NAME, NUM_BLOCKS,
};
use crate::utils::{fs_size_calculator, traits::FixedCodec};

/// a `(name, inode number)` pair exactly as it is laid out on disk
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntry {
    /// NUL terminated
    name: [u8; MAX_NAME + 1],
    inode_number: i32,
}

impl FixedCodec for DirEntry {
    const ENCODED_SIZE: usize = DIR_ENTRY_SIZE;
}

impl DirEntry {
    /// # Errors
    /// - [FsError::InvalidName] for an empty name or one containing NUL
    /// - [FsError::NameTooLong] for more than [MAX_NAME] bytes
    pub fn new(name: &[u8], inode_number: u32) -> FsResult<Self> {
        if name.is_empty() || name.contains(&0) {
            return Err(FsError::InvalidName);
        }
        if name.len() > MAX_NAME {
            return Err(FsError::NameTooLong);
        }
        let mut raw = [0u8; MAX_NAME + 1];
        raw[..name.len()].copy_from_slice(name);
        Ok(DirEntry {
            name: raw,
            inode_number: inode_number as i32,
        })
    }

    /// the name bytes before the terminator
    pub fn name(&self) -> &[u8] {
        let len = self
            .name
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(self.name.len());
        &self.name[..len]
    }

    pub fn inode_number(&self) -> i32 {
        self.inode_number
    }
}

/// entries stored in `dir`, derived from its size
#[inline]
fn entry_count(dir: &Inode) -> usize {
    dir.header.size as usize / DIR_ENTRY_SIZE
}

/// the column-transposed directory codec
impl<D: BlockDevice> Dfs<D> {
    /// gather byte `j` of entry `ordinal` from slot `dir.id` of block `ordinal * 20 + j`
    fn decode_entry(&self, dir: &Inode, ordinal: usize) -> FsResult<DirEntry> {
        let first = fs_size_calculator::entry_first_block(ordinal);
        let mut raw = [0u8; DIR_ENTRY_SIZE];
        for (j, byte) in raw.iter_mut().enumerate() {
            let block = self.store().read(first + j)?;
            *byte = block.payload[dir.id as usize];
        }
        Ok(DirEntry::decode_from(&raw)?)
    }

    /// decode the entry at `ordinal`, which must be below the entry count
    pub fn read_entry(&self, dir: &Inode, ordinal: usize) -> FsResult<DirEntry> {
        check_index(dir.id as u64)?;
        if !dir.is_dir() {
            return Err(FsError::NotADirectory);
        }
        if ordinal >= entry_count(dir) {
            return Err(FsError::NotFound);
        }
        self.decode_entry(dir, ordinal)
    }

    /// store `entry` after the last entry of `dir`
    ///
    /// all entry bytes reach the disk before the size that makes them visible,
    /// `dir` is refreshed with the new size afterwards
    pub fn append_entry(&mut self, dir: &mut Inode, entry: &DirEntry) -> FsResult<()> {
        check_index(dir.id as u64)?;
        *dir = self.existing_inode(dir.id)?;
        if !dir.is_dir() {
            return Err(FsError::NotADirectory);
        }
        let num = entry_count(dir);
        if !self.has_room_for_entry(dir) {
            return Err(FsError::NoSpace);
        }
        let bytes = entry.encode()?;
        let first = fs_size_calculator::entry_first_block(num);
        for (j, byte) in bytes.iter().enumerate() {
            let mut block = self.store().read(first + j)?;
            block.payload[dir.id as usize] = *byte;
            self.store_mut().write(first + j, &block)?;
        }
        let mut updated = *dir;
        updated.header.size = ((num + 1) * DIR_ENTRY_SIZE) as u32;
        self.save_header(&updated)?;
        *dir = updated;
        debug!(
            "adding name : {} ino : {} at ordinal {num}",
            String::from_utf8_lossy(entry.name()),
            entry.inode_number()
        );
        Ok(())
    }

    /// whether one more entry still fits below the last block
    pub fn has_room_for_entry(&self, dir: &Inode) -> bool {
        (entry_count(dir) + 1) * DIR_ENTRY_SIZE <= NUM_BLOCKS
    }

    /// find the first entry called `name`
    ///
    /// entries appended later under the same name are never returned
    pub fn find_entry(&self, dir: &Inode, name: &[u8]) -> FsResult<Option<DirEntry>> {
        for item in self.read_dir(dir, 0)? {
            let (_, entry) = item?;
            if entry.name() == name {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    /// lazily walk the entries of `dir`, starting at ordinal `start`
    pub fn read_dir(&self, dir: &Inode, start: usize) -> FsResult<DirEntries<'_, D>> {
        check_index(dir.id as u64)?;
        if !dir.is_dir() {
            return Err(FsError::NotADirectory);
        }
        Ok(DirEntries {
            fs: self,
            dir: *dir,
            next: start,
            count: entry_count(dir),
        })
    }
}

/// iterator returned by [Dfs::read_dir]
///
/// yields `(resume ordinal, entry)`, the ordinal being where a later walk
/// should start to continue after this entry
pub struct DirEntries<'a, D> {
    fs: &'a Dfs<D>,
    dir: Inode,
    next: usize,
    count: usize,
}

impl<'a, D: BlockDevice> Iterator for DirEntries<'a, D> {
    type Item = FsResult<(usize, DirEntry)>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.count {
            let ordinal = self.next;
            self.next += 1;
            match self.fs.decode_entry(&self.dir, ordinal) {
                // inode 0 is the root, no entry may point at it
                Ok(entry) if entry.inode_number() == 0 => continue,
                Ok(entry) => return Some(Ok((self.next, entry))),
                Err(e) => {
                    self.next = self.count;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fs::{InodeHeader, ROOT_INODE},
        utils::init_test_environment::init_test_environment,
    };

    #[test]
    fn test_entry_layout() {
        let entry = DirEntry::new(b"file1", 3).unwrap();
        let bytes = entry.encode().unwrap();
        assert_eq!(bytes.len(), DIR_ENTRY_SIZE);
        assert_eq!(&bytes[..6], b"file1\0");
        assert_eq!(&bytes[16..], &[3, 0, 0, 0]);
        assert_eq!(DirEntry::decode_from(&bytes).unwrap().name(), b"file1");
    }

    #[test]
    fn test_entry_names_are_validated() {
        assert!(DirEntry::new(b"exactly15bytes!", 1).is_ok());
        assert!(matches!(
            DirEntry::new(b"sixteen-bytes-xx", 1),
            Err(FsError::NameTooLong)
        ));
        assert!(matches!(DirEntry::new(b"", 1), Err(FsError::InvalidName)));
        assert!(matches!(DirEntry::new(b"a\0b", 1), Err(FsError::InvalidName)));
    }

    #[test]
    fn test_entries_are_transposed_across_blocks() {
        let mut fs = init_test_environment();
        let mut root = fs.root().unwrap();
        let entry = DirEntry::new(b"ab", 7).unwrap();
        fs.append_entry(&mut root, &entry).unwrap();
        fs.append_entry(&mut root, &DirEntry::new(b"z", 8).unwrap())
            .unwrap();

        // first entry: bytes 0..20 in slot 0 of blocks 0..20
        let store = fs.store();
        assert_eq!(store.read(0).unwrap().payload[0], b'a');
        assert_eq!(store.read(1).unwrap().payload[0], b'b');
        assert_eq!(store.read(2).unwrap().payload[0], 0);
        assert_eq!(store.read(16).unwrap().payload[0], 7);
        // second entry starts at block 20
        assert_eq!(store.read(20).unwrap().payload[0], b'z');
        assert_eq!(store.read(36).unwrap().payload[0], 8);
        // no other slot was touched
        assert_eq!(store.read(0).unwrap().payload[1], 0);

        assert_eq!(root.size(), 2 * DIR_ENTRY_SIZE as u64);
        assert_eq!(fs.read_entry(&root, 1).unwrap().name(), b"z");
        assert!(matches!(fs.read_entry(&root, 2), Err(FsError::NotFound)));
    }

    #[test]
    fn test_iteration_stops_at_entry_count() {
        let mut fs = init_test_environment();
        let mut root = fs.root().unwrap();
        fs.append_entry(&mut root, &DirEntry::new(b"one", 1).unwrap())
            .unwrap();
        fs.append_entry(&mut root, &DirEntry::new(b"two", 2).unwrap())
            .unwrap();

        // pretend the second append never committed its size
        let mut shrunk = root;
        shrunk.header.size = DIR_ENTRY_SIZE as u32;
        let names: Vec<_> = fs
            .read_dir(&shrunk, 0)
            .unwrap()
            .map(|item| item.unwrap().1.name().to_vec())
            .collect();
        assert_eq!(names, vec![b"one".to_vec()]);
    }

    #[test]
    fn test_root_entries_are_skipped() {
        let mut fs = init_test_environment();
        let mut root = fs.root().unwrap();
        fs.append_entry(&mut root, &DirEntry::new(b"hidden", ROOT_INODE).unwrap())
            .unwrap();
        fs.append_entry(&mut root, &DirEntry::new(b"shown", 4).unwrap())
            .unwrap();
        let listed: Vec<_> = fs
            .read_dir(&root, 0)
            .unwrap()
            .map(|item| item.unwrap())
            .collect();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].0, 2);
        assert_eq!(listed[0].1.name(), b"shown");
    }

    #[test]
    fn test_sixth_entry_does_not_fit() {
        let mut fs = init_test_environment();
        let mut root = fs.root().unwrap();
        for i in 0..fs_size_calculator::max_dir_entries() {
            let name = format!("f{i}");
            fs.append_entry(&mut root, &DirEntry::new(name.as_bytes(), i as u32 + 1).unwrap())
                .unwrap();
        }
        assert!(!fs.has_room_for_entry(&root));
        let before = root;
        assert!(matches!(
            fs.append_entry(&mut root, &DirEntry::new(b"f5", 6).unwrap()),
            Err(FsError::NoSpace)
        ));
        assert_eq!(fs.root().unwrap(), before);
    }

    #[test]
    fn test_files_are_not_directories() {
        let mut fs = init_test_environment();
        let mut root = fs.root().unwrap();
        let mut file = fs.create(&mut root, b"plain").unwrap();
        assert!(matches!(fs.read_dir(&file, 0), Err(FsError::NotADirectory)));
        assert!(matches!(
            fs.append_entry(&mut file, &DirEntry::new(b"x", 2).unwrap()),
            Err(FsError::NotADirectory)
        ));
    }

    #[test]
    fn test_bogus_directory_id_fails_closed() {
        let mut fs = init_test_environment();
        let mut root = fs.root().unwrap();
        fs.append_entry(&mut root, &DirEntry::new(b"x", 1).unwrap())
            .unwrap();

        for id in [NUM_BLOCKS as u32 + 100, 600] {
            let mut header = InodeHeader::directory();
            header.size = DIR_ENTRY_SIZE as u32;
            let mut bogus = Inode::new(id, header);
            assert!(matches!(
                fs.read_entry(&bogus, 0),
                Err(FsError::OutOfBounds { .. })
            ));
            assert!(matches!(fs.read_dir(&bogus, 0), Err(FsError::OutOfBounds { .. })));
            assert!(matches!(
                fs.find_entry(&bogus, b"x"),
                Err(FsError::OutOfBounds { .. })
            ));
            assert!(matches!(fs.lookup(&bogus, b"x"), Err(FsError::OutOfBounds { .. })));
            assert!(matches!(
                fs.append_entry(&mut bogus, &DirEntry::new(b"y", 2).unwrap()),
                Err(FsError::OutOfBounds { .. })
            ));
        }
        // the real root is untouched
        assert_eq!(fs.root().unwrap().size(), DIR_ENTRY_SIZE as u64);
    }
}
