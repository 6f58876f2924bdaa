//! our column-transposed filesystem
pub mod block;
pub mod block_dev;
pub mod directory;
pub mod error;
pub mod file_data;
pub mod filekind;
pub mod format;
pub mod fs_layout;
pub mod inode;
pub mod inode_table;
mod fs_api_impl;
pub use block::*;
pub use block_dev::*;
pub use directory::*;
pub use error::*;
pub use filekind::*;
pub use format::*;
pub use fs_api_impl::DfsFuse;
pub use fs_layout::*;
pub use inode::*;

/// size of one on-disk block, header included
pub const BLOCK_SIZE: usize = 512;
/// the device holds exactly this many blocks
pub const NUM_BLOCKS: usize = 100;
/// longest file name, not counting the NUL terminator
pub const MAX_NAME: usize = 15;
/// `is_empty`, `is_directory` and `size`, each a little-endian `i32`
pub const HEADER_SIZE: usize = 3 * std::mem::size_of::<i32>();
/// payload slots per block, one per possible inode id
pub const MAX_DATA_SIZE: usize = BLOCK_SIZE - HEADER_SIZE;
/// name (with terminator) followed by a little-endian `i32` inode number
pub const DIR_ENTRY_SIZE: usize = MAX_NAME + 1 + std::mem::size_of::<i32>();
/// the root directory always lives in block 0
pub const ROOT_INODE: u32 = 0;
