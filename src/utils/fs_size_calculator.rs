//! This module contains functions to calculate the size of different fs components

use crate::fs::{BLOCK_SIZE, DIR_ENTRY_SIZE, NUM_BLOCKS};

/// calculate the size of a whole filesystem image
/// # Return
/// the number of bytes `mkfs` writes
/// # Example
/// ```
/// use dfs::utils::fs_size_calculator::image_size;
/// assert_eq!(image_size(), 512 * 100);
/// ```
pub const fn image_size() -> u64 {
    (NUM_BLOCKS * BLOCK_SIZE) as u64
}

/// calculate the byte offset of a block inside the image
/// # Arguments
/// - `index`: the block index
/// # Example
/// ```
/// use dfs::utils::fs_size_calculator::block_offset;
/// assert_eq!(block_offset(0), 0);
/// assert_eq!(block_offset(3), 1536);
/// ```
pub const fn block_offset(index: usize) -> u64 {
    (index * BLOCK_SIZE) as u64
}

/// calculate how many entries one directory can hold
///
/// every entry byte takes a block, so a directory runs out of blocks
/// long before it runs out of payload slots
/// # Example
/// ```
/// use dfs::utils::fs_size_calculator::max_dir_entries;
/// assert_eq!(max_dir_entries(), 5);
/// ```
pub const fn max_dir_entries() -> usize {
    NUM_BLOCKS / DIR_ENTRY_SIZE
}

/// calculate the first block holding a byte of the directory entry `ordinal`
/// # Example
/// ```
/// use dfs::utils::fs_size_calculator::entry_first_block;
/// assert_eq!(entry_first_block(0), 0);
/// assert_eq!(entry_first_block(2), 40);
/// ```
pub const fn entry_first_block(ordinal: usize) -> usize {
    ordinal * DIR_ENTRY_SIZE
}
