//! register our filesystem to `FUSE` and mount it
use fuser::MountOption;
use log::info;
use std::path::Path;

use crate::fs::{Dfs, DfsFuse};

/// mount options beyond the image and the mount point
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MountConfig {
    pub auto_unmount: bool,
    pub allow_other: bool,
}

impl MountConfig {
    pub fn options(&self) -> Vec<MountOption> {
        let mut opts = vec![
            MountOption::FSName("dfs".to_string()),
            MountOption::RW,
            MountOption::NoSuid,
            MountOption::NoExec,
        ];
        if self.auto_unmount {
            opts.push(MountOption::AutoUnmount);
        }
        if self.allow_other {
            opts.push(MountOption::AllowOther);
        }
        opts
    }
}

/// blocks until the filesystem is unmounted
pub fn mount<P, Q>(image_path: P, mountpoint: Q, config: MountConfig) -> anyhow::Result<()>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let fs = Dfs::open_image(image_path.as_ref())?;
    info!(
        "mounting {:?} on {:?}",
        image_path.as_ref(),
        mountpoint.as_ref()
    );
    Ok(fuser::mount2(DfsFuse::new(fs), mountpoint, &config.options())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mount_options() {
        let opts = MountConfig::default().options();
        assert!(opts.contains(&MountOption::FSName("dfs".to_string())));
        assert!(!opts.contains(&MountOption::AutoUnmount));

        let opts = MountConfig {
            auto_unmount: true,
            allow_other: true,
        }
        .options();
        assert!(opts.contains(&MountOption::AutoUnmount));
        assert!(opts.contains(&MountOption::AllowOther));
    }

    #[test]
    fn test_mount_rejects_unformatted_image() {
        let tmp_file = std::env::temp_dir().join("dfs_mount_unformatted.img");
        std::fs::write(&tmp_file, vec![0u8; crate::fs::BLOCK_SIZE * crate::fs::NUM_BLOCKS])
            .unwrap();
        let err = mount(&tmp_file, std::env::temp_dir(), MountConfig::default()).unwrap_err();
        assert!(err.to_string().contains("formatted"));
        std::fs::remove_file(&tmp_file).unwrap();
    }
}
