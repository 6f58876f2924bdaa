use clap::Parser;
use dfs::{cli_interface::DfsCli, mount::MountConfig};
/// a CLI interface to users to choose create our filesystem,
/// or register it to `FUSE` and mount it.
///
/// The latter will block the program until we umount our filesystem ourselves,
///
/// or specify `--auto-unmount` when mounting this fs.
fn main() -> anyhow::Result<()> {
    env_logger::builder().format_timestamp_nanos().init();
    let args = DfsCli::parse();
    match args {
        //if it is a `mkfs` subcommand
        DfsCli::Mkfs(args) => {
            dfs::mkfs::mkfs(args.image_file_path)?;
        }
        DfsCli::Mount(args) => {
            //register a filesystem to `FUSE` and mount it
            let config = MountConfig {
                auto_unmount: args.auto_unmount,
                allow_other: args.allow_other,
            };
            dfs::mount::mount(args.image_file_path, args.mount_point, config)?;
        }
    }
    Ok(())
}
