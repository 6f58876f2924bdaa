use crate::fs::{Dfs, ImageDevice};

/// a freshly formatted filesystem on an in-memory device
pub fn init_test_environment() -> Dfs<ImageDevice> {
    let device = ImageDevice::anonymous().expect("Failed to map anonymous memory");
    Dfs::format(device).expect("Failed to format test device")
}
