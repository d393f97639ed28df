mod file_manager;
mod fs_utils;
mod mock;

pub use file_manager::{with_test_files, ScopedTestFiles, TestFileManager};
pub use mock::{MockControl, MockManager};
