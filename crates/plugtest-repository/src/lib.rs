mod fs_utils;
mod installer;
mod layout;
mod metadata;
mod settings;
mod stager;

pub use installer::{ArtifactInstaller, FileSystemInstaller};
pub use layout::{LocalRepository, RepositoryLayout, LOCAL_METADATA_FILE_NAME};
pub use metadata::{read_local_versions, record_local_version};
pub use settings::{find_local_repository_directory, SettingsSources};
pub use stager::{ComponentProject, InstalledPom, RepositoryTool, StagingReport};
