use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use plugtest_core::Artifact;
use tracing::debug;

use crate::fs_utils::copy_file;
use crate::layout::LocalRepository;
use crate::metadata::record_local_version;

/// Places artifact files into a repository.
pub trait ArtifactInstaller {
    /// Installs `source` as `artifact` into `repository` and returns where it landed.
    fn install(
        &self,
        source: &Path,
        artifact: &Artifact,
        repository: &LocalRepository,
    ) -> Result<PathBuf>;
}

/// Copies files into a local repository directory and keeps its version metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileSystemInstaller;

impl ArtifactInstaller for FileSystemInstaller {
    fn install(
        &self,
        source: &Path,
        artifact: &Artifact,
        repository: &LocalRepository,
    ) -> Result<PathBuf> {
        artifact.validate()?;
        if !source.is_file() {
            bail!(
                "cannot install {artifact}: file does not exist: {}",
                source.display()
            );
        }

        let destination = repository.artifact_path(artifact);
        copy_file(source, &destination)?;
        debug!(
            artifact = %artifact,
            destination = %destination.display(),
            "installed artifact"
        );

        if let Some(pom_file) = artifact.pom_file() {
            let pom_destination = repository.pom_path(artifact);
            if pom_destination != destination {
                if !pom_file.is_file() {
                    bail!(
                        "cannot install descriptor of {artifact}: file does not exist: {}",
                        pom_file.display()
                    );
                }
                copy_file(pom_file, &pom_destination)?;
                debug!(
                    artifact = %artifact,
                    destination = %pom_destination.display(),
                    "installed attached descriptor"
                );
            }
        }

        if let Some(metadata_path) = repository.metadata_path(artifact) {
            record_local_version(&metadata_path, artifact)?;
        }

        Ok(destination)
    }
}
