use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use plugtest_core::{Artifact, Coordinates, PomModel};
use serde::Serialize;
use tracing::debug;

use crate::fs_utils::ensure_parent_dir;
use crate::installer::{ArtifactInstaller, FileSystemInstaller};
use crate::layout::{LocalRepository, RepositoryLayout};
use crate::settings::{find_local_repository_directory, SettingsSources};

/// A built project whose artifact is to be staged for test builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentProject {
    pub artifact: Artifact,
    /// Descriptor the project was built from.
    pub pom_file: PathBuf,
}

impl ComponentProject {
    pub fn new(artifact: Artifact, pom_file: impl Into<PathBuf>) -> Self {
        Self {
            artifact,
            pom_file: pom_file.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledPom {
    pub coordinates: Coordinates,
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// What a staging run placed into the test repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagingReport {
    pub repository: PathBuf,
    pub artifact: PathBuf,
    /// Ancestor descriptors, nearest parent first.
    pub ancestors: Vec<InstalledPom>,
}

/// Builds local repositories for plugin test builds.
#[derive(Debug, Clone, Default)]
pub struct RepositoryTool<I = FileSystemInstaller> {
    installer: I,
    layout: RepositoryLayout,
}

impl RepositoryTool<FileSystemInstaller> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<I: ArtifactInstaller> RepositoryTool<I> {
    pub fn with_installer(installer: I) -> Self {
        Self {
            installer,
            layout: RepositoryLayout::Default,
        }
    }

    pub fn with_layout(mut self, layout: RepositoryLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn layout(&self) -> RepositoryLayout {
        self.layout
    }

    pub fn installer(&self) -> &I {
        &self.installer
    }

    /// Location of the normal (non-test) local repository.
    pub fn find_local_repository_directory(&self, sources: &SettingsSources) -> Result<PathBuf> {
        find_local_repository_directory(sources)
    }

    /// Handle on the normal (non-test) local repository.
    pub fn create_normal_local_repository(
        &self,
        sources: &SettingsSources,
    ) -> Result<LocalRepository> {
        let basedir = self.find_local_repository_directory(sources)?;
        self.create_local_repository(&basedir)
    }

    /// Handle on a local repository rooted at `basedir`, using this tool's layout.
    pub fn create_local_repository(&self, basedir: &Path) -> Result<LocalRepository> {
        let repository = LocalRepository::new(basedir, self.layout);
        repository.url()?;
        Ok(repository)
    }

    /// Installs the project's artifact and every ancestor descriptor reachable
    /// through `relativePath` links from `real_pom_file` into `target_basedir`.
    ///
    /// `real_pom_file` itself is not installed again; its coordinates are
    /// covered by the artifact install. Parents that are only available from
    /// another repository, and not through a relative path, are not
    /// discovered, so test builds needing them will fail to resolve their
    /// ancestry.
    ///
    /// Work done before a failure stays in place.
    pub fn stage_component_project(
        &self,
        project: &ComponentProject,
        real_pom_file: &Path,
        target_basedir: &Path,
    ) -> Result<StagingReport> {
        let mut artifact = project.artifact.clone();
        if artifact.is_pom() {
            artifact.file = Some(project.pom_file.clone());
        }
        if artifact.pom_file.is_none() {
            artifact.pom_file = Some(project.pom_file.clone());
        }

        let repository = self.create_local_repository(target_basedir)?;

        ensure_parent_dir(&repository.artifact_path(&artifact))?;

        let installed_artifact = artifact
            .file()
            .with_context(|| format!("artifact {artifact} has no file; package the project first"))
            .and_then(|source| self.installer.install(source, &artifact, &repository))
            .with_context(|| {
                format!(
                    "Error installing plugin artifact to target local repository: {}",
                    target_basedir.display()
                )
            })?;

        let ancestors = self.install_reachable_ancestor_poms(real_pom_file, &repository)?;

        Ok(StagingReport {
            repository: repository.basedir().to_path_buf(),
            artifact: installed_artifact,
            ancestors,
        })
    }

    fn install_reachable_ancestor_poms(
        &self,
        real_pom_file: &Path,
        repository: &LocalRepository,
    ) -> Result<Vec<InstalledPom>> {
        let mut installed = Vec::new();
        let mut visited = HashSet::new();
        let mut first_pass = true;
        let mut next = Some(real_pom_file.to_path_buf());

        while let Some(pom) = next.take() {
            if !pom.exists() {
                debug!(pom = %pom.display(), "ancestor descriptor not found; stopping");
                break;
            }
            let identity = fs::canonicalize(&pom).unwrap_or_else(|_| pom.clone());
            if !visited.insert(identity) {
                debug!(pom = %pom.display(), "ancestor chain loops back; stopping");
                break;
            }

            let model = PomModel::read(&pom)
                .with_context(|| format!("Error reading ancestor POM: {}", pom.display()))?;
            next = model.parent_pom_path(&pom);

            if first_pass {
                first_pass = false;
                continue;
            }

            let coordinates = model
                .coordinates()
                .with_context(|| format!("Error reading ancestor POM: {}", pom.display()))?;
            let pom_artifact = Artifact::project(
                &coordinates.group_id,
                &coordinates.artifact_id,
                &coordinates.version,
            )
            .with_file(&pom)
            .with_pom_file(&pom);

            let destination = ensure_parent_dir(&repository.artifact_path(&pom_artifact))
                .and_then(|()| self.installer.install(&pom, &pom_artifact, repository))
                .with_context(|| {
                    format!(
                        "Error installing ancestor POM: {} to target local repository: {}",
                        pom.display(),
                        repository.basedir().display()
                    )
                })?;
            debug!(
                pom = %pom.display(),
                coordinates = %coordinates,
                "installed ancestor descriptor"
            );

            installed.push(InstalledPom {
                coordinates,
                source: pom,
                destination,
            });
        }

        Ok(installed)
    }
}
