use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use plugtest_core::Artifact;
use serde::Serialize;
use url::Url;

pub const LOCAL_METADATA_FILE_NAME: &str = "maven-metadata-local.xml";

/// Maps artifact coordinates to paths beneath a repository root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryLayout {
    /// `g/r/o/u/p/<artifactId>/<version>/<file>`
    #[default]
    Default,
    /// `<groupId>/<extension>s/<file>`
    Legacy,
}

impl RepositoryLayout {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Legacy => "legacy",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim() {
            "default" => Ok(Self::Default),
            "legacy" => Ok(Self::Legacy),
            other => bail!("Error retrieving {other} repository layout."),
        }
    }

    pub fn path_of(self, artifact: &Artifact) -> PathBuf {
        match self {
            Self::Default => self
                .artifact_dir(artifact)
                .join(&artifact.version)
                .join(artifact.file_name()),
            Self::Legacy => PathBuf::from(&artifact.group_id)
                .join(format!("{}s", artifact.extension()))
                .join(artifact.file_name()),
        }
    }

    /// Relative path of the descriptor installed alongside `artifact`.
    pub fn pom_path_of(self, artifact: &Artifact) -> PathBuf {
        match self {
            Self::Default => self
                .artifact_dir(artifact)
                .join(&artifact.version)
                .join(artifact.pom_file_name()),
            Self::Legacy => PathBuf::from(&artifact.group_id)
                .join("poms")
                .join(artifact.pom_file_name()),
        }
    }

    /// Relative path of the per-artifact version metadata, if the layout keeps any.
    pub fn metadata_path_of(self, artifact: &Artifact) -> Option<PathBuf> {
        match self {
            Self::Default => Some(self.artifact_dir(artifact).join(LOCAL_METADATA_FILE_NAME)),
            Self::Legacy => None,
        }
    }

    fn artifact_dir(self, artifact: &Artifact) -> PathBuf {
        let mut dir = PathBuf::new();
        for segment in artifact.group_id.split('.').filter(|segment| !segment.is_empty()) {
            dir.push(segment);
        }
        dir.join(&artifact.artifact_id)
    }
}

impl FromStr for RepositoryLayout {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        Self::from_name(value)
    }
}

impl fmt::Display for RepositoryLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A local repository: a root directory plus the layout used beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRepository {
    basedir: PathBuf,
    layout: RepositoryLayout,
}

impl LocalRepository {
    pub fn new(basedir: impl Into<PathBuf>, layout: RepositoryLayout) -> Self {
        Self {
            basedir: basedir.into(),
            layout,
        }
    }

    pub fn basedir(&self) -> &Path {
        &self.basedir
    }

    pub fn layout(&self) -> RepositoryLayout {
        self.layout
    }

    /// `file:` URL of the repository root.
    pub fn url(&self) -> Result<Url> {
        let absolute = if self.basedir.is_absolute() {
            self.basedir.clone()
        } else {
            std::env::current_dir()
                .context("Error converting local repo directory to a URL.")?
                .join(&self.basedir)
        };
        Url::from_directory_path(&absolute).map_err(|()| {
            anyhow!(
                "Error converting local repo directory to a URL: {}",
                absolute.display()
            )
        })
    }

    pub fn path_of(&self, artifact: &Artifact) -> PathBuf {
        self.layout.path_of(artifact)
    }

    pub fn artifact_path(&self, artifact: &Artifact) -> PathBuf {
        self.basedir.join(self.path_of(artifact))
    }

    pub fn pom_path(&self, artifact: &Artifact) -> PathBuf {
        self.basedir.join(self.layout.pom_path_of(artifact))
    }

    pub fn metadata_path(&self, artifact: &Artifact) -> Option<PathBuf> {
        self.layout
            .metadata_path_of(artifact)
            .map(|relative| self.basedir.join(relative))
    }
}
