use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::artifact::Coordinates;
use crate::xml::{read_xml_file, XmlDocument};

/// Relative path assumed when a `<parent>` declares none.
pub const DEFAULT_PARENT_RELATIVE_PATH: &str = "../pom.xml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PomParent {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    /// Empty when the descriptor opts out of filesystem lookup with `<relativePath/>`.
    pub relative_path: String,
}

/// The subset of a project descriptor needed to walk its ancestry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PomModel {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub packaging: Option<String>,
    pub parent: Option<PomParent>,
}

impl PomModel {
    pub fn from_xml_str(input: &str) -> Result<Self> {
        let document = XmlDocument::parse(input).context("failed to parse project descriptor")?;
        if document.root() != "project" {
            bail!(
                "expected <project> as the descriptor root element, found <{}>",
                document.root()
            );
        }

        let parent = document.contains("project/parent").then(|| PomParent {
            group_id: document.non_empty_text("project/parent/groupId"),
            artifact_id: document.non_empty_text("project/parent/artifactId"),
            version: document.non_empty_text("project/parent/version"),
            relative_path: match document.text("project/parent/relativePath") {
                Some(path) => path.trim().to_string(),
                None => DEFAULT_PARENT_RELATIVE_PATH.to_string(),
            },
        });

        Ok(Self {
            group_id: document.non_empty_text("project/groupId"),
            artifact_id: document.non_empty_text("project/artifactId"),
            version: document.non_empty_text("project/version"),
            packaging: document.non_empty_text("project/packaging"),
            parent,
        })
    }

    pub fn read(path: &Path) -> Result<Self> {
        let raw = read_xml_file(path)
            .with_context(|| format!("failed to read project descriptor: {}", path.display()))?;
        Self::from_xml_str(&raw)
            .with_context(|| format!("failed to parse project descriptor: {}", path.display()))
    }

    /// Own groupId, or the parent's when the descriptor inherits it.
    pub fn effective_group_id(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or_else(|| self.parent.as_ref()?.group_id.as_deref())
    }

    /// Own version, or the parent's when the descriptor inherits it.
    pub fn effective_version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .or_else(|| self.parent.as_ref()?.version.as_deref())
    }

    pub fn coordinates(&self) -> Result<Coordinates> {
        let Some(artifact_id) = self.artifact_id.as_deref() else {
            bail!("project descriptor declares no artifactId");
        };
        let Some(group_id) = self.effective_group_id() else {
            bail!("project descriptor '{artifact_id}' declares no groupId and has no parent");
        };
        let Some(version) = self.effective_version() else {
            bail!("project descriptor '{artifact_id}' declares no version and has no parent");
        };
        Ok(Coordinates::new(group_id, artifact_id, version))
    }

    /// Location of the parent descriptor relative to `pom_file`.
    ///
    /// `None` when there is no parent or the relative path is empty. A path
    /// naming a directory resolves to the `pom.xml` inside it. The returned
    /// path is not checked for existence.
    pub fn parent_pom_path(&self, pom_file: &Path) -> Option<PathBuf> {
        let parent = self.parent.as_ref()?;
        if parent.relative_path.is_empty() {
            return None;
        }

        let base = pom_file.parent().unwrap_or_else(|| Path::new(""));
        let candidate = base.join(&parent.relative_path);
        if candidate.is_dir() {
            return Some(candidate.join("pom.xml"));
        }
        Some(candidate)
    }
}
