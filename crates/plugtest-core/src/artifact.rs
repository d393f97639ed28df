use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use serde::Serialize;

/// Group, artifact and version of a project descriptor.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Coordinates {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

impl Coordinates {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

/// A built output identified by its coordinates and packaging.
///
/// `file` is the built file once the project has been packaged. `pom_file` is
/// the descriptor attached to the artifact; installers place it next to the
/// artifact so the repository can resolve the project model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub packaging: String,
    pub classifier: Option<String>,
    pub file: Option<PathBuf>,
    pub pom_file: Option<PathBuf>,
}

impl Artifact {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
        packaging: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
            packaging: packaging.into(),
            classifier: None,
            file: None,
            pom_file: None,
        }
    }

    /// The artifact of a bare project descriptor (`pom` packaging).
    pub fn project(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self::new(group_id, artifact_id, version, "pom")
    }

    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_pom_file(mut self, pom_file: impl Into<PathBuf>) -> Self {
        self.pom_file = Some(pom_file.into());
        self
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(&self.group_id, &self.artifact_id, &self.version)
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn pom_file(&self) -> Option<&Path> {
        self.pom_file.as_deref()
    }

    pub fn is_pom(&self) -> bool {
        self.packaging == "pom"
    }

    pub fn extension(&self) -> &str {
        packaging_extension(&self.packaging)
    }

    /// Explicit classifier, or the one implied by the packaging.
    pub fn effective_classifier(&self) -> Option<&str> {
        if let Some(classifier) = self.classifier.as_deref() {
            return Some(classifier).filter(|value| !value.is_empty());
        }
        match self.packaging.as_str() {
            "test-jar" => Some("tests"),
            "java-source" => Some("sources"),
            "javadoc" => Some("javadoc"),
            _ => None,
        }
    }

    /// `<artifactId>-<version>[-<classifier>].<extension>`
    pub fn file_name(&self) -> String {
        match self.effective_classifier() {
            Some(classifier) => format!(
                "{}-{}-{}.{}",
                self.artifact_id,
                self.version,
                classifier,
                self.extension()
            ),
            None => format!("{}-{}.{}", self.artifact_id, self.version, self.extension()),
        }
    }

    pub fn pom_file_name(&self) -> String {
        format!("{}-{}.pom", self.artifact_id, self.version)
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("groupId", &self.group_id),
            ("artifactId", &self.artifact_id),
            ("version", &self.version),
            ("packaging", &self.packaging),
        ] {
            if value.trim().is_empty() {
                bail!("artifact {self} has an empty {field}");
            }
            if value.contains(['/', '\\']) {
                bail!("artifact {self} has an invalid {field}: {value}");
            }
        }
        Ok(())
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.packaging)?;
        if let Some(classifier) = self.effective_classifier() {
            write!(f, ":{classifier}")?;
        }
        write!(f, ":{}", self.version)
    }
}

/// File extension used for artifacts of the given packaging.
pub fn packaging_extension(packaging: &str) -> &str {
    match packaging {
        "pom" => "pom",
        "jar" | "maven-plugin" | "ejb" | "ejb-client" | "test-jar" | "java-source"
        | "javadoc" => "jar",
        other => other,
    }
}
