use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use plugtest_core::{escape_text, read_xml_file, Artifact, XmlDocument};

use crate::fs_utils::ensure_parent_dir;

const VERSIONS_PATH: &str = "metadata/versioning/versions/version";

/// Versions recorded in a local metadata file, in file order.
///
/// A missing file records no versions.
pub fn read_local_versions(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let raw = read_xml_file(path)
        .with_context(|| format!("failed to read repository metadata: {}", path.display()))?;
    let document = XmlDocument::parse(&raw)
        .with_context(|| format!("failed to parse repository metadata: {}", path.display()))?;
    if document.root() != "metadata" {
        bail!(
            "repository metadata {} has unexpected root element <{}>",
            path.display(),
            document.root()
        );
    }

    Ok(document
        .texts(VERSIONS_PATH)
        .filter(|version| !version.is_empty())
        .map(str::to_string)
        .collect())
}

/// Adds the artifact's version to the local metadata at `path`.
pub fn record_local_version(path: &Path, artifact: &Artifact) -> Result<()> {
    let mut versions = read_local_versions(path)?;
    if !versions.iter().any(|version| version == &artifact.version) {
        versions.push(artifact.version.clone());
    }

    let last_updated = Utc::now().format("%Y%m%d%H%M%S").to_string();
    let mut payload = String::new();
    payload.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    payload.push_str("<metadata>\n");
    payload.push_str(&format!(
        "  <groupId>{}</groupId>\n",
        escape_text(&artifact.group_id)
    ));
    payload.push_str(&format!(
        "  <artifactId>{}</artifactId>\n",
        escape_text(&artifact.artifact_id)
    ));
    payload.push_str("  <versioning>\n");
    payload.push_str("    <versions>\n");
    for version in &versions {
        payload.push_str(&format!(
            "      <version>{}</version>\n",
            escape_text(version)
        ));
    }
    payload.push_str("    </versions>\n");
    payload.push_str(&format!(
        "    <lastUpdated>{last_updated}</lastUpdated>\n"
    ));
    payload.push_str("  </versioning>\n");
    payload.push_str("</metadata>\n");

    ensure_parent_dir(path)?;
    fs::write(path, payload.as_bytes())
        .with_context(|| format!("failed to write repository metadata: {}", path.display()))?;
    Ok(())
}
