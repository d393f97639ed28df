use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use plugtest_core::{read_xml_file, XmlDocument};
use tracing::debug;

/// Where to look for the location of the normal local repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsSources {
    pub local_repository_override: Option<PathBuf>,
    pub user_settings: Option<PathBuf>,
    pub global_settings: Option<PathBuf>,
    pub user_home: PathBuf,
}

impl SettingsSources {
    /// Conventional sources for `user_home`: `~/.m2/settings.xml` and no global settings.
    pub fn new(user_home: impl Into<PathBuf>) -> Self {
        let user_home = user_home.into();
        Self {
            local_repository_override: None,
            user_settings: Some(user_home.join(".m2").join("settings.xml")),
            global_settings: None,
            user_home,
        }
    }

    /// Reads `MAVEN_LOCAL_REPO`, `MAVEN_HOME` and the user's home directory.
    pub fn from_env() -> Result<Self> {
        let home_var = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
        let home = std::env::var(home_var)
            .with_context(|| format!("{home_var} is not set; cannot resolve user settings"))?;

        let mut sources = Self::new(home);
        sources.local_repository_override = non_empty_env("MAVEN_LOCAL_REPO").map(PathBuf::from);
        sources.global_settings = non_empty_env("MAVEN_HOME")
            .map(|maven_home| PathBuf::from(maven_home).join("conf").join("settings.xml"));
        Ok(sources)
    }

    pub fn with_override(mut self, local_repository: impl Into<PathBuf>) -> Self {
        self.local_repository_override = Some(local_repository.into());
        self
    }

    pub fn with_user_settings(mut self, path: impl Into<PathBuf>) -> Self {
        self.user_settings = Some(path.into());
        self
    }

    pub fn with_global_settings(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_settings = Some(path.into());
        self
    }

    pub fn default_local_repository(&self) -> PathBuf {
        self.user_home.join(".m2").join("repository")
    }
}

/// Location of the normal (non-test) local repository.
///
/// An explicit override wins, then `localRepository` from user settings, then
/// from global settings, then `~/.m2/repository`.
pub fn find_local_repository_directory(sources: &SettingsSources) -> Result<PathBuf> {
    if let Some(local_repo) = sources
        .local_repository_override
        .as_ref()
        .filter(|path| !path.as_os_str().is_empty())
    {
        return Ok(local_repo.clone());
    }

    let configured = read_configured_local_repository(sources)
        .context("Error building Maven settings.")?;
    match configured {
        Some(value) => {
            debug!(local_repository = %value, "local repository configured by settings");
            Ok(PathBuf::from(value))
        }
        None => Ok(sources.default_local_repository()),
    }
}

fn read_configured_local_repository(sources: &SettingsSources) -> Result<Option<String>> {
    for path in [&sources.user_settings, &sources.global_settings]
        .into_iter()
        .flatten()
    {
        if let Some(value) = read_settings_local_repository(path)? {
            let value = interpolate(&value, &sources.user_home);
            if !value.trim().is_empty() {
                return Ok(Some(value.trim().to_string()));
            }
        }
    }
    Ok(None)
}

fn read_settings_local_repository(path: &Path) -> Result<Option<String>> {
    if !path.is_file() {
        return Ok(None);
    }

    let raw = read_xml_file(path)
        .with_context(|| format!("failed to read settings: {}", path.display()))?;
    let document = XmlDocument::parse(&raw)
        .with_context(|| format!("failed to parse settings: {}", path.display()))?;
    if document.root() != "settings" {
        bail!(
            "settings file {} has unexpected root element <{}>",
            path.display(),
            document.root()
        );
    }
    Ok(document.non_empty_text("settings/localRepository"))
}

/// Expands `${user.home}` and `${env.NAME}`; unknown expressions are kept verbatim.
pub(crate) fn interpolate(value: &str, user_home: &Path) -> String {
    let mut output = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            output.push_str(&rest[start..]);
            return output;
        };

        let expression = &after[..end];
        let replacement = if expression == "user.home" {
            Some(user_home.display().to_string())
        } else if let Some(name) = expression.strip_prefix("env.") {
            std::env::var(name).ok()
        } else {
            None
        };
        match replacement {
            Some(replacement) => output.push_str(&replacement),
            None => output.push_str(&rest[start..start + 2 + end + 1]),
        }
        rest = &after[end + 1..];
    }

    output.push_str(rest);
    output
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}
