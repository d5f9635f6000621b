//! Typed project configuration (`kb.toml`).

use crate::error::{KbError, KbResult};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Project-relative location of the optional configuration file.
pub const CONFIG_FILE: &str = "kb.toml";

/// Default reserved index filename.
pub const DEFAULT_INDEX_FILE: &str = "INDEX.md";

/// Generic TOML-backed config loader.
///
/// `ConfigLoader<T>` handles only filesystem access and TOML deserialization. Semantic checks on
/// the loaded value belong to the caller.
///
/// ```rust
/// # use std::path::Path;
/// # use knowledge_base::config::{ConfigLoader, KbConfig};
/// let loader = ConfigLoader::<KbConfig>::new(Path::new("/project"), "kb.toml");
/// assert!(loader.path().ends_with("kb.toml"));
/// ```
#[derive(Clone, Debug)]
pub struct ConfigLoader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T> ConfigLoader<T>
where
    T: DeserializeOwned,
{
    /// Create a loader for the given root-relative path.
    pub fn new(root: &Path, relative_path: &str) -> Self {
        Self {
            path: root.join(relative_path),
            _marker: PhantomData,
        }
    }

    /// Load and deserialize the configuration file.
    ///
    /// Unreadable files and TOML parse failures are both [`KbError::Config`].
    pub fn load(&self) -> KbResult<T> {
        let body = fs::read_to_string(&self.path).map_err(|err| KbError::Config {
            path: self.path.clone(),
            message: format!("failed to read: {err}"),
        })?;
        toml::from_str(&body).map_err(|err| KbError::Config {
            path: self.path.clone(),
            message: format!("failed to parse: {err}"),
        })
    }

    /// Load the file if it exists, otherwise fall back to `T::default()`.
    pub fn load_or_default(&self) -> KbResult<T>
    where
        T: Default,
    {
        if self.path.exists() {
            self.load()
        } else {
            Ok(T::default())
        }
    }

    /// Config path on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Engine configuration for one project.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct KbConfig {
    /// Top-level content directories walked by the project validator, in visit order.
    pub content_roots: Vec<String>,
    /// Reserved per-directory index filename.
    pub index_file: String,
    /// Source URL checking policy.
    pub url_check: UrlCheckConfig,
}

impl Default for KbConfig {
    fn default() -> Self {
        Self {
            content_roots: vec!["docs".into(), "research".into(), "notes".into()],
            index_file: DEFAULT_INDEX_FILE.into(),
            url_check: UrlCheckConfig::default(),
        }
    }
}

impl KbConfig {
    /// Load `kb.toml` from `root`, or defaults when the file is absent.
    pub fn load(root: &Path) -> KbResult<Self> {
        ConfigLoader::<Self>::new(root, CONFIG_FILE).load_or_default()
    }
}

/// Settings for the source URL checker.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct UrlCheckConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// User-agent sent with every probe.
    pub user_agent: String,
    /// HTTP statuses reported as warnings instead of failures.
    pub warn_statuses: Vec<u16>,
}

impl Default for UrlCheckConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: concat!("knowledge-base-validator/", env!("CARGO_PKG_VERSION")).into(),
            warn_statuses: vec![403, 429],
        }
    }
}

impl UrlCheckConfig {
    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_yields_defaults() {
        let root = tempfile::tempdir().expect("tempdir");
        let config = KbConfig::load(root.path()).expect("load");
        assert_eq!(config, KbConfig::default());
        assert_eq!(config.url_check.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let root = tempfile::tempdir().expect("tempdir");
        fs::write(
            root.path().join(CONFIG_FILE),
            "content_roots = [\"kb\"]\n\n[url_check]\nwarn_statuses = []\n",
        )
        .expect("write config");

        let config = KbConfig::load(root.path()).expect("load");
        assert_eq!(config.content_roots, vec!["kb".to_string()]);
        assert_eq!(config.index_file, DEFAULT_INDEX_FILE);
        assert!(config.url_check.warn_statuses.is_empty());
        assert_eq!(config.url_check.timeout_secs, 10);
    }

    #[test]
    fn invalid_toml_is_a_config_error_naming_the_file() {
        let root = tempfile::tempdir().expect("tempdir");
        fs::write(root.path().join(CONFIG_FILE), "content_roots = [").expect("write config");

        let err = KbConfig::load(root.path()).expect_err("invalid config should fail");
        assert!(matches!(err, KbError::Config { .. }));
        assert!(err.to_string().contains(CONFIG_FILE));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let root = tempfile::tempdir().expect("tempdir");
        fs::write(root.path().join(CONFIG_FILE), "index_name = \"README.md\"\n")
            .expect("write config");

        assert!(KbConfig::load(root.path()).is_err());
    }
}
