//! Locate, parse, override and validate the configuration.
//!
//! Precedence, lowest first: built-in defaults, the YAML file, then
//! [`Overrides`] (environment variables and command-line flags, resolved by
//! the caller).

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::defaults;
use crate::error::{ConfigError, ConfigResult};
use crate::model::{ConfigDocument, Settings};
use crate::validate::validate;

/// Values that win over the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Replaces `download_client.url`.
    pub client_url: Option<String>,
    /// Forces dry-run mode on; never turns it off.
    pub dry_run: bool,
    /// Replaces `quota.max_used_bytes`.
    pub max_used_bytes: Option<u64>,
}

impl Overrides {
    /// Write the overrides into `document`.
    pub fn apply(&self, document: &mut ConfigDocument) {
        if let Some(url) = &self.client_url {
            document.download_client.url = Some(url.clone());
        }
        if self.dry_run {
            document.dry_run = true;
        }
        if let Some(bytes) = self.max_used_bytes {
            document.quota.max_used_bytes = Some(bytes);
        }
    }
}

/// Loads settings from an explicit path or the working directory.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    path: Option<PathBuf>,
    overrides: Overrides,
}

impl ConfigLoader {
    /// Loader with no explicit file and no overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `path`; it must exist.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Apply `overrides` on top of the file.
    #[must_use]
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Parse the document without validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when an explicit file cannot be read and
    /// [`ConfigError::Parse`] when the YAML does not fit the document shape.
    pub fn document(&self) -> ConfigResult<ConfigDocument> {
        let mut document = match self.source() {
            Some(path) => read_document(&path)?,
            None => {
                debug!("no configuration file; using defaults");
                ConfigDocument::default()
            }
        };
        self.overrides.apply(&mut document);
        Ok(document)
    }

    /// Parse and validate.
    ///
    /// # Errors
    ///
    /// Any error from [`ConfigLoader::document`] or [`validate`].
    pub fn load(&self) -> ConfigResult<Settings> {
        validate(self.document()?)
    }

    fn source(&self) -> Option<PathBuf> {
        if let Some(path) = &self.path {
            return Some(path.clone());
        }
        let fallback = PathBuf::from(defaults::CONFIG_FILE);
        fallback.is_file().then_some(fallback)
    }
}

fn read_document(path: &Path) -> ConfigResult<ConfigDocument> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "read configuration file");
    if raw.trim().is_empty() {
        return Ok(ConfigDocument::default());
    }
    serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
