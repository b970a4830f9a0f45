//! Error types for configuration loading and validation.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Source IO error.
        #[source]
        source: io::Error,
    },
    /// Configuration file is not valid YAML for the document shape.
    #[error("failed to parse configuration file")]
    Parse {
        /// File that was being parsed.
        path: PathBuf,
        /// Source parse error.
        #[source]
        source: serde_yaml::Error,
    },
    /// Field contained an invalid value.
    #[error("invalid configuration field")]
    InvalidField {
        /// Section that failed validation.
        section: String,
        /// Field that failed validation.
        field: String,
        /// Offending value when available.
        value: Option<String>,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// A category is bound to a PVR that is not declared.
    #[error("category bound to an unknown pvr")]
    UnknownPvr {
        /// Category carrying the binding.
        category: String,
        /// PVR name the binding refers to.
        pvr: String,
    },
    /// A required field was absent.
    #[error("missing configuration field")]
    MissingField {
        /// Section the field belongs to.
        section: &'static str,
        /// Name of the missing field.
        field: &'static str,
    },
}

impl ConfigError {
    pub(crate) fn invalid(
        section: impl Into<String>,
        field: impl Into<String>,
        value: Option<String>,
        reason: &'static str,
    ) -> Self {
        Self::InvalidField {
            section: section.into(),
            field: field.into(),
            value,
            reason,
        }
    }

    /// One-line description with the structured context folded in.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Io { path, source } => format!("{self}: {}: {source}", path.display()),
            Self::Parse { path, source } => format!("{self}: {}: {source}", path.display()),
            Self::InvalidField {
                section,
                field,
                value,
                reason,
            } => match value {
                Some(value) => format!("{self}: {section}.{field} = {value:?}: {reason}"),
                None => format!("{self}: {section}.{field}: {reason}"),
            },
            Self::UnknownPvr { category, pvr } => {
                format!("{self}: categories.{category} -> {pvr:?}")
            }
            Self::MissingField { section, field } => format!("{self}: {section}.{field}"),
        }
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
