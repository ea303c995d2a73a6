//! Optional per-repository configuration in `.gw-state/config.json`.

use std::env;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::document::STATE_DIR;
use crate::error::ConfigError;
use crate::message::{DEFAULT_MAX_HEADER_LENGTH, Severity, TypeSet, Validator};
use crate::vcs::DEFAULT_RENAME_THRESHOLD;
use crate::vcs::git::DEFAULT_TIMEOUT_SECS;

/// File name of the config inside the state directory.
pub const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding `git_timeout_secs`.
pub const TIMEOUT_ENV_VAR: &str = "GW_GIT_TIMEOUT";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Commit types accepted in addition to the built-in set.
    pub extra_types: Vec<String>,
    /// Whether an unknown type blocks the commit or only warns.
    pub unknown_type: Severity,
    /// Similarity percent for rename detection (1..=100).
    pub rename_threshold: u8,
    pub git_timeout_secs: u64,
    pub max_subject_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extra_types: Vec::new(),
            unknown_type: Severity::Error,
            rename_threshold: DEFAULT_RENAME_THRESHOLD,
            git_timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_subject_length: DEFAULT_MAX_HEADER_LENGTH,
        }
    }
}

impl Config {
    /// Load the config for the repository at `root`.
    ///
    /// A missing file yields the defaults. `GW_GIT_TIMEOUT` wins over the
    /// file's `git_timeout_secs`.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(STATE_DIR).join(CONFIG_FILE);

        let mut config = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                Config::default()
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        if !(1..=100).contains(&config.rename_threshold) {
            return Err(ConfigError::InvalidRenameThreshold(config.rename_threshold));
        }

        if config.git_timeout_secs == 0 {
            warn!(
                "Invalid git_timeout_secs 0 in {}, using {}s",
                path.display(),
                DEFAULT_TIMEOUT_SECS
            );
            config.git_timeout_secs = DEFAULT_TIMEOUT_SECS;
        }

        if let Some(secs) = timeout_override() {
            config.git_timeout_secs = secs;
        }

        Ok(config)
    }

    pub fn git_timeout(&self) -> Duration {
        Duration::from_secs(self.git_timeout_secs)
    }

    /// A validator honoring the configured types and policies.
    pub fn validator(&self) -> Validator {
        Validator::new(TypeSet::with_extra(&self.extra_types), self.unknown_type)
            .with_max_header_length(self.max_subject_length)
    }
}

/// Reads `GW_GIT_TIMEOUT`; invalid values (including 0) are logged and
/// ignored.
fn timeout_override() -> Option<u64> {
    match env::var(TIMEOUT_ENV_VAR) {
        Ok(v) if !v.is_empty() => match v.parse::<u64>() {
            Ok(secs) if secs > 0 => Some(secs),
            _ => {
                warn!("Invalid {} value '{}', ignoring it", TIMEOUT_ENV_VAR, v);
                None
            }
        },
        _ => None,
    }
}
