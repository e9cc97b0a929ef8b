//! Local backend configuration
//!
//! Paths left empty fall back to defaults when resolved:
//! - state path: [`DEFAULT_STATE_FILENAME`]
//! - output path: the state path
//! - backup path: the output path plus [`DEFAULT_BACKUP_EXTENSION`]
//!
//! A backup path of [`BACKUP_DISABLED`] turns backups off.

use crate::backend::ResourceConfig;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// State file used when none is configured
pub const DEFAULT_STATE_FILENAME: &str = "terrace.tfstate";

/// Appended to the output path to form the default backup path
pub const DEFAULT_BACKUP_EXTENSION: &str = ".backup";

/// Backup path value that disables backups
pub const BACKUP_DISABLED: &str = "-";

/// Environment variable that can veto interactive input
pub const INPUT_ENV: &str = "TERRACE_INPUT";

/// Local backend settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Where state is read from
    pub state_path: PathBuf,
    /// Where state is written to
    pub state_out_path: PathBuf,
    /// Where the pre-write state is backed up
    pub state_backup_path: PathBuf,
    /// Ask for missing input before running
    pub input: bool,
    /// Validate configuration before running
    pub validation: bool,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            state_path: PathBuf::new(),
            state_out_path: PathBuf::new(),
            state_backup_path: PathBuf::new(),
            input: false,
            validation: true,
        }
    }
}

/// State locations with defaults applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePaths {
    /// Input location
    pub state: PathBuf,
    /// Output location
    pub out: PathBuf,
    /// Backup location, `None` when disabled
    pub backup: Option<PathBuf>,
}

impl LocalConfig {
    /// Create default config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the state path
    #[must_use]
    pub fn with_state_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_path = path.into();
        self
    }

    /// Set the output path
    #[must_use]
    pub fn with_state_out_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_out_path = path.into();
        self
    }

    /// Set the backup path, or [`BACKUP_DISABLED`]
    #[must_use]
    pub fn with_backup_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_backup_path = path.into();
        self
    }

    /// Enable or disable input
    #[must_use]
    pub fn with_input(mut self, input: bool) -> Self {
        self.input = input;
        self
    }

    /// Enable or disable validation
    #[must_use]
    pub fn with_validation(mut self, validation: bool) -> Self {
        self.validation = validation;
        self
    }

    /// Apply path defaults
    #[must_use]
    pub fn paths(&self) -> StatePaths {
        let state = non_empty(&self.state_path).unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILENAME));
        let out = non_empty(&self.state_out_path).unwrap_or_else(|| state.clone());

        let backup = if self.state_backup_path.as_os_str() == BACKUP_DISABLED {
            None
        } else {
            Some(non_empty(&self.state_backup_path).unwrap_or_else(|| {
                let mut name = OsString::from(out.as_os_str());
                name.push(DEFAULT_BACKUP_EXTENSION);
                PathBuf::from(name)
            }))
        };

        StatePaths { state, out, backup }
    }

    /// Check a configuration block against the local schema
    #[must_use]
    pub fn validate_block(config: &ResourceConfig) -> Vec<ConfigError> {
        config
            .iter()
            .filter_map(|(key, value)| match key.as_str() {
                "path" | "out_path" | "backup_path" if !value.is_string() => Some(ConfigError::WrongType {
                    key: key.clone(),
                    expected: "string",
                }),
                "path" | "out_path" | "backup_path" => None,
                _ => Some(ConfigError::UnknownKey(key.clone())),
            })
            .collect()
    }

    /// Apply a configuration block on top of these settings
    ///
    /// # Errors
    ///
    /// Returns the first schema violation; nothing is applied in that case.
    pub fn apply_block(&mut self, config: &ResourceConfig) -> Result<(), ConfigError> {
        if let Some(err) = Self::validate_block(config).into_iter().next() {
            return Err(err);
        }
        for (key, value) in config {
            let Some(path) = value.as_str() else { continue };
            match key.as_str() {
                "path" => self.state_path = PathBuf::from(path),
                "out_path" => self.state_out_path = PathBuf::from(path),
                "backup_path" => self.state_backup_path = PathBuf::from(path),
                _ => {}
            }
        }
        Ok(())
    }
}

fn non_empty(path: &Path) -> Option<PathBuf> {
    (!path.as_os_str().is_empty()).then(|| path.to_path_buf())
}

/// Whether input should be enabled, given the requested setting and
/// the value of [`INPUT_ENV`]
#[must_use]
pub fn input_enabled(requested: bool, env_value: Option<&str>) -> bool {
    requested && env_value.and_then(parse_bool) != Some(false)
}

/// Read [`INPUT_ENV`] and decide whether input should be enabled
#[must_use]
pub fn input_enabled_from_env(requested: bool) -> bool {
    let value = std::env::var(INPUT_ENV).ok();
    input_enabled(requested, value.as_deref())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_paths_get_defaults() {
        let paths = LocalConfig::new().paths();
        assert_eq!(paths.state, PathBuf::from("terrace.tfstate"));
        assert_eq!(paths.out, PathBuf::from("terrace.tfstate"));
        assert_eq!(paths.backup, Some(PathBuf::from("terrace.tfstate.backup")));
    }

    #[test]
    fn backup_defaults_follow_out_path() {
        let paths = LocalConfig::new().with_state_path("in.tfstate").with_state_out_path("out.tfstate").paths();
        assert_eq!(paths.state, PathBuf::from("in.tfstate"));
        assert_eq!(paths.backup, Some(PathBuf::from("out.tfstate.backup")));
    }

    #[test]
    fn dash_disables_backup() {
        let paths = LocalConfig::new().with_backup_path(BACKUP_DISABLED).paths();
        assert_eq!(paths.backup, None);
    }

    #[test]
    fn schema_rejects_unknown_and_mistyped_keys() {
        let block = json!({"path": "a", "backup_path": 3, "colour": "red"});
        let errors = LocalConfig::validate_block(block.as_object().unwrap());
        assert_eq!(errors.len(), 2);
        assert!(errors.contains(&ConfigError::UnknownKey("colour".into())));

        let mut config = LocalConfig::new();
        let block = json!({"path": "x.tfstate", "backup_path": "-"});
        config.apply_block(block.as_object().unwrap()).unwrap();
        assert_eq!(config.paths().state, PathBuf::from("x.tfstate"));
        assert_eq!(config.paths().backup, None);
    }

    #[test]
    fn env_can_only_veto_input() {
        assert!(input_enabled(true, None));
        assert!(!input_enabled(true, Some("false")));
        assert!(!input_enabled(true, Some("0")));
        assert!(input_enabled(true, Some("maybe")));
        assert!(!input_enabled(false, Some("true")));
    }
}
