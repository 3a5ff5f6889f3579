//! Codec and CLI settings, stored as TOML.
//!
//! ```toml
//! problem_name = "delivery"
//! case_folding = "preserve"
//! indent = 4
//! ```

use std::path::Path;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::{CaseFolding, EmitOptions};

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(plankb::config::read),
        help("Ensure the config file exists and is valid TOML.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {path}")]
    #[diagnostic(
        code(plankb::config::parse),
        help(
            "Check the TOML syntax. Known keys are problem_name, case_folding \
             (\"lower-identifiers\" or \"preserve\") and indent."
        )
    )]
    Parse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(plankb::config::write),
        help("Ensure you have write permissions to the config directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Settings for problem emission. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanKbConfig {
    #[serde(default = "default_problem_name")]
    pub problem_name: String,
    #[serde(default)]
    pub case_folding: CaseFolding,
    #[serde(default = "default_indent")]
    pub indent: usize,
}

fn default_problem_name() -> String {
    "problem_1".into()
}

fn default_indent() -> usize {
    2
}

impl Default for PlanKbConfig {
    fn default() -> Self {
        Self {
            problem_name: default_problem_name(),
            case_folding: CaseFolding::default(),
            indent: default_indent(),
        }
    }
}

impl PlanKbConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }

    pub fn emit_options(&self) -> EmitOptions {
        EmitOptions {
            problem_name: self.problem_name.clone(),
            case_folding: self.case_folding,
            indent: self.indent,
        }
    }
}
