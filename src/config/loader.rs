// Configuration loader

use miette::{IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::NameFilter;
use crate::report::ReportFormat;

/// Configuration for a classvacuum run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Classes selected as analysis roots
    pub roots: NameFilter,

    /// Namespace excluded from dependency edges
    pub system: NameFilter,

    /// Local package repository; defaults to `$HOME/.m2/repository`
    pub repository: Option<PathBuf>,

    /// Fail the run on the first class that cannot be decoded
    pub strict: bool,

    /// Decode classes of each archive in parallel
    pub parallel: bool,

    /// Report configuration
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Output format: terminal, json
    pub format: ReportFormat,

    /// Vacuum report lists only archives that can be removed
    pub removable_only: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            roots: NameFilter::default(),
            system: NameFilter::system_default(),
            repository: None,
            strict: false,
            parallel: false,
            report: ReportConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file (YAML or TOML)
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let config: Self = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse YAML config")?,
            "toml" => toml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse TOML config")?,
            _ => {
                // Try YAML first, then TOML
                if let Ok(config) = serde_yaml::from_str(&contents) {
                    config
                } else {
                    toml::from_str(&contents)
                        .into_diagnostic()
                        .wrap_err("Failed to parse config file")?
                }
            }
        };

        Ok(config.normalized())
    }

    /// Try to load configuration from default locations
    pub fn from_default_locations(project_root: &Path) -> Result<Self> {
        let default_names = [
            ".classvacuum.yml",
            ".classvacuum.yaml",
            ".classvacuum.toml",
            "classvacuum.yml",
            "classvacuum.yaml",
            "classvacuum.toml",
        ];

        for name in &default_names {
            let path = project_root.join(name);
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        // No config file found, use defaults
        Ok(Self::default())
    }

    fn normalized(mut self) -> Self {
        self.roots = self.roots.normalized();
        self.system = self.system.normalized();
        self
    }

    /// Repository root, falling back to `$HOME/.m2/repository`
    pub fn repository_root(&self) -> Option<PathBuf> {
        self.repository.clone().or_else(|| {
            std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".m2").join("repository"))
        })
    }
}
