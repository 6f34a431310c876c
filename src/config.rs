//! Layered configuration: built-in defaults, then an optional TOML file,
//! then `PROVIDER_INDEX__SECTION__KEY` environment variables. CLI flags are
//! applied on top by the binary.

use ::config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::analyzers::{CrudResolver, DEFAULT_RESOURCE_CONFIG_TYPES};
use crate::output::OutputLayout;
use crate::types::{IndexError, Result};

pub const ENV_PREFIX: &str = "PROVIDER_INDEX";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Worker pool size for scanning and emission. Unset means one per CPU.
    pub workers: Option<usize>,
    pub include_test_files: bool,
    /// Two-part names accepted as a legacy resource constructor's result.
    pub resource_config_types: Vec<String>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            workers: None,
            include_test_files: false,
            resource_config_types: DEFAULT_RESOURCE_CONFIG_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ScanSettings {
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get).max(1)
    }

    pub fn crud_resolver(&self) -> CrudResolver {
        CrudResolver::new(self.resource_config_types.iter().cloned())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub scan: ScanSettings,
    pub output: OutputLayout,
}

impl IndexConfig {
    /// `<config dir>/provider-index/config.toml` for the current user.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "provider-index")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load from the process environment. An explicit `path` must exist; the
    /// per-user default file is only read when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_from(path, None)
    }

    /// Like [`IndexConfig::load`], reading variables from `env` instead of
    /// the process environment when given.
    pub fn load_from(path: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self> {
        let defaults = Config::try_from(&Self::default())?;
        let mut builder = Config::builder().add_source(defaults);

        match path {
            Some(path) => {
                debug!("Loading configuration from {}", path.display());
                if !path.exists() {
                    return Err(IndexError::Config(format!(
                        "configuration file not found: {}",
                        path.display()
                    )));
                }
                builder = builder.add_source(File::from(path).format(FileFormat::Toml));
            }
            None => {
                if let Some(default_path) = Self::default_config_path().filter(|p| p.exists()) {
                    debug!("Loading configuration from {}", default_path.display());
                    builder = builder.add_source(File::from(default_path).format(FileFormat::Toml));
                }
            }
        }

        let environment = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("scan.resource_config_types")
            .source(env);
        builder = builder.add_source(environment);

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| IndexError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn no_env() -> Option<HashMap<String, String>> {
        Some(HashMap::new())
    }

    #[test]
    fn test_defaults() {
        let config = IndexConfig::default();
        assert_eq!(config.scan.workers, None);
        assert!(config.scan.worker_count() >= 1);
        assert_eq!(config.scan.resource_config_types, vec!["pluginsdk.Resource", "schema.Resource"]);
        assert_eq!(config.output.resources_dir, "resources");
        assert_eq!(config.output.data_sources_dir, "datasources");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("provider-index.toml");
        std::fs::write(
            &path,
            r#"
[scan]
workers = 3
include_test_files = true

[output]
summary_file = "index.json"
"#,
        )
        .unwrap();

        let config = IndexConfig::load_from(Some(&path), no_env()).unwrap();
        assert_eq!(config.scan.workers, Some(3));
        assert!(config.scan.include_test_files);
        assert_eq!(config.output.summary_file, "index.json");
        // Untouched keys keep their defaults.
        assert_eq!(config.output.ephemeral_dir, "ephemeral");
        assert_eq!(config.scan.resource_config_types.len(), 2);
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("provider-index.toml");
        std::fs::write(&path, "[scan]\nworkers = 3\n").unwrap();

        let mut env = HashMap::new();
        env.insert("PROVIDER_INDEX__SCAN__WORKERS".to_string(), "7".to_string());
        env.insert(
            "PROVIDER_INDEX__SCAN__RESOURCE_CONFIG_TYPES".to_string(),
            "sdk.Resource,schema.Resource".to_string(),
        );

        let config = IndexConfig::load_from(Some(&path), Some(env)).unwrap();
        assert_eq!(config.scan.workers, Some(7));
        assert_eq!(config.scan.resource_config_types, vec!["sdk.Resource", "schema.Resource"]);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = IndexConfig::load_from(Some(Path::new("/no/such/config.toml")), no_env()).unwrap_err();
        assert!(matches!(err, IndexError::Config(_)));
    }

    #[test]
    fn test_toml_rendering() {
        let rendered = IndexConfig::default().to_toml().unwrap();
        assert!(rendered.contains("[scan]"));
        assert!(rendered.contains("[output]"));
        assert!(rendered.contains("summary_file"));
    }
}
