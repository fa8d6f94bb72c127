//! create-wrangler configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Project-local config file name
pub const LOCAL_CONFIG: &str = ".create-wrangler.yml";

/// Main create-wrangler configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JavaScript runtime used to load templates
    pub runtime: RuntimeConfig,

    /// Bundler used for TypeScript templates
    pub compiler: CompilerConfig,

    /// Temporary compilation directories
    pub workspace: WorkspaceConfig,
}

impl Config {
    /// Load the tool configuration
    ///
    /// An explicit path must load. Otherwise the first readable file from
    /// [`Config::search_paths`] wins; unreadable ones are skipped with a
    /// warning, and with none found the defaults apply.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::read(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::search_paths() {
            if !candidate.is_file() {
                continue;
            }
            match Self::read(&candidate) {
                Ok(config) => return Ok(config),
                Err(e) => tracing::warn!("Skipping config {}: {:#}", candidate.display(), e),
            }
        }

        tracing::debug!("Config::load: no config file, using defaults");
        Ok(Self::default())
    }

    /// Implicit config locations, highest priority first
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("create-wrangler").join("create-wrangler.yml"));
        }
        paths
    }

    fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config = serde_yaml::from_str(&content).context("Invalid create-wrangler config")?;
        tracing::debug!(?path, "Config::read: loaded");
        Ok(config)
    }
}

/// JavaScript runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Runtime executable
    pub program: String,

    /// Extra arguments placed before the loader script
    pub args: Vec<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            program: "node".to_string(),
            args: Vec::new(),
        }
    }
}

/// Bundler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Executable that runs the bundler
    pub program: String,

    /// Arguments placed before the entry point
    pub args: Vec<String>,

    /// Output module format
    pub format: String,

    /// Target platform
    pub platform: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: "npx".to_string(),
            args: vec!["--no-install".to_string(), "esbuild".to_string()],
            format: "esm".to_string(),
            platform: "node".to_string(),
        }
    }
}

/// Temporary compilation directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Parent of the per-run output directories (default: working directory)
    #[serde(rename = "temp-parent")]
    pub temp_parent: Option<PathBuf>,

    /// Name prefix of the per-run output directories
    pub prefix: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            temp_parent: None,
            prefix: ".create-wrangler-".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.runtime.program, "node");
        assert_eq!(config.compiler.program, "npx");
        assert_eq!(config.compiler.args, vec!["--no-install", "esbuild"]);
        assert_eq!(config.compiler.format, "esm");
        assert!(config.workspace.temp_parent.is_none());
        assert_eq!(config.workspace.prefix, ".create-wrangler-");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
runtime:
  program: bun
workspace:
  temp-parent: /tmp/builds
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.runtime.program, "bun");
        assert!(config.runtime.args.is_empty());
        assert_eq!(config.compiler.program, "npx");
        assert_eq!(config.workspace.temp_parent, Some(PathBuf::from("/tmp/builds")));
        assert_eq!(config.workspace.prefix, ".create-wrangler-");
    }

    #[test]
    fn test_load_explicit_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cw.yml");
        std::fs::write(&path, "compiler:\n  platform: neutral\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.compiler.platform, "neutral");
        assert_eq!(config.compiler.format, "esm");
    }

    #[test]
    fn test_search_paths_start_with_local_file() {
        let paths = Config::search_paths();
        assert_eq!(paths[0], PathBuf::from(LOCAL_CONFIG));
        assert!(paths.iter().skip(1).all(|p| p.ends_with("create-wrangler/create-wrangler.yml")));
    }

    #[test]
    fn test_load_explicit_invalid_file_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cw.yml");
        std::fs::write(&path, "runtime: [not, a, table]\n").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid create-wrangler config"));
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let path = PathBuf::from("/nonexistent/create-wrangler.yml");
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/create-wrangler.yml"));
    }
}
