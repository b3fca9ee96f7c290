use anyhow::{Context, Result};
use clap::ValueEnum;
use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use xoeuf_domain::Limits;

#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Indent JSON output. Ignored for the literal format.
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Literal,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// `<config_dir>/xoeuf/xdom.toml`, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("xoeuf").join("xdom.toml"))
    }

    /// An explicit path must exist. Without one, the default location is
    /// used when present, else the built-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => {
                debug!("Loading config from {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_full_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("xdom.toml");

        let config_content = r#"
[limits]
max_depth = 32

[output]
format = "literal"
pretty = true
"#;
        fs::write(&config_path, config_content).unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.limits.max_depth, 32);
        assert_eq!(config.output.format, OutputFormat::Literal);
        assert!(config.output.pretty);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("xdom.toml");
        fs::write(&config_path, "[output]\npretty = true\n").unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.limits, Limits::default());
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.pretty);

        fs::write(&config_path, "").unwrap();
        assert_eq!(Config::load(&config_path).unwrap(), Config::default());
    }

    #[test]
    fn test_load_errors_name_the_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("xdom.toml");

        let err = Config::load(&config_path).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));

        fs::write(&config_path, "[output]\nformat = \"yaml\"\n").unwrap();
        let err = Config::load(&config_path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
        assert!(err.to_string().contains("xdom.toml"));
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.toml");
        assert!(Config::resolve(Some(missing.as_path())).is_err());
    }
}
