use crate::error::LoadError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when none is named.
pub const DEFAULT_CONFIG_FILE: &str = "fieldchain.yaml";

/// Library-level resolution settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveOptions {
    /// Any diagnostic, warnings included, fails the whole resolution.
    #[serde(default)]
    pub strict: bool,
}

/// Optional YAML config file for the CLI. Command-line flags win.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub strict: Option<bool>,
    #[serde(default)]
    pub pretty: Option<bool>,
    /// Seed for generated codes; no codes are generated without one.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Load the config file. An explicitly named file must exist; the default
/// file is optional.
pub fn load_config(path: Option<&Path>) -> Result<FileConfig, LoadError> {
    let (path, required) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(FileConfig::default());
        }
        Err(source) => return Err(LoadError::Io { path, source }),
    };
    parse_config(&contents).map_err(|source| LoadError::Config { path, source })
}

pub fn parse_config(contents: &str) -> Result<FileConfig, serde_yaml::Error> {
    if contents.trim().is_empty() {
        return Ok(FileConfig::default());
    }
    serde_yaml::from_str(contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_keys() {
        let config = parse_config("strict: true\npretty: false\nseed: 9\n").unwrap();
        assert_eq!(
            config,
            FileConfig {
                strict: Some(true),
                pretty: Some(false),
                seed: Some(9),
            }
        );
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(parse_config("  \n").unwrap(), FileConfig::default());
    }

    #[test]
    fn rejects_wrong_types() {
        assert!(parse_config("strict: maybe").is_err());
    }

    #[test]
    fn named_missing_file_is_an_error() {
        let err = load_config(Some(Path::new("/nonexistent/fieldchain.yaml"))).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
