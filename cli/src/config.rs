use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "gcdump.toml";

/// Defaults for `gcdump dump`, read from a TOML file.
/// Command-line flags can switch options on but not off.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub strip: bool,
    pub quiet: bool,
    pub verbose: bool,
    pub keep_going: bool,
    pub no_color: bool,
    pub output: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config '{}': {source}", path.display())]
    Invalid {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl Config {
    /// Load `explicit` if given (it must exist), otherwise `gcdump.toml` in
    /// `dir` if present, otherwise the defaults.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<Config, ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = dir.join(DEFAULT_CONFIG_FILE);
                if !candidate.is_file() {
                    return Ok(Config::default());
                }
                candidate
            }
        };

        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = toml::from_str(&text).map_err(|source| ConfigError::Invalid {
            path: path.clone(),
            source,
        })?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_default_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(None, dir.path()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn reads_default_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "strip = true\noutput = \"out.gcode\"\n",
        )
        .unwrap();
        let config = Config::load(None, dir.path()).unwrap();
        assert!(config.strip);
        assert!(!config.quiet);
        assert_eq!(config.output, Some(PathBuf::from("out.gcode")));
    }

    #[test]
    fn explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = Config::load(Some(&missing), dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "speed = 19200\n").unwrap();
        let err = Config::load(Some(&path), dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        assert!(err.to_string().starts_with("invalid config"));
    }
}
