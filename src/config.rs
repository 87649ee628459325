//! Configuration management for Chunkyard Server

use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::upload::DEFAULT_MAX_CHUNK_SIZE;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Where chunks wait for assembly
    pub chunk_dir: PathBuf,
    /// Where assembled artifacts and their sidecars live
    pub upload_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Largest accepted `POST /upload` request body, in bytes
    pub max_chunk_size: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            storage: StorageConfig {
                chunk_dir: PathBuf::from("chunks"),
                upload_dir: PathBuf::from("uploads"),
            },
            upload: UploadConfig {
                max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a config from any variable source; unset variables keep defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        Ok(Config {
            server: ServerConfig {
                host: lookup("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_var(&lookup, "SERVER_PORT", defaults.server.port)?,
            },
            storage: StorageConfig {
                chunk_dir: lookup("CHUNK_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.chunk_dir),
                upload_dir: lookup("UPLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.upload_dir),
            },
            upload: UploadConfig {
                max_chunk_size: parse_var(&lookup, "MAX_CHUNK_SIZE", defaults.upload.max_chunk_size)?,
            },
        })
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.chunk_dir, PathBuf::from("chunks"));
        assert_eq!(config.storage.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.upload.max_chunk_size, 32 * 1024 * 1024);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("SERVER_HOST", "127.0.0.1"),
            ("SERVER_PORT", "9000"),
            ("CHUNK_DIR", "/var/lib/chunkyard/chunks"),
            ("UPLOAD_DIR", "/var/lib/chunkyard/uploads"),
            ("MAX_CHUNK_SIZE", "1048576"),
        ]))
        .unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.storage.chunk_dir, PathBuf::from("/var/lib/chunkyard/chunks"));
        assert_eq!(config.storage.upload_dir, PathBuf::from("/var/lib/chunkyard/uploads"));
        assert_eq!(config.upload.max_chunk_size, 1024 * 1024);
    }

    #[test]
    fn test_invalid_number() {
        let result = Config::from_lookup(lookup(&[("SERVER_PORT", "eighty")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { name: "SERVER_PORT", .. })
        ));
    }
}
