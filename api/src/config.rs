use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Runtime settings, read from the environment at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
    /// Directory holding resume files; created at startup if missing.
    pub upload_dir: PathBuf,
    /// Request body limit applied to uploads.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl ServerConfig {
    /// Reads `PORT`, `UPLOAD_DIR` and `MAX_UPLOAD_BYTES`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Invalid values fall back to the
    /// default with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let upload_dir = match lookup("UPLOAD_DIR") {
            Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            Some(_) => {
                warn!(
                    "Empty UPLOAD_DIR in environment variable. Using default directory '{}'.",
                    DEFAULT_UPLOAD_DIR
                );
                defaults.upload_dir
            }
            None => defaults.upload_dir,
        };
        Self {
            port: parse_or_default(&lookup, "PORT", defaults.port),
            upload_dir,
            max_upload_bytes: parse_or_default(
                &lookup,
                "MAX_UPLOAD_BYTES",
                defaults.max_upload_bytes,
            ),
        }
    }
}

fn parse_or_default<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
{
    match lookup(key) {
        Some(raw) => match T::from_str(raw.trim()) {
            Ok(value) => {
                info!("Using {} {} from environment variable.", key, value);
                value
            }
            Err(_) => {
                warn!(
                    "Invalid {} value '{}' in environment variable. Using default {}.",
                    key, raw, default
                );
                default
            }
        },
        None => default,
    }
}
