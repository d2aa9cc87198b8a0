use std::path::{Path, PathBuf};

use anyhow::Context;
use config::{File, FileFormat};
use serde::Deserialize;
use url::Url;

pub use duration::Duration;

mod duration;

pub const DEFAULT_CONFIG_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../config.toml");

/// Environment variable with a colon separated list of config files.
pub const CONFIG_PATH_ENV: &str = "FOLIO_CONFIG";

/// Environment variable that replaces the configured relay endpoint.
pub const CONTACT_ENDPOINT_ENV: &str = "FOLIO_CONTACT_ENDPOINT";

/// Loads the config from the files listed in `FOLIO_CONFIG`, falling back to
/// the bundled `config.toml`.
pub fn load() -> anyhow::Result<Config> {
    let paths = match std::env::var_os(CONFIG_PATH_ENV) {
        Some(paths) => std::env::split_paths(&paths).collect(),
        None => vec![PathBuf::from(DEFAULT_CONFIG_PATH)],
    };
    load_with_override(&paths, &[])
}

/// Loads the config from `paths` and layers the TOML snippets in `overrides`
/// on top.
pub fn load_with_override(
    paths: &[impl AsRef<Path>],
    overrides: &[&str],
) -> anyhow::Result<Config> {
    let builder = paths
        .iter()
        .try_fold(config::Config::builder(), |builder, path| {
            let path = path.as_ref();
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file at {}", path.display()))?;
            let source = File::from_str(&content, FileFormat::Toml);
            anyhow::Ok(builder.add_source(source))
        })?;

    overrides
        .iter()
        .fold(builder, |builder, &snippet| {
            builder.add_source(File::from_str(snippet, FileFormat::Toml))
        })
        .set_override_option("contact.endpoint", std::env::var(CONTACT_ENDPOINT_ENV).ok())?
        .build()?
        .try_deserialize()
        .context("Failed to load config")
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub contact: ContactConfig,
}

#[derive(Debug, Deserialize)]
pub struct ContactConfig {
    pub endpoint: Url,
    pub cooldown: Duration,
    pub fallback_email: Option<String>,
    pub retry: RetryConfig,
}

#[derive(Debug, Deserialize)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay: Duration,
}
