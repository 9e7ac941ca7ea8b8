use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;

use crate::{settings::Settings, storage};

const DEFAULT_CONFIG_PATH: &str = "vsc.toml";

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Settings exported from the browser extension. They replace the settings in this
    /// file when present.
    pub stored_settings: Option<PathBuf>,

    #[serde(flatten)]
    pub settings: Settings,
}

impl Config {
    pub fn read(file: &mut impl Read) -> anyhow::Result<Self> {
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .context("Failed to read config file")?;

        let config: Self = toml::from_str(&contents).context("Failed to parse config file")?;
        config
            .settings
            .validate()
            .context("Invalid settings in config file")?;
        config.settings.warn_shadowed_bindings();
        Ok(config)
    }

    pub fn read_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let mut file = File::open(path).context("Failed to open config file")?;
        Self::read(&mut file)
    }

    /// Reads the config at `path`, or `vsc.toml` in the working directory, or falls back
    /// to the defaults. Stored extension settings referenced by the config are loaded too,
    /// relative to the directory of the config file.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config_path = match path {
            Some(config_path) => config_path.to_path_buf(),
            None => {
                let default_config = PathBuf::from(DEFAULT_CONFIG_PATH);
                if !default_config.exists() {
                    log::warn!("No config file found; using default config");
                    return Ok(Config::default());
                }
                log::info!("Using default config file {DEFAULT_CONFIG_PATH}");
                default_config
            }
        };
        let mut config = Self::read_path(&config_path)?;
        if let Some(stored_path) = &config.stored_settings {
            let stored_path = match config_path.parent() {
                Some(dir) => dir.join(stored_path),
                None => stored_path.clone(),
            };
            log::info!("Loading stored settings from {}", stored_path.display());
            config.settings = storage::read_path(&stored_path)
                .with_context(|| format!("Failed to load {}", stored_path.display()))?;
        }
        Ok(config)
    }
}
