use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const CONFIG_VERSION: u32 = 1;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub version: u32,
    pub metadata: MetadataSource,
    pub http: HttpConfig,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.to_string_lossy()))?;
        let config: Config =
            toml::from_str(&contents).with_context(|| "Failed to parse config TOML")?;
        anyhow::ensure!(
            config.version == CONFIG_VERSION,
            "unsupported config version {}, expected {CONFIG_VERSION}",
            config.version
        );
        Ok(config)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub bind_addr: String,
    pub port: u16,
    /// honor `progress`, `releaseStart` and `releaseEnd` query parameters.
    /// Never enable in production.
    #[serde(default)]
    pub dev_overrides: bool,
}

/// Where the complete metadata record lives
#[derive(Debug, Deserialize, Clone)]
pub struct MetadataSource {
    pub path: PathBuf,
}
