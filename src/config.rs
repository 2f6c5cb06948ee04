use std::fs;
use std::path::Path;
use calculator_core::servers::http_core::TlsConfig;
use calculator_core::CoreError;
use log::debug;
use serde::Deserialize;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const QUIET_ENV: &str = "CALC_WEB_QUIET";

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub server: ServerSection,
    pub tls: Option<TlsConfig>,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub quiet: Option<bool>,
}

pub fn load_config(path: &Path) -> Result<ConfigFile, CoreError> {
    let content = fs::read_to_string(path)
        .map_err(|e| CoreError::IoError(format!("Failed to read config file '{}': {}", path.display(), e)))?;
    parse_config(&content)
        .map_err(|e| CoreError::ConfigParseError(format!("Failed to parse config file '{}': {}", path.display(), e)))
}

fn parse_config(content: &str) -> Result<ConfigFile, toml::de::Error> {
    let config: ConfigFile = toml::from_str(content)?;
    debug!("Loaded config: {:?}", config);
    Ok(config)
}

pub fn quiet_from_env() -> bool {
    std::env::var(QUIET_ENV).is_ok_and(|value| value == "1")
}
