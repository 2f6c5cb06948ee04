use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use calculator_core::servers::http_core::{self, Server, TlsConfig};
use calculator_core::CoreError;
use log::info;
use tokio::net::TcpListener;
use crate::config::{load_config, quiet_from_env, ConfigFile, DEFAULT_HOST, DEFAULT_PORT};

#[derive(Debug, Default)]
pub struct ServeOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub config: Option<PathBuf>,
    pub tls_cert: Option<String>,
    pub tls_key: Option<String>,
    pub quiet: bool,
}

#[derive(Debug, PartialEq)]
pub struct ServeSettings {
    pub host: String,
    pub port: u16,
    pub quiet: bool,
    pub tls: Option<TlsConfig>,
}

/// Command line beats the config file, which beats the environment and the
/// built-in defaults.
pub fn resolve_settings(overrides: ServeOverrides, file: ConfigFile, env_quiet: bool) -> ServeSettings {
    let tls = match (overrides.tls_cert, overrides.tls_key) {
        (Some(cert_path), Some(key_path)) => Some(TlsConfig { cert_path, key_path }),
        _ => file.tls,
    };

    ServeSettings {
        host: overrides.host.or(file.server.host).unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: overrides.port.or(file.server.port).unwrap_or(DEFAULT_PORT),
        quiet: overrides.quiet || file.server.quiet.unwrap_or(env_quiet),
        tls,
    }
}

pub async fn serve(overrides: ServeOverrides) -> Result<(), Box<dyn Error>> {
    let file = match &overrides.config {
        Some(path) => load_config(path)?,
        None => ConfigFile::default(),
    };
    let settings = resolve_settings(overrides, file, quiet_from_env());

    let server = Arc::new(Server::new(settings.quiet, settings.tls)?);
    let listener = TcpListener::bind((settings.host.as_str(), settings.port))
        .await
        .map_err(|e| {
            CoreError::ServerStartFailed(format!("Bind failed {}:{}: {}", settings.host, settings.port, e))
        })?;

    println!("Open {}://{}:{}/ in your browser", server.scheme(), settings.host, settings.port);

    tokio::select! {
        result = http_core::serve(listener, server) => result?,
        _ = tokio::signal::ctrl_c() => info!("Stopping..."),
    }

    Ok(())
}
