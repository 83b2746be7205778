use anyhow::{Result, anyhow};
use config::{Config, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub auth: Auth,
    pub broker: Broker,
    pub cache: Cache,
    pub http: Http,
    pub log: Log,
}

/// Development fallbacks for the signing secrets; production deployments
/// override them with ACCESS_TOKEN_SECRET / REFRESH_TOKEN_SECRET.
#[derive(Debug, Deserialize)]
pub struct Auth {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct Broker {
    pub bootstrap_server: String,
    /// The queue the auth endpoint consumes; replies go to a per-process
    /// topic derived from it.
    pub request_topic: String,
    pub consumer_group: String,
    pub call_timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Cache {
    pub backend: String, // "memory" or "redis"
    pub redis_dsn: String,
    pub key_prefix: String,
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    pub secure_cookies: bool,
    pub tls: Option<Tls>,
}

#[derive(Debug, Deserialize)]
pub struct Tls {
    pub cert_path: String,
    pub key_path: String,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}
