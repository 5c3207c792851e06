use anyhow::{bail, Context, Result};
use std::net::IpAddr;

pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        let server = ServerConfig {
            host: env_or("SERVER_HOST", "127.0.0.1")
                .parse()
                .context("SERVER_HOST must be an IP address")?,
            port: env_or("SERVER_PORT", "5001")
                .parse()
                .context("SERVER_PORT must be a port number")?,
        };
        let store = match env_or("RESERVATION_STORE", "postgres").as_str() {
            "postgres" => StoreConfig::Postgres(DatabaseConfig::from_env()?),
            "memory" => StoreConfig::InMemory,
            other => bail!("unknown RESERVATION_STORE: {other}"),
        };
        Ok(Self { server, store })
    }
}

pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

// 予約データの保存先
pub enum StoreConfig {
    Postgres(DatabaseConfig),
    InMemory,
}

pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

impl DatabaseConfig {
    fn from_env() -> Result<Self> {
        Ok(Self {
            host: required("DATABASE_HOST")?,
            port: required("DATABASE_PORT")?
                .parse()
                .context("DATABASE_PORT must be a port number")?,
            username: required("DATABASE_USERNAME")?,
            password: required("DATABASE_PASSWORD")?,
            database: required("DATABASE_NAME")?,
        })
    }
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("environment variable {key} is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}
