use crate::error::{Result, ServiceError};
use std::env;
use std::path::PathBuf;

/// Region used for emission-factor resolution when `REGION` is unset.
pub const DEFAULT_REGION: &str = "India";

const DEFAULT_BUCKET: &str = "uploads";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Process-wide configuration, read from the environment exactly once at
/// startup and carried inside the shared application state afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    /// Connection string for the analytics warehouse.
    pub database_url: String,
    /// Root of the object store that keeps raw uploaded files.
    pub bucket_dir: PathBuf,
    /// Region used when resolving the energy emission factor.
    pub region: String,
    /// Address the HTTP server binds to.
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| ServiceError::Config("DATABASE_URL is not set".to_string()))?;

        let bucket_dir = env::var("BUCKET_NAME")
            .unwrap_or_else(|_| DEFAULT_BUCKET.to_string())
            .into();

        let region = env::var("REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string());

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        Ok(Self {
            database_url,
            bucket_dir,
            region,
            bind_addr,
        })
    }
}
