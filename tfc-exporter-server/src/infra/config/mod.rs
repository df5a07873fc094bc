//! Typed runtime configuration composed from the command line, the
//! environment and an optional `.env` file.

pub mod cli;

use std::{
    fs,
    ops::RangeInclusive,
    path::{Path, PathBuf},
};

use tfc_exporter_core::api::{ClientConfig, DEFAULT_ADDRESS};
use thiserror::Error;

pub use cli::{Args, LogFormat, LogLevel};

pub const PAGE_SIZE_RANGE: RangeInclusive<u32> = 1..=100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing API token: set --api-token or --api-token-file")]
    MissingToken,
    #[error("failed to read token file {path}")]
    TokenFileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("token file {path} is empty")]
    EmptyTokenFile { path: PathBuf },
    #[error("page size {0} is outside 1..=100")]
    PageSize(u32),
    #[error("invalid listen address '{0}': expected host:port")]
    ListenAddress(String),
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Empty means discover every organization visible to the token.
    pub organizations: Vec<String>,
    pub client: ClientConfig,
    /// Whether `--api-address` replaced the default.
    pub address_overridden: bool,
    /// `host:port`, resolved when the listener binds.
    pub listen_address: String,
    pub page_size: u32,
    pub log_level: LogLevel,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        let token = match (&args.api_token_file, &args.api_token) {
            (Some(path), _) => read_token_file(path)?,
            (None, Some(token)) if !token.trim().is_empty() => {
                token.trim().to_string()
            }
            _ => return Err(ConfigError::MissingToken),
        };

        if !PAGE_SIZE_RANGE.contains(&args.page_size) {
            return Err(ConfigError::PageSize(args.page_size));
        }

        let listen_address = listen_address(&args.listen_address)?;

        let organizations = args
            .organizations
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect();

        let address_overridden = args.api_address.is_some();
        let address = args
            .api_address
            .unwrap_or_else(|| DEFAULT_ADDRESS.to_string());

        Ok(Self {
            organizations,
            client: ClientConfig {
                address,
                token,
                insecure_skip_verify: args.api_insecure_skip_verify,
            },
            address_overridden,
            listen_address,
            page_size: args.page_size,
            log_level: args.log_level,
            log_format: args.log_format,
        })
    }
}

/// Load `.env` from the working directory. A missing file is not an error.
pub fn load_env_file() -> Result<bool, ConfigError> {
    let loaded = dotenvy::dotenv().map(|_| true).or_else(|err| match err {
        dotenvy::Error::Io(_) => Ok(false),
        _ => Err(err),
    })?;
    Ok(loaded)
}

/// Validates `host:port`. An empty host (`:9100`) listens on every
/// interface.
fn listen_address(raw: &str) -> Result<String, ConfigError> {
    let invalid = || ConfigError::ListenAddress(raw.to_string());
    let (host, port) = raw.trim().rsplit_once(':').ok_or_else(invalid)?;
    port.parse::<u16>().map_err(|_| invalid())?;
    if host.is_empty() {
        return Ok(format!("0.0.0.0:{port}"));
    }
    if host.contains(':') && !(host.starts_with('[') && host.ends_with(']')) {
        return Err(invalid());
    }
    Ok(format!("{host}:{port}"))
}

/// First line of `path`, trimmed.
fn read_token_file(path: &Path) -> Result<String, ConfigError> {
    let contents =
        fs::read_to_string(path).map_err(|source| ConfigError::TokenFileIo {
            path: path.to_path_buf(),
            source,
        })?;
    contents
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .ok_or_else(|| ConfigError::EmptyTokenFile {
            path: path.to_path_buf(),
        })
}
