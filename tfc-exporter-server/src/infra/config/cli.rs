use std::path::PathBuf;

use clap::{Parser, ValueEnum};

pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0:9100";
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Command line of the `tfc-exporter` binary. Every option also reads an
/// environment variable.
#[derive(Parser, Debug, Clone)]
#[command(name = "tfc-exporter", version)]
#[command(about = "Prometheus exporter for Terraform Cloud/Enterprise")]
pub struct Args {
    /// Comma separated organizations to scrape. Every organization visible
    /// to the token when empty.
    #[arg(short = 'o', long, env = "TF_ORGANIZATIONS", value_delimiter = ',')]
    pub organizations: Vec<String>,

    /// User token for authenticating with the API.
    #[arg(short = 't', long, env = "TF_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// File whose first line is the API token. Takes precedence over
    /// --api-token.
    #[arg(long, env = "TF_API_TOKEN_FILE", value_name = "PATH")]
    pub api_token_file: Option<PathBuf>,

    /// Terraform API address to scrape metrics from.
    #[arg(long, env = "TF_API_ADDRESS", value_name = "URL")]
    pub api_address: Option<String>,

    /// Accept any certificate presented by the API.
    #[arg(long, env = "TF_API_INSECURE_SKIP_VERIFY", default_value_t = false)]
    pub api_insecure_skip_verify: bool,

    /// Address to listen on for the web interface and telemetry.
    /// Accepts `host:port` or `:port`.
    #[arg(
        long,
        env = "TF_LISTEN_ADDRESS",
        default_value = DEFAULT_LISTEN_ADDRESS
    )]
    pub listen_address: String,

    /// Workspaces requested per page (1-100).
    #[arg(long, env = "TF_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u32,

    /// Only log messages with the given severity or above.
    #[arg(
        long = "log.level",
        env = "TF_LOG_LEVEL",
        value_enum,
        default_value_t = LogLevel::Info
    )]
    pub log_level: LogLevel,

    /// Output format of log messages.
    #[arg(
        long = "log.format",
        env = "TF_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Logfmt
    )]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// logfmt `key=value` lines.
    Logfmt,
    Json,
}
