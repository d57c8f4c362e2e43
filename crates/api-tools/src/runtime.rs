//! Process-level plumbing shared by the adapter binaries: common CLI flags and tracing setup.

use clap::{Args, ValueEnum};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Flags every adapter binary accepts.
#[derive(Debug, Clone, Args)]
pub struct RuntimeArgs {
    /// Default log filter; `RUST_LOG` takes precedence.
    #[arg(long, env = "MCP_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "MCP_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Timeout for each upstream HTTP request.
    #[arg(long, env = "MCP_HTTP_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Reject upstream responses larger than this many bytes.
    #[arg(long, env = "MCP_MAX_RESPONSE_BYTES")]
    pub max_response_bytes: Option<usize>,
}

impl Default for RuntimeArgs {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            timeout_secs: 30,
            max_response_bytes: None,
        }
    }
}

impl RuntimeArgs {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Install the global tracing subscriber. Logs always go to stderr: stdout is the protocol.
///
/// # Errors
///
/// Fails if the filter does not parse or a subscriber is already installed.
pub fn init_tracing(args: &RuntimeArgs) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&args.log_level)?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false);

    let installed = match args.log_format {
        LogFormat::Json => builder.json().with_target(true).try_init(),
        LogFormat::Text => builder.try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("failed to initialise tracing: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Cli {
        #[command(flatten)]
        runtime: RuntimeArgs,
    }

    #[test]
    fn flags_parse_with_defaults() {
        let cli = Cli::try_parse_from(["bin", "--timeout-secs", "5", "--log-format", "json"])
            .expect("parse");
        assert_eq!(cli.runtime.timeout(), Duration::from_secs(5));
        assert_eq!(cli.runtime.log_format, LogFormat::Json);
        assert_eq!(cli.runtime.max_response_bytes, None);
    }

    #[test]
    fn invalid_log_format_is_rejected() {
        assert!(Cli::try_parse_from(["bin", "--log-format", "xml"]).is_err());
    }
}
