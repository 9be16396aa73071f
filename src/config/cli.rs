use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the relaydoc binary.
#[derive(Debug, Parser)]
#[command(
    name = "relaydoc",
    version,
    about = "Caching content gateway with document export"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "RELAYDOC_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP gateway.
    Serve(Box<ServeArgs>),
    /// Export records once as a PDF, DOCX or RTF document.
    Export(ExportArgs),
    /// Send one prompt to the generative-text API and print the reply.
    Complete(CompleteArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct CacheOverrides {
    /// Override the cache backend (redis|memory).
    #[arg(long = "cache-backend", value_name = "BACKEND")]
    pub backend: Option<String>,

    /// Override the Redis connection URL.
    #[arg(long = "redis-url", value_name = "URL")]
    pub redis_url: Option<String>,

    /// Override the sentinel master name; empty connects to `--redis-url`.
    #[arg(long = "sentinel-master", value_name = "NAME")]
    pub sentinel_master: Option<String>,

    /// Override the sentinel nodes (comma-separated host:port).
    #[arg(long = "sentinel-nodes", value_name = "NODES")]
    pub sentinel_nodes: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct LoggingOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub cache: CacheOverrides,

    #[command(flatten)]
    pub logging: LoggingOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the content API base URL.
    #[arg(long = "content-api-url", value_name = "URL")]
    pub content_api_url: Option<String>,

    /// Override the maximum number of retries per outbound call.
    #[arg(long = "max-retries", value_name = "COUNT")]
    pub max_retries: Option<u32>,
}

#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub cache: CacheOverrides,

    #[command(flatten)]
    pub logging: LoggingOverrides,

    /// Output format (pdf|docx|rtf).
    #[arg(long, value_name = "FORMAT")]
    pub format: String,

    /// Only export records owned by this user.
    #[arg(long = "user-id", value_name = "ID")]
    pub user_id: Option<i64>,

    /// Only export this record; wins over --user-id.
    #[arg(long = "post-id", value_name = "ID")]
    pub post_id: Option<i64>,

    /// Path to the document to write.
    #[arg(long, short, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub output: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct CompleteArgs {
    #[command(flatten)]
    pub logging: LoggingOverrides,

    /// Optional system prompt.
    #[arg(long, value_name = "TEXT")]
    pub system: Option<String>,

    /// Prompt text.
    #[arg(value_name = "PROMPT")]
    pub prompt: String,
}
