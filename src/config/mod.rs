//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::cache::{CacheBackend, SentinelConfig, SentinelNode};
use crate::resilience::RetryPolicy;

mod cli;

pub use cli::{
    CacheOverrides, CliArgs, Command, CompleteArgs, ExportArgs, LoggingOverrides, ServeArgs,
    ServeOverrides,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "relaydoc";
const ENV_PREFIX: &str = "RELAYDOC";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_CONTENT_API_URL: &str = "https://jsonplaceholder.typicode.com";
const DEFAULT_CONTENT_API_TIMEOUT_SECS: u64 = 30;
const DEFAULT_GENERATIVE_URL: &str = "https://api.anthropic.com";
const DEFAULT_GENERATIVE_API_VERSION: &str = "2023-06-01";
const DEFAULT_GENERATIVE_MODEL: &str = "claude-3-5-sonnet-20241022";
const DEFAULT_GENERATIVE_MAX_TOKENS: u32 = 1000;
const DEFAULT_GENERATIVE_TEMPERATURE: f32 = 0.7;
const DEFAULT_GENERATIVE_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BASE_DELAY_MS: u64 = 1000;
const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
const DEFAULT_SENTINEL_MASTER: &str = "mymaster";
const DEFAULT_SENTINEL_NODES: &str = "localhost:26379";
const DEFAULT_PROBE_TIMEOUT_MS: u64 = 2000;
const DEFAULT_PDF_COMMAND: &str = "wkhtmltopdf";

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub content_api: ContentApiSettings,
    pub generative: GenerativeSettings,
    pub resilience: ResilienceSettings,
    pub cache: CacheSettings,
    pub render: RenderSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct ContentApiSettings {
    pub base_url: Url,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct GenerativeSettings {
    pub base_url: Url,
    pub api_version: String,
    pub api_key: Option<String>,
    pub default_model: String,
    pub default_max_tokens: u32,
    pub default_temperature: f32,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ResilienceSettings {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl ResilienceSettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.base_delay)
    }
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub backend: CacheBackend,
    pub redis_url: String,
    /// `None` when `cache.sentinel_master` is empty.
    pub sentinel: Option<SentinelConfig>,
    pub probe_timeout: Duration,
    pub ttl: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub pdf_command: PathBuf,
    pub rtf_font: String,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_command(cli.command.as_ref());

    Settings::from_raw(raw)
}

/// Resolve configuration using the process arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    content_api: RawContentApiSettings,
    generative: RawGenerativeSettings,
    resilience: RawResilienceSettings,
    cache: RawCacheSettings,
    render: RawRenderSettings,
}

impl RawSettings {
    fn apply_command(&mut self, command: Option<&Command>) {
        match command {
            Some(Command::Serve(args)) => self.apply_serve_overrides(&args.overrides),
            Some(Command::Export(args)) => {
                self.apply_cache_overrides(&args.cache);
                self.apply_logging_overrides(&args.logging);
            }
            Some(Command::Complete(args)) => self.apply_logging_overrides(&args.logging),
            None => self.apply_serve_overrides(&ServeOverrides::default()),
        }
    }

    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(url) = overrides.content_api_url.as_ref() {
            self.content_api.base_url = Some(url.clone());
        }
        if let Some(max_retries) = overrides.max_retries {
            self.resilience.max_retries = Some(max_retries);
        }
        self.apply_cache_overrides(&overrides.cache);
        self.apply_logging_overrides(&overrides.logging);
    }

    fn apply_cache_overrides(&mut self, overrides: &CacheOverrides) {
        if let Some(backend) = overrides.backend.as_ref() {
            self.cache.backend = Some(backend.clone());
        }
        if let Some(url) = overrides.redis_url.as_ref() {
            self.cache.redis_url = Some(url.clone());
        }
        if let Some(master) = overrides.sentinel_master.as_ref() {
            self.cache.sentinel_master = Some(master.clone());
        }
        if let Some(nodes) = overrides.sentinel_nodes.as_ref() {
            self.cache.sentinel_nodes = Some(nodes.clone());
        }
    }

    fn apply_logging_overrides(&mut self, overrides: &LoggingOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            content_api,
            generative,
            resilience,
            cache,
            render,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            content_api: build_content_api_settings(content_api)?,
            generative: build_generative_settings(generative)?,
            resilience: build_resilience_settings(resilience)?,
            cache: build_cache_settings(cache)?,
            render: build_render_settings(render)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    Ok(ServerSettings { addr })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_content_api_settings(
    content_api: RawContentApiSettings,
) -> Result<ContentApiSettings, LoadError> {
    let base_url = parse_http_url(
        content_api.base_url.as_deref(),
        DEFAULT_CONTENT_API_URL,
        "content_api.base_url",
    )?;
    let timeout = positive_duration_secs(
        content_api.timeout_seconds,
        DEFAULT_CONTENT_API_TIMEOUT_SECS,
        "content_api.timeout_seconds",
    )?;

    Ok(ContentApiSettings { base_url, timeout })
}

fn build_generative_settings(
    generative: RawGenerativeSettings,
) -> Result<GenerativeSettings, LoadError> {
    let base_url = parse_http_url(
        generative.base_url.as_deref(),
        DEFAULT_GENERATIVE_URL,
        "generative.base_url",
    )?;

    let api_key = generative.api_key.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    let default_model = generative
        .default_model
        .unwrap_or_else(|| DEFAULT_GENERATIVE_MODEL.to_string());
    if default_model.trim().is_empty() {
        return Err(LoadError::invalid(
            "generative.default_model",
            "model must not be empty",
        ));
    }

    let default_max_tokens = generative
        .default_max_tokens
        .unwrap_or(DEFAULT_GENERATIVE_MAX_TOKENS);
    if default_max_tokens == 0 {
        return Err(LoadError::invalid(
            "generative.default_max_tokens",
            "must be greater than zero",
        ));
    }

    let default_temperature = generative
        .default_temperature
        .unwrap_or(DEFAULT_GENERATIVE_TEMPERATURE);
    if !(0.0..=1.0).contains(&default_temperature) {
        return Err(LoadError::invalid(
            "generative.default_temperature",
            "must be between 0.0 and 1.0",
        ));
    }

    let timeout = positive_duration_secs(
        generative.timeout_seconds,
        DEFAULT_GENERATIVE_TIMEOUT_SECS,
        "generative.timeout_seconds",
    )?;

    Ok(GenerativeSettings {
        base_url,
        api_version: generative
            .api_version
            .unwrap_or_else(|| DEFAULT_GENERATIVE_API_VERSION.to_string()),
        api_key,
        default_model,
        default_max_tokens,
        default_temperature,
        timeout,
    })
}

fn build_resilience_settings(
    resilience: RawResilienceSettings,
) -> Result<ResilienceSettings, LoadError> {
    let max_retries = resilience.max_retries.unwrap_or(DEFAULT_MAX_RETRIES);
    if max_retries > 10 {
        return Err(LoadError::invalid(
            "resilience.max_retries",
            "must not exceed 10",
        ));
    }

    Ok(ResilienceSettings {
        max_retries,
        base_delay: Duration::from_millis(
            resilience.base_delay_ms.unwrap_or(DEFAULT_BASE_DELAY_MS),
        ),
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let backend = match cache.backend.as_deref().map(str::trim) {
        None => CacheBackend::Redis,
        Some(value) if value.eq_ignore_ascii_case("redis") => CacheBackend::Redis,
        Some(value) if value.eq_ignore_ascii_case("memory") => CacheBackend::Memory,
        Some(other) => {
            return Err(LoadError::invalid(
                "cache.backend",
                format!("expected `redis` or `memory`, got `{other}`"),
            ));
        }
    };

    let redis_url = cache
        .redis_url
        .unwrap_or_else(|| DEFAULT_REDIS_URL.to_string());
    let parsed = Url::parse(&redis_url)
        .map_err(|err| LoadError::invalid("cache.redis_url", format!("invalid url: {err}")))?;
    if !matches!(parsed.scheme(), "redis" | "rediss") {
        return Err(LoadError::invalid(
            "cache.redis_url",
            "scheme must be redis or rediss",
        ));
    }

    let master = cache
        .sentinel_master
        .as_deref()
        .unwrap_or(DEFAULT_SENTINEL_MASTER)
        .trim();
    let sentinel = if master.is_empty() {
        None
    } else {
        let nodes = parse_sentinel_nodes(
            cache
                .sentinel_nodes
                .as_deref()
                .unwrap_or(DEFAULT_SENTINEL_NODES),
        )?;
        Some(SentinelConfig {
            master: master.to_string(),
            nodes,
        })
    };

    let probe_timeout_ms = cache.probe_timeout_ms.unwrap_or(DEFAULT_PROBE_TIMEOUT_MS);
    if probe_timeout_ms == 0 {
        return Err(LoadError::invalid(
            "cache.probe_timeout_ms",
            "must be greater than zero",
        ));
    }

    let ttl = match cache.ttl_seconds {
        Some(0) => {
            return Err(LoadError::invalid(
                "cache.ttl_seconds",
                "must be greater than zero when set",
            ));
        }
        Some(seconds) => Some(Duration::from_secs(seconds)),
        None => None,
    };

    Ok(CacheSettings {
        backend,
        redis_url,
        sentinel,
        probe_timeout: Duration::from_millis(probe_timeout_ms),
        ttl,
    })
}

fn build_render_settings(render: RawRenderSettings) -> Result<RenderSettings, LoadError> {
    let pdf_command = render
        .pdf_command
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PDF_COMMAND));
    if pdf_command.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "render.pdf_command",
            "path must not be empty",
        ));
    }

    let rtf_font = render
        .rtf_font
        .unwrap_or_else(|| crate::render::DEFAULT_FONT.to_string());
    if rtf_font.trim().is_empty() {
        return Err(LoadError::invalid("render.rtf_font", "must not be empty"));
    }

    Ok(RenderSettings {
        pdf_command,
        rtf_font,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawContentApiSettings {
    base_url: Option<String>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawGenerativeSettings {
    base_url: Option<String>,
    api_version: Option<String>,
    api_key: Option<String>,
    default_model: Option<String>,
    default_max_tokens: Option<u32>,
    default_temperature: Option<f32>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawResilienceSettings {
    max_retries: Option<u32>,
    base_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    backend: Option<String>,
    redis_url: Option<String>,
    sentinel_master: Option<String>,
    sentinel_nodes: Option<String>,
    probe_timeout_ms: Option<u64>,
    ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRenderSettings {
    pdf_command: Option<PathBuf>,
    rtf_font: Option<String>,
}

/// Parses a comma-separated `host:port` list.
fn parse_sentinel_nodes(raw: &str) -> Result<Vec<SentinelNode>, LoadError> {
    let mut nodes = Vec::new();
    for entry in raw.split(',').map(str::trim) {
        let (host, port) = entry
            .rsplit_once(':')
            .filter(|(host, _)| !host.trim().is_empty())
            .ok_or_else(|| {
                LoadError::invalid(
                    "cache.sentinel_nodes",
                    format!("expected `host:port`, got `{entry}`"),
                )
            })?;
        let port = port.trim().parse::<u16>().map_err(|err| {
            LoadError::invalid(
                "cache.sentinel_nodes",
                format!("invalid port in `{entry}`: {err}"),
            )
        })?;
        nodes.push(SentinelNode {
            host: host.trim().to_string(),
            port,
        });
    }
    Ok(nodes)
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn parse_http_url(value: Option<&str>, default: &str, key: &'static str) -> Result<Url, LoadError> {
    let raw = value.map(str::trim).unwrap_or(default);
    let url = Url::parse(raw).map_err(|err| LoadError::invalid(key, format!("invalid url: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(LoadError::invalid(key, "scheme must be http or https"));
    }
    Ok(url)
}

fn positive_duration_secs(
    value: Option<u64>,
    default: u64,
    key: &'static str,
) -> Result<Duration, LoadError> {
    let seconds = value.unwrap_or(default);
    if seconds == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_secs(seconds))
}
