use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["boa.toml", "config/boa.toml"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub base_url: String,
    pub requests_path: String,
    pub media_base_url: String,
    pub timeout_secs: u64,
    pub api_token: Option<SecretString>,
}

impl BackendConfig {
    pub fn requests_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.requests_path.trim_start_matches('/')
        )
    }
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
    /// Serve a seeded in-memory request set instead of calling the backend.
    pub demo_mode: bool,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub backend_base_url: Option<String>,
    pub backend_media_base_url: Option<String>,
    pub backend_api_token: Option<String>,
    pub database_url: Option<String>,
    pub server_port: Option<u16>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig {
                base_url: "http://localhost/cs-portal/api".to_string(),
                requests_path: "boa/get_requests.php".to_string(),
                media_base_url: "http://localhost/cs-portal/uploads/boa".to_string(),
                timeout_secs: 15,
                api_token: None,
            },
            database: DatabaseConfig {
                url: "sqlite://boa-portal.db?mode=rwc".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
                demo_mode: false,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("boa.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(backend) = patch.backend {
            if let Some(base_url) = backend.base_url {
                self.backend.base_url = base_url;
            }
            if let Some(requests_path) = backend.requests_path {
                self.backend.requests_path = requests_path;
            }
            if let Some(media_base_url) = backend.media_base_url {
                self.backend.media_base_url = media_base_url;
            }
            if let Some(timeout_secs) = backend.timeout_secs {
                self.backend.timeout_secs = timeout_secs;
            }
            if let Some(api_token) = backend.api_token {
                self.backend.api_token = Some(secret_value(api_token));
            }
        }

        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
            if let Some(demo_mode) = server.demo_mode {
                self.server.demo_mode = demo_mode;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("BOA_BACKEND_BASE_URL") {
            self.backend.base_url = value;
        }
        if let Some(value) = read_env("BOA_BACKEND_REQUESTS_PATH") {
            self.backend.requests_path = value;
        }
        if let Some(value) = read_env("BOA_BACKEND_MEDIA_BASE_URL") {
            self.backend.media_base_url = value;
        }
        if let Some(value) = read_env("BOA_BACKEND_TIMEOUT_SECS") {
            self.backend.timeout_secs = parse_u64("BOA_BACKEND_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("BOA_BACKEND_API_TOKEN") {
            self.backend.api_token = Some(secret_value(value));
        }

        if let Some(value) = read_env("BOA_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("BOA_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("BOA_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("BOA_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("BOA_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("BOA_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("BOA_SERVER_PORT") {
            self.server.port = parse_u16("BOA_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("BOA_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("BOA_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }
        if let Some(value) = read_env("BOA_SERVER_DEMO_MODE") {
            self.server.demo_mode = parse_bool("BOA_SERVER_DEMO_MODE", &value)?;
        }

        let log_level = read_env("BOA_LOGGING_LEVEL").or_else(|| read_env("BOA_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("BOA_LOGGING_FORMAT").or_else(|| read_env("BOA_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(base_url) = overrides.backend_base_url {
            self.backend.base_url = base_url;
        }
        if let Some(media_base_url) = overrides.backend_media_base_url {
            self.backend.media_base_url = media_base_url;
        }
        if let Some(api_token) = overrides.backend_api_token {
            self.backend.api_token = Some(secret_value(api_token));
        }
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_backend(&self.backend)?;
        validate_database(&self.database)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn validate_backend(backend: &BackendConfig) -> Result<(), ConfigError> {
    if !is_http_url(backend.base_url.trim()) {
        return Err(ConfigError::Validation(
            "backend.base_url must start with http:// or https://".to_string(),
        ));
    }

    if backend.requests_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "backend.requests_path must name the BOA listing endpoint (e.g. `boa/get_requests.php`)"
                .to_string(),
        ));
    }

    let media = backend.media_base_url.trim();
    if !media.is_empty() && !is_http_url(media) {
        return Err(ConfigError::Validation(
            "backend.media_base_url must start with http:// or https:// (or be empty)".to_string(),
        ));
    }

    if backend.timeout_secs == 0 || backend.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "backend.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    let blank_token =
        backend.api_token.as_ref().is_some_and(|token| token.expose_secret().trim().is_empty());
    if blank_token {
        return Err(ConfigError::Validation(
            "backend.api_token is set but empty; remove it or provide a token".to_string(),
        ));
    }

    Ok(())
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }),
    }
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    backend: Option<BackendPatch>,
    database: Option<DatabasePatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct BackendPatch {
    base_url: Option<String>,
    requests_path: Option<String>,
    media_base_url: Option<String>,
    timeout_secs: Option<u64>,
    api_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
    demo_mode: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
