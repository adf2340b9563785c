use std::env;
use std::fs;
use std::path::Path;

use boa_core::config::{resolve_config_path, AppConfig, LogFormat};
use secrecy::ExposeSecret;
use toml::Value;

use crate::commands::{load_config, CommandResult};

pub fn run() -> CommandResult {
    let config = match load_config("config") {
        Ok(config) => config,
        Err(result) => return result,
    };

    let config_file_path = resolve_config_path(None);
    CommandResult { exit_code: 0, output: render(&config, config_file_path.as_deref()) }
}

pub fn render(config: &AppConfig, config_file_path: Option<&Path>) -> String {
    let config_file_doc = load_config_file_doc(config_file_path);

    let api_token = match &config.backend.api_token {
        Some(token) => redact_token(token.expose_secret()),
        None => "<unset>".to_string(),
    };
    let fields: [(&str, &[&str], String); 13] = [
        ("backend.base_url", &["BOA_BACKEND_BASE_URL"], config.backend.base_url.clone()),
        ("backend.requests_path", &["BOA_BACKEND_REQUESTS_PATH"], config.backend.requests_path.clone()),
        ("backend.media_base_url", &["BOA_BACKEND_MEDIA_BASE_URL"], config.backend.media_base_url.clone()),
        ("backend.timeout_secs", &["BOA_BACKEND_TIMEOUT_SECS"], config.backend.timeout_secs.to_string()),
        ("backend.api_token", &["BOA_BACKEND_API_TOKEN"], api_token),
        ("database.url", &["BOA_DATABASE_URL"], config.database.url.clone()),
        ("database.max_connections", &["BOA_DATABASE_MAX_CONNECTIONS"], config.database.max_connections.to_string()),
        ("database.timeout_secs", &["BOA_DATABASE_TIMEOUT_SECS"], config.database.timeout_secs.to_string()),
        ("server.bind_address", &["BOA_SERVER_BIND_ADDRESS"], config.server.bind_address.clone()),
        ("server.port", &["BOA_SERVER_PORT"], config.server.port.to_string()),
        ("server.demo_mode", &["BOA_SERVER_DEMO_MODE"], config.server.demo_mode.to_string()),
        ("logging.level", &["BOA_LOGGING_LEVEL", "BOA_LOG_LEVEL"], config.logging.level.clone()),
        ("logging.format", &["BOA_LOGGING_FORMAT", "BOA_LOG_FORMAT"], log_format_name(config.logging.format).to_string()),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(fields.iter().map(|(key, env_keys, value)| {
        render_line(key, value, field_source(key, env_keys, config_file_doc.as_ref(), config_file_path))
    }));
    lines.join("\n")
}

fn log_format_name(format: LogFormat) -> &'static str {
    match format {
        LogFormat::Compact => "compact",
        LogFormat::Pretty => "pretty",
        LogFormat::Json => "json",
    }
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }
    let visible: String = trimmed.chars().take(4).collect();
    if trimmed.chars().count() > 8 {
        format!("{visible}***")
    } else {
        "<redacted>".to_string()
    }
}
