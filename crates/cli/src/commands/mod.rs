pub mod config;
pub mod doctor;
pub mod migrate;
pub mod requests;
pub mod settings;
pub mod show;

use boa_core::config::{AppConfig, LoadOptions};
use boa_core::settings::Preferences;
use boa_core::{RequesterId, SettingsStore};
use boa_db::{connect_from_config, migrations, SqlSettingsStore};
use serde::Serialize;
use tokio::runtime::Runtime;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_BACKEND: u8 = 3;
pub const EXIT_INPUT: u8 = 4;
pub const EXIT_PERSISTENCE: u8 = 5;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) fn load_config(command: &str) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            EXIT_CONFIG,
        )
    })
}

pub(crate) fn runtime(command: &str) -> Result<Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            EXIT_BACKEND,
        )
    })
}

/// Opens the settings database, applying pending migrations first.
pub(crate) async fn open_settings(
    config: &AppConfig,
    command: &str,
) -> Result<SqlSettingsStore, CommandResult> {
    let pool = connect_from_config(&config.database).await.map_err(|error| {
        CommandResult::failure(command, "db_connectivity", error.to_string(), EXIT_PERSISTENCE)
    })?;
    migrations::run_pending(&pool).await.map_err(|error| {
        CommandResult::failure(command, "migration", error.to_string(), EXIT_PERSISTENCE)
    })?;
    Ok(SqlSettingsStore::new(pool))
}

/// Uses `--roll-no` when given, otherwise the remembered roll number.
pub(crate) async fn resolve_requester(
    explicit: Option<&str>,
    store: &dyn SettingsStore,
    command: &str,
) -> Result<RequesterId, CommandResult> {
    if let Some(raw) = explicit {
        return RequesterId::parse(raw).map_err(|error| {
            CommandResult::failure(command, "invalid_input", error.to_string(), EXIT_INPUT)
        });
    }

    let preferences = Preferences::load(store).await.map_err(|error| {
        CommandResult::failure(command, "persistence", error.to_string(), EXIT_PERSISTENCE)
    })?;
    preferences.last_roll_no.ok_or_else(|| {
        CommandResult::failure(
            command,
            "missing_roll_no",
            "no roll number given; pass --roll-no or run `boa settings set last_roll_no <roll-no>`",
            EXIT_INPUT,
        )
    })
}
