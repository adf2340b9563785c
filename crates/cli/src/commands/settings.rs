use std::collections::BTreeSet;

use boa_core::settings::{save_setting, Preferences};
use boa_core::{SettingKey, SettingsError, SettingsStore};

use crate::commands::{
    load_config, open_settings, runtime, CommandResult, EXIT_INPUT, EXIT_PERSISTENCE,
};

const COMMAND: &str = "settings";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsAction {
    List,
    Get { key: String },
    Set { key: String, value: String },
    Reset { key: String },
}

pub fn run(action: SettingsAction) -> CommandResult {
    let config = match load_config(COMMAND) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    runtime.block_on(async {
        let store = match open_settings(&config, COMMAND).await {
            Ok(store) => store,
            Err(result) => return result,
        };
        execute(&store, action).await
    })
}

pub async fn execute(store: &dyn SettingsStore, action: SettingsAction) -> CommandResult {
    match action_result(store, action).await {
        Ok(message) => CommandResult::success(COMMAND, message),
        Err(error) => settings_failure(error),
    }
}

async fn action_result(
    store: &dyn SettingsStore,
    action: SettingsAction,
) -> Result<String, SettingsError> {
    match action {
        SettingsAction::List => {
            let preferences = Preferences::load(store).await?;
            let stored: BTreeSet<SettingKey> =
                store.entries().await?.into_iter().map(|(key, _)| key).collect();

            let lines: Vec<String> = SettingKey::ALL
                .into_iter()
                .map(|key| {
                    let source = if stored.contains(&key) { "stored" } else { "default" };
                    format!("- {key} = {} ({source})", display_value(&preferences.value_of(key)))
                })
                .collect();
            Ok(lines.join("\n"))
        }
        SettingsAction::Get { key } => {
            let key: SettingKey = key.parse()?;
            let preferences = Preferences::load(store).await?;
            Ok(display_value(&preferences.value_of(key)))
        }
        SettingsAction::Set { key, value } => {
            let key: SettingKey = key.parse()?;
            let stored = save_setting(store, key, &value).await?;
            Ok(format!("{key} = {stored}"))
        }
        SettingsAction::Reset { key } => {
            let key: SettingKey = key.parse()?;
            store.remove(key).await?;
            Ok(format!("{key} reset to default"))
        }
    }
}

fn display_value(value: &str) -> String {
    if value.is_empty() {
        "<unset>".to_string()
    } else {
        value.to_string()
    }
}

fn settings_failure(error: SettingsError) -> CommandResult {
    match error {
        SettingsError::UnknownKey(_) => {
            CommandResult::failure(COMMAND, "unknown_key", error.to_string(), EXIT_INPUT)
        }
        SettingsError::InvalidValue { .. } => {
            CommandResult::failure(COMMAND, "invalid_value", error.to_string(), EXIT_INPUT)
        }
        SettingsError::Backend(_) => {
            CommandResult::failure(COMMAND, "persistence", error.to_string(), EXIT_PERSISTENCE)
        }
    }
}

#[cfg(test)]
mod tests {
    use boa_core::{InMemorySettingsStore, SettingKey, SettingsStore};
    use serde_json::Value;

    use super::{execute, SettingsAction};
    use crate::commands::EXIT_INPUT;

    fn payload(output: &str) -> Value {
        serde_json::from_str(output).expect("json outcome")
    }

    #[tokio::test]
    async fn list_marks_defaults_and_stored_values() {
        let store = InMemorySettingsStore::default();
        store.put(SettingKey::Theme, "dark").await.expect("put");

        let result = execute(&store, SettingsAction::List).await;

        assert_eq!(result.exit_code, 0);
        assert_eq!(
            payload(&result.output)["message"],
            "- cookie_consent = unset (default)\n- theme = dark (stored)\n- last_roll_no = <unset> (default)"
        );
    }

    #[tokio::test]
    async fn set_normalizes_and_reset_restores_default() {
        let store = InMemorySettingsStore::default();

        let set = execute(
            &store,
            SettingsAction::Set { key: "cookie-consent".to_string(), value: "Accept".to_string() },
        )
        .await;
        assert_eq!(payload(&set.output)["message"], "cookie_consent = accepted");

        let reset =
            execute(&store, SettingsAction::Reset { key: "cookie_consent".to_string() }).await;
        assert_eq!(reset.exit_code, 0);

        let get = execute(&store, SettingsAction::Get { key: "cookie_consent".to_string() }).await;
        assert_eq!(payload(&get.output)["message"], "unset");
    }

    #[tokio::test]
    async fn invalid_input_maps_to_input_exit_code() {
        let store = InMemorySettingsStore::default();

        let unknown = execute(&store, SettingsAction::Get { key: "font_size".to_string() }).await;
        assert_eq!(unknown.exit_code, EXIT_INPUT);
        assert_eq!(payload(&unknown.output)["error_class"], "unknown_key");

        let invalid = execute(
            &store,
            SettingsAction::Set { key: "theme".to_string(), value: "neon".to_string() },
        )
        .await;
        assert_eq!(invalid.exit_code, EXIT_INPUT);
        assert_eq!(payload(&invalid.output)["error_class"], "invalid_value");
    }
}
