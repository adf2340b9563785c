use boa_client::HttpRequestSource;
use boa_core::settings::remember_roll_no;
use boa_core::{LoadOutcome, RequestBoard, RequestSource, RequestSummary, SettingsStore};
use tracing::warn;

use crate::commands::{load_config, open_settings, resolve_requester, runtime, CommandResult, EXIT_BACKEND};

const COMMAND: &str = "requests";

pub fn run(roll_no: Option<&str>) -> CommandResult {
    let config = match load_config(COMMAND) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };
    let source = match HttpRequestSource::from_config(&config.backend) {
        Ok(source) => source,
        Err(error) => {
            return CommandResult::failure(COMMAND, "client_init", error.to_string(), EXIT_BACKEND)
        }
    };

    runtime.block_on(async {
        let store = match open_settings(&config, COMMAND).await {
            Ok(store) => store,
            Err(result) => return result,
        };
        execute(source, &store, roll_no).await
    })
}

pub async fn execute<S: RequestSource>(
    source: S,
    store: &dyn SettingsStore,
    roll_no: Option<&str>,
) -> CommandResult {
    let requester = match resolve_requester(roll_no, store, COMMAND).await {
        Ok(requester) => requester,
        Err(result) => return result,
    };

    let board = RequestBoard::new(source);
    match board.load_requests(requester.clone()).await {
        LoadOutcome::Failed(error) => {
            CommandResult::failure(COMMAND, error.error_class(), error.notice_message(), EXIT_BACKEND)
        }
        LoadOutcome::Loaded { .. } | LoadOutcome::Superseded => {
            if let Err(error) = remember_roll_no(store, &requester).await {
                warn!(
                    event_name = "boa.cli.remember_roll_no_failed",
                    error = %error,
                    "could not remember roll number"
                );
            }
            CommandResult::success(COMMAND, render_listing(requester.as_str(), &board.summaries().await))
        }
    }
}

fn render_listing(roll_no: &str, summaries: &[RequestSummary]) -> String {
    if summaries.is_empty() {
        return format!("No BOA requests found for {roll_no}.");
    }

    let mut lines = vec![format!("{} BOA request(s) for {roll_no}:", summaries.len())];
    for summary in summaries {
        let dates = match (summary.date_from, summary.date_to) {
            (Some(from), Some(to)) if from != to => format!(" ({from} to {to})"),
            (Some(from), _) => format!(" ({from})"),
            (None, Some(to)) => format!(" (until {to})"),
            (None, None) => String::new(),
        };
        lines.push(format!(
            "- {} {}{} [{}]",
            summary.id, summary.event_name, dates, summary.status.label
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use boa_core::wire::ListingError;
    use boa_core::{
        BoaRequest, InMemoryRequestSource, InMemorySettingsStore, RequesterId, SettingKey,
        SettingsStore,
    };
    use chrono::NaiveDate;
    use serde_json::Value;

    use super::execute;
    use crate::commands::{EXIT_BACKEND, EXIT_INPUT};

    fn payload(output: &str) -> Value {
        serde_json::from_str(output).expect("json outcome")
    }

    #[tokio::test]
    async fn lists_requests_and_remembers_roll_number() {
        let source = InMemoryRequestSource::default();
        let mut request = BoaRequest::new("BOA-7", "Robotics Expo");
        request.event.date_from = NaiveDate::from_ymd_opt(2024, 3, 1);
        request.event.date_to = NaiveDate::from_ymd_opt(2024, 3, 2);
        source.insert(RequesterId("21CS007".to_string()), request).await;
        let store = InMemorySettingsStore::default();

        let result = execute(source, &store, Some("21CS007")).await;

        assert_eq!(result.exit_code, 0);
        let message = payload(&result.output)["message"].as_str().unwrap_or_default().to_string();
        assert!(message.contains("- BOA-7 Robotics Expo (2024-03-01 to 2024-03-02) [Pending]"));
        assert_eq!(
            store.get(SettingKey::LastRollNo).await.expect("get").as_deref(),
            Some("21CS007")
        );
    }

    #[tokio::test]
    async fn empty_listing_is_success() {
        let store = InMemorySettingsStore::default();

        let result = execute(InMemoryRequestSource::default(), &store, Some("21CS008")).await;

        assert_eq!(result.exit_code, 0);
        assert_eq!(payload(&result.output)["message"], "No BOA requests found for 21CS008.");
    }

    #[tokio::test]
    async fn backend_failure_reports_notice_and_keeps_previous_roll_number() {
        let source = InMemoryRequestSource::default();
        source
            .fail_with(
                RequesterId("21CS009".to_string()),
                ListingError::Rejected { message: Some("   ".to_string()) },
            )
            .await;
        let store = InMemorySettingsStore::default();
        store.put(SettingKey::LastRollNo, "21CS001").await.expect("put");

        let result = execute(source, &store, Some("21CS009")).await;

        assert_eq!(result.exit_code, EXIT_BACKEND);
        let payload = payload(&result.output);
        assert_eq!(payload["error_class"], "rejected");
        assert_eq!(payload["message"], "Unable to load BOA requests. Please try again.");
        assert_eq!(
            store.get(SettingKey::LastRollNo).await.expect("get").as_deref(),
            Some("21CS001")
        );
    }

    #[tokio::test]
    async fn blank_roll_number_is_rejected() {
        let store = InMemorySettingsStore::default();

        let result = execute(InMemoryRequestSource::default(), &store, Some("  ")).await;

        assert_eq!(result.exit_code, EXIT_INPUT);
        assert_eq!(payload(&result.output)["error_class"], "invalid_input");
    }
}
