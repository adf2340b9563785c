use boa_client::HttpRequestSource;
use boa_core::{
    BoaRequestId, LoadOutcome, MediaResolver, RequestBoard, RequestSource, SettingsStore,
};

use crate::commands::{
    load_config, open_settings, resolve_requester, runtime, CommandResult, EXIT_BACKEND, EXIT_INPUT,
};

const COMMAND: &str = "show";

pub fn run(id: &str, roll_no: Option<&str>) -> CommandResult {
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
    let media = MediaResolver::new(config.backend.media_base_url.clone());

    runtime.block_on(async {
        let store = match open_settings(&config, COMMAND).await {
            Ok(store) => store,
            Err(result) => return result,
        };
        execute(source, &store, &media, id, roll_no).await
    })
}

/// Loads the requester's list and renders one request from it.
pub async fn execute<S: RequestSource>(
    source: S,
    store: &dyn SettingsStore,
    media: &MediaResolver,
    id: &str,
    roll_no: Option<&str>,
) -> CommandResult {
    let requester = match resolve_requester(roll_no, store, COMMAND).await {
        Ok(requester) => requester,
        Err(result) => return result,
    };

    let board = RequestBoard::new(source);
    if let LoadOutcome::Failed(error) = board.load_requests(requester.clone()).await {
        return CommandResult::failure(
            COMMAND,
            error.error_class(),
            error.notice_message(),
            EXIT_BACKEND,
        );
    }

    let request_id = BoaRequestId(id.trim().to_string());
    if !board.open_detail_by_id(&request_id).await {
        return CommandResult::failure(
            COMMAND,
            "not_found",
            format!("no BOA request `{request_id}` for roll number {requester}"),
            EXIT_INPUT,
        );
    }

    match board.detail(media).await {
        Some(detail) => CommandResult::success(COMMAND, detail.render_text()),
        None => CommandResult::failure(
            COMMAND,
            "not_found",
            format!("no BOA request `{request_id}` for roll number {requester}"),
            EXIT_INPUT,
        ),
    }
}

#[cfg(test)]
mod tests {
    use boa_core::{
        ApprovalDecision, ApproverRole, BoaRequest, BoaRequestId, Decision,
        InMemoryRequestSource, InMemorySettingsStore, MediaResolver, RequesterId, SettingKey,
        SettingsStore,
    };
    use chrono::{TimeZone, Utc};
    use serde_json::Value;

    use super::execute;
    use crate::commands::EXIT_INPUT;

    fn message(output: &str) -> String {
        let payload: Value = serde_json::from_str(output).expect("json outcome");
        payload["message"].as_str().unwrap_or_default().to_string()
    }

    async fn source() -> InMemoryRequestSource {
        let source = InMemoryRequestSource::default();
        let mut request = BoaRequest::new("BOA-3", "Code Sprint");
        request.event_photos = vec!["sprint/day1.jpg".to_string()];
        source.insert(RequesterId("21CS003".to_string()), request).await;
        source
            .record_decision(
                &ApprovalDecision {
                    request_id: BoaRequestId("BOA-3".to_string()),
                    role: ApproverRole::ClassInCharge,
                    decision: Decision::Approved,
                    approver: "Prof. R. Iyer".to_string(),
                    remarks: None,
                },
                Utc.with_ymd_and_hms(2024, 2, 1, 9, 15, 0).unwrap(),
            )
            .await
            .expect("decision");
        source
    }

    #[tokio::test]
    async fn renders_detail_for_remembered_roll_number() {
        let store = InMemorySettingsStore::default();
        store.put(SettingKey::LastRollNo, "21CS003").await.expect("put");
        let media = MediaResolver::new("https://cs.example.edu/uploads");

        let result = execute(source().await, &store, &media, "BOA-3", None).await;

        assert_eq!(result.exit_code, 0);
        let text = message(&result.output);
        assert!(text.starts_with("BOA request BOA-3 [Pending]"));
        assert!(text.contains("  by: Prof. R. Iyer"));
        assert!(text.contains("  on: 2024-02-01 09:15 UTC"));
        assert!(!text.contains("remarks:"));
        assert!(text.contains("https://cs.example.edu/uploads/sprint/day1.jpg"));
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let store = InMemorySettingsStore::default();
        let media = MediaResolver::new("");

        let result = execute(source().await, &store, &media, "BOA-99", Some("21CS003")).await;

        assert_eq!(result.exit_code, EXIT_INPUT);
        let payload: Value = serde_json::from_str(&result.output).expect("json outcome");
        assert_eq!(payload["error_class"], "not_found");
    }
}
