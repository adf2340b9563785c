//! HTTP implementation of the BOA request listing collaborator.

use std::time::Duration;

use async_trait::async_trait;
use boa_core::config::BackendConfig;
use boa_core::wire::{parse_listing_body, ListingError, ListingResponse};
use boa_core::{BoaRequest, RequestSource, RequesterId};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, warn};

const ROLL_NO_PARAM: &str = "rollNo";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to build http client: {0}")]
    Build(#[source] reqwest::Error),
}

#[derive(Clone)]
pub struct HttpRequestSource {
    client: Client,
    requests_url: String,
    base_url: String,
    api_token: Option<SecretString>,
}

impl HttpRequestSource {
    pub fn from_config(config: &BackendConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(ClientError::Build)?;

        Ok(Self {
            client,
            requests_url: config.requests_url(),
            base_url: config.base_url.clone(),
            api_token: config.api_token.clone(),
        })
    }

    pub fn requests_url(&self) -> &str {
        &self.requests_url
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }
}

#[async_trait]
impl RequestSource for HttpRequestSource {
    async fn fetch_requests(&self, requester: &RequesterId) -> Result<Vec<BoaRequest>, ListingError> {
        let request = self
            .client
            .get(&self.requests_url)
            .query(&[(ROLL_NO_PARAM, requester.as_str())]);

        let response = self.authorized(request).send().await.map_err(|error| {
            warn!(
                event_name = "boa.client.transport_error",
                roll_no = %requester,
                error = %error,
                "BOA listing request failed"
            );
            ListingError::Transport(error.to_string())
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| ListingError::Transport(format!("failed to read response body: {error}")))?;

        debug!(
            event_name = "boa.client.response",
            roll_no = %requester,
            http_status = status.as_u16(),
            bytes = body.len(),
            "BOA listing response received"
        );

        interpret_response(status, &body)
    }

    async fn probe(&self) -> Result<(), ListingError> {
        let response = self
            .authorized(self.client.get(&self.base_url))
            .send()
            .await
            .map_err(|error| ListingError::Transport(error.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(ListingError::Transport(format!("backend returned {status}")));
        }
        Ok(())
    }
}

/// Backends often answer failures with a non-2xx status and an error envelope;
/// the envelope's message wins when one can be read.
fn interpret_response(
    status: reqwest::StatusCode,
    body: &str,
) -> Result<Vec<BoaRequest>, ListingError> {
    match parse_listing_body(body) {
        Ok(ListingResponse::Success(requests)) if status.is_success() => Ok(requests),
        Ok(ListingResponse::Success(_)) => {
            Err(ListingError::Transport(format!("backend returned {status}")))
        }
        Ok(failure @ ListingResponse::Failure { .. }) => failure.into_result(),
        Err(_) if !status.is_success() => {
            Err(ListingError::Transport(format!("backend returned {status}")))
        }
        Err(error) => Err(error),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::{
        extract::Query,
        http::{HeaderMap, StatusCode},
        routing::get,
        Json, Router,
    };
    use boa_core::config::BackendConfig;
    use boa_core::wire::{ListingError, GENERIC_LISTING_FAILURE};
    use boa_core::{RequestSource, RequesterId};
    use serde_json::{json, Value};

    use super::{interpret_response, HttpRequestSource};

    async fn listing(
        Query(params): Query<HashMap<String, String>>,
        headers: HeaderMap,
    ) -> (StatusCode, Json<Value>) {
        let roll_no = params.get("rollNo").cloned().unwrap_or_default();
        match roll_no.as_str() {
            "21CS001" => {
                let authorized = headers
                    .get("authorization")
                    .and_then(|value| value.to_str().ok())
                    .is_some_and(|value| value == "Bearer portal-token");
                let hod_status = if authorized { "approved" } else { "pending" };
                (
                    StatusCode::OK,
                    Json(json!({
                        "status": "success",
                        "data": [
                            { "id": "BOA-1", "eventName": "Hackathon", "hodApprovalStatus": hod_status },
                            { "id": "BOA-2", "eventName": "Symposium" }
                        ]
                    })),
                )
            }
            "21CS404" => (
                StatusCode::NOT_FOUND,
                Json(json!({ "status": "error", "message": "No student with that roll number" })),
            ),
            _ => (StatusCode::OK, Json(json!({ "status": "success", "data": [] }))),
        }
    }

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind stub backend");
        let address = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{address}/api")
    }

    async fn spawn_backend() -> String {
        spawn(Router::new().route("/api/boa/get_requests.php", get(listing))).await
    }

    fn backend_config(base_url: String, api_token: Option<&str>) -> BackendConfig {
        BackendConfig {
            base_url,
            requests_path: "boa/get_requests.php".to_string(),
            media_base_url: String::new(),
            timeout_secs: 5,
            api_token: api_token.map(|token| token.to_string().into()),
        }
    }

    #[tokio::test]
    async fn fetches_requests_scoped_by_roll_number() {
        let base_url = spawn_backend().await;
        let source = HttpRequestSource::from_config(&backend_config(base_url, Some("portal-token")))
            .expect("client");

        let requests = source
            .fetch_requests(&RequesterId("21CS001".to_string()))
            .await
            .expect("listing succeeds");

        let ids: Vec<&str> = requests.iter().map(|request| request.id.0.as_str()).collect();
        assert_eq!(ids, vec!["BOA-1", "BOA-2"]);
        assert!(requests[0].hod.status.is_decided(), "bearer token should reach the backend");
    }

    #[tokio::test]
    async fn empty_listing_is_ok() {
        let base_url = spawn_backend().await;
        let source = HttpRequestSource::from_config(&backend_config(base_url, None)).expect("client");

        let requests =
            source.fetch_requests(&RequesterId("22CS000".to_string())).await.expect("listing");
        assert!(requests.is_empty());
    }

    #[tokio::test]
    async fn error_envelope_on_non_2xx_surfaces_backend_message() {
        let base_url = spawn_backend().await;
        let source = HttpRequestSource::from_config(&backend_config(base_url, None)).expect("client");

        let error = source
            .fetch_requests(&RequesterId("21CS404".to_string()))
            .await
            .expect_err("error envelope");

        assert_eq!(error.notice_message(), "No student with that roll number");
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("local addr");
        drop(listener);

        let source = HttpRequestSource::from_config(&backend_config(format!("http://{address}"), None))
            .expect("client");
        let error = source
            .fetch_requests(&RequesterId("21CS001".to_string()))
            .await
            .expect_err("nothing is listening");

        assert!(matches!(error, ListingError::Transport(_)));
        assert_eq!(error.notice_message(), GENERIC_LISTING_FAILURE);
        assert!(source.probe().await.is_err());
    }

    #[tokio::test]
    async fn probe_accepts_client_errors_but_not_server_errors() {
        let healthy = HttpRequestSource::from_config(&backend_config(spawn_backend().await, None))
            .expect("client");
        assert!(healthy.probe().await.is_ok(), "a 404 on the base url still means the backend is up");

        let failing_url =
            spawn(Router::new().route("/api", get(|| async { StatusCode::SERVICE_UNAVAILABLE }))).await;
        let failing =
            HttpRequestSource::from_config(&backend_config(failing_url, None)).expect("client");
        let error = failing.probe().await.expect_err("5xx is not ready");

        assert!(matches!(error, ListingError::Transport(ref message) if message.contains("503")));
    }

    #[test]
    fn non_json_error_page_is_a_transport_error() {
        let result = interpret_response(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            "<b>Fatal error</b>: Uncaught mysqli_sql_exception",
        );
        assert!(matches!(result, Err(ListingError::Transport(ref message)) if message.contains("500")));
    }

    #[test]
    fn non_json_success_page_is_a_decode_error() {
        let result = interpret_response(reqwest::StatusCode::OK, "Connected successfully");
        assert!(matches!(result, Err(ListingError::Decode(_))));
    }
}
