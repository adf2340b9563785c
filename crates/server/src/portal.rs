//! Student-facing portal routes.
//!
//! HTML Endpoints:
//! - `GET /portal`                                  roll-number form
//! - `GET /portal/requests?rollNo=`                 request list with status badges
//! - `GET /portal/requests/{roll_no}/{request_id}`  request detail
//!
//! JSON API Endpoints:
//! - `GET /api/v1/requests?rollNo=`                 request summaries

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Json, Router,
};
use boa_core::{
    ApplicationError, ApproverPanel, BoaRequestDetail, BoaRequestId, InterfaceError, LoadOutcome,
    MediaResolver, Notice, RequestBoard, RequestSource, RequestSummary, RequesterId,
};
use serde::{Deserialize, Serialize};
use tera::{Context, Tera};
use tracing::{error, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct PortalState {
    source: Arc<dyn RequestSource>,
    templates: Arc<Tera>,
    media: MediaResolver,
}

impl PortalState {
    pub fn new(source: Arc<dyn RequestSource>, media: MediaResolver) -> Self {
        Self { source, templates: init_templates(), media }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RequestsQuery {
    #[serde(rename = "rollNo")]
    pub roll_no: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListingPayload {
    pub status: &'static str,
    pub data: Vec<RequestSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl ListingPayload {
    fn failure(interface: &InterfaceError) -> Self {
        Self {
            status: "error",
            data: Vec::new(),
            message: Some(interface.message().to_string()),
            correlation_id: Some(interface.correlation_id().to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    #[serde(flatten)]
    summary: &'a RequestSummary,
    id_param: String,
}

#[derive(Debug, Serialize)]
struct ApproverView {
    role_label: &'static str,
    label: &'static str,
    css_class: &'static str,
    approver_name: Option<String>,
    decided_at: Option<String>,
    remarks: Option<String>,
}

impl From<&ApproverPanel> for ApproverView {
    fn from(panel: &ApproverPanel) -> Self {
        Self {
            role_label: panel.role_label,
            label: panel.status.label,
            css_class: panel.status.css_class,
            approver_name: panel.approver_name.clone(),
            decided_at: panel.decided_at.map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string()),
            remarks: panel.remarks.clone(),
        }
    }
}

type HtmlError = (StatusCode, Html<String>);

/// Percent-encodes a value for a single path segment or query value.
/// Request ids are opaque and may contain `/`, `?` or `#`.
fn url_param(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

fn init_templates() -> Arc<Tera> {
    let mut tera = Tera::default();
    let templates = [
        ("base.html", include_str!("../../../templates/portal/base.html")),
        ("index.html", include_str!("../../../templates/portal/index.html")),
        ("requests.html", include_str!("../../../templates/portal/requests.html")),
        ("request_detail.html", include_str!("../../../templates/portal/request_detail.html")),
    ];
    if let Err(error) = tera.add_raw_templates(templates) {
        error!(
            event_name = "system.portal.template_error",
            error = %error,
            "failed to register embedded portal templates"
        );
    }
    Arc::new(tera)
}

pub fn router(state: PortalState) -> Router {
    Router::new()
        .route("/portal", get(portal_index_page))
        .route("/portal/requests", get(requests_page))
        .route("/portal/requests/{roll_no}/{request_id}", get(request_detail_page))
        .route("/api/v1/requests", get(list_requests))
        .with_state(state)
}

fn render(state: &PortalState, template: &str, context: &Context) -> Result<String, HtmlError> {
    state.templates.render(template, context).map_err(|error| {
        error!(
            event_name = "system.portal.render_failed",
            template,
            error = %error,
            "portal template rendering failed"
        );
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html("<h1>Template Error</h1><p>The page could not be rendered.</p>".to_string()),
        )
    })
}

fn index_context(roll_no: &str, error: Option<String>) -> Context {
    let mut context = Context::new();
    context.insert("roll_no", roll_no);
    context.insert("error", &error);
    context
}

async fn portal_index_page(
    Query(query): Query<RequestsQuery>,
    State(state): State<PortalState>,
) -> Result<Html<String>, HtmlError> {
    let roll_no = query.roll_no.unwrap_or_default();
    render(&state, "index.html", &index_context(roll_no.trim(), None)).map(Html)
}

async fn requests_page(
    Query(query): Query<RequestsQuery>,
    State(state): State<PortalState>,
) -> Result<Html<String>, HtmlError> {
    let raw = query.roll_no.unwrap_or_default();
    let requester = match RequesterId::parse(&raw) {
        Ok(requester) => requester,
        Err(_) => {
            let context = index_context("", Some("Enter your roll number to see your requests.".to_string()));
            let html = render(&state, "index.html", &context)?;
            return Err((StatusCode::BAD_REQUEST, Html(html)));
        }
    };

    let board = RequestBoard::new(state.source.clone());
    board.load_requests(requester.clone()).await;

    let html = render_requests(&state, &requester, &board.summaries().await, board.notice().await)?;
    Ok(Html(html))
}

fn render_requests(
    state: &PortalState,
    requester: &RequesterId,
    summaries: &[RequestSummary],
    notice: Option<Notice>,
) -> Result<String, HtmlError> {
    let rows: Vec<SummaryRow<'_>> = summaries
        .iter()
        .map(|summary| SummaryRow { summary, id_param: url_param(&summary.id) })
        .collect();

    let mut context = Context::new();
    context.insert("roll_no", requester.as_str());
    context.insert("roll_no_param", &url_param(requester.as_str()));
    context.insert("rows", &rows);
    context.insert("count", &rows.len());
    context.insert("notice", &notice);
    render(state, "requests.html", &context)
}

async fn request_detail_page(
    Path((roll_no, request_id)): Path<(String, String)>,
    State(state): State<PortalState>,
) -> Result<Html<String>, HtmlError> {
    let requester = RequesterId::parse(&roll_no)
        .map_err(|_| (StatusCode::BAD_REQUEST, Html("<h1>Missing roll number</h1>".to_string())))?;

    let board = RequestBoard::new(state.source.clone());
    if let LoadOutcome::Failed(_) = board.load_requests(requester.clone()).await {
        let html = render_requests(&state, &requester, &[], board.notice().await)?;
        return Err((StatusCode::BAD_GATEWAY, Html(html)));
    }

    let id = BoaRequestId(request_id);
    if !board.open_detail_by_id(&id).await {
        return Err((StatusCode::NOT_FOUND, Html("<h1>BOA request not found</h1>".to_string())));
    }
    let Some(detail) = board.detail(&state.media).await else {
        return Err((StatusCode::NOT_FOUND, Html("<h1>BOA request not found</h1>".to_string())));
    };

    info!(
        event_name = "boa.portal.detail_viewed",
        roll_no = %requester,
        request_id = %id,
        "request detail rendered"
    );

    let html = render(&state, "request_detail.html", &detail_context(&requester, &detail))?;
    Ok(Html(html))
}

fn detail_context(requester: &RequesterId, detail: &BoaRequestDetail) -> Context {
    let approvers: Vec<ApproverView> = detail.approvers.iter().map(ApproverView::from).collect();
    let submitted_on = detail
        .submitted_at
        .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string())
        .or_else(|| detail.submission_date.map(|date| date.to_string()));

    let mut context = Context::new();
    context.insert("roll_no", requester.as_str());
    context.insert("roll_no_param", &url_param(requester.as_str()));
    context.insert("detail", detail);
    context.insert("approvers", &approvers);
    context.insert("photo_count", &detail.photos.len());
    context.insert("submitted_on", &submitted_on);
    context
}

async fn list_requests(
    Query(query): Query<RequestsQuery>,
    State(state): State<PortalState>,
) -> (StatusCode, Json<ListingPayload>) {
    let raw = query.roll_no.unwrap_or_default();
    let requester = match RequesterId::parse(&raw) {
        Ok(requester) => requester,
        Err(domain_error) => {
            let interface = ApplicationError::from(domain_error)
                .into_interface(Uuid::new_v4().to_string());
            return (StatusCode::BAD_REQUEST, Json(ListingPayload::failure(&interface)));
        }
    };

    let board = RequestBoard::new(state.source.clone());
    match board.load_requests(requester).await {
        LoadOutcome::Failed(listing_error) => {
            let error_class = listing_error.error_class();
            let interface = ApplicationError::Integration(listing_error.notice_message())
                .into_interface(Uuid::new_v4().to_string());
            error!(
                event_name = "boa.api.listing_failed",
                correlation_id = interface.correlation_id(),
                error_class,
                "listing API returned backend failure"
            );
            (StatusCode::BAD_GATEWAY, Json(ListingPayload::failure(&interface)))
        }
        LoadOutcome::Loaded { .. } | LoadOutcome::Superseded => (
            StatusCode::OK,
            Json(ListingPayload {
                status: "success",
                data: board.summaries().await,
                message: None,
                correlation_id: None,
            }),
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        extract::{Path, Query, State},
        http::{Request, StatusCode},
        Json,
    };
    use boa_core::{
        ApprovalDecision, ApproverRole, BoaRequest, BoaRequestId, Decision,
        InMemoryRequestSource, ListingError, MediaResolver, RequesterId,
    };
    use chrono::{TimeZone, Utc};
    use tower::ServiceExt;

    use super::*;

    const ROLL_NO: &str = "21CS001";

    async fn source() -> Arc<InMemoryRequestSource> {
        let source = InMemoryRequestSource::default();
        let requester = RequesterId(ROLL_NO.to_string());

        let mut hackathon = BoaRequest::new("BOA-1", "Hackathon <Finals>");
        hackathon.event_photos = vec!["hack/1.jpg".to_string()];
        source.insert(requester.clone(), hackathon).await;
        source.insert(requester.clone(), BoaRequest::new("BOA-2", "Symposium")).await;

        let decision = ApprovalDecision {
            request_id: BoaRequestId("BOA-1".to_string()),
            role: ApproverRole::Hod,
            decision: Decision::Rejected,
            approver: "Dr. S. Menon".to_string(),
            remarks: Some("Clashes with exams".to_string()),
        };
        source
            .record_decision(&decision, Utc.with_ymd_and_hms(2024, 9, 6, 15, 30, 0).unwrap())
            .await
            .expect("decision");

        source
            .fail_with(
                RequesterId("21CS500".to_string()),
                ListingError::Rejected { message: Some("Student record locked".to_string()) },
            )
            .await;

        Arc::new(source)
    }

    async fn state() -> PortalState {
        PortalState::new(source().await, MediaResolver::new("https://cs.example.edu/uploads/boa/"))
    }

    fn query(roll_no: &str) -> Query<RequestsQuery> {
        Query(RequestsQuery { roll_no: Some(roll_no.to_string()) })
    }

    #[tokio::test]
    async fn requests_page_lists_summaries_with_locally_derived_badges() {
        let Html(html) = requests_page(query(ROLL_NO), State(state().await)).await.expect("page");

        assert!(html.contains("Hackathon &lt;Finals&gt;"), "event names are escaped");
        assert!(html.contains("badge-rejected"));
        assert!(html.contains("badge-pending"));
        assert!(html.contains("/portal/requests/21CS001/BOA-2"));
        assert!(!html.contains("role=\"alert\""));
    }

    #[tokio::test]
    async fn requests_page_shows_empty_state_without_notice() {
        let Html(html) = requests_page(query("22CS999"), State(state().await)).await.expect("page");

        assert!(html.contains("No BOA requests found."));
        assert!(!html.contains("role=\"alert\""));
    }

    #[tokio::test]
    async fn requests_page_surfaces_backend_message_with_retry_link() {
        let Html(html) = requests_page(query("21CS500"), State(state().await)).await.expect("page");

        assert!(html.contains("Student record locked"));
        assert!(html.contains("href=\"/portal/requests?rollNo=21CS500\""));
        assert!(!html.contains("No BOA requests found."));
    }

    #[tokio::test]
    async fn requests_page_without_roll_number_is_bad_request() {
        let result = requests_page(query("   "), State(state().await)).await;

        let (status, Html(html)) = result.expect_err("blank roll number");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(html.contains("Enter your roll number"));
    }

    #[tokio::test]
    async fn detail_page_shows_decided_stage_and_resolved_photos() {
        let Html(html) = request_detail_page(
            Path((ROLL_NO.to_string(), "BOA-1".to_string())),
            State(state().await),
        )
        .await
        .expect("detail page");

        assert!(html.contains("Dr. S. Menon"));
        assert!(html.contains("2024-09-06 15:30 UTC"));
        assert!(html.contains("Clashes with exams"));
        assert!(html.contains("cs.example.edu"), "photo resolved against media base");
        assert!(html.contains("1.jpg"));
        assert_eq!(html.matches("<dt>By</dt>").count(), 1, "pending stage shows no approver");
    }

    #[tokio::test]
    async fn detail_page_omits_photo_section_when_there_are_none() {
        let Html(html) = request_detail_page(
            Path((ROLL_NO.to_string(), "BOA-2".to_string())),
            State(state().await),
        )
        .await
        .expect("detail page");

        assert!(!html.contains("Event photos"));
        assert!(!html.contains("<dt>By</dt>"));
    }

    #[tokio::test]
    async fn unknown_request_id_is_not_found() {
        let app = router(state().await);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/portal/requests/21CS001/BOA-404")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn api_lists_summaries_in_backend_order() {
        let app = router(state().await);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/requests?rollNo=21CS001")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let payload: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(payload["status"], "success");
        assert_eq!(payload["data"][0]["id"], "BOA-1");
        assert_eq!(payload["data"][0]["status"]["label"], "Rejected");
        assert_eq!(payload["data"][1]["id"], "BOA-2");
    }

    #[tokio::test]
    async fn api_reports_backend_failure_with_notice_message() {
        let (status, Json(payload)) = list_requests(query("21CS500"), State(state().await)).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(payload.status, "error");
        assert!(payload.data.is_empty());
        assert_eq!(payload.message.as_deref(), Some("Student record locked"));
        assert!(payload.correlation_id.is_some());
    }

    #[tokio::test]
    async fn api_requires_roll_number() {
        let (status, Json(payload)) =
            list_requests(Query(RequestsQuery::default()), State(state().await)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(payload.status, "error");
        assert_eq!(
            payload.message.as_deref(),
            Some("domain invariant violation: roll number must not be empty")
        );
        assert!(payload.correlation_id.is_some());
    }

    async fn fetch(app: &Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, String::from_utf8(body.to_vec()).expect("utf-8 body"))
    }

    fn portal_links(html: &str) -> Vec<String> {
        html.split("href=\"")
            .skip(1)
            .filter_map(|rest| rest.split('"').next())
            .filter(|href| href.starts_with("/portal/requests"))
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn links_for_ids_with_reserved_characters_resolve() {
        let source = InMemoryRequestSource::default();
        let requester = RequesterId("21CS&7".to_string());
        source.insert(requester.clone(), BoaRequest::new("BOA/2024/7", "Robotics Expo")).await;
        source.insert(requester, BoaRequest::new("BOA?draft#2", "Quiz Night")).await;
        let app = router(PortalState::new(Arc::new(source), MediaResolver::new("")));

        let (status, list_html) = fetch(&app, "/portal/requests?rollNo=21CS%267").await;
        assert_eq!(status, StatusCode::OK);

        let detail_links = portal_links(&list_html);
        assert_eq!(
            detail_links,
            vec![
                "/portal/requests/21CS%267/BOA%2F2024%2F7".to_string(),
                "/portal/requests/21CS%267/BOA%3Fdraft%232".to_string(),
            ]
        );

        for link in &detail_links {
            let (status, detail_html) = fetch(&app, link).await;
            assert_eq!(status, StatusCode::OK, "detail link {link}");

            let back_links = portal_links(&detail_html);
            assert_eq!(back_links, vec!["/portal/requests?rollNo=21CS%267".to_string()]);
            let (status, _) = fetch(&app, &back_links[0]).await;
            assert_eq!(status, StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn retry_link_encodes_roll_number() {
        let source = InMemoryRequestSource::default();
        source
            .fail_with(RequesterId("21CS 500&x".to_string()), ListingError::Transport("down".to_string()))
            .await;
        let state = PortalState::new(Arc::new(source), MediaResolver::new(""));

        let Html(html) = requests_page(query("21CS 500&x"), State(state)).await.expect("page");

        assert_eq!(portal_links(&html), vec!["/portal/requests?rollNo=21CS%20500%26x".to_string()]);
    }
}
