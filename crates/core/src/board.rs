//! Request list and detail selection for one requester at a time.
//!
//! A load releases the state lock while it waits on the backend. Each load is
//! tagged with a generation number, and a completed fetch is only applied if no
//! newer load started in the meantime.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::approvals::ApprovalDecision;
use crate::detail::{BoaRequestDetail, MediaResolver, RequestSummary};
use crate::domain::boa_request::{BoaRequest, BoaRequestId, RequesterId};
use crate::errors::DomainError;
use crate::wire::ListingError;

#[async_trait]
pub trait RequestSource: Send + Sync {
    async fn fetch_requests(&self, requester: &RequesterId) -> Result<Vec<BoaRequest>, ListingError>;

    async fn probe(&self) -> Result<(), ListingError> {
        Ok(())
    }
}

#[async_trait]
impl<S> RequestSource for std::sync::Arc<S>
where
    S: RequestSource + ?Sized,
{
    async fn fetch_requests(&self, requester: &RequesterId) -> Result<Vec<BoaRequest>, ListingError> {
        (**self).fetch_requests(requester).await
    }

    async fn probe(&self) -> Result<(), ListingError> {
        (**self).probe().await
    }
}

/// Request source backed by a map; also accepts approval decisions.
#[derive(Default)]
pub struct InMemoryRequestSource {
    requests: RwLock<HashMap<RequesterId, Vec<BoaRequest>>>,
    failures: RwLock<HashMap<RequesterId, ListingError>>,
}

impl InMemoryRequestSource {
    pub async fn insert(&self, requester: RequesterId, request: BoaRequest) {
        let mut requests = self.requests.write().await;
        requests.entry(requester).or_default().push(request);
    }

    pub async fn fail_with(&self, requester: RequesterId, error: ListingError) {
        self.failures.write().await.insert(requester, error);
    }

    pub async fn record_decision(
        &self,
        decision: &ApprovalDecision,
        decided_at: DateTime<Utc>,
    ) -> Result<BoaRequest, DomainError> {
        let mut requests = self.requests.write().await;
        let request = requests
            .values_mut()
            .flat_map(|list| list.iter_mut())
            .find(|request| request.id == decision.request_id)
            .ok_or_else(|| {
                DomainError::InvariantViolation(format!(
                    "no BOA request with id `{}`",
                    decision.request_id
                ))
            })?;

        request.apply_decision(decision, decided_at)?;
        Ok(request.clone())
    }
}

#[async_trait]
impl RequestSource for InMemoryRequestSource {
    async fn fetch_requests(&self, requester: &RequesterId) -> Result<Vec<BoaRequest>, ListingError> {
        if let Some(error) = self.failures.read().await.get(requester) {
            return Err(error.clone());
        }
        Ok(self.requests.read().await.get(requester).cloned().unwrap_or_default())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Error,
}

/// Non-blocking user-visible message raised by a failed load.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { count: usize },
    Failed(ListingError),
    /// A newer load started before this one finished; its result was dropped.
    Superseded,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("no requester has been loaded yet")]
    NoRequester,
}

#[derive(Debug, Default)]
struct BoardState {
    requester: Option<RequesterId>,
    generation: u64,
    loading: bool,
    requests: Vec<BoaRequest>,
    notice: Option<Notice>,
    active: Option<BoaRequest>,
}

pub struct RequestBoard<S> {
    source: S,
    state: RwLock<BoardState>,
}

impl<S> RequestBoard<S>
where
    S: RequestSource,
{
    pub fn new(source: S) -> Self {
        Self { source, state: RwLock::new(BoardState::default()) }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetches the requester's requests and replaces the list with them.
    pub async fn load_requests(&self, requester: RequesterId) -> LoadOutcome {
        let generation = {
            let mut state = self.state.write().await;
            state.generation += 1;
            state.requester = Some(requester.clone());
            state.loading = true;
            state.active = None;
            state.generation
        };

        info!(
            event_name = "boa.board.load_started",
            roll_no = %requester,
            generation,
            "loading BOA requests"
        );

        let result = self.source.fetch_requests(&requester).await;

        let mut state = self.state.write().await;
        if state.generation != generation {
            debug!(
                event_name = "boa.board.stale_response",
                roll_no = %requester,
                generation,
                current_generation = state.generation,
                "dropping response from superseded load"
            );
            return LoadOutcome::Superseded;
        }
        state.loading = false;

        match result {
            Ok(requests) => {
                for request in &requests {
                    if let Some(reported) = request.status_mismatch() {
                        warn!(
                            event_name = "boa.request.status_mismatch",
                            request_id = %request.id,
                            reported = %reported,
                            derived = %request.overall_status(),
                            "backend overall status disagrees with approval stages"
                        );
                    }
                }
                let count = requests.len();
                state.requests = requests;
                state.notice = None;
                info!(
                    event_name = "boa.board.load_completed",
                    roll_no = %requester,
                    count,
                    "BOA requests loaded"
                );
                LoadOutcome::Loaded { count }
            }
            Err(error) => {
                warn!(
                    event_name = "boa.board.load_failed",
                    roll_no = %requester,
                    error_class = error.error_class(),
                    error = %error,
                    "failed to load BOA requests"
                );
                state.requests.clear();
                state.notice =
                    Some(Notice { level: NoticeLevel::Error, message: error.notice_message() });
                LoadOutcome::Failed(error)
            }
        }
    }

    /// Reloads the current requester.
    pub async fn retry(&self) -> Result<LoadOutcome, BoardError> {
        let requester = self.state.read().await.requester.clone().ok_or(BoardError::NoRequester)?;
        Ok(self.load_requests(requester).await)
    }

    pub async fn open_detail(&self, request: &BoaRequest) {
        self.state.write().await.active = Some(request.clone());
    }

    /// Selects a request from the loaded list by id; returns whether it was found.
    pub async fn open_detail_by_id(&self, id: &BoaRequestId) -> bool {
        let mut state = self.state.write().await;
        let found = state.requests.iter().find(|request| &request.id == id).cloned();
        let opened = found.is_some();
        state.active = found;
        opened
    }

    pub async fn close_detail(&self) {
        self.state.write().await.active = None;
    }

    pub async fn detail(&self, media: &MediaResolver) -> Option<BoaRequestDetail> {
        let state = self.state.read().await;
        state.active.as_ref().map(|request| BoaRequestDetail::from_request(request, media))
    }

    pub async fn is_detail_open(&self) -> bool {
        self.state.read().await.active.is_some()
    }

    pub async fn requests(&self) -> Vec<BoaRequest> {
        self.state.read().await.requests.clone()
    }

    pub async fn summaries(&self) -> Vec<RequestSummary> {
        self.state.read().await.requests.iter().map(RequestSummary::from).collect()
    }

    pub async fn notice(&self) -> Option<Notice> {
        self.state.read().await.notice.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    pub async fn requester(&self) -> Option<RequesterId> {
        self.state.read().await.requester.clone()
    }
}
