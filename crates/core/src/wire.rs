//! Response schema for the backend's BOA request listing endpoint.
//!
//! The backend answers `GET <requests-endpoint>?rollNo=<id>` with
//! `{ "status": "success" | <other>, "data"?: [...], "message"?: "..." }`.
//! Everything is validated here so the rest of the crate only sees
//! [`BoaRequest`] values; a single bad record fails the whole response.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::approval::{ApprovalStage, ApprovalStatus};
use crate::domain::boa_request::{AcademicContext, BoaRequest, BoaRequestId, EventDetails};
use crate::errors::DomainError;

pub const GENERIC_LISTING_FAILURE: &str = "Unable to load BOA requests. Please try again.";

const SUCCESS_STATUS: &str = "success";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ListingError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("backend rejected listing request: {}", .message.as_deref().unwrap_or("no message"))]
    Rejected { message: Option<String> },
    #[error("could not decode listing response: {0}")]
    Decode(String),
}

impl ListingError {
    /// Text shown to the user: the backend's own message when it sent one.
    pub fn notice_message(&self) -> String {
        match self {
            Self::Rejected { message: Some(message) } if !message.trim().is_empty() => {
                message.trim().to_string()
            }
            _ => GENERIC_LISTING_FAILURE.to_string(),
        }
    }

    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Rejected { .. } => "rejected",
            Self::Decode(_) => "decode",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListingResponse {
    Success(Vec<BoaRequest>),
    Failure { message: Option<String> },
}

impl ListingResponse {
    pub fn into_result(self) -> Result<Vec<BoaRequest>, ListingError> {
        match self {
            Self::Success(requests) => Ok(requests),
            Self::Failure { message } => Err(ListingError::Rejected { message }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListingEnvelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    message: Option<Value>,
}

pub fn parse_listing_body(body: &str) -> Result<ListingResponse, ListingError> {
    let envelope: ListingEnvelope =
        serde_json::from_str(body).map_err(|error| ListingError::Decode(error.to_string()))?;

    if envelope.status.as_deref() != Some(SUCCESS_STATUS) {
        let message = envelope.message.as_ref().and_then(scalar_text);
        return Ok(ListingResponse::Failure { message });
    }

    let records = match envelope.data {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(records)) => records,
        Some(other) => {
            return Err(ListingError::Decode(format!(
                "expected `data` to be an array, found {}",
                value_kind(&other)
            )))
        }
    };

    let requests = records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            decode_record(record)
                .map_err(|error| ListingError::Decode(format!("record {index}: {error}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ListingResponse::Success(requests))
}

pub fn decode_record(value: &Value) -> Result<BoaRequest, DomainError> {
    let Value::Object(map) = value else {
        return Err(DomainError::InvalidRecord {
            field: "record",
            reason: format!("expected an object, found {}", value_kind(value)),
        });
    };
    let record = Record(map);

    let id = record.text("id").ok_or(DomainError::InvalidRecord {
        field: "id",
        reason: "missing request id".to_string(),
    })?;

    Ok(BoaRequest {
        id: BoaRequestId(id),
        event: EventDetails {
            name: record.text("eventName").unwrap_or_default(),
            date_from: record.date("eventDateFrom")?,
            date_to: record.date("eventDateTo")?,
            organizing_dept: record.text("organizingDept").unwrap_or_default(),
            teacher_in_charge: record.text("teacherInCharge").unwrap_or_default(),
            theory_lectures: record.count("numTheoryLectures")?,
            practical_lectures: record.count("numPracticalLectures")?,
        },
        academic: AcademicContext {
            branch: record.text("branch").unwrap_or_default(),
            semester: record.text("semester").unwrap_or_default(),
            section: record.text("section").unwrap_or_default(),
            class_in_charge: record.text("classInCharge").unwrap_or_default(),
        },
        hod: record.stage(
            "hodApprovalStatus",
            "hodApprovedBy",
            "hodApprovalDate",
            "hodRemarks",
        )?,
        class_in_charge: record.stage(
            "classInchargeApprovalStatus",
            "classInchargeApprovedBy",
            "classInchargeApprovalDate",
            "classInchargeRemarks",
        )?,
        reported_status: record.status("status"),
        event_photos: record.photos("eventPhotos")?,
        submission_date: record.submission_date("submissionDate")?,
        submitted_at: record.timestamp("submittedAt")?,
    })
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` (read as UTC) and bare dates.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(parsed.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc())
}

struct Record<'a>(&'a Map<String, Value>);

impl Record<'_> {
    fn text(&self, field: &str) -> Option<String> {
        self.0.get(field).and_then(scalar_text)
    }

    fn status(&self, field: &str) -> ApprovalStatus {
        self.text(field).map(|raw| ApprovalStatus::canonicalize(&raw)).unwrap_or_default()
    }

    fn count(&self, field: &'static str) -> Result<u32, DomainError> {
        let invalid = |reason: String| DomainError::InvalidRecord { field, reason };
        match self.0.get(field) {
            None | Some(Value::Null) => Ok(0),
            Some(Value::Number(number)) => number
                .as_u64()
                .and_then(|value| u32::try_from(value).ok())
                .ok_or_else(|| invalid(format!("`{number}` is not a non-negative count"))),
            Some(Value::String(raw)) if raw.trim().is_empty() => Ok(0),
            Some(Value::String(raw)) => raw
                .trim()
                .parse::<u32>()
                .map_err(|_| invalid(format!("`{raw}` is not a non-negative count"))),
            Some(other) => Err(invalid(format!("expected a count, found {}", value_kind(other)))),
        }
    }

    fn date(&self, field: &'static str) -> Result<Option<NaiveDate>, DomainError> {
        let Some(raw) = self.text(field) else {
            return Ok(None);
        };
        NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map(Some).map_err(|_| {
            DomainError::InvalidRecord { field, reason: format!("`{raw}` is not a YYYY-MM-DD date") }
        })
    }

    fn submission_date(&self, field: &'static str) -> Result<Option<NaiveDate>, DomainError> {
        let Some(raw) = self.text(field) else {
            return Ok(None);
        };
        parse_timestamp(&raw).map(|timestamp| Some(timestamp.date_naive())).ok_or_else(|| {
            DomainError::InvalidRecord { field, reason: format!("`{raw}` is not a date") }
        })
    }

    fn timestamp(&self, field: &'static str) -> Result<Option<DateTime<Utc>>, DomainError> {
        let Some(raw) = self.text(field) else {
            return Ok(None);
        };
        parse_timestamp(&raw).map(Some).ok_or_else(|| DomainError::InvalidRecord {
            field,
            reason: format!("`{raw}` is not a timestamp"),
        })
    }

    fn stage(
        &self,
        status: &str,
        approved_by: &str,
        decided_at: &'static str,
        remarks: &str,
    ) -> Result<ApprovalStage, DomainError> {
        Ok(ApprovalStage {
            status: self.status(status),
            approved_by: self.text(approved_by),
            decided_at: self.timestamp(decided_at)?,
            remarks: self.text(remarks),
        })
    }

    /// Photos arrive as a JSON array, a JSON-encoded array string, or a comma list.
    fn photos(&self, field: &'static str) -> Result<Vec<String>, DomainError> {
        let collect = |items: &[Value]| -> Vec<String> { items.iter().filter_map(scalar_text).collect() };

        match self.0.get(field) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(collect(items)),
            Some(Value::String(raw)) => {
                let trimmed = raw.trim();
                if trimmed.starts_with('[') {
                    let items: Vec<Value> = serde_json::from_str(trimmed).map_err(|error| {
                        DomainError::InvalidRecord { field, reason: error.to_string() }
                    })?;
                    return Ok(collect(&items));
                }
                Ok(trimmed
                    .split(',')
                    .map(str::trim)
                    .filter(|reference| !reference.is_empty())
                    .map(str::to_string)
                    .collect())
            }
            Some(other) => Err(DomainError::InvalidRecord {
                field,
                reason: format!("expected a list of image references, found {}", value_kind(other)),
            }),
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(raw) => Some(raw.trim()).filter(|raw| !raw.is_empty()).map(str::to_string),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
