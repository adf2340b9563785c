use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::approvals::{derive_overall_status, ApprovalDecision};
use crate::domain::approval::{ApprovalStage, ApprovalStatus, ApproverRole};
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoaRequestId(pub String);

impl std::fmt::Display for BoaRequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Student roll number scoping which requests are listed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequesterId(pub String);

impl RequesterId {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvariantViolation("roll number must not be empty".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequesterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDetails {
    pub name: String,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub organizing_dept: String,
    pub teacher_in_charge: String,
    pub theory_lectures: u32,
    pub practical_lectures: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicContext {
    pub branch: String,
    pub semester: String,
    pub section: String,
    pub class_in_charge: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoaRequest {
    pub id: BoaRequestId,
    pub event: EventDetails,
    pub academic: AcademicContext,
    pub hod: ApprovalStage,
    pub class_in_charge: ApprovalStage,
    /// Overall status as supplied by the backend. Views use [`BoaRequest::overall_status`].
    pub reported_status: ApprovalStatus,
    pub event_photos: Vec<String>,
    pub submission_date: Option<NaiveDate>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl BoaRequest {
    pub fn new(id: impl Into<String>, event_name: impl Into<String>) -> Self {
        Self {
            id: BoaRequestId(id.into()),
            event: EventDetails { name: event_name.into(), ..EventDetails::default() },
            academic: AcademicContext::default(),
            hod: ApprovalStage::pending(),
            class_in_charge: ApprovalStage::pending(),
            reported_status: ApprovalStatus::Pending,
            event_photos: Vec::new(),
            submission_date: None,
            submitted_at: None,
        }
    }

    pub fn stage(&self, role: ApproverRole) -> &ApprovalStage {
        match role {
            ApproverRole::Hod => &self.hod,
            ApproverRole::ClassInCharge => &self.class_in_charge,
        }
    }

    fn stage_mut(&mut self, role: ApproverRole) -> &mut ApprovalStage {
        match role {
            ApproverRole::Hod => &mut self.hod,
            ApproverRole::ClassInCharge => &mut self.class_in_charge,
        }
    }

    /// Overall status recomputed from the two approval stages.
    pub fn overall_status(&self) -> ApprovalStatus {
        derive_overall_status(self.hod.status, self.class_in_charge.status)
    }

    /// Returns the backend value when it disagrees with the local derivation.
    pub fn status_mismatch(&self) -> Option<ApprovalStatus> {
        let derived = self.overall_status();
        (self.reported_status != derived).then_some(self.reported_status)
    }

    /// Records one approver's decision, moving that stage out of `pending`.
    pub fn apply_decision(
        &mut self,
        decision: &ApprovalDecision,
        decided_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let decision = decision.validated()?;
        if decision.request_id != self.id {
            return Err(DomainError::InvariantViolation(format!(
                "decision for `{}` applied to request `{}`",
                decision.request_id, self.id
            )));
        }

        let stage = self.stage_mut(decision.role);
        if stage.status.is_decided() {
            return Err(DomainError::StageAlreadyDecided {
                role: decision.role,
                status: stage.status,
            });
        }

        *stage = ApprovalStage {
            status: decision.decision.status(),
            approved_by: Some(decision.approver),
            decided_at: Some(decided_at),
            remarks: decision.remarks,
        };
        self.reported_status = self.overall_status();
        Ok(())
    }
}
