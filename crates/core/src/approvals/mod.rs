use serde::{Deserialize, Serialize};

use crate::domain::approval::{ApprovalStatus, ApproverRole};
use crate::domain::boa_request::BoaRequestId;
use crate::errors::DomainError;

/// Presentation category for a status value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusBadge {
    Approved,
    Rejected,
    Pending,
}

impl StatusBadge {
    pub fn label(self) -> &'static str {
        match self {
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Pending => "Pending",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Self::Approved => "badge-approved",
            Self::Rejected => "badge-rejected",
            Self::Pending => "badge-pending",
        }
    }
}

impl From<ApprovalStatus> for StatusBadge {
    fn from(status: ApprovalStatus) -> Self {
        match status {
            ApprovalStatus::Approved => Self::Approved,
            ApprovalStatus::Rejected => Self::Rejected,
            ApprovalStatus::Pending => Self::Pending,
        }
    }
}

/// Maps any raw status string onto a badge; unknown values read as pending.
pub fn derive_status_badge(raw: &str) -> StatusBadge {
    ApprovalStatus::canonicalize(raw).into()
}

/// Combines the two approval stages into the request's overall status.
///
/// A rejection from either role wins over an approval from the other.
pub fn derive_overall_status(hod: ApprovalStatus, class_in_charge: ApprovalStatus) -> ApprovalStatus {
    match (hod, class_in_charge) {
        (ApprovalStatus::Rejected, _) | (_, ApprovalStatus::Rejected) => ApprovalStatus::Rejected,
        (ApprovalStatus::Approved, ApprovalStatus::Approved) => ApprovalStatus::Approved,
        _ => ApprovalStatus::Pending,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn status(self) -> ApprovalStatus {
        match self {
            Self::Approved => ApprovalStatus::Approved,
            Self::Rejected => ApprovalStatus::Rejected,
        }
    }
}

impl std::str::FromStr for Decision {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "approved" | "approve" => Ok(Self::Approved),
            "rejected" | "reject" => Ok(Self::Rejected),
            _ => Err(DomainError::InvalidDecision(value.to_string())),
        }
    }
}

/// Payload the approval collaborator accepts from an approver.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalDecision {
    pub request_id: BoaRequestId,
    pub role: ApproverRole,
    pub decision: Decision,
    pub approver: String,
    pub remarks: Option<String>,
}

impl ApprovalDecision {
    /// Returns a normalized copy: approver trimmed and required, blank remarks dropped.
    pub fn validated(&self) -> Result<Self, DomainError> {
        let approver = self.approver.trim();
        if approver.is_empty() {
            return Err(DomainError::InvariantViolation(format!(
                "{} decision on `{}` requires an approver name",
                self.role.label(),
                self.request_id
            )));
        }

        let remarks = self
            .remarks
            .as_deref()
            .map(str::trim)
            .filter(|remarks| !remarks.is_empty())
            .map(str::to_string);

        Ok(Self {
            request_id: self.request_id.clone(),
            role: self.role,
            decision: self.decision,
            approver: approver.to_string(),
            remarks,
        })
    }
}
