use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Decision state of one approver role on a BOA request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    /// Total parse used wherever a status string is compared.
    ///
    /// Only an ASCII case-insensitive match of `approved` or `rejected` maps to a
    /// decision; anything else, including padded or empty input, reads as pending.
    pub fn canonicalize(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("approved") {
            Self::Approved
        } else if raw.eq_ignore_ascii_case("rejected") {
            Self::Rejected
        } else {
            Self::Pending
        }
    }

    pub fn is_decided(self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two approvers every BOA request needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApproverRole {
    #[serde(rename = "hod")]
    Hod,
    #[serde(rename = "classInCharge")]
    ClassInCharge,
}

impl ApproverRole {
    pub const ALL: [Self; 2] = [Self::Hod, Self::ClassInCharge];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hod => "hod",
            Self::ClassInCharge => "classInCharge",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Hod => "HOD",
            Self::ClassInCharge => "Class In-Charge",
        }
    }
}

impl std::str::FromStr for ApproverRole {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace(['-', '_', ' '], "");
        match normalized.as_str() {
            "hod" => Ok(Self::Hod),
            "classincharge" => Ok(Self::ClassInCharge),
            _ => Err(DomainError::UnknownApproverRole(value.to_string())),
        }
    }
}

impl std::fmt::Display for ApproverRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One approver's sub-state on a request.
///
/// The approver name, decision time and remarks are stamped together when the
/// role decides, but the backend may omit any of them individually.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalStage {
    pub status: ApprovalStatus,
    pub approved_by: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
    pub remarks: Option<String>,
}

impl ApprovalStage {
    pub fn pending() -> Self {
        Self::default()
    }

    /// Approver identity fields are only meaningful once the role has decided.
    pub fn decision_visible(&self) -> bool {
        self.status.is_decided()
    }

    pub fn visible_approver(&self) -> Option<&str> {
        self.approved_by.as_deref().filter(|_| self.decision_visible())
    }

    pub fn visible_decided_at(&self) -> Option<DateTime<Utc>> {
        self.decided_at.filter(|_| self.decision_visible())
    }

    pub fn visible_remarks(&self) -> Option<&str> {
        self.remarks.as_deref().filter(|_| self.decision_visible())
    }
}
