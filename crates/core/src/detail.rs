//! View models for the request list and the on-demand detail view.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::approvals::StatusBadge;
use crate::domain::approval::{ApprovalStage, ApproverRole};
use crate::domain::boa_request::BoaRequest;

/// Resolves event-photo references against the backend's media base.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaResolver {
    base_url: String,
}

impl MediaResolver {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self { base_url: base_url.trim_end_matches('/').to_string() }
    }

    pub fn resolve(&self, reference: &str) -> String {
        let reference = reference.trim();
        if reference.starts_with("http://") || reference.starts_with("https://") {
            return reference.to_string();
        }
        if self.base_url.is_empty() {
            return reference.to_string();
        }
        format!("{}/{}", self.base_url, reference.trim_start_matches('/'))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BadgeView {
    pub category: StatusBadge,
    pub label: &'static str,
    pub css_class: &'static str,
}

impl From<StatusBadge> for BadgeView {
    fn from(category: StatusBadge) -> Self {
        Self { category, label: category.label(), css_class: category.css_class() }
    }
}

/// Compact list row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RequestSummary {
    pub id: String,
    pub event_name: String,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub status: BadgeView,
}

impl From<&BoaRequest> for RequestSummary {
    fn from(request: &BoaRequest) -> Self {
        Self {
            id: request.id.0.clone(),
            event_name: request.event.name.clone(),
            date_from: request.event.date_from,
            date_to: request.event.date_to,
            status: StatusBadge::from(request.overall_status()).into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ApproverPanel {
    pub role: ApproverRole,
    pub role_label: &'static str,
    pub status: BadgeView,
    pub approver_name: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
    pub remarks: Option<String>,
}

impl ApproverPanel {
    fn new(role: ApproverRole, stage: &ApprovalStage) -> Self {
        Self {
            role,
            role_label: role.label(),
            status: StatusBadge::from(stage.status).into(),
            approver_name: stage.visible_approver().map(str::to_string),
            decided_at: stage.visible_decided_at(),
            remarks: stage.visible_remarks().map(str::to_string),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EventBlock {
    pub name: String,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub organizing_dept: String,
    pub teacher_in_charge: String,
    pub theory_lectures: u32,
    pub practical_lectures: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AcademicBlock {
    pub branch: String,
    pub semester: String,
    pub section: String,
    pub class_in_charge: String,
}

/// Everything the detail view shows for one request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BoaRequestDetail {
    pub id: String,
    pub overall: BadgeView,
    pub event: EventBlock,
    pub academic: AcademicBlock,
    pub approvers: Vec<ApproverPanel>,
    /// Resolved photo URLs in display order; empty means the section is omitted.
    pub photos: Vec<String>,
    pub submission_date: Option<NaiveDate>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl BoaRequestDetail {
    pub fn from_request(request: &BoaRequest, media: &MediaResolver) -> Self {
        Self {
            id: request.id.0.clone(),
            overall: StatusBadge::from(request.overall_status()).into(),
            event: EventBlock {
                name: request.event.name.clone(),
                date_from: request.event.date_from,
                date_to: request.event.date_to,
                organizing_dept: request.event.organizing_dept.clone(),
                teacher_in_charge: request.event.teacher_in_charge.clone(),
                theory_lectures: request.event.theory_lectures,
                practical_lectures: request.event.practical_lectures,
            },
            academic: AcademicBlock {
                branch: request.academic.branch.clone(),
                semester: request.academic.semester.clone(),
                section: request.academic.section.clone(),
                class_in_charge: request.academic.class_in_charge.clone(),
            },
            approvers: ApproverRole::ALL
                .into_iter()
                .map(|role| ApproverPanel::new(role, request.stage(role)))
                .collect(),
            photos: request.event_photos.iter().map(|reference| media.resolve(reference)).collect(),
            submission_date: request.submission_date,
            submitted_at: request.submitted_at,
        }
    }

    pub fn approver(&self, role: ApproverRole) -> Option<&ApproverPanel> {
        self.approvers.iter().find(|panel| panel.role == role)
    }

    /// Plain-text rendering; absent fields produce no line at all.
    pub fn render_text(&self) -> String {
        let mut lines = vec![
            format!("BOA request {} [{}]", self.id, self.overall.label),
            String::new(),
            "Event".to_string(),
            format!("  name: {}", self.event.name),
        ];

        match (self.event.date_from, self.event.date_to) {
            (Some(from), Some(to)) => lines.push(format!("  dates: {from} to {to}")),
            (Some(date), None) | (None, Some(date)) => lines.push(format!("  date: {date}")),
            (None, None) => {}
        }
        push_text(&mut lines, "organizing department", &self.event.organizing_dept);
        push_text(&mut lines, "teacher in charge", &self.event.teacher_in_charge);
        lines.push(format!(
            "  lectures: {} theory, {} practical",
            self.event.theory_lectures, self.event.practical_lectures
        ));

        lines.push(String::new());
        lines.push("Class".to_string());
        push_text(&mut lines, "branch", &self.academic.branch);
        push_text(&mut lines, "semester", &self.academic.semester);
        push_text(&mut lines, "section", &self.academic.section);
        push_text(&mut lines, "class in-charge", &self.academic.class_in_charge);

        for panel in &self.approvers {
            lines.push(String::new());
            lines.push(format!("{} approval [{}]", panel.role_label, panel.status.label));
            if let Some(name) = &panel.approver_name {
                lines.push(format!("  by: {name}"));
            }
            if let Some(decided_at) = panel.decided_at {
                lines.push(format!("  on: {}", decided_at.format("%Y-%m-%d %H:%M UTC")));
            }
            if let Some(remarks) = &panel.remarks {
                lines.push(format!("  remarks: {remarks}"));
            }
        }

        if !self.photos.is_empty() {
            lines.push(String::new());
            lines.push(format!("Event photos ({})", self.photos.len()));
            lines.extend(self.photos.iter().map(|photo| format!("  {photo}")));
        }

        if let Some(date) = self.submission_date {
            lines.push(String::new());
            lines.push(format!("Submitted {date}"));
        }

        lines.join("\n")
    }
}

fn push_text(lines: &mut Vec<String>, label: &str, value: &str) {
    if !value.is_empty() {
        lines.push(format!("  {label}: {value}"));
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{BoaRequestDetail, MediaResolver, RequestSummary};
    use crate::approvals::StatusBadge;
    use crate::domain::approval::{ApprovalStatus, ApproverRole};
    use crate::domain::boa_request::BoaRequest;

    fn media() -> MediaResolver {
        MediaResolver::new("https://portal.example.edu/uploads/")
    }

    #[test]
    fn media_resolver_joins_relative_and_keeps_absolute() {
        let media = media();
        assert_eq!(media.resolve("a.jpg"), "https://portal.example.edu/uploads/a.jpg");
        assert_eq!(media.resolve("/boa/b.jpg"), "https://portal.example.edu/uploads/boa/b.jpg");
        assert_eq!(media.resolve("https://cdn.example.com/c.jpg"), "https://cdn.example.com/c.jpg");
        assert_eq!(MediaResolver::new("").resolve("a.jpg"), "a.jpg");
    }

    #[test]
    fn both_pending_shows_no_approver_fields() {
        let mut request = BoaRequest::new("BOA-1", "Workshop");
        request.hod.approved_by = Some("ghost".to_string());

        let detail = BoaRequestDetail::from_request(&request, &media());

        for panel in &detail.approvers {
            assert_eq!(panel.status.category, StatusBadge::Pending);
            assert!(panel.approver_name.is_none());
            assert!(panel.decided_at.is_none());
            assert!(panel.remarks.is_none());
        }
        let text = detail.render_text();
        assert!(!text.contains("by:"));
        assert!(!text.contains("on:"));
        assert!(!text.contains("remarks:"));
        assert!(!text.contains("ghost"));
    }

    #[test]
    fn decided_role_shows_only_present_fields() {
        let mut request = BoaRequest::new("BOA-1", "Workshop");
        request.hod.status = ApprovalStatus::Approved;
        request.hod.approved_by = Some("Dr. X".to_string());
        request.hod.decided_at = Utc.with_ymd_and_hms(2025, 1, 10, 10, 0, 0).single();

        let detail = BoaRequestDetail::from_request(&request, &media());

        let hod = detail.approver(ApproverRole::Hod).expect("hod panel");
        assert_eq!(hod.status.category, StatusBadge::Approved);
        assert_eq!(hod.approver_name.as_deref(), Some("Dr. X"));
        assert!(hod.decided_at.is_some());
        assert!(hod.remarks.is_none());

        let class_in_charge = detail.approver(ApproverRole::ClassInCharge).expect("cic panel");
        assert_eq!(class_in_charge.status.category, StatusBadge::Pending);
        assert!(class_in_charge.approver_name.is_none());
        assert!(class_in_charge.decided_at.is_none());
        assert!(class_in_charge.remarks.is_none());

        let text = detail.render_text();
        assert!(text.contains("  by: Dr. X"));
        assert!(text.contains("  on: 2025-01-10 10:00 UTC"));
        assert!(!text.contains("remarks:"));
        assert_eq!(detail.overall.category, StatusBadge::Pending);
    }

    #[test]
    fn photo_section_follows_photo_list() {
        let mut request = BoaRequest::new("BOA-1", "Workshop");
        let detail = BoaRequestDetail::from_request(&request, &media());
        assert!(detail.photos.is_empty());
        assert!(!detail.render_text().contains("Event photos"));

        request.event_photos = vec!["a.jpg".to_string(), "b.jpg".to_string()];
        let detail = BoaRequestDetail::from_request(&request, &media());
        assert_eq!(
            detail.photos,
            vec![
                "https://portal.example.edu/uploads/a.jpg".to_string(),
                "https://portal.example.edu/uploads/b.jpg".to_string(),
            ]
        );
        assert!(detail.render_text().contains("Event photos (2)"));
    }

    #[test]
    fn summary_uses_locally_derived_status() {
        let mut request = BoaRequest::new("BOA-3", "Expo");
        request.hod.status = ApprovalStatus::Approved;
        request.class_in_charge.status = ApprovalStatus::Rejected;
        request.reported_status = ApprovalStatus::Approved;

        let summary = RequestSummary::from(&request);
        assert_eq!(summary.status.category, StatusBadge::Rejected);
        assert_eq!(summary.status.css_class, "badge-rejected");
    }
}
