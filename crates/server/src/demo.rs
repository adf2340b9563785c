//! Seeded request set served when `server.demo_mode` is on.

use chrono::{NaiveDate, TimeZone, Utc};

use boa_core::{
    ApprovalDecision, ApproverRole, BoaRequest, BoaRequestId, Decision, DomainError,
    InMemoryRequestSource, RequesterId,
};

pub const DEMO_ROLL_NO: &str = "DEMO001";

pub async fn seeded_source() -> Result<InMemoryRequestSource, DomainError> {
    let source = InMemoryRequestSource::default();
    let requester = RequesterId(DEMO_ROLL_NO.to_string());

    for request in [
        request("BOA-101", "Smart India Hackathon", (2024, 9, 12), (2024, 9, 13), &["sih/team.jpg", "sih/stage.jpg"]),
        request("BOA-102", "Inter-college Paper Presentation", (2024, 10, 4), (2024, 10, 4), &[]),
        request("BOA-103", "Cultural Fest Volunteering", (2024, 11, 20), (2024, 11, 22), &[]),
    ] {
        source.insert(requester.clone(), request).await;
    }

    let day = |d: u32, h: u32| Utc.with_ymd_and_hms(2024, 9, d, h, 0, 0).single().unwrap_or_else(Utc::now);
    for (id, role, decision, approver, remarks, at) in [
        ("BOA-101", ApproverRole::ClassInCharge, Decision::Approved, "Prof. R. Iyer", None, day(5, 10)),
        ("BOA-101", ApproverRole::Hod, Decision::Approved, "Dr. S. Menon", Some("Best of luck"), day(6, 15)),
        ("BOA-102", ApproverRole::ClassInCharge, Decision::Approved, "Prof. R. Iyer", None, day(20, 9)),
        ("BOA-102", ApproverRole::Hod, Decision::Rejected, "Dr. S. Menon", Some("Clashes with internal assessment"), day(21, 11)),
    ] {
        let decision = ApprovalDecision {
            request_id: BoaRequestId(id.to_string()),
            role,
            decision,
            approver: approver.to_string(),
            remarks: remarks.map(str::to_string),
        };
        source.record_decision(&decision, at).await?;
    }

    Ok(source)
}

fn request(
    id: &str,
    name: &str,
    from: (i32, u32, u32),
    to: (i32, u32, u32),
    photos: &[&str],
) -> BoaRequest {
    let mut request = BoaRequest::new(id, name);
    request.event.date_from = NaiveDate::from_ymd_opt(from.0, from.1, from.2);
    request.event.date_to = NaiveDate::from_ymd_opt(to.0, to.1, to.2);
    request.event.organizing_dept = "Computer Science".to_string();
    request.event.teacher_in_charge = "Prof. A. Rao".to_string();
    request.event.theory_lectures = 2;
    request.event.practical_lectures = 1;
    request.academic.branch = "CSE".to_string();
    request.academic.semester = "5".to_string();
    request.academic.section = "A".to_string();
    request.academic.class_in_charge = "Prof. R. Iyer".to_string();
    request.event_photos = photos.iter().map(|photo| photo.to_string()).collect();
    request.submission_date = NaiveDate::from_ymd_opt(2024, 9, 1);
    request
}

#[cfg(test)]
mod tests {
    use boa_core::{ApprovalStatus, RequestSource, RequesterId};

    use super::{seeded_source, DEMO_ROLL_NO};

    #[tokio::test]
    async fn seeded_source_covers_every_overall_status() {
        let source = seeded_source().await.expect("seed");
        let requests =
            source.fetch_requests(&RequesterId(DEMO_ROLL_NO.to_string())).await.expect("fetch");

        let statuses: Vec<ApprovalStatus> =
            requests.iter().map(|request| request.overall_status()).collect();
        assert_eq!(
            statuses,
            vec![ApprovalStatus::Approved, ApprovalStatus::Rejected, ApprovalStatus::Pending]
        );
        assert!(requests.iter().all(|request| request.status_mismatch().is_none()));
    }
}
