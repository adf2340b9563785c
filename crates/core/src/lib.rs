pub mod approvals;
pub mod board;
pub mod config;
pub mod detail;
pub mod domain;
pub mod errors;
pub mod settings;
pub mod wire;

pub use approvals::{
    derive_overall_status, derive_status_badge, ApprovalDecision, Decision, StatusBadge,
};
pub use board::{
    BoardError, InMemoryRequestSource, LoadOutcome, Notice, NoticeLevel, RequestBoard,
    RequestSource,
};
pub use detail::{ApproverPanel, BoaRequestDetail, MediaResolver, RequestSummary};
pub use domain::approval::{ApprovalStage, ApprovalStatus, ApproverRole};
pub use domain::boa_request::{
    AcademicContext, BoaRequest, BoaRequestId, EventDetails, RequesterId,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use settings::{
    CookieConsent, InMemorySettingsStore, Preferences, SettingKey, SettingsError, SettingsStore,
    Theme,
};
pub use wire::{parse_listing_body, ListingError, ListingResponse};
