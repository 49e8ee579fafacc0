//! Wire types shared by the admin client and the CLI.
//!
//! Everything here is plain serde data: no I/O, no HTTP. Unknown fields are
//! ignored and optional fields default so that backend additions never break
//! deserialization.

pub mod auth;
pub mod page;
pub mod records;
pub mod stats;

pub use auth::{AuthUser, LoginRequest, RefreshRequest, TokenPair};
pub use page::Page;
pub use records::{
    Badge, ContentType, Dispute, Job, JobStatus, KycDecision, KycSubmission, ModeratedContent,
    ModerationAction, NewBadge, Payment, PaymentReport, Review, User, UserRole,
};
pub use stats::{DashboardStats, PlatformMetrics};
