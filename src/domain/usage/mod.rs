pub mod error;
pub mod model;
pub mod service;

pub use error::UsageServiceError;
pub use model::{
    next_reset, retention_cutoff, DailyLimits, ResetScope, UsageIdentity, UsageSnapshot,
    UsageTier, RETENTION_DAYS, UNKNOWN_IP, UNKNOWN_USER_TIER,
};
pub use service::{UsageService, UsageServiceApi};
