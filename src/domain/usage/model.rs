use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// IP key used when a request carries neither a user id nor a resolvable address
pub const UNKNOWN_IP: &str = "unknown";

/// Tier assigned to a user id that has no matching account
pub const UNKNOWN_USER_TIER: UsageTier = UsageTier::Free;

/// Records older than this many days are removed by the retention sweep
pub const RETENTION_DAYS: i64 = 7;

/// Service level that decides the daily request cap
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "text")]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UsageTier {
    Guest,
    Free,
    Premium,
}

impl std::fmt::Display for UsageTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UsageTier::Guest => write!(f, "guest"),
            UsageTier::Free => write!(f, "free"),
            UsageTier::Premium => write!(f, "premium"),
        }
    }
}

/// Daily request caps per tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyLimits {
    pub guest: i32,
    pub free: i32,
    pub premium: i32,
}

impl Default for DailyLimits {
    fn default() -> Self {
        Self {
            guest: 10,
            free: 20,
            premium: 50,
        }
    }
}

impl DailyLimits {
    pub fn for_tier(&self, tier: UsageTier) -> i32 {
        match tier {
            UsageTier::Guest => self.guest,
            UsageTier::Free => self.free,
            UsageTier::Premium => self.premium,
        }
    }
}

/// Key a usage record is stored under. A user id always wins over the caller address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UsageIdentity {
    User(Uuid),
    Ip(String),
}

impl UsageIdentity {
    pub fn resolve(user_id: Option<Uuid>, ip_address: Option<&str>) -> Self {
        match user_id {
            Some(id) => UsageIdentity::User(id),
            None => {
                let ip = ip_address
                    .map(str::trim)
                    .filter(|ip| !ip.is_empty())
                    .unwrap_or(UNKNOWN_IP);
                UsageIdentity::Ip(ip.to_string())
            }
        }
    }
}

impl std::fmt::Display for UsageIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UsageIdentity::User(id) => write!(f, "user:{}", id),
            UsageIdentity::Ip(ip) => write!(f, "ip:{}", ip),
        }
    }
}

/// Computed view of one identity's quota for today
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSnapshot {
    pub used: i32,
    pub limit: i32,
    pub remaining: i32,
    pub user_type: UsageTier,
    pub can_use: bool,
    pub resets_at: DateTime<Utc>,
}

impl UsageSnapshot {
    pub fn new(used: i32, limit: i32, tier: UsageTier, today: NaiveDate) -> Self {
        Self {
            used,
            limit,
            remaining: (limit - used).max(0),
            user_type: tier,
            can_use: used < limit,
            resets_at: next_reset(today),
        }
    }
}

/// Rows removed by the development reset endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetScope {
    All,
    Identity(UsageIdentity),
}

/// Start of the next UTC day
pub fn next_reset(today: NaiveDate) -> DateTime<Utc> {
    (today + Duration::days(1))
        .and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc()
}

/// First date that survives the retention sweep
pub fn retention_cutoff(today: NaiveDate) -> NaiveDate {
    today - Duration::days(RETENTION_DAYS)
}
