use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Registered account. Plan and status are written by billing, so any value may appear.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub subscription_plan: SubscriptionPlan,
    pub subscription_status: SubscriptionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionPlan {
    Free,
    Premium,
    Other(String),
}

impl From<&str> for SubscriptionPlan {
    fn from(value: &str) -> Self {
        match value {
            "free" => SubscriptionPlan::Free,
            "premium" => SubscriptionPlan::Premium,
            other => SubscriptionPlan::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for SubscriptionPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionPlan::Free => write!(f, "free"),
            SubscriptionPlan::Premium => write!(f, "premium"),
            SubscriptionPlan::Other(value) => write!(f, "{}", value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionStatus {
    Active,
    Inactive,
    Cancelled,
    PastDue,
    Other(String),
}

impl From<&str> for SubscriptionStatus {
    fn from(value: &str) -> Self {
        match value {
            "active" => SubscriptionStatus::Active,
            "inactive" => SubscriptionStatus::Inactive,
            "cancelled" => SubscriptionStatus::Cancelled,
            "past_due" => SubscriptionStatus::PastDue,
            other => SubscriptionStatus::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionStatus::Active => write!(f, "active"),
            SubscriptionStatus::Inactive => write!(f, "inactive"),
            SubscriptionStatus::Cancelled => write!(f, "cancelled"),
            SubscriptionStatus::PastDue => write!(f, "past_due"),
            SubscriptionStatus::Other(value) => write!(f, "{}", value),
        }
    }
}

/// Row shape of `users`, with plan and status left as raw text
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub subscription_plan: String,
    pub subscription_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            subscription_plan: SubscriptionPlan::from(row.subscription_plan.as_str()),
            subscription_status: SubscriptionStatus::from(row.subscription_status.as_str()),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl User {
    /// Only an active premium subscription unlocks the premium quota
    pub fn has_active_premium(&self) -> bool {
        self.subscription_plan == SubscriptionPlan::Premium
            && self.subscription_status == SubscriptionStatus::Active
    }
}
