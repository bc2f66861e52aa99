//! In-memory doubles for the repository traits, used by unit tests.

use crate::domain::usage::{ResetScope, UsageIdentity, UsageTier};
use crate::domain::user::{SubscriptionPlan, SubscriptionStatus, User};
use crate::error::{AppError, AppResult};
use crate::infrastructure::repositories::{UsageStore, UserLookup};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryUsageStore {
    rows: Mutex<HashMap<(UsageIdentity, NaiveDate), (i32, UsageTier)>>,
    failure: Mutex<Option<String>>,
}

impl InMemoryUsageStore {
    /// Make every subsequent call fail with the given message
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock() = Some(message.to_string());
    }

    pub fn seed(&self, identity: UsageIdentity, date: NaiveDate, count: i32) {
        self.rows
            .lock()
            .insert((identity, date), (count, UsageTier::Guest));
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.lock().keys().map(|(_, date)| *date).collect()
    }

    /// Tier stored on today's row for the identity
    pub fn tier_of(&self, identity: &UsageIdentity) -> Option<UsageTier> {
        let today = Utc::now().date_naive();
        self.rows
            .lock()
            .get(&(identity.clone(), today))
            .map(|(_, tier)| *tier)
    }

    fn check(&self) -> AppResult<()> {
        match self.failure.lock().as_ref() {
            Some(message) => Err(AppError::Internal(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl UsageStore for InMemoryUsageStore {
    async fn count_for(&self, identity: &UsageIdentity, date: NaiveDate) -> AppResult<i32> {
        self.check()?;
        Ok(self
            .rows
            .lock()
            .get(&(identity.clone(), date))
            .map(|(count, _)| *count)
            .unwrap_or(0))
    }

    async fn increment_within_limit(
        &self,
        identity: &UsageIdentity,
        date: NaiveDate,
        tier: UsageTier,
        limit: i32,
    ) -> AppResult<Option<i32>> {
        self.check()?;
        let mut rows = self.rows.lock();
        let entry = rows.entry((identity.clone(), date)).or_insert((0, tier));
        if entry.0 >= limit {
            return Ok(None);
        }
        entry.0 += 1;
        entry.1 = tier;
        Ok(Some(entry.0))
    }

    async fn delete_before(&self, cutoff: NaiveDate) -> AppResult<u64> {
        self.check()?;
        let mut rows = self.rows.lock();
        let before = rows.len();
        rows.retain(|(_, date), _| *date >= cutoff);
        Ok((before - rows.len()) as u64)
    }

    async fn delete_matching(&self, scope: &ResetScope) -> AppResult<u64> {
        self.check()?;
        let mut rows = self.rows.lock();
        let before = rows.len();
        match scope {
            ResetScope::All => rows.clear(),
            ResetScope::Identity(target) => rows.retain(|(identity, _), _| identity != target),
        }
        Ok((before - rows.len()) as u64)
    }
}

#[derive(Default)]
pub struct StaticUserLookup {
    users: Mutex<HashMap<Uuid, User>>,
}

impl StaticUserLookup {
    pub fn add(&self, plan: SubscriptionPlan, status: SubscriptionStatus) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        self.users.lock().insert(
            id,
            User {
                id,
                email: format!("{}@example.com", id.simple()),
                subscription_plan: plan,
                subscription_status: status,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    pub fn set_plan(&self, user_id: Uuid, plan: SubscriptionPlan, status: SubscriptionStatus) {
        if let Some(user) = self.users.lock().get_mut(&user_id) {
            user.subscription_plan = plan;
            user.subscription_status = status;
        }
    }
}

#[async_trait]
impl UserLookup for StaticUserLookup {
    async fn find_by_id(&self, user_id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.lock().get(&user_id).cloned())
    }
}
