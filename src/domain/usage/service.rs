use super::error::UsageServiceError;
use super::model::{
    retention_cutoff, DailyLimits, ResetScope, UsageIdentity, UsageSnapshot, UsageTier,
    UNKNOWN_USER_TIER,
};
use crate::infrastructure::repositories::{UsageStore, UserLookup};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use uuid::Uuid;

pub struct UsageService {
    usage_store: Arc<dyn UsageStore>,
    user_lookup: Arc<dyn UserLookup>,
    limits: DailyLimits,
}

impl UsageService {
    pub fn new(
        usage_store: Arc<dyn UsageStore>,
        user_lookup: Arc<dyn UserLookup>,
        limits: DailyLimits,
    ) -> Self {
        Self {
            usage_store,
            user_lookup,
            limits,
        }
    }
}

#[async_trait]
pub trait UsageServiceApi: Send + Sync {
    /// Effective tier for an optional user id.
    ///
    /// No id is a guest. An id without an account falls back to `UNKNOWN_USER_TIER`.
    async fn resolve_tier(&self, user_id: Option<Uuid>) -> Result<UsageTier, UsageServiceError>;

    /// Today's quota view for the caller. Missing records read as zero usage.
    async fn get_usage_snapshot(
        &self,
        user_id: Option<Uuid>,
        ip_address: Option<&str>,
    ) -> Result<UsageSnapshot, UsageServiceError>;

    /// Consume one request if the caller is under today's limit.
    ///
    /// Returns `false` without writing when the quota is exhausted.
    async fn record_usage(
        &self,
        user_id: Option<Uuid>,
        ip_address: Option<&str>,
    ) -> Result<bool, UsageServiceError>;

    /// Remove records older than the retention window, returning how many were deleted
    async fn purge_stale_records(&self) -> Result<u64, UsageServiceError>;

    /// Remove all records or one identity's records
    async fn reset_usage(&self, scope: ResetScope) -> Result<u64, UsageServiceError>;
}

#[async_trait]
impl UsageServiceApi for UsageService {
    async fn resolve_tier(&self, user_id: Option<Uuid>) -> Result<UsageTier, UsageServiceError> {
        let Some(user_id) = user_id else {
            return Ok(UsageTier::Guest);
        };

        let user = self
            .user_lookup
            .find_by_id(user_id)
            .await?;

        let tier = match user {
            Some(user) if user.has_active_premium() => UsageTier::Premium,
            Some(_) => UsageTier::Free,
            None => {
                tracing::debug!(user_id = %user_id, "Unknown user id, using default tier");
                UNKNOWN_USER_TIER
            }
        };

        Ok(tier)
    }

    async fn get_usage_snapshot(
        &self,
        user_id: Option<Uuid>,
        ip_address: Option<&str>,
    ) -> Result<UsageSnapshot, UsageServiceError> {
        let identity = UsageIdentity::resolve(user_id, ip_address);
        let tier = self.resolve_tier(user_id).await?;
        let today = today();

        let used = self
            .usage_store
            .count_for(&identity, today)
            .await?;

        Ok(UsageSnapshot::new(used, self.limits.for_tier(tier), tier, today))
    }

    async fn record_usage(
        &self,
        user_id: Option<Uuid>,
        ip_address: Option<&str>,
    ) -> Result<bool, UsageServiceError> {
        let identity = UsageIdentity::resolve(user_id, ip_address);
        let tier = self.resolve_tier(user_id).await?;
        let limit = self.limits.for_tier(tier);

        if limit <= 0 {
            return Ok(false);
        }

        let new_count = self
            .usage_store
            .increment_within_limit(&identity, today(), tier, limit)
            .await?;

        match new_count {
            Some(count) => {
                tracing::debug!(
                    identity = %identity,
                    tier = %tier,
                    used = count,
                    limit = limit,
                    "Usage recorded"
                );
                Ok(true)
            }
            None => {
                tracing::info!(
                    identity = %identity,
                    tier = %tier,
                    limit = limit,
                    "Daily limit reached, usage not recorded"
                );
                Ok(false)
            }
        }
    }

    async fn purge_stale_records(&self) -> Result<u64, UsageServiceError> {
        let cutoff = retention_cutoff(today());

        let deleted = self
            .usage_store
            .delete_before(cutoff)
            .await?;

        tracing::info!(cutoff = %cutoff, deleted = deleted, "Purged stale usage records");

        Ok(deleted)
    }

    async fn reset_usage(&self, scope: ResetScope) -> Result<u64, UsageServiceError> {
        let deleted = self
            .usage_store
            .delete_matching(&scope)
            .await?;

        tracing::warn!(scope = ?scope, deleted = deleted, "Usage records reset");

        Ok(deleted)
    }
}

/// Usage days follow UTC
fn today() -> NaiveDate {
    Utc::now().date_naive()
}
