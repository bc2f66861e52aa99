use crate::domain::usage::{ResetScope, UsageIdentity, UsageTier};
use crate::error::AppResult;
use crate::infrastructure::db::DbPool;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Persistence for daily usage counters.
///
/// Implementations must keep at most one row per identity and date, and
/// `increment_within_limit` must check the limit and write in one step so
/// concurrent callers cannot push a counter past its cap.
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Count recorded for the identity on `date`, zero when no row exists
    async fn count_for(&self, identity: &UsageIdentity, date: NaiveDate) -> AppResult<i32>;

    /// Create the row with a count of one, or add one while the count is below `limit`.
    ///
    /// Returns the new count, or `None` when the quota was already exhausted.
    async fn increment_within_limit(
        &self,
        identity: &UsageIdentity,
        date: NaiveDate,
        tier: UsageTier,
        limit: i32,
    ) -> AppResult<Option<i32>>;

    /// Delete every row dated strictly before `cutoff`
    async fn delete_before(&self, cutoff: NaiveDate) -> AppResult<u64>;

    /// Delete all rows, or every row belonging to one identity
    async fn delete_matching(&self, scope: &ResetScope) -> AppResult<u64>;
}

pub struct UsageRepository {
    pool: Arc<DbPool>,
}

impl UsageRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageStore for UsageRepository {
    async fn count_for(&self, identity: &UsageIdentity, date: NaiveDate) -> AppResult<i32> {
        let pool = self.pool.as_ref();

        let count: Option<(i32,)> = match identity {
            UsageIdentity::User(user_id) => {
                sqlx::query_as(
                    "SELECT usage_count FROM usage_records WHERE user_id = $1 AND usage_date = $2",
                )
                .bind(*user_id)
                .bind(date)
                .fetch_optional(pool)
                .await?
            }
            UsageIdentity::Ip(ip) => {
                sqlx::query_as(
                    "SELECT usage_count FROM usage_records WHERE ip_address = $1 AND usage_date = $2",
                )
                .bind(ip)
                .bind(date)
                .fetch_optional(pool)
                .await?
            }
        };

        Ok(count.map(|(count,)| count).unwrap_or(0))
    }

    async fn increment_within_limit(
        &self,
        identity: &UsageIdentity,
        date: NaiveDate,
        tier: UsageTier,
        limit: i32,
    ) -> AppResult<Option<i32>> {
        let pool = self.pool.as_ref();
        let now = Utc::now();
        let id = Uuid::new_v4();

        // The conflict target names the partial unique index for the identity kind.
        // The WHERE on DO UPDATE runs under the row lock, so the check and the
        // increment cannot interleave with another request.
        let new_count: Option<(i32,)> = match identity {
            UsageIdentity::User(user_id) => {
                sqlx::query_as(
                    r#"
                    INSERT INTO usage_records (id, user_id, usage_date, usage_count, user_type, created_at, updated_at)
                    VALUES ($1, $2, $3, 1, $4, $5, $5)
                    ON CONFLICT (user_id, usage_date) WHERE user_id IS NOT NULL
                    DO UPDATE SET
                        usage_count = usage_records.usage_count + 1,
                        user_type = EXCLUDED.user_type,
                        updated_at = EXCLUDED.updated_at
                    WHERE usage_records.usage_count < $6
                    RETURNING usage_count
                    "#,
                )
                .bind(id)
                .bind(*user_id)
                .bind(date)
                .bind(tier)
                .bind(now)
                .bind(limit)
                .fetch_optional(pool)
                .await?
            }
            UsageIdentity::Ip(ip) => {
                sqlx::query_as(
                    r#"
                    INSERT INTO usage_records (id, ip_address, usage_date, usage_count, user_type, created_at, updated_at)
                    VALUES ($1, $2, $3, 1, $4, $5, $5)
                    ON CONFLICT (ip_address, usage_date) WHERE ip_address IS NOT NULL
                    DO UPDATE SET
                        usage_count = usage_records.usage_count + 1,
                        user_type = EXCLUDED.user_type,
                        updated_at = EXCLUDED.updated_at
                    WHERE usage_records.usage_count < $6
                    RETURNING usage_count
                    "#,
                )
                .bind(id)
                .bind(ip.as_str())
                .bind(date)
                .bind(tier)
                .bind(now)
                .bind(limit)
                .fetch_optional(pool)
                .await?
            }
        };

        Ok(new_count.map(|(count,)| count))
    }

    async fn delete_before(&self, cutoff: NaiveDate) -> AppResult<u64> {
        let pool = self.pool.as_ref();

        let result = sqlx::query("DELETE FROM usage_records WHERE usage_date < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_matching(&self, scope: &ResetScope) -> AppResult<u64> {
        let pool = self.pool.as_ref();

        let result = match scope {
            ResetScope::All => sqlx::query("DELETE FROM usage_records").execute(pool).await?,
            ResetScope::Identity(UsageIdentity::User(user_id)) => {
                sqlx::query("DELETE FROM usage_records WHERE user_id = $1")
                    .bind(*user_id)
                    .execute(pool)
                    .await?
            }
            ResetScope::Identity(UsageIdentity::Ip(ip)) => {
                sqlx::query("DELETE FROM usage_records WHERE ip_address = $1")
                    .bind(ip.as_str())
                    .execute(pool)
                    .await?
            }
        };

        Ok(result.rows_affected())
    }
}
