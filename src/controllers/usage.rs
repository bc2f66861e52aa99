use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::usage::{ResetScope, UsageIdentity, UsageServiceApi, UsageSnapshot},
    error::{AppError, AppResult},
    infrastructure::{
        auth::{AuthUser, ClientIp},
        config::Config,
    },
};

/// Query for GET /api/usage
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageQuery {
    pub user_id: Option<String>,
}

/// Query for POST /api/usage/reset
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetQuery {
    pub user_id: Option<String>,
    pub ip: Option<String>,
    pub all: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetResponse {
    pub success: bool,
    pub deleted: u64,
}

pub struct UsageController {
    usage_service: Arc<dyn UsageServiceApi>,
    config: Arc<Config>,
}

impl UsageController {
    pub fn new(usage_service: Arc<dyn UsageServiceApi>, config: Arc<Config>) -> Self {
        Self {
            usage_service,
            config,
        }
    }

    /// GET /api/usage - Today's usage snapshot for the caller
    pub async fn get_usage(
        State(controller): State<Arc<UsageController>>,
        auth_user: Option<Extension<AuthUser>>,
        ClientIp(ip_address): ClientIp,
        Query(query): Query<UsageQuery>,
    ) -> AppResult<Json<UsageSnapshot>> {
        let user_id = match parse_user_id(query.user_id.as_deref())? {
            Some(user_id) => Some(user_id),
            None => auth_user.map(|Extension(user)| user.user_id),
        };

        let snapshot = controller
            .usage_service
            .get_usage_snapshot(user_id, Some(ip_address.as_str()))
            .await?;

        Ok(Json(snapshot))
    }

    /// POST /api/usage/reset - Delete usage records (development only)
    pub async fn reset_usage(
        State(controller): State<Arc<UsageController>>,
        Query(query): Query<ResetQuery>,
    ) -> AppResult<Json<ResetResponse>> {
        if !controller.config.is_development() {
            return Err(AppError::Forbidden(
                "Usage reset is only available in development".to_string(),
            ));
        }

        let scope = reset_scope(&query)?;
        let deleted = controller.usage_service.reset_usage(scope).await?;

        Ok(Json(ResetResponse {
            success: true,
            deleted,
        }))
    }
}

fn parse_user_id(raw: Option<&str>) -> AppResult<Option<Uuid>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Uuid::parse_str(raw)
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("Invalid userId: {}", raw))),
        None => Ok(None),
    }
}

fn reset_scope(query: &ResetQuery) -> AppResult<ResetScope> {
    if query.all == Some(true) {
        return Ok(ResetScope::All);
    }

    if let Some(user_id) = parse_user_id(query.user_id.as_deref())? {
        return Ok(ResetScope::Identity(UsageIdentity::User(user_id)));
    }

    match query.ip.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(ip) => Ok(ResetScope::Identity(UsageIdentity::Ip(ip.to_string()))),
        None => Err(AppError::BadRequest(
            "Specify userId, ip or all=true".to_string(),
        )),
    }
}
