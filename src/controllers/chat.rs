use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use std::sync::Arc;

use crate::{
    domain::chat::{Caller, ChatRequest, ChatServiceApi},
    error::AppResult,
    infrastructure::auth::{AuthUser, ClientIp},
};

pub struct ChatController {
    chat_service: Arc<dyn ChatServiceApi>,
}

impl ChatController {
    pub fn new(chat_service: Arc<dyn ChatServiceApi>) -> Self {
        Self { chat_service }
    }

    /// POST /api/chat - Stream a completion followed by the usage update frame
    pub async fn stream_chat(
        State(controller): State<Arc<ChatController>>,
        auth_user: Option<Extension<AuthUser>>,
        ClientIp(ip_address): ClientIp,
        Json(request): Json<ChatRequest>,
    ) -> AppResult<Response> {
        let caller = Caller {
            user_id: auth_user.map(|Extension(user)| user.user_id),
            ip_address,
        };

        let stream = controller.chat_service.stream_chat(caller, request).await?;

        let mut response = (StatusCode::OK, Body::from_stream(stream)).into_response();
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert("x-accel-buffering", HeaderValue::from_static("no"));

        Ok(response)
    }
}
