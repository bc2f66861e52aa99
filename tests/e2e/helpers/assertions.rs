use chatquota_backend::domain::chat::{USAGE_UPDATE_END, USAGE_UPDATE_START};
use serde_json::Value;

pub fn assert_usage_response(usage: &Value, used: i64, limit: i64, user_type: &str) {
    assert_eq!(usage.get("used").and_then(|v| v.as_i64()), Some(used));
    assert_eq!(usage.get("limit").and_then(|v| v.as_i64()), Some(limit));
    assert_eq!(
        usage.get("remaining").and_then(|v| v.as_i64()),
        Some((limit - used).max(0))
    );
    assert_eq!(
        usage.get("userType").and_then(|v| v.as_str()),
        Some(user_type)
    );
    assert_eq!(
        usage.get("canUse").and_then(|v| v.as_bool()),
        Some(used < limit)
    );
    assert!(
        usage.get("resetsAt").and_then(|v| v.as_str()).is_some(),
        "Missing resetsAt field"
    );
}

/// Split a chat response body into the relayed text and the trailing usage frame
pub fn split_usage_frame(body: &str) -> (&str, Option<Value>) {
    match body.find(USAGE_UPDATE_START) {
        Some(start) => {
            let json = body[start + USAGE_UPDATE_START.len()..]
                .strip_suffix(USAGE_UPDATE_END)
                .expect("Usage frame must close the stream");
            let usage = serde_json::from_str(json).expect("Usage frame must carry JSON");
            (&body[..start], Some(usage))
        }
        None => (body, None),
    }
}
