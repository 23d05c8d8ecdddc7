//! Inbound call-event webhook: normalize and forward to the CRM.

use axum::http::StatusCode;
use callrelay_core::{CallEventOutcome, CrmGateway};
use serde_json::{json, Value};

pub const NOT_CONFIGURED_NOTE: &str = "CRM not configured";

/// Decode a webhook body.
///
/// Only a JSON content type (`application/json` or any `+json` type) is
/// parsed. A missing or different content type, or an empty body, yields an
/// empty event, which the normalizer turns into an all-defaults contact.
pub fn parse_call_event(content_type: Option<&str>, body: &[u8]) -> Result<Value, serde_json::Error> {
    let is_json = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false);

    if !is_json || body.iter().all(u8::is_ascii_whitespace) {
        return Ok(json!({}));
    }
    serde_json::from_slice(body)
}

/// 400 for a body that claims to be JSON but is not.
pub fn reject_body(error: &serde_json::Error) -> (StatusCode, Value) {
    tracing::warn!(error = %error, "Rejected malformed webhook body");
    (
        StatusCode::BAD_REQUEST,
        json!({ "status": "error", "message": format!("invalid JSON body: {}", error) }),
    )
}

/// Relay one call event and describe the result as `(status, body)`.
///
/// - CRM unconfigured: 200 `{"status": "logged", "note": ...}`
/// - forwarded: 200 `{"status": "ok", "contactId": ...}` (`contactId` omitted if the CRM gave none)
/// - any failure: 500 `{"status": "error", "message": ...}`
pub async fn relay_call_event(crm: &CrmGateway, payload: Value) -> (StatusCode, Value) {
    match crm.forward_call_event(&payload).await {
        Ok(CallEventOutcome::Logged) => (
            StatusCode::OK,
            json!({ "status": "logged", "note": NOT_CONFIGURED_NOTE }),
        ),
        Ok(CallEventOutcome::Forwarded { contact_id }) => {
            let mut body = json!({ "status": "ok" });
            if let Some(id) = contact_id {
                body["contactId"] = Value::String(id);
            }
            (StatusCode::OK, body)
        }
        Err(e) => {
            tracing::error!(error = %e, "Webhook error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "status": "error", "message": e.to_string() }),
            )
        }
    }
}
