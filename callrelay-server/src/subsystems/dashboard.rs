//! Read-through endpoints feeding the dashboard UI.

use axum::http::StatusCode;
use callrelay_core::{AggregatedItems, BoardAggregator, CrmGateway};
use serde_json::{json, Value};

pub const CRM_NOT_CONFIGURED: &str = "CRM not configured";
pub const BOARDS_NOT_CONFIGURED: &str = "Board API not configured";

/// `{"contacts": [...]}` from the CRM; 502 `{"error": ...}` if the call fails.
pub async fn contacts_view(crm: &CrmGateway) -> (StatusCode, Value) {
    match crm.list_contacts().await {
        Ok(Some(contacts)) => (StatusCode::OK, json!({ "contacts": contacts })),
        Ok(None) => (
            StatusCode::OK,
            json!({ "contacts": [], "note": CRM_NOT_CONFIGURED }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "CRM contact list failed");
            (StatusCode::BAD_GATEWAY, json!({ "error": e.to_string() }))
        }
    }
}

/// Merged items from all configured boards, nested like the board API reply.
pub async fn boards_view(boards: &BoardAggregator) -> (StatusCode, Value) {
    if !boards.is_configured() {
        return (
            StatusCode::OK,
            json!({
                "data": { "boards": [{ "items_page": { "items": [] } }] },
                "_note": BOARDS_NOT_CONFIGURED,
            }),
        );
    }

    let merged: AggregatedItems = boards.aggregate().await;
    tracing::info!(count = merged.count(), "Board items aggregated");

    match serde_json::to_value(&merged) {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize board items");
            (StatusCode::BAD_GATEWAY, json!({ "error": e.to_string() }))
        }
    }
}
