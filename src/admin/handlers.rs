use axum::{extract::State, Json};
use serde::Serialize;

use crate::admin::AdminState;

#[derive(Debug, Serialize)]
pub struct OriginalSummary {
    pub method: String,
    pub uri: String,
}

#[derive(Debug, Serialize)]
pub struct TeleportStatus {
    pub version: &'static str,
    pub station: Option<String>,
    pub knock_url: Option<String>,
    pub knock_count: Option<u32>,
    pub bound: bool,
    pub server: Option<String>,
    pub route_group: Vec<String>,
    pub original: Option<OriginalSummary>,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<TeleportStatus> {
    let binding = state.handoff.as_ref().and_then(|h| h.binding());

    Json(TeleportStatus {
        version: env!("CARGO_PKG_VERSION"),
        station: state.station.as_ref().map(|s| s.station.clone()),
        knock_url: state
            .station
            .as_ref()
            .and_then(|s| s.knock_url().map(str::to_string)),
        knock_count: state
            .station
            .as_ref()
            .and_then(|s| s.knock.as_ref().map(|k| k.count)),
        bound: binding.is_some(),
        server: binding.map(|b| b.ambient.server.name().to_string()),
        route_group: binding
            .map(|b| b.ambient.route_group.iter().map(str::to_string).collect())
            .unwrap_or_default(),
        original: binding.map(|b| OriginalSummary {
            method: b.ambient.original.method.to_string(),
            uri: b.ambient.original.uri.to_string(),
        }),
    })
}
