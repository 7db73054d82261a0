//! Admin status endpoint.
//!
//! `GET /teleport/status` reports the station, knock settings and whether
//! the handoff state is bound (and to what).

pub mod handlers;

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::config::StationConfig;
use crate::handoff::HandoffState;
use self::handlers::get_status;

#[derive(Debug, Clone, Default)]
pub struct AdminState {
    pub station: Option<StationConfig>,
    pub handoff: Option<Arc<HandoffState>>,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/teleport/status", get(get_status))
        .with_state(state)
}
