use axum::{extract::State, Json};
use serde::Serialize;

use crate::admin::AdminState;
use crate::auth::RevocationStore;
use crate::config::RouteDefinition;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub routes: usize,
}

#[derive(Debug, Serialize)]
pub struct RevocationSummary {
    /// Entries held, including expired ones the sweeper has not reached yet.
    pub entries: usize,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        routes: state.registry.len(),
    })
}

pub async fn get_routes(State(state): State<AdminState>) -> Json<Vec<RouteDefinition>> {
    Json(state.registry.routes().cloned().collect())
}

pub async fn get_revocations(State(state): State<AdminState>) -> Json<RevocationSummary> {
    Json(RevocationSummary {
        entries: state.store.len(),
    })
}
