use axum::extract::State;
use serde::Serialize;

use crate::{
    cache::TierState,
    infra::http::{AppState, envelope::ApiResponse},
};

#[derive(Debug, Serialize)]
pub struct TierReport {
    pub state: TierState,
    pub tier: Option<&'static str>,
}

pub async fn tier(State(state): State<AppState>) -> ApiResponse<TierReport> {
    ApiResponse::success(TierReport {
        state: state.selector.state(),
        tier: state.selector.active_tier(),
    })
}

pub async fn reprobe(State(state): State<AppState>) -> ApiResponse<TierReport> {
    let resolved = state.selector.reprobe().await;
    ApiResponse::success(TierReport {
        state: resolved,
        tier: state.selector.active_tier(),
    })
}
