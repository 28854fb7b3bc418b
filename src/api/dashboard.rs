//! Dashboard endpoint

use axum::{extract::State, Json};

use crate::{error::AppResult, models::DashboardStats};

/// Library-wide counters
#[utoipa::path(
    get,
    path = "/dashboard/stats",
    tag = "dashboard",
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardStats)
    )
)]
pub async fn get_stats(State(state): State<crate::AppState>) -> AppResult<Json<DashboardStats>> {
    let stats = state.services.stats.dashboard().await?;
    Ok(Json(stats))
}
