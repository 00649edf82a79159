//! Admin dashboard
//!
//! - GET /api/v1/admin/dashboard - Record counts, recent news, cache and
//!   request statistics

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState};
use crate::services::DashboardSummary;

const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub version: &'static str,
    #[serde(flatten)]
    pub summary: DashboardSummary,
    pub requests: RequestSummary,
}

#[derive(Debug, Serialize)]
pub struct RequestSummary {
    pub uptime_seconds: u64,
    pub uptime_formatted: String,
    pub total_requests: u64,
    pub avg_response_time_ms: f64,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/dashboard", get(get_dashboard))
}

/// GET /api/v1/admin/dashboard
async fn get_dashboard(State(state): State<AppState>) -> Result<Json<DashboardResponse>, ApiError> {
    let summary = state.dashboard_service.summary().await?;

    let stats = &state.request_stats;
    let uptime_seconds = stats.uptime_seconds();
    Ok(Json(DashboardResponse {
        version: APP_VERSION,
        summary,
        requests: RequestSummary {
            uptime_seconds,
            uptime_formatted: format_uptime(uptime_seconds),
            total_requests: stats.total_requests(),
            avg_response_time_ms: stats.avg_response_time_us() / 1000.0,
        },
    }))
}

/// `2d 3h 4m`, dropping leading zero units
fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86400;
    let hours = (seconds % 86400) / 3600;
    let minutes = (seconds % 3600) / 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        format!("{}s", seconds)
    }
}
