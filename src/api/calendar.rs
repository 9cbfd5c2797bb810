use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Local;
use std::sync::Arc;

use super::validation::validate_weekday;
use crate::api::{ApiError, ApiResponse, AppState};
use crate::models::ScheduleDay;
use crate::services::{MonthGrid, month_grid};

/// GET /api/schedule/{weekday}
pub async fn get_schedule(
    State(state): State<Arc<AppState>>,
    Path(weekday): Path<String>,
) -> Result<Json<ApiResponse<ScheduleDay>>, ApiError> {
    let weekday = validate_weekday(&weekday)?;
    let day = state.catalog().schedule(weekday).await;
    Ok(Json(ApiResponse::success(day)))
}

/// GET /api/calendar/week
/// Monday to Sunday.
pub async fn get_week(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Vec<ScheduleDay>>> {
    let week = state.catalog().week_schedule().await;
    Json(ApiResponse::success(week))
}

/// GET /api/calendar/{year}/{month}
pub async fn get_month(
    Path((year, month)): Path<(i32, u32)>,
) -> Result<Json<ApiResponse<MonthGrid>>, ApiError> {
    let grid = month_grid(year, month, Local::now().date_naive())
        .ok_or_else(|| ApiError::validation(format!("Invalid month: {year}-{month}")))?;
    Ok(Json(ApiResponse::success(grid)))
}
