//! Walk tracking endpoints.
//!
//! - `POST /api/walks/tracking`: apply one tracking action
//! - `GET /api/walks/tracking?walkId=`: current tracking state

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::WalkTrackingView;
use crate::tracking::{self, TrackingError, TrackingRequest};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingQuery {
    pub walk_id: Option<String>,
}

#[derive(Serialize)]
pub struct TrackingResponse {
    pub success: bool,
    pub walk: WalkTrackingView,
}

/// `POST /api/walks/tracking`
pub async fn apply(
    State(ctx): State<ApiContext>,
    payload: Result<Json<TrackingRequest>, JsonRejection>,
) -> Result<Json<TrackingResponse>, ApiError> {
    let Json(request) = payload?;

    let view = {
        let mut conn = ctx.core.lock_db()?;
        let updated = tracking::apply_tracking_action(&mut conn, &request)?;
        let dog = ctx.dog_summary(&conn, &updated.dog_id)?;
        WalkTrackingView::new(updated, dog)
    };

    Ok(Json(TrackingResponse {
        success: true,
        walk: view,
    }))
}

/// `GET /api/walks/tracking?walkId=`
pub async fn fetch(
    State(ctx): State<ApiContext>,
    query: Result<Query<TrackingQuery>, QueryRejection>,
) -> Result<Json<TrackingResponse>, ApiError> {
    let Query(query) = query?;
    let walk_id = query
        .walk_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(TrackingError::MissingWalkId)?;

    let view = {
        let conn = ctx.core.lock_db()?;
        let current = tracking::fetch_tracking(&conn, walk_id)?;
        let dog = ctx.dog_summary(&conn, &current.dog_id)?;
        WalkTrackingView::new(current, dog)
    };

    Ok(Json(TrackingResponse {
        success: true,
        walk: view,
    }))
}
