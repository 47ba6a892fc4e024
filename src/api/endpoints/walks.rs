//! Walk endpoints.
//!
//! - `POST /api/walks`: book a walk
//! - `GET /api/walks?walkerId=&date=`: a walker's schedule
//! - `GET /api/walks/groups?walkerId=`: group walk sessions

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::booking::{self, NewWalk};
use crate::db;
use crate::group_walk::{self, GroupWalkSession};
use crate::models::Walk;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkListQuery {
    pub walker_id: Option<String>,
    pub date: Option<String>,
}

#[derive(Serialize)]
pub struct WalkResponse {
    pub success: bool,
    pub walk: Walk,
}

#[derive(Serialize)]
pub struct WalkListResponse {
    pub success: bool,
    pub walks: Vec<Walk>,
}

#[derive(Serialize)]
pub struct GroupListResponse {
    pub success: bool,
    pub sessions: Vec<GroupWalkSession>,
}

fn required_walker_id(query: &WalkListQuery) -> Result<&str, ApiError> {
    query
        .walker_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("walkerId is required".into()))
}

/// `POST /api/walks`
pub async fn create(
    State(ctx): State<ApiContext>,
    payload: Result<Json<NewWalk>, JsonRejection>,
) -> Result<(StatusCode, Json<WalkResponse>), ApiError> {
    let Json(request) = payload?;

    let walk = {
        let conn = ctx.core.lock_db()?;
        booking::create_walk(&conn, &request)?
    };

    Ok((
        StatusCode::CREATED,
        Json(WalkResponse {
            success: true,
            walk,
        }),
    ))
}

/// `GET /api/walks?walkerId=&date=`
pub async fn list(
    State(ctx): State<ApiContext>,
    query: Result<Query<WalkListQuery>, QueryRejection>,
) -> Result<Json<WalkListResponse>, ApiError> {
    let Query(query) = query?;
    let walker_id = required_walker_id(&query)?;
    let date = query
        .date
        .as_deref()
        .map(|raw| {
            NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map_err(|_| ApiError::BadRequest(format!("date must be YYYY-MM-DD, got '{raw}'")))
        })
        .transpose()?;

    let walks = {
        let conn = ctx.core.lock_db()?;
        db::list_walks_for_walker(&conn, walker_id, date)?
    };

    Ok(Json(WalkListResponse {
        success: true,
        walks,
    }))
}

/// `GET /api/walks/groups?walkerId=`: every member starts `pending`.
pub async fn groups(
    State(ctx): State<ApiContext>,
    query: Result<Query<WalkListQuery>, QueryRejection>,
) -> Result<Json<GroupListResponse>, ApiError> {
    let Query(query) = query?;
    let walker_id = required_walker_id(&query)?;

    let walks = {
        let conn = ctx.core.lock_db()?;
        db::list_walks_for_walker(&conn, walker_id, None)?
    };

    Ok(Json(GroupListResponse {
        success: true,
        sessions: group_walk::group_walks(&walks, walker_id),
    }))
}
