use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::request_id::RequestId;
use crate::models::{DestinationHit, Group, PreferenceRecord};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct CreateGroupResponse {
    pub group_id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct GroupSummaryResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub member_count: usize,
    pub created_at: DateTime<Utc>,
}

impl From<&Group> for GroupSummaryResponse {
    fn from(group: &Group) -> Self {
        Self {
            id: group.id,
            name: group.name.clone(),
            description: group.description.clone(),
            member_count: group.member_count(),
            created_at: group.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub member_id: String,
    pub likes: Vec<String>,
    pub dislikes: Vec<String>,
    pub joined_at: DateTime<Utc>,
}

impl From<&PreferenceRecord> for MemberResponse {
    fn from(record: &PreferenceRecord) -> Self {
        Self {
            member_id: record.member_id.clone(),
            likes: record.likes.clone(),
            dislikes: record.dislikes.clone(),
            joined_at: record.joined_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GroupDetailResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub members: Vec<MemberResponse>,
}

impl From<&Group> for GroupDetailResponse {
    fn from(group: &Group) -> Self {
        Self {
            id: group.id,
            name: group.name.clone(),
            description: group.description.clone(),
            created_at: group.created_at,
            members: group.preferences().iter().map(MemberResponse::from).collect(),
        }
    }
}

/// Likes and dislikes are required; an empty list is fine, a missing one is not.
#[derive(Debug, Deserialize)]
pub struct JoinGroupRequest {
    pub member_id: String,
    pub likes: Vec<String>,
    pub dislikes: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub results: Vec<DestinationHit>,
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::InvalidInput(rejection.body_text()))
}

fn parse_group_id(path: Result<Path<Uuid>, PathRejection>) -> AppResult<Uuid> {
    path.map(|Path(id)| id)
        .map_err(|_| AppError::InvalidInput("group_id must be a UUID".to_string()))
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Create a new, empty group
pub async fn create_group(
    State(state): State<AppState>,
    payload: Result<Json<CreateGroupRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<CreateGroupResponse>)> {
    let request = json_body(payload)?;
    let name = request.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::InvalidInput("Group name is required".to_string()));
    }

    let group = state.store.create_group(name, request.description).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateGroupResponse {
            group_id: group.id,
            name: group.name,
        }),
    ))
}

/// List all groups
pub async fn list_groups(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<GroupSummaryResponse>>> {
    let groups = state.store.list_groups().await?;
    Ok(Json(groups.iter().map(GroupSummaryResponse::from).collect()))
}

/// Get a group with its members in join order
pub async fn get_group(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<GroupDetailResponse>> {
    let group_id = parse_group_id(path)?;
    let group = state.store.get_group(&group_id).await?;
    Ok(Json(GroupDetailResponse::from(&group)))
}

/// Join a group with a set of preferences
pub async fn join_group(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<JoinGroupRequest>, JsonRejection>,
) -> AppResult<StatusCode> {
    let group_id = parse_group_id(path)?;
    let request = json_body(payload)?;
    let record = PreferenceRecord::new(request.member_id, request.likes, request.dislikes)?;
    state.store.add_member(&group_id, record).await?;
    Ok(StatusCode::CREATED)
}

/// Recommend destinations matching the group's shared interest
pub async fn get_recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<RecommendationsResponse>> {
    let group_id = parse_group_id(path)?;
    tracing::info!(
        request_id = %request_id,
        group_id = %group_id,
        "Processing recommendation request"
    );

    let results = state.recommender.recommend(&group_id).await?;

    tracing::info!(
        request_id = %request_id,
        results = results.len(),
        "Recommendation request completed"
    );

    Ok(Json(RecommendationsResponse { results }))
}
