use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{
    auth::jwt::StaffUser,
    state::AppState,
    users::{
        dto::{CreateUserRequest, Pagination, PaginationLinks, UserListResponse, UserResponse},
        services,
    },
    validation::ProfileUpdate,
};

type ApiError = (StatusCode, String);

pub fn staff_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    StaffUser(_staff): StaffUser,
    Query(p): Query<Pagination>,
) -> Result<Json<UserListResponse>, ApiError> {
    let (limit, offset) = p.clamped();
    let (users, total) = services::list_users(&state, limit, offset).await?;
    let items: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(Json(UserListResponse {
        size: items.len(),
        page: offset / limit + 1,
        total,
        items,
        links: PaginationLinks::new(&state.config.base_url, limit, offset, total),
    }))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = services::register_user(&state, payload).await?;
    tracing::info!(created_by = %staff.id, user_id = %user.id, "user created by staff");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    StaffUser(_staff): StaffUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = services::get_user(&state, id).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, update))]
pub async fn update_user(
    State(state): State<AppState>,
    StaffUser(_staff): StaffUser,
    Path(id): Path<Uuid>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    require_fields(&update)?;
    let user = services::update_user(&state, id, &update).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    StaffUser(_staff): StaffUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    services::delete_user(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) fn require_fields(update: &ProfileUpdate) -> Result<(), ApiError> {
    if update.is_empty() {
        warn!("empty update payload");
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "At least one field must be provided for update".into(),
        ));
    }
    Ok(())
}
