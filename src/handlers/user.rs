// src/handlers/user.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::{
    common::{error::AppError, extract::JsonBody},
    config::AppState,
    middleware::context::RequestContext,
    models::user::{CreateUserPayload, LoginRedirect, UpdateUserPayload, UserCreated},
    services::user_service::UserService,
};

pub async fn create_user(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    JsonBody(payload): JsonBody<CreateUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    let email = UserService::new(app_state, ctx).create(&payload).await?;
    Ok((StatusCode::CREATED, Json(UserCreated { user_id: email })))
}

pub async fn update_user(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    Path(user_id): Path<String>,
    JsonBody(payload): JsonBody<UpdateUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    UserService::new(app_state, ctx)
        .update(&user_id, &payload)
        .await?;
    Ok(Json(json!({})))
}

pub async fn delete_user(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    UserService::new(app_state, ctx).delete(&user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn user_login(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let redirect_url = UserService::new(app_state, ctx).login_link(&user_id).await?;
    Ok(Json(LoginRedirect { redirect_url }))
}
