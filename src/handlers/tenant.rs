// src/handlers/tenant.rs

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{
    common::{error::AppError, extract::JsonBody},
    config::AppState,
    middleware::context::RequestContext,
    models::tenant::{
        ProvisioningResult, TenantArgs, TenantPayload, UpdateTenantPayload, STATUS_ERROR,
        STATUS_REPROVISIONED,
    },
    oa::PlatformGateway,
    services::{provisioning_service::ProvisioningService, tenant_service::TenantService},
};

// ---
// POST /tenant: as duas fases do protocolo do OA
// ---
pub async fn create_tenant(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    JsonBody(payload): JsonBody<TenantPayload>,
) -> Result<Response, AppError> {
    // 1. Extrair e validar os argumentos
    let args = TenantArgs::from_payload(payload, &app_state.settings.resources())?;

    // 2. Já provisionado: nada a fazer
    if args.status_is(STATUS_REPROVISIONED) {
        return Ok((StatusCode::CREATED, Json(json!({}))).into_response());
    }

    // 3. Fase assíncrona: o OA volta a chamar em modo síncrono
    if ctx.is_async_phase() && !args.status_is(STATUS_ERROR) {
        return Ok(ProvisioningResult::accepted(json!({})).into_response());
    }

    // 4. Provisionamento real
    let gateway = PlatformGateway::from_context(&app_state, &ctx);
    let result = ProvisioningService::new(&app_state, &ctx, gateway)
        .provision(&args, args.has_status())
        .await?;

    Ok(result.into_response())
}

pub async fn get_tenant(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    Path(tenant_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let counters = TenantService::new(app_state, ctx)
        .usage_counters(&tenant_id)
        .await?;
    Ok(Json(counters))
}

pub async fn update_tenant(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    Path(tenant_id): Path<String>,
    JsonBody(payload): JsonBody<UpdateTenantPayload>,
) -> Result<impl IntoResponse, AppError> {
    TenantService::new(app_state, ctx)
        .update(&tenant_id, &payload)
        .await?;
    Ok(Json(json!({})))
}

pub async fn delete_tenant(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    Path(tenant_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    TenantService::new(app_state, ctx).delete(&tenant_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// O FallBall ainda não suporta suspender clientes
pub async fn disable(Path(_tenant_id): Path<String>) -> impl IntoResponse {
    Json(json!({}))
}

pub async fn enable(Path(_tenant_id): Path<String>) -> impl IntoResponse {
    Json(json!({}))
}

pub async fn admin_login(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    Path(tenant_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let link = TenantService::new(app_state, ctx)
        .admin_login_link(&tenant_id)
        .await?;
    Ok(([(header::CONTENT_TYPE, "text/plain")], link))
}

pub async fn users_created(Path(_tenant_id): Path<String>) -> impl IntoResponse {
    Json(json!({}))
}

pub async fn user_removed(Path((_tenant_id, _user_id)): Path<(String, String)>) -> impl IntoResponse {
    Json(json!({}))
}

// Webhook das subscrições criadas no provisionamento. O corpo não é usado.
pub async fn on_users_change(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    Path(tenant_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    TenantService::new(app_state, ctx)
        .on_users_change(&tenant_id)
        .await?;
    Ok(Json(json!({})))
}

pub async fn reprovision(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    Path(tenant_id): Path<String>,
    JsonBody(payload): JsonBody<TenantPayload>,
) -> Result<impl IntoResponse, AppError> {
    let args = TenantArgs::from_payload(payload, &app_state.settings.resources())?;

    let gateway = PlatformGateway::from_context(&app_state, &ctx);
    ProvisioningService::new(&app_state, &ctx, gateway)
        .reprovision(&tenant_id, &args)
        .await?;

    Ok((StatusCode::OK, Json(json!({}))))
}
