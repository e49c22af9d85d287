// src/handlers/application.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::info;
use validator::Validate;

use crate::{
    common::{error::AppError, extract::JsonBody},
    config::AppState,
    fallball::ResellerRepository,
    middleware::context::RequestContext,
    models::application::{AppApsRef, AppCreated, AppPayload},
};

// GET / fora do prefixo do conector
pub async fn root() -> impl IntoResponse {
    let host = std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
    Json(json!({ "service": "fallball_connector", "host": host }))
}

// GET /connector/v1/ (público, sem assinatura)
pub async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

// ---
// POST /app: nova instância da aplicação -> novo revendedor
// ---
pub async fn create_app(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    JsonBody(payload): JsonBody<AppPayload>,
) -> Result<impl IntoResponse, AppError> {
    // 1. Validar o payload
    payload.validate().map_err(AppError::ValidationError)?;
    let aps = payload
        .aps
        .ok_or_else(|| AppError::missing("No APS id specified"))?;

    // 2. Criar o revendedor com o nome gerado pelo guard
    ResellerRepository::new(app_state.fallball.clone())
        .create(&ctx.reseller)
        .await?;
    info!(reseller = %ctx.reseller.name, "🏢 Revendedor criado");

    // 3. Responder com Sucesso
    let created = AppCreated {
        aps: AppApsRef {
            aps_type: aps.aps_type.unwrap_or_default(),
            id: aps.id.unwrap_or_default(),
        },
    };
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn delete_app(
    State(app_state): State<AppState>,
    ctx: RequestContext,
    Path(app_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    // Só o próprio revendedor pode remover a sua instância
    if ctx.reseller.name != app_id {
        return Err(AppError::Forbidden);
    }

    ResellerRepository::new(app_state.fallball.clone())
        .delete(&ctx.reseller.name)
        .await?;
    info!(reseller = %ctx.reseller.name, "🗑️ Revendedor removido");

    Ok(StatusCode::NO_CONTENT)
}

// Eventos da instância que o FallBall não precisa de tratar
pub async fn upgrade(Path(_app_id): Path<String>) -> impl IntoResponse {
    Json(json!({}))
}

pub async fn tenant_new(Path(_app_id): Path<String>) -> impl IntoResponse {
    Json(json!({}))
}

pub async fn tenant_delete(Path((_app_id, _tenant_id)): Path<(String, String)>) -> impl IntoResponse {
    Json(json!({}))
}
