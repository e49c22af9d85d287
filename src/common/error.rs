// src/common/error.rs

use std::collections::BTreeMap;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::{fallball::FallballError, oa::OaError};

// O erro de topo da aplicação. Cada camada tem o seu próprio enum
// (FallballError, OaError) e converte para cá via `#[from]`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] ValidationErrors),

    // Corpo que não é JSON ou não tem a forma esperada
    #[error("{0}")]
    InvalidBody(#[from] JsonRejection),

    // Campo obrigatório em falta no payload recebido
    #[error("{0}")]
    MissingParameter(String),

    #[error("Assinatura OAuth ausente ou inválida")]
    Unauthorized,

    #[error("Acesso negado")]
    Forbidden,

    // Pedido bem formado mas recusado pelas regras de negócio (ex: reprovisionamento)
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Storage(#[from] FallballError),

    #[error(transparent)]
    Platform(#[from] OaError),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    pub fn missing(what: impl Into<String>) -> Self {
        AppError::MissingParameter(what.into())
    }
}

// Achata os erros do `validator` (incluindo structs aninhadas) num mapa caminho -> mensagens.
fn flatten_validation_errors(
    prefix: &str,
    errors: &ValidationErrors,
    out: &mut BTreeMap<String, Vec<String>>,
) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages = field_errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("Invalid {}", path))
                    })
                    .collect::<Vec<_>>();
                out.entry(path).or_default().extend(messages);
            }
            ValidationErrorsKind::Struct(inner) => flatten_validation_errors(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    flatten_validation_errors(&format!("{}[{}]", path, index), inner, out);
                }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::ValidationError(errors) => {
                let mut details = BTreeMap::new();
                flatten_validation_errors("", &errors, &mut details);
                let message = details
                    .values()
                    .flatten()
                    .next()
                    .cloned()
                    .unwrap_or_else(|| "Invalid request".to_string());
                (
                    StatusCode::BAD_REQUEST,
                    json!({ "message": message, "details": details }),
                )
            }
            AppError::InvalidBody(rejection) => {
                tracing::warn!("Corpo do pedido inválido: {}", rejection.body_text());
                (
                    StatusCode::BAD_REQUEST,
                    json!({ "message": rejection.body_text(), "error": "InvalidBody" }),
                )
            }
            AppError::MissingParameter(message) => {
                (StatusCode::BAD_REQUEST, json!({ "message": message }))
            }
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "message": "Unauthorized", "error": "Unauthorized" }),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                json!({ "message": "Forbidden", "error": "Forbidden" }),
            ),
            AppError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": message, "message": message }),
            ),

            // Erros do FallBall passam com o status original do serviço.
            AppError::Storage(e) => {
                let status = e.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                if status.is_server_error() {
                    tracing::error!("🔥 Erro do FallBall: {}", e);
                } else {
                    tracing::warn!("FallBall recusou o pedido: {}", e);
                }
                (status, json!({ "message": e.message() }))
            }
            AppError::Platform(e) => {
                tracing::error!("🔥 Falha na comunicação com o OA: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": e.to_string(), "error": "PlatformCommunicationError" }),
                )
            }
            ref e @ AppError::InternalServerError(_) => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": e.to_string(), "error": "InternalServerError" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
