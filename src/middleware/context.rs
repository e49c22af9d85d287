// src/middleware/context.rs

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    common::{error::AppError, oauth1::OAuthCredentials},
    models::fallball::Reseller,
};

pub const PHASE_SYNC: &str = "sync";
pub const PHASE_ASYNC: &str = "async";

// O contexto de um pedido de entrada. Preenchido uma vez pelo guard
// e lido pelos handlers através do extrator abaixo.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub reseller: Reseller,
    pub is_new_reseller: bool,
    pub instance_id: Option<String>,
    pub controller_uri: Option<String>,
    pub transaction_id: Option<String>,
    pub identity_id: Option<String>,
    // Aps-Request-Phase (sync por omissão)
    pub phase: String,
    // Credenciais para assinar os pedidos de saída ao OA
    pub oauth: Option<OAuthCredentials>,
}

impl RequestContext {
    pub fn is_async_phase(&self) -> bool {
        self.phase == PHASE_ASYNC
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Se o guard não correu, a rota foi montada sem ele: erro de programação.
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or_else(|| {
                AppError::InternalServerError(anyhow::anyhow!(
                    "RequestContext ausente: rota sem reseller_guard"
                ))
            })
    }
}
