// src/oa/transport.rs

use std::time::Duration;

use reqwest::{header, Method, StatusCode, Url};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::common::{
    logging::redact_headers,
    oauth1::{authorization_header, OAuthCredentials},
};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

const RESOURCE_ID_HEADER: &str = "aps-resource-id";
const TRANSACTION_ID_HEADER: &str = "aps-transaction-id";

// Clone: o mesmo erro é entregue a todos os pedidos que esperavam pela mesma entrada de cache
#[derive(Debug, Clone, Error)]
pub enum OaError {
    // Timeout, erro de rede ou resposta diferente de 200
    #[error("{}", describe(.status, .text))]
    Communication { status: Option<u16>, text: String },

    #[error("{property} property is missing in OA resource {resource}")]
    MalformedResource {
        resource: String,
        property: &'static str,
    },
}

fn describe(status: &Option<u16>, text: &str) -> String {
    let mut message = String::from("Request to OA failed.");
    if let Some(code) = status {
        message.push_str(&format!(" OA responded with code {}", code));
    }
    message.push_str(&format!("\nError message: {}", text));
    message
}

impl OaError {
    fn unreachable(text: impl Into<String>) -> Self {
        OaError::Communication {
            status: None,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestOptions {
    // Reencaminha o `aps-transaction-id` do pedido de entrada
    pub transaction: bool,
    pub impersonate_as: Option<String>,
    pub max_attempts: u32,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            transaction: true,
            impersonate_as: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl RequestOptions {
    pub fn without_transaction(mut self) -> Self {
        self.transaction = false;
        self
    }

    pub fn impersonating(mut self, resource_id: impl Into<String>) -> Self {
        self.impersonate_as = Some(resource_id.into());
        self
    }

    pub fn attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

/// Cliente de baixo nível para o controlador OA, com o contexto de um único
/// pedido de entrada (URI do controlador, transação, credenciais).
#[derive(Clone)]
pub struct OaTransport {
    http: reqwest::Client,
    controller_uri: Option<String>,
    credentials: Option<OAuthCredentials>,
    transaction_id: Option<String>,
    timeout: Duration,
}

impl OaTransport {
    pub fn new(http: reqwest::Client, timeout: Duration) -> Self {
        Self {
            http,
            controller_uri: None,
            credentials: None,
            transaction_id: None,
            timeout,
        }
    }

    pub fn with_controller(mut self, controller_uri: Option<String>) -> Self {
        self.controller_uri = controller_uri;
        self
    }

    pub fn with_credentials(mut self, credentials: Option<OAuthCredentials>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_transaction(mut self, transaction_id: Option<String>) -> Self {
        self.transaction_id = transaction_id;
        self
    }

    pub fn controller_uri(&self) -> Option<&str> {
        self.controller_uri.as_deref()
    }

    fn url_for(&self, path: &str) -> Result<Url, OaError> {
        let base = self
            .controller_uri
            .as_deref()
            .ok_or_else(|| OaError::unreachable("Missing aps-controller-uri header"))?;
        let base = Url::parse(base).map_err(|e| OaError::unreachable(e.to_string()))?;
        base.join(path).map_err(|e| OaError::unreachable(e.to_string()))
    }

    /// Envia um pedido ao OA.
    ///
    /// O OA responde 400 quando um recurso acabado de criar ainda não está
    /// visível, por isso o 400 é repetido até `max_attempts` vezes (sem espera).
    /// Qualquer outro status diferente de 200, timeout ou erro de rede falha
    /// imediatamente.
    pub async fn send_request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        options: &RequestOptions,
    ) -> Result<Value, OaError> {
        let url = self.url_for(path)?;
        let payload = body.map(Value::to_string);
        let attempts = options.max_attempts.max(1);
        let mut last_text = String::new();

        for attempt in 1..=attempts {
            let mut request = self
                .http
                .request(method.clone(), url.clone())
                .timeout(self.timeout)
                .header(header::CONTENT_TYPE, "application/json");

            if let Some(resource_id) = &options.impersonate_as {
                request = request.header(RESOURCE_ID_HEADER, resource_id);
            }
            if options.transaction {
                if let Some(transaction_id) = &self.transaction_id {
                    request = request.header(TRANSACTION_ID_HEADER, transaction_id);
                }
            }
            if let Some(credentials) = &self.credentials {
                request = request.header(
                    header::AUTHORIZATION,
                    authorization_header(method.as_str(), &url, credentials),
                );
            }
            if let Some(payload) = &payload {
                request = request.body(payload.clone());
            }

            let request = request
                .build()
                .map_err(|e| OaError::unreachable(e.to_string()))?;
            debug!(
                method = %method,
                url = %url,
                attempt,
                headers = ?redact_headers(request.headers()),
                body = %payload.as_deref().unwrap_or_default(),
                "➡️ Pedido ao OA"
            );

            let response = match self.http.execute(request).await {
                Ok(response) => response,
                Err(e) if e.is_timeout() => {
                    return Err(OaError::unreachable(format!(
                        "Request to OA timed out. Timeout: {}",
                        self.timeout.as_secs()
                    )));
                }
                Err(e) => return Err(OaError::unreachable(e.to_string())),
            };

            let status = response.status();
            let text = response
                .text()
                .await
                .map_err(|e| OaError::unreachable(e.to_string()))?;
            debug!(method = %method, url = %url, status = %status, body = %text, "⬅️ Resposta do OA");

            if status == StatusCode::OK {
                if text.trim().is_empty() {
                    return Ok(Value::Null);
                }
                return serde_json::from_str(&text).map_err(|e| OaError::Communication {
                    status: Some(status.as_u16()),
                    text: format!("Invalid JSON in OA response: {}", e),
                });
            }

            if status != StatusCode::BAD_REQUEST {
                return Err(OaError::Communication {
                    status: Some(status.as_u16()),
                    text,
                });
            }

            warn!(attempt, attempts, url = %url, "OA respondeu 400, a repetir o pedido");
            last_text = text;
        }

        Err(OaError::Communication {
            status: Some(StatusCode::BAD_REQUEST.as_u16()),
            text: last_text,
        })
    }
}
