// src/fallball/client.rs

use reqwest::{header, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::common::logging::redact_headers;

#[derive(Debug, Error)]
pub enum FallballError {
    #[error("FallBall respondeu {status}: {body}")]
    Client { status: StatusCode, body: String },

    #[error("FallBall respondeu {status}: {body}")]
    Server { status: StatusCode, body: String },

    #[error("Falha de comunicação com o FallBall: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Resposta inválida do FallBall: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FallballError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FallballError::Client { status, .. } | FallballError::Server { status, .. } => {
                Some(*status)
            }
            FallballError::Transport(e) => e.status(),
            FallballError::Decode(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    /// Corpo do erro interpretado como JSON (só para respostas 4xx/5xx).
    pub fn body_json(&self) -> Option<Value> {
        match self {
            FallballError::Client { body, .. } | FallballError::Server { body, .. } => {
                serde_json::from_str(body).ok()
            }
            _ => None,
        }
    }

    /// Mensagem para devolver ao OA: o texto do serviço sem aspas à volta.
    pub fn message(&self) -> String {
        match self {
            FallballError::Client { body, .. } | FallballError::Server { body, .. } => {
                body.trim().trim_matches('"').to_string()
            }
            other => other.to_string(),
        }
    }
}

// O cliente HTTP do FallBall, partilhado por todos os repositórios
#[derive(Clone)]
pub struct FallballClient {
    http: reqwest::Client,
    base_url: String,
    service_token: String,
}

impl FallballClient {
    pub fn new(http: reqwest::Client, base_url: &str, service_token: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_token: service_token.to_string(),
        }
    }

    pub fn service_token(&self) -> &str {
        &self.service_token
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Envia o pedido com `Authorization: Token <token>` e decodifica a resposta.
    /// Corpo vazio (ex: 204) é tratado como `null`.
    pub async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        token: &str,
        body: Option<&Value>,
    ) -> Result<T, FallballError> {
        let url = self.url(path);

        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(header::AUTHORIZATION, format!("Token {}", token))
            .header(header::ACCEPT, "application/json");
        if let Some(json_body) = body {
            request = request.json(json_body);
        }

        let request = request.build()?;
        debug!(
            method = %method,
            url = %url,
            headers = ?redact_headers(request.headers()),
            body = %body.map(serde_json::Value::to_string).unwrap_or_default(),
            "➡️ Pedido ao FallBall"
        );

        let response = self.http.execute(request).await?;
        let status = response.status();
        let text = response.text().await?;

        debug!(method = %method, url = %url, status = %status, body = %text, "⬅️ Resposta do FallBall");

        if status.is_server_error() {
            return Err(FallballError::Server { status, body: text });
        }
        if !status.is_success() {
            return Err(FallballError::Client { status, body: text });
        }

        if text.trim().is_empty() {
            Ok(serde_json::from_value(Value::Null)?)
        } else {
            Ok(serde_json::from_str(&text)?)
        }
    }
}

/// Escapa um segmento de caminho (nomes e e-mails vão no URL).
pub(crate) fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
