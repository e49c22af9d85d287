// src/oa/gateway.rs

use reqwest::Method;
use serde_json::Value;
use tracing::info;

use crate::{
    common::oauth1::encode,
    config::{AppState, Caches},
    middleware::context::RequestContext,
    models::oa::{aps_id, Notification, Subscription, NOTIFICATION_MANAGER_TYPE},
    oa::transport::{OaError, OaTransport, RequestOptions},
};

// Chave de cache quando o pedido não trouxe URI do controlador
const NO_CONTROLLER: &str = "-";

/// Operações tipadas sobre o grafo de recursos do OA.
#[derive(Clone)]
pub struct PlatformGateway {
    transport: OaTransport,
    caches: Caches,
    identity_id: Option<String>,
    retry_attempts: u32,
}

impl PlatformGateway {
    pub fn new(transport: OaTransport, caches: Caches, retry_attempts: u32) -> Self {
        Self {
            transport,
            caches,
            identity_id: None,
            retry_attempts,
        }
    }

    pub fn with_identity(mut self, identity_id: Option<String>) -> Self {
        self.identity_id = identity_id;
        self
    }

    /// Monta o gateway com o contexto do pedido de entrada atual.
    pub fn from_context(state: &AppState, ctx: &RequestContext) -> Self {
        let transport = OaTransport::new(state.http.clone(), state.settings.request_timeout())
            .with_controller(ctx.controller_uri.clone())
            .with_credentials(ctx.oauth.clone())
            .with_transaction(ctx.transaction_id.clone());

        Self::new(transport, state.caches.clone(), state.settings.oa_retry_attempts)
            .with_identity(ctx.identity_id.clone())
    }

    fn options(&self) -> RequestOptions {
        RequestOptions::default().attempts(self.retry_attempts)
    }

    fn cache_key(&self) -> String {
        self.transport
            .controller_uri()
            .unwrap_or(NO_CONTROLLER)
            .to_string()
    }

    pub async fn send_request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        options: &RequestOptions,
    ) -> Result<Value, OaError> {
        self.transport.send_request(method, path, body, options).await
    }

    // ---
    // Recursos
    // ---

    pub async fn get_resource(&self, resource_id: &str) -> Result<Value, OaError> {
        let path = format!("aps/2/resources/{}", resource_id);
        self.send_request(Method::GET, &path, None, &self.options()).await
    }

    /// Executa uma consulta RQL e devolve a lista de recursos.
    pub async fn get_resources(&self, rql: &str) -> Result<Vec<Value>, OaError> {
        let value = self.send_request(Method::GET, rql, None, &self.options()).await?;
        Ok(match value {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            other => vec![other],
        })
    }

    pub async fn get_linked_resources(
        &self,
        resource_id: &str,
        relation: &str,
    ) -> Result<Vec<Value>, OaError> {
        self.get_resources(&format!("aps/2/resources/{}/{}", resource_id, relation))
            .await
    }

    pub async fn put_resource(
        &self,
        representation: &Value,
        impersonate_as: Option<&str>,
    ) -> Result<Value, OaError> {
        let mut options = self.options();
        if let Some(resource_id) = impersonate_as {
            options = options.impersonating(resource_id);
        }
        self.send_request(Method::PUT, "aps/2/resources", Some(representation), &options)
            .await
    }

    /// PUT no recurso do tenant da aplicação (contadores, estado de provisionamento).
    pub async fn update_tenant(&self, tenant_id: &str, body: &Value) -> Result<Value, OaError> {
        let path = format!("aps/2/application/tenant/{}", tenant_id);
        self.send_request(Method::PUT, &path, Some(body), &self.options())
            .await
    }

    pub async fn subscribe_on(
        &self,
        resource_id: &str,
        subscription: &Subscription,
    ) -> Result<Value, OaError> {
        let path = format!("aps/2/resources/{}/aps/subscriptions", resource_id);
        let body = serde_json::to_value(subscription).map_err(|e| OaError::Communication {
            status: None,
            text: e.to_string(),
        })?;

        info!(resource_id, event = %subscription.event, "📡 A subscrever evento no OA");
        self.send_request(Method::POST, &path, Some(&body), &self.options())
            .await
    }

    // ---
    // Notificações
    // ---

    pub async fn notification_manager(&self) -> Result<String, OaError> {
        self.caches
            .notification_managers
            .get_or_try_insert_with(self.cache_key(), || self.find_notification_manager())
            .await
    }

    async fn find_notification_manager(&self) -> Result<String, OaError> {
        let rql = format!(
            "aps/2/resources?implementing({})",
            encode(NOTIFICATION_MANAGER_TYPE)
        );
        let options = self.options().without_transaction();
        let managers = self.send_request(Method::GET, &rql, None, &options).await?;

        managers
            .get(0)
            .and_then(aps_id)
            .ok_or_else(|| OaError::MalformedResource {
                resource: NOTIFICATION_MANAGER_TYPE.to_string(),
                property: "aps.id",
            })
    }

    /// Envia uma notificação para o painel. O iniciador é o `aps-identity-id` do pedido.
    pub async fn send_notification(&self, mut notification: Notification) -> Result<Value, OaError> {
        if notification.initiator_id.is_none() {
            notification.initiator_id = self.identity_id.clone();
        }

        let manager = self.notification_manager().await?;
        let path = format!("aps/2/resources/{}/notifications", manager);
        let body = serde_json::to_value(&notification).map_err(|e| OaError::Communication {
            status: None,
            text: e.to_string(),
        })?;

        self.send_request(
            Method::POST,
            &path,
            Some(&body),
            &self.options().without_transaction(),
        )
        .await
    }

    // ---
    // Esquemas da aplicação
    // ---

    pub async fn application_schema(&self) -> Result<Value, OaError> {
        self.caches
            .application_schemas
            .get_or_try_insert_with(self.cache_key(), || async {
                self.send_request(
                    Method::GET,
                    "aps/2/application",
                    None,
                    &self.options().without_transaction(),
                )
                .await
            })
            .await
    }

    pub async fn supports_users(&self) -> Result<bool, OaError> {
        let schema = self.application_schema().await?;
        Ok(match &schema["user"] {
            Value::Null | Value::Bool(false) => false,
            Value::Object(map) => !map.is_empty(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        })
    }

    /// Esquema do tipo de usuário da aplicação (objeto vazio se não existir).
    pub async fn user_schema(&self) -> Result<Value, OaError> {
        self.caches
            .user_schemas
            .get_or_try_insert_with(self.cache_key(), || self.fetch_user_schema())
            .await
    }

    async fn fetch_user_schema(&self) -> Result<Value, OaError> {
        let schema = self.application_schema().await?;
        match schema["user"]["schema"].as_str() {
            Some(uri) => {
                self.send_request(Method::GET, uri, None, &self.options().without_transaction())
                    .await
            }
            None => Ok(Value::Object(Default::default())),
        }
    }

    /// Classes de usuário declaradas pela aplicação (`properties.resource.enum`).
    pub async fn user_resources(&self) -> Result<Vec<String>, OaError> {
        let schema = self.user_schema().await?;
        Ok(schema["properties"]["resource"]["enum"]
            .as_array()
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default())
    }
}
