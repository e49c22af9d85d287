// src/models/tenant.rs

use axum::{
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::{CounterKey, ResourceNames},
    models::oa::{has_aps_id, opt_id, scalar_to_string, Link},
};

pub const APS_INFO_HEADER: HeaderName = HeaderName::from_static("aps-info");
pub const APS_INFO_MESSAGE: &str = "Additional information required to complete provisioning";

pub const STATUS_REPROVISIONED: &str = "reprovisioned";
pub const STATUS_ERROR: &str = "error";
pub const STATUS_ACTIVATION_REQUIRED: &str = "activationRequired";

// ---
// 1. Payload do OA (POST /tenant e /tenant/{id}/reprovision)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TenantAps {
    #[serde(default, deserialize_with = "opt_id")]
    #[validate(required(message = "Missing aps.id in request"))]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "opt_id")]
    #[validate(required(message = "Missing aps.subscription in request"))]
    pub subscription: Option<String>,

    #[serde(default, rename = "type")]
    #[validate(required(message = "Missing aps.type in request"))]
    pub aps_type: Option<String>,

    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TenantPayload {
    #[serde(default)]
    #[validate(required(message = "Missing aps.id in request"), nested)]
    pub aps: Option<TenantAps>,

    #[serde(default)]
    #[validate(
        required(message = "Missing link to account in request"),
        custom(function = "has_aps_id", message = "Missing link to account in request")
    )]
    pub account: Option<Link>,

    #[serde(default, rename = "accountinfo", alias = "accountInfo")]
    pub account_info: Option<Value>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default, rename = "statusData")]
    pub status_data: Option<Value>,

    // Os recursos (diskspace, users, ...) têm nomes definidos na configuração
    #[serde(flatten)]
    pub resources: Map<String, Value>,
}

/// `{ "<recurso>": { "limit": N } }` -> `Some(N)`. Recurso ausente -> `None`.
pub fn resource_limit(
    resources: &Map<String, Value>,
    wire_name: Option<&str>,
) -> Result<Option<i64>, AppError> {
    let Some(field) = wire_name.and_then(|name| resources.get(name)) else {
        return Ok(None);
    };
    if field.is_null() {
        return Ok(None);
    }

    let limit = &field["limit"];
    let parsed = match limit {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    parsed.map(Some).ok_or_else(|| {
        AppError::missing(format!(
            "Missing limit in {} in request",
            wire_name.unwrap_or_default()
        ))
    })
}

// ---
// 2. Argumentos já validados
// ---
#[derive(Debug, Clone)]
pub struct TenantArgs {
    pub aps_id: String,
    pub subscription_resource_id: String,
    pub aps_type: String,
    pub aps_status: Option<String>,
    pub account_id: String,
    pub account_info: Value,
    pub status: Option<String>,
    pub storage_limit: Option<i64>,
    pub users_limit: Option<i64>,
    pub gold_users_limit: Option<i64>,
}

impl TenantArgs {
    pub fn from_payload(payload: TenantPayload, resources: &ResourceNames) -> Result<Self, AppError> {
        payload.validate()?;

        let storage_limit = resource_limit(&payload.resources, resources.wire(CounterKey::Diskspace))?;
        let users_limit = resource_limit(&payload.resources, resources.wire(CounterKey::Users))?;
        let gold_users_limit =
            resource_limit(&payload.resources, resources.wire(CounterKey::GoldUsers))?;

        // Depois do validate() os campos obrigatórios existem; o `ok_or` é só para não usar unwrap.
        let aps = payload.aps.ok_or_else(|| AppError::missing("Missing aps.id in request"))?;
        let account_id = payload
            .account
            .as_ref()
            .and_then(|link| link.id())
            .map(str::to_string)
            .ok_or_else(|| AppError::missing("Missing link to account in request"))?;

        Ok(Self {
            aps_id: aps.id.ok_or_else(|| AppError::missing("Missing aps.id in request"))?,
            subscription_resource_id: aps
                .subscription
                .ok_or_else(|| AppError::missing("Missing aps.subscription in request"))?,
            aps_type: aps
                .aps_type
                .ok_or_else(|| AppError::missing("Missing aps.type in request"))?,
            aps_status: aps.status,
            account_id,
            account_info: payload.account_info.unwrap_or_else(|| Value::Object(Map::new())),
            status: payload.status.filter(|s| !s.is_empty()),
            storage_limit,
            users_limit,
            gold_users_limit,
        })
    }

    /// A aplicação gere os próprios usuários quando vende usuários (normais ou gold).
    /// Qualquer limite diferente de zero conta, incluindo -1 (ilimitado).
    pub fn user_integration_enabled(&self) -> bool {
        self.users_limit.is_some_and(|l| l != 0) || self.gold_users_limit.is_some_and(|l| l != 0)
    }

    pub fn status_is(&self, status: &str) -> bool {
        self.status.as_deref() == Some(status)
    }

    pub fn has_status(&self) -> bool {
        self.status.is_some()
    }

    /// `accountinfo.techContact.email` enviado pelo OA, se não estiver vazio.
    pub fn contact_email(&self) -> Option<String> {
        scalar_to_string(&self.account_info["techContact"]["email"])
    }

    pub fn postal_code(&self) -> Option<String> {
        scalar_to_string(&self.account_info["addressPostal"]["postalCode"])
    }
}

// ---
// 3. PUT /tenant/{id}
// ---
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTenantPayload {
    #[serde(flatten)]
    pub resources: Map<String, Value>,
}

// ---
// 4. Resultado do provisionamento devolvido ao OA
// ---
#[derive(Debug, Clone)]
pub struct ProvisioningResult {
    pub body: Value,
    pub status: StatusCode,
    pub headers: Vec<(HeaderName, HeaderValue)>,
}

impl ProvisioningResult {
    pub fn created(body: Value) -> Self {
        Self {
            body,
            status: StatusCode::CREATED,
            headers: Vec::new(),
        }
    }

    /// 202 com o cabeçalho `Aps-Info`: o OA vai voltar a chamar.
    pub fn accepted(body: Value) -> Self {
        Self {
            body,
            status: StatusCode::ACCEPTED,
            headers: vec![(APS_INFO_HEADER, HeaderValue::from_static(APS_INFO_MESSAGE))],
        }
    }

    pub fn failed(body: Value) -> Self {
        Self {
            body,
            status: StatusCode::INTERNAL_SERVER_ERROR,
            headers: Vec::new(),
        }
    }

    pub fn is_created(&self) -> bool {
        self.status == StatusCode::CREATED
    }
}

impl IntoResponse for ProvisioningResult {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.body)).into_response();
        for (name, value) in self.headers {
            response.headers_mut().insert(name, value);
        }
        response
    }
}
