// src/models/oa.rs

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const LINKED_EVENT: &str = "http://aps-standard.org/core/events/linked";
pub const UNLINKED_EVENT: &str = "http://aps-standard.org/core/events/unlinked";
pub const NOTIFICATION_MANAGER_TYPE: &str =
    "http://www.parallels.com/pa/pa-core-services/notification-manager/1";

/// Ids do OA chegam como texto ou como número; guardamos sempre texto.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(scalar_to_string))
}

// ---
// Link para outro recurso: { "aps": { "id": "..." } }
// ---
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkRef {
    #[serde(default, deserialize_with = "opt_id")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub aps: Option<LinkRef>,
}

impl Link {
    pub fn id(&self) -> Option<&str> {
        self.aps.as_ref().and_then(|a| a.id.as_deref())
    }
}

/// Validação `custom` para links obrigatórios.
pub fn has_aps_id(link: &Link) -> Result<(), validator::ValidationError> {
    match link.id() {
        Some(_) => Ok(()),
        None => Err(validator::ValidationError::new("missing_aps_id")),
    }
}

/// Lê `resource.aps.id` de um recurso devolvido pelo OA.
pub fn aps_id(resource: &Value) -> Option<String> {
    scalar_to_string(&resource["aps"]["id"])
}

// ---
// Subscrição de eventos
// ---
#[derive(Debug, Clone, Serialize)]
pub struct EventSource {
    #[serde(rename = "type")]
    pub source_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Subscription {
    pub event: String,
    pub source: EventSource,
    pub relation: String,
    pub handler: String,
}

// ---
// Notificações para o painel do OA
// ---
#[derive(Debug, Clone, Serialize)]
pub struct NotificationText {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub status: String,
    pub message: NotificationText,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<NotificationText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initiator_id: Option<String>,
}

impl Notification {
    pub fn ready(message: impl Into<String>) -> Self {
        Self {
            status: "ready".to_string(),
            message: NotificationText {
                message: message.into(),
            },
            details: None,
            account_id: None,
            user_id: None,
            link: None,
            initiator_id: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(NotificationText {
            message: details.into(),
        });
        self
    }

    pub fn for_account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    pub fn for_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}
