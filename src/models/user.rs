// src/models/user.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::oa::{has_aps_id, Link};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UserAps {
    #[serde(default, rename = "type")]
    #[validate(required(message = "Missing aps.type in request"))]
    pub aps_type: Option<String>,
}

// POST /user: o serviço da aplicação foi atribuído a um usuário do OA
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserPayload {
    #[serde(default)]
    #[validate(required(message = "Missing aps.type in request"), nested)]
    pub aps: Option<UserAps>,

    #[serde(default)]
    #[validate(
        required(message = "Missing tenant in request"),
        custom(function = "has_aps_id", message = "Missing tenant in request")
    )]
    pub tenant: Option<Link>,

    #[serde(default)]
    #[validate(
        required(message = "Missing aps.id in request"),
        custom(function = "has_aps_id", message = "Missing aps.id in request")
    )]
    pub user: Option<Link>,

    // Classe do usuário (nome do recurso de usuários no OA)
    #[serde(default)]
    pub resource: Option<String>,
}

impl CreateUserPayload {
    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant.as_ref().and_then(Link::id)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().and_then(Link::id)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserPayload {
    #[serde(default)]
    pub resource: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreated {
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRedirect {
    pub redirect_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn requires_tenant_and_user_links() {
        let payload: CreateUserPayload = serde_json::from_value(json!({
            "aps": { "type": "http://app/user/1.0" },
            "tenant": { "aps": { "id": "t-1" } }
        }))
        .unwrap();
        assert!(payload.validate().is_err());

        let payload: CreateUserPayload = serde_json::from_value(json!({
            "aps": { "type": "http://app/user/1.0" },
            "tenant": { "aps": { "id": "t-1" } },
            "user": { "aps": { "id": "u-1" } },
            "resource": "GOLD_USERS"
        }))
        .unwrap();
        assert!(payload.validate().is_ok());
        assert_eq!(payload.tenant_id(), Some("t-1"));
        assert_eq!(payload.user_id(), Some("u-1"));
    }

    #[test]
    fn responses_use_camel_case() {
        let created = serde_json::to_value(UserCreated { user_id: "a@b.io".into() }).unwrap();
        assert_eq!(created, json!({ "userId": "a@b.io" }));
    }
}
