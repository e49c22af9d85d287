// src/models/fallball.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ---
// 1. Storage (quota e uso)
// ---
// `usage` só vem do FallBall, nunca é enviado.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Storage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(default, skip_serializing)]
    pub usage: Option<i64>,
}

impl Storage {
    pub fn with_limit(limit: i64) -> Self {
        Self {
            limit: Some(limit),
            usage: None,
        }
    }
}

// ---
// 2. Reseller (o "Revendedor")
// ---
// Uma instalação da aplicação no OA. `rid` é o Aps-Instance-Id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reseller {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing)]
    pub clients_amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<Storage>,
}

impl Reseller {
    pub fn new(name: impl Into<String>, rid: Option<String>) -> Self {
        Self {
            name: name.into(),
            rid,
            ..Default::default()
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

// ---
// 3. Client (o "Tenant" do OA)
// ---
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    // true quando a aplicação gere os próprios usuários
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_integrated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<Storage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing)]
    pub users_amount: Option<i64>,
    #[serde(default, skip_serializing)]
    pub users_by_type: HashMap<String, i64>,
}

impl Client {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn storage_limit(&self) -> Option<i64> {
        self.storage.as_ref().and_then(|s| s.limit)
    }

    pub fn storage_usage(&self) -> i64 {
        self.storage.as_ref().and_then(|s| s.usage).unwrap_or(0)
    }

    pub fn users_of_type(&self, profile_type: &str) -> i64 {
        self.users_by_type.get(profile_type).copied().unwrap_or(0)
    }
}

// ---
// 4. User (login dentro de um cliente)
// ---
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub email: String,
    // Só enviada na criação
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<Storage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_type: Option<String>,
}

impl User {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Default::default()
        }
    }
}
