// src/models/application.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::oa::opt_id;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppAps {
    #[serde(default, rename = "type")]
    #[validate(required(message = "No APS type specified"))]
    pub aps_type: Option<String>,

    #[serde(default, deserialize_with = "opt_id")]
    #[validate(required(message = "No APS id specified"))]
    pub id: Option<String>,
}

// POST /app: nova instância da aplicação (um novo revendedor no FallBall)
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AppPayload {
    #[serde(default)]
    #[validate(required(message = "No APS id specified"), nested)]
    pub aps: Option<AppAps>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppApsRef {
    #[serde(rename = "type")]
    pub aps_type: String,
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppCreated {
    pub aps: AppApsRef,
}
