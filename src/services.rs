pub mod provisioning_service;
pub mod tenant_service;
pub mod usage_service;
pub mod user_service;
