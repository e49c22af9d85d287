// src/services/usage_service.rs

use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::{
    common::error::AppError,
    config::{AppState, CounterKey, ResourceNames, USER_COUNTERS},
    fallball::ClientRepository,
    middleware::context::RequestContext,
    models::{
        fallball::{Client, Reseller},
        oa::{aps_id, Notification},
    },
    oa::PlatformGateway,
};

/// Mapa de contadores para o OA: disco, dispositivos (sempre 0) e as classes
/// de usuário que a aplicação declara.
pub fn build_counters(resources: &ResourceNames, client: &Client, declared: &[String]) -> Map<String, Value> {
    let mut counters = Map::new();
    counters.insert(
        resources.diskspace.clone(),
        json!({ "usage": client.storage_usage() }),
    );
    counters.insert(resources.devices.clone(), json!({ "usage": 0 }));

    for key in USER_COUNTERS {
        let (Some(wire), Some(profile)) = (resources.wire(key), key.profile_type()) else {
            continue;
        };
        if wire.is_empty() || !declared.iter().any(|d| d == wire) {
            continue;
        }
        counters.insert(
            wire.to_string(),
            json!({ "usage": client.users_of_type(profile) }),
        );
    }

    counters
}

#[derive(Clone)]
pub struct UsageService {
    clients: ClientRepository,
    gateway: PlatformGateway,
    resources: ResourceNames,
    reseller: Reseller,
}

impl UsageService {
    pub fn new(app_state: &AppState, ctx: &RequestContext, gateway: PlatformGateway) -> Self {
        Self {
            clients: ClientRepository::new(app_state.fallball.clone()),
            gateway,
            resources: app_state.settings.resources(),
            reseller: ctx.reseller.clone(),
        }
    }

    // Classes de usuário declaradas no esquema. Aplicações com usuários mas
    // sem enum de recursos ficam com o contador de usuários normal.
    async fn declared_user_counters(&self) -> Result<Vec<String>, AppError> {
        let declared = self.gateway.user_resources().await?;
        if declared.is_empty() && self.gateway.supports_users().await? {
            return Ok(self
                .resources
                .wire(CounterKey::Users)
                .map(|w| vec![w.to_string()])
                .unwrap_or_default());
        }
        Ok(declared)
    }

    /// Lê o cliente atual no FallBall e monta os contadores.
    pub async fn counters_for(&self, client_name: &str) -> Result<Map<String, Value>, AppError> {
        let client = self.clients.get(&self.reseller, client_name).await?;
        let declared = self.declared_user_counters().await?;
        Ok(build_counters(&self.resources, &client, &declared))
    }

    /// Envia os contadores atuais para o recurso do tenant no OA.
    pub async fn sync(&self, tenant_id: &str, client_name: &str) -> Result<Map<String, Value>, AppError> {
        let counters = self.counters_for(client_name).await?;
        self.gateway
            .update_tenant(tenant_id, &Value::Object(counters.clone()))
            .await?;
        info!(tenant_id, client = %client_name, "🔄 Contadores sincronizados com o OA");
        Ok(counters)
    }

    /// Sincroniza depois de uma mudança de usuários e avisa a conta do tenant.
    /// A notificação é informativa: se falhar, a sincronização continua válida.
    pub async fn on_users_change(&self, tenant_id: &str, client_name: &str) -> Result<(), AppError> {
        self.sync(tenant_id, client_name).await?;

        if let Err(e) = self.notify_account(tenant_id, client_name).await {
            warn!(tenant_id, "Notificação de uso não enviada: {}", e);
        }
        Ok(())
    }

    async fn notify_account(&self, tenant_id: &str, client_name: &str) -> Result<(), AppError> {
        let accounts = self.gateway.get_linked_resources(tenant_id, "account").await?;
        let Some(account_id) = accounts.first().and_then(aps_id) else {
            return Ok(());
        };

        let notification = Notification::ready("Fallball usage was updated")
            .with_details(format!("Resource usage was synchronized for {}", client_name))
            .for_account(account_id);
        self.gateway.send_notification(notification).await?;
        Ok(())
    }
}
