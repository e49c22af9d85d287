// src/services/tenant_service.rs

use serde_json::{Map, Value};
use tracing::{info, Span};

use crate::{
    common::{error::AppError, naming::default_admin_email},
    config::{AppState, Caches, CounterKey},
    fallball::{ClientRepository, UserRepository},
    middleware::context::RequestContext,
    models::{
        fallball::{Client, Reseller, Storage},
        oa::scalar_to_string,
        tenant::{resource_limit, UpdateTenantPayload},
    },
    oa::{OaError, PlatformGateway},
    services::usage_service::UsageService,
};

// Usado para obter o link do formulário de login quando o tenant não existe no OA
const FAKE_CLIENT: &str = "fake_client";
const FAKE_USER_EMAIL: &str = "does-not-exist@non-existing.local";

/// Nome do cliente no FallBall para um tenant do OA (propriedade `tenantId`).
/// Memorizado por processo; erros não ficam em cache.
pub async fn client_name_for_tenant(
    caches: &Caches,
    gateway: &PlatformGateway,
    tenant_id: &str,
) -> Result<String, AppError> {
    let name = caches
        .tenant_names
        .get_or_try_insert_with(tenant_id.to_string(), || fetch_tenant_name(gateway, tenant_id))
        .await?;

    Span::current().record("company", name.as_str());
    Ok(name)
}

async fn fetch_tenant_name(gateway: &PlatformGateway, tenant_id: &str) -> Result<String, OaError> {
    let resource = gateway.get_resource(tenant_id).await?;
    scalar_to_string(&resource["tenantId"]).ok_or_else(|| OaError::MalformedResource {
        resource: tenant_id.to_string(),
        property: "tenantId",
    })
}

#[derive(Clone)]
pub struct TenantService {
    app_state: AppState,
    ctx: RequestContext,
    gateway: PlatformGateway,
    clients: ClientRepository,
    users: UserRepository,
}

impl TenantService {
    pub fn new(app_state: AppState, ctx: RequestContext) -> Self {
        let gateway = PlatformGateway::from_context(&app_state, &ctx);
        Self {
            clients: ClientRepository::new(app_state.fallball.clone()),
            users: UserRepository::new(app_state.fallball.clone()),
            app_state,
            ctx,
            gateway,
        }
    }

    fn reseller(&self) -> &Reseller {
        &self.ctx.reseller
    }

    fn usage(&self) -> UsageService {
        UsageService::new(&self.app_state, &self.ctx, self.gateway.clone())
    }

    pub async fn client_name(&self, tenant_id: &str) -> Result<String, AppError> {
        client_name_for_tenant(&self.app_state.caches, &self.gateway, tenant_id).await
    }

    /// GET /tenant/{id}: contadores de uso atuais.
    pub async fn usage_counters(&self, tenant_id: &str) -> Result<Map<String, Value>, AppError> {
        let name = self.client_name(tenant_id).await?;
        self.usage().counters_for(&name).await
    }

    /// Atualiza a quota de disco. Limite ausente ou zero não altera nada.
    pub async fn update(&self, tenant_id: &str, payload: &UpdateTenantPayload) -> Result<(), AppError> {
        let resources = self.app_state.settings.resources();
        let limit = resource_limit(&payload.resources, resources.wire(CounterKey::Diskspace))?;
        let name = self.client_name(tenant_id).await?;

        if let Some(limit) = limit.filter(|l| *l != 0) {
            let client = Client {
                storage: Some(Storage::with_limit(limit)),
                ..Client::named(name.clone())
            };
            self.clients.update(self.reseller(), &client).await?;
            info!(client = %name, limit, "💾 Quota de disco atualizada");
        }
        Ok(())
    }

    pub async fn delete(&self, tenant_id: &str) -> Result<(), AppError> {
        let name = self.client_name(tenant_id).await?;
        self.clients.delete(self.reseller(), &name).await?;
        info!(client = %name, "🗑️ Cliente removido do FallBall");
        Ok(())
    }

    /// Link de login do administrador por omissão. Se o tenant não puder ser
    /// resolvido no OA, devolve o link de um usuário inexistente, que leva ao
    /// formulário de login do serviço.
    pub async fn admin_login_link(&self, tenant_id: &str) -> Result<String, AppError> {
        match self.client_name(tenant_id).await {
            Ok(name) => {
                let email = default_admin_email(&name, &self.reseller().name);
                Ok(self.users.login_link(self.reseller(), &name, &email).await?)
            }
            Err(AppError::Platform(e)) => {
                info!("Tenant {} não resolvido no OA ({}), a usar o formulário de login", tenant_id, e);
                Ok(self
                    .users
                    .login_link(self.reseller(), FAKE_CLIENT, FAKE_USER_EMAIL)
                    .await?)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn on_users_change(&self, tenant_id: &str) -> Result<(), AppError> {
        let name = self.client_name(tenant_id).await?;
        self.usage().on_users_change(tenant_id, &name).await
    }
}
