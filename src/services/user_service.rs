// src/services/user_service.rs

use serde_json::Value;
use tracing::info;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    fallball::{ClientRepository, UserRepository},
    middleware::context::RequestContext,
    models::{
        fallball::{Client, Reseller, Storage, User},
        oa::{aps_id, scalar_to_string, Notification},
        user::{CreateUserPayload, UpdateUserPayload},
    },
    oa::{OaError, PlatformGateway},
    services::{tenant_service::client_name_for_tenant, usage_service::UsageService},
};

const DEFAULT_PROFILE: &str = "default";

fn user_link(oa_user_id: &str) -> String {
    format!("/v/pa/ccp-users/viewUser/r/{}", oa_user_id)
}

fn required_str(resource: &Value, pointer: &str, resource_id: &str, property: &'static str) -> Result<String, OaError> {
    resource
        .pointer(pointer)
        .and_then(scalar_to_string)
        .ok_or_else(|| OaError::MalformedResource {
            resource: resource_id.to_string(),
            property,
        })
}

// O serviço de usuário no OA aponta para o tenant e para o e-mail do usuário.
struct FallballUserRef {
    client_name: String,
    email: String,
}

#[derive(Clone)]
pub struct UserService {
    app_state: AppState,
    ctx: RequestContext,
    gateway: PlatformGateway,
    clients: ClientRepository,
    users: UserRepository,
}

impl UserService {
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

    // Cliente sem quota de disco: os usuários também ficam com zero.
    fn storage_limit(&self, client: &Client, user_resource: Option<&str>) -> i64 {
        if client.storage_limit() == Some(0) {
            0
        } else {
            self.app_state.settings.user_limit_for(user_resource)
        }
    }

    fn profile_for(&self, user_resource: Option<&str>) -> Option<&'static str> {
        user_resource.and_then(|r| self.app_state.settings.resources().profile_for(r))
    }

    async fn notify(&self, oa_user: &Value, message: &str, details: String) -> Result<(), AppError> {
        let Some(oa_user_id) = aps_id(oa_user) else {
            return Ok(());
        };
        let notification = Notification::ready(message)
            .with_details(details)
            .for_user(oa_user_id.clone())
            .with_link(user_link(&oa_user_id));
        self.gateway.send_notification(notification).await?;
        Ok(())
    }

    async fn linked_one(&self, user_id: &str, relation: &'static str) -> Result<Value, AppError> {
        let linked = self.gateway.get_linked_resources(user_id, relation).await?;
        linked.into_iter().next().ok_or_else(|| {
            AppError::from(OaError::MalformedResource {
                resource: user_id.to_string(),
                property: relation,
            })
        })
    }

    async fn resolve(&self, user_id: &str) -> Result<FallballUserRef, AppError> {
        let service = self.gateway.get_resource(user_id).await?;
        let tenant_id = required_str(&service, "/tenant/aps/id", user_id, "tenant")?;
        let email = required_str(&service, "/userId", user_id, "userId")?;
        let client_name = client_name_for_tenant(&self.app_state.caches, &self.gateway, &tenant_id).await?;
        Ok(FallballUserRef { client_name, email })
    }

    /// POST /user: cria o usuário no FallBall e devolve o e-mail.
    pub async fn create(&self, payload: &CreateUserPayload) -> Result<String, AppError> {
        payload.validate()?;
        let tenant_id = payload
            .tenant_id()
            .ok_or_else(|| AppError::missing("Missing tenant in request"))?;
        let user_id = payload
            .user_id()
            .ok_or_else(|| AppError::missing("Missing aps.id in request"))?;
        let user_resource = payload.resource.as_deref();

        // 1. Cliente dono do usuário
        let client_name = client_name_for_tenant(&self.app_state.caches, &self.gateway, tenant_id).await?;
        let client = self.clients.get(self.reseller(), &client_name).await?;
        let limit = self.storage_limit(&client, user_resource);

        // 2. Dados do usuário no OA
        let oa_user = self.gateway.get_resource(user_id).await?;
        let email = required_str(&oa_user, "/email", user_id, "email")?;

        let user = User {
            admin: Some(oa_user["isAccountAdmin"].as_bool().unwrap_or(false)),
            storage: Some(Storage::with_limit(limit)),
            profile_type: Some(self.profile_for(user_resource).unwrap_or(DEFAULT_PROFILE).to_string()),
            ..User::new(email.clone())
        };
        self.users.create(self.reseller(), &client_name, &user).await?;
        info!(client = %client_name, "👤 Usuário criado no FallBall");

        // 3. Aviso no painel
        let display_name = oa_user["displayName"].as_str().unwrap_or(&email).to_string();
        self.notify(
            &oa_user,
            "Fallball assigned to user",
            format!("Fallball was assigned to {}", display_name),
        )
        .await?;

        Ok(email)
    }

    /// PUT /user/{id}: recalcula quota e classe; se a classe mudou, sincroniza o uso do tenant.
    pub async fn update(&self, user_id: &str, payload: &UpdateUserPayload) -> Result<(), AppError> {
        let user_ref = self.resolve(user_id).await?;
        let user_resource = payload.resource.as_deref();

        let mut user = self
            .users
            .get(self.reseller(), &user_ref.client_name, &user_ref.email)
            .await?;
        let client = self.clients.get(self.reseller(), &user_ref.client_name).await?;

        user.storage = Some(Storage::with_limit(self.storage_limit(&client, user_resource)));
        let profile = self.profile_for(user_resource);
        if let Some(profile) = profile {
            user.profile_type = Some(profile.to_string());
        }

        let oa_user = self.linked_one(user_id, "user").await?;
        let oa_tenant = self.linked_one(user_id, "tenant").await?;
        let oa_tenant_id = required_str(&oa_tenant, "/aps/id", user_id, "tenant")?;

        self.users.update(self.reseller(), &user_ref.client_name, &user).await?;

        if profile.is_some() {
            UsageService::new(&self.app_state, &self.ctx, self.gateway.clone())
                .sync(&oa_tenant_id, &user_ref.client_name)
                .await?;
        }

        let display_name = oa_user["displayName"].as_str().unwrap_or(&user_ref.email).to_string();
        self.notify(
            &oa_user,
            "Fallball was modified for user",
            format!("Fallball service was modified for {}", display_name),
        )
        .await
    }

    pub async fn delete(&self, user_id: &str) -> Result<(), AppError> {
        let user_ref = self.resolve(user_id).await?;
        let oa_user = self.linked_one(user_id, "user").await?;

        self.users
            .delete(self.reseller(), &user_ref.client_name, &user_ref.email)
            .await?;
        info!(client = %user_ref.client_name, "🗑️ Usuário removido do FallBall");

        let display_name = oa_user["displayName"].as_str().unwrap_or(&user_ref.email).to_string();
        self.notify(
            &oa_user,
            "Fallball unassigned from user",
            format!("Fallball service was unassigned from {}", display_name),
        )
        .await
    }

    pub async fn login_link(&self, user_id: &str) -> Result<String, AppError> {
        let user_ref = self.resolve(user_id).await?;
        Ok(self
            .users
            .login_link(self.reseller(), &user_ref.client_name, &user_ref.email)
            .await?)
    }
}
