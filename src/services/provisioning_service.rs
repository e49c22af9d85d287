// src/services/provisioning_service.rs

use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::{error, info, warn, Span};

use crate::{
    common::{
        error::AppError,
        naming::{default_admin_email, tenant_name},
    },
    config::AppState,
    fallball::{ClientRepository, FallballError, UserRepository},
    middleware::context::RequestContext,
    models::{
        fallball::{Client, Reseller, Storage, User},
        oa::{scalar_to_string, EventSource, Subscription, LINKED_EVENT, UNLINKED_EVENT},
        tenant::{ProvisioningResult, TenantArgs, STATUS_ACTIVATION_REQUIRED, STATUS_ERROR, STATUS_REPROVISIONED},
    },
    oa::{OaError, PlatformGateway},
};

const ACTIVATION_DATA_CODE: &str = "ActivationData";
const USERS_CHANGE_HANDLER: &str = "onUsersChange";
const USERS_RELATION: &str = "users";
const PROVISIONING_STATUS: &str = "provisioning";

const ADDITIONAL_INFO_TEXT: &str =
    "Please provide additional information to complete provisioning of the FallBall service";
const ADDITIONAL_INFO_TEXT_RU: &str =
    "Пожалуйста, предоставьте дополнительные данные для завершения создания сервиса FallBall";

// ---
// Tabela de erros recuperáveis do FallBall
// ---

/// Uma forma de erro corrigível: o corpo do erro é um objeto com uma única
/// chave, `field`, e o OA deve pedir de novo o campo `property_name`.
#[derive(Debug, Clone)]
pub struct RecoverableShape {
    pub field: String,
    pub property_name: String,
    pub text: String,
    pub text_ru: String,
}

impl RecoverableShape {
    pub fn new(
        field: impl Into<String>,
        property_name: impl Into<String>,
        text: impl Into<String>,
        text_ru: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            property_name: property_name.into(),
            text: text.into(),
            text_ru: text_ru.into(),
        }
    }

    pub fn matches(&self, body: &Value) -> bool {
        body.as_object()
            .is_some_and(|map| map.len() == 1 && map.contains_key(&self.field))
    }

    fn activation_required(&self) -> Value {
        json!({
            "status": STATUS_ACTIVATION_REQUIRED,
            "statusData": {
                "code": ACTIVATION_DATA_CODE,
                "messages": [{
                    "type": "error",
                    "text": ADDITIONAL_INFO_TEXT,
                    "textLocalized": { "ru": ADDITIONAL_INFO_TEXT_RU }
                }],
                "perPropertyData": [{
                    "propertyName": self.property_name,
                    "message": {
                        "text": self.text,
                        "textLocalized": { "ru": self.text_ru }
                    }
                }]
            }
        })
    }
}

/// Lista ordenada; a primeira forma que casar ganha.
#[derive(Debug, Clone)]
pub struct RecoverableErrors {
    shapes: Vec<RecoverableShape>,
}

impl Default for RecoverableErrors {
    fn default() -> Self {
        Self::empty()
            .with_shape(RecoverableShape::new(
                "email",
                "accountinfo.techContact.email",
                "Dots are not allowed in local parts of email addresses",
                "Часть адреса электронной почты до знака @ не должна содержать точек",
            ))
            .with_shape(RecoverableShape::new(
                "postal_code",
                "accountinfo.addressPostal.postalCode",
                "Postal code must be a 5 digit number",
                "Почтовый индекс должен состоять из 5 цифр",
            ))
    }
}

impl RecoverableErrors {
    pub fn empty() -> Self {
        Self { shapes: Vec::new() }
    }

    pub fn with_shape(mut self, shape: RecoverableShape) -> Self {
        self.shapes.push(shape);
        self
    }

    pub fn shapes(&self) -> &[RecoverableShape] {
        &self.shapes
    }

    /// Corpo `activationRequired` para o erro, ou `None` se não é recuperável.
    pub fn analyze(&self, body: &Value) -> Option<Value> {
        self.shapes
            .iter()
            .find(|shape| shape.matches(body))
            .map(RecoverableShape::activation_required)
    }
}

/// Corpo de erro irrecuperável devolvido ao OA.
pub fn report_error(message: impl std::fmt::Display) -> Value {
    json!({
        "status": STATUS_ERROR,
        "statusData": {
            "code": ACTIVATION_DATA_CODE,
            "messages": [{ "type": "error", "text": message.to_string() }],
            "perPropertyData": []
        }
    })
}

// Junta as chaves de `extra` em `target` (os dois têm de ser objetos).
fn merge(target: &mut Value, extra: Value) {
    if let (Some(target), Value::Object(extra)) = (target.as_object_mut(), extra) {
        target.extend(extra);
    }
}

// ---
// O serviço
// ---

#[derive(Clone)]
pub struct ProvisioningService {
    clients: ClientRepository,
    users: UserRepository,
    gateway: PlatformGateway,
    reseller: Reseller,
    recoverable: Arc<RecoverableErrors>,
}

impl ProvisioningService {
    pub fn new(app_state: &AppState, ctx: &RequestContext, gateway: PlatformGateway) -> Self {
        Self {
            clients: ClientRepository::new(app_state.fallball.clone()),
            users: UserRepository::new(app_state.fallball.clone()),
            gateway,
            reseller: ctx.reseller.clone(),
            recoverable: Arc::clone(&app_state.recoverable_errors),
        }
    }

    /// Cria o cliente no FallBall para um tenant do OA.
    ///
    /// Os passos correm em ordem: dados da empresa, criação do cliente,
    /// administrador por omissão e subscrições. Um erro na criação do cliente
    /// não chega aos passos seguintes.
    pub async fn provision(
        &self,
        args: &TenantArgs,
        reprovision: bool,
    ) -> Result<ProvisioningResult, AppError> {
        // 1. A aplicação gere os próprios usuários?
        let user_integration = args.user_integration_enabled();

        // 2. Empresa e e-mail de contacto (o do pedido tem prioridade)
        let company = self.gateway.get_resource(&args.account_id).await?;
        let company_name = company["companyName"].as_str().unwrap_or_default();
        let admin_email = args
            .contact_email()
            .or_else(|| scalar_to_string(&company["techContact"]["email"]));

        let mut info = json!({
            "accountinfo": { "techContact": { "email": admin_email } }
        });

        let subscription = self.gateway.get_resource(&args.subscription_resource_id).await?;
        let subscription_id = scalar_to_string(&subscription["subscriptionId"]).ok_or_else(|| {
            OaError::MalformedResource {
                resource: args.subscription_resource_id.clone(),
                property: "subscriptionId",
            }
        })?;

        // 3. Nome determinístico do cliente e criação no FallBall
        let client_name = tenant_name(company_name, &subscription_id);
        Span::current().record("company", client_name.as_str());

        let client = Client {
            email: admin_email.clone(),
            is_integrated: Some(user_integration),
            storage: Some(Storage::with_limit(args.storage_limit.unwrap_or(0))),
            postal_code: args.postal_code(),
            ..Client::named(client_name.clone())
        };

        // 4. Classificação do erro: recuperável (202) ou não (500)
        if let Err(e) = self.clients.create(&self.reseller, &client).await {
            return Ok(self.classify_failure(e, info));
        }
        info!(client = %client_name, "✅ Cliente criado no FallBall");

        // 5. Administrador sintético quando a aplicação não gere usuários
        if !user_integration {
            self.ensure_default_admin(&client_name).await?;
        }

        // 6. Subscrições para as mudanças de usuários
        for event in [LINKED_EVENT, UNLINKED_EVENT] {
            let subscription = Subscription {
                event: event.to_string(),
                source: EventSource {
                    source_type: args.aps_type.clone(),
                },
                relation: USERS_RELATION.to_string(),
                handler: USERS_CHANGE_HANDLER.to_string(),
            };
            self.gateway.subscribe_on(&args.aps_id, &subscription).await?;
        }

        // 7. Resposta final
        let status = if reprovision { STATUS_REPROVISIONED } else { "" };
        info = json!({
            "tenantId": client_name,
            "status": status,
            "statusData": { "messages": [], "perPropertyData": [] }
        });
        Ok(ProvisioningResult::created(info))
    }

    fn classify_failure(&self, e: FallballError, mut info: Value) -> ProvisioningResult {
        if let FallballError::Client { status, body } = &e {
            if let Some(data) = e.body_json().and_then(|json| self.recoverable.analyze(&json)) {
                warn!(%status, body = %body, "⚠️ Erro recuperável do FallBall, a pedir dados ao OA");
                merge(&mut info, data);
                return ProvisioningResult::accepted(info);
            }
            error!(%status, body = %body, "❌ FallBall recusou a criação do cliente");
            return ProvisioningResult::failed(report_error(body));
        }

        error!("❌ Falha ao criar o cliente no FallBall: {}", e);
        ProvisioningResult::failed(report_error(e.message()))
    }

    async fn ensure_default_admin(&self, client_name: &str) -> Result<(), AppError> {
        let admin = User {
            admin: Some(true),
            storage: Some(Storage::with_limit(0)),
            ..User::new(default_admin_email(client_name, &self.reseller.name))
        };

        match self.users.create(&self.reseller, client_name, &admin).await {
            Ok(()) => Ok(()),
            // Já existe de um provisionamento anterior: atualiza no lugar.
            Err(FallballError::Client { .. }) => {
                self.users.update(&self.reseller, client_name, &admin).await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Repete o provisionamento de um tenant ainda em `provisioning` e publica
    /// o resultado no recurso do tenant no OA.
    pub async fn reprovision(&self, tenant_id: &str, args: &TenantArgs) -> Result<(), AppError> {
        let tenant = self.gateway.get_resource(tenant_id).await?;
        let aps_status = tenant["aps"]["status"].as_str().unwrap_or_default();
        let still_provisioning =
            aps_status.strip_prefix("aps:").unwrap_or(aps_status) == PROVISIONING_STATUS;

        if !still_provisioning || tenant["status"].as_str() == Some(STATUS_REPROVISIONED) {
            warn!(tenant_id, aps_status, "🚫 Reprovisionamento recusado");
            return Err(AppError::BadRequest(
                "Cannot provision already provisioned client".to_string(),
            ));
        }

        let result = self.provision(args, true).await?;

        let body = if result.is_created() {
            let mut body = json!({
                "accountinfo": args.account_info,
                "status": STATUS_REPROVISIONED,
                "statusData": Value::Object(Map::new()),
            });
            merge(&mut body, result.body);
            body
        } else {
            result.body
        };

        self.gateway.update_tenant(tenant_id, &body).await?;
        Ok(())
    }
}
