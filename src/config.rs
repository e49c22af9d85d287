// src/config.rs

use std::{
    env,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::{
    common::memo::Memo,
    fallball::FallballClient,
    services::provisioning_service::RecoverableErrors,
};

// Valores do arquivo de exemplo que têm de ser trocados antes de arrancar
const PLACEHOLDER_PREFIX: &str = "PUT_HERE_";
const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Falha ao ler o arquivo de configuração: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuração inválida: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("You can't run your connector with default parameters, please replace the {0} value with a real one")]
    Placeholder(&'static str),
}

fn default_user_limit() -> i64 {
    10
}

fn default_gold_user_limit() -> i64 {
    20
}

fn default_request_timeout_secs() -> u64 {
    50
}

fn default_oa_retry_attempts() -> u32 {
    10
}

fn config_path_from(value: Option<String>) -> PathBuf {
    PathBuf::from(
        value
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string()),
    )
}

// As configurações carregadas uma vez no arranque
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub debug: bool,
    pub fallball_service_url: String,
    pub fallball_service_authorization_token: String,
    pub oauth_key: String,
    pub oauth_secret: String,

    // Nomes dos recursos (contadores) tal como declarados no pacote da aplicação
    pub diskspace_resource: String,
    pub devices_resource: String,
    pub users_resource: String,
    #[serde(default)]
    pub gold_users_resource: String,

    #[serde(default = "default_user_limit")]
    pub default_user_limit: i64,
    #[serde(default = "default_gold_user_limit")]
    pub gold_user_limit: i64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_oa_retry_attempts")]
    pub oa_retry_attempts: u32,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Caminho do arquivo de configuração: `CONFIG_PATH` ou `config.json`.
    pub fn config_path() -> PathBuf {
        config_path_from(env::var("CONFIG_PATH").ok())
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(raw)?;
        settings.check_configuration()?;
        Ok(settings)
    }

    /// Falha se algum valor ainda for o placeholder `PUT_HERE_*`.
    pub fn check_configuration(&self) -> Result<(), ConfigError> {
        let values: [(&'static str, &str); 8] = [
            ("fallball_service_url", &self.fallball_service_url),
            (
                "fallball_service_authorization_token",
                &self.fallball_service_authorization_token,
            ),
            ("oauth_key", &self.oauth_key),
            ("oauth_secret", &self.oauth_secret),
            ("diskspace_resource", &self.diskspace_resource),
            ("devices_resource", &self.devices_resource),
            ("users_resource", &self.users_resource),
            ("gold_users_resource", &self.gold_users_resource),
        ];

        match values.iter().find(|(_, v)| v.starts_with(PLACEHOLDER_PREFIX)) {
            Some((key, _)) => Err(ConfigError::Placeholder(*key)),
            None => Ok(()),
        }
    }

    pub fn resources(&self) -> ResourceNames {
        ResourceNames {
            diskspace: self.diskspace_resource.clone(),
            devices: self.devices_resource.clone(),
            users: self.users_resource.clone(),
            gold_users: Some(self.gold_users_resource.clone()).filter(|r| !r.is_empty()),
        }
    }

    /// Quota de disco de um usuário conforme a classe (nome do recurso no OA).
    pub fn user_limit_for(&self, user_resource: Option<&str>) -> i64 {
        match user_resource {
            Some(r) if !self.gold_users_resource.is_empty() && r == self.gold_users_resource => {
                self.gold_user_limit
            }
            _ => self.default_user_limit,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// ---
// Contadores: chave lógica -> nome no fio
// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterKey {
    Diskspace,
    Devices,
    Users,
    GoldUsers,
}

impl CounterKey {
    /// Classe de usuário no FallBall (`profile_type` / `users_by_type`) para os contadores de usuários.
    pub fn profile_type(self) -> Option<&'static str> {
        match self {
            CounterKey::Users => Some("default"),
            CounterKey::GoldUsers => Some("gold"),
            CounterKey::Diskspace | CounterKey::Devices => None,
        }
    }
}

pub const USER_COUNTERS: [CounterKey; 2] = [CounterKey::Users, CounterKey::GoldUsers];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNames {
    pub diskspace: String,
    pub devices: String,
    pub users: String,
    pub gold_users: Option<String>,
}

impl ResourceNames {
    pub fn wire(&self, key: CounterKey) -> Option<&str> {
        match key {
            CounterKey::Diskspace => Some(self.diskspace.as_str()),
            CounterKey::Devices => Some(self.devices.as_str()),
            CounterKey::Users => Some(self.users.as_str()),
            CounterKey::GoldUsers => self.gold_users.as_deref(),
        }
    }

    /// Classe do usuário para um nome de recurso recebido do OA (`None` se desconhecido).
    pub fn profile_for(&self, user_resource: &str) -> Option<&'static str> {
        USER_COUNTERS
            .into_iter()
            .find(|key| self.wire(*key) == Some(user_resource))
            .and_then(CounterKey::profile_type)
    }
}

// ---
// Caches do processo (nunca partilhados entre processos)
// ---

#[derive(Clone, Default)]
pub struct Caches {
    // Aps-Instance-Id -> nome do revendedor
    pub reseller_names: Memo<String, String>,
    // id do tenant no OA -> nome do cliente no FallBall
    pub tenant_names: Memo<String, String>,
    // URI do controlador -> id do gestor de notificações
    pub notification_managers: Memo<String, String>,
    pub application_schemas: Memo<String, Value>,
    pub user_schemas: Memo<String, Value>,
}

// O estado partilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub http: reqwest::Client,
    pub fallball: FallballClient,
    pub caches: Caches,
    pub recoverable_errors: Arc<RecoverableErrors>,
}

impl AppState {
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()?;

        let fallball = FallballClient::new(
            http.clone(),
            &settings.fallball_service_url,
            &settings.fallball_service_authorization_token,
        );

        tracing::info!("✅ Cliente FallBall configurado para {}", settings.fallball_service_url);

        Ok(Self {
            settings: Arc::new(settings),
            http,
            fallball,
            caches: Caches::default(),
            recoverable_errors: Arc::new(RecoverableErrors::default()),
        })
    }

    pub fn with_recoverable_errors(mut self, table: RecoverableErrors) -> Self {
        self.recoverable_errors = Arc::new(table);
        self
    }
}
