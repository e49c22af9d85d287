// src/main.rs

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

use fallball_connector::{app, config::{AppState, Settings}};

const DEFAULT_PORT: u16 = 5000;

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // JSON_LOG=1 para uma linha JSON por evento (agregadores de logs)
    if std::env::var_os("JSON_LOG").is_some() {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt().with_env_filter(filter).with_target(false).compact().init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Carrega o .env se existir
    dotenvy::dotenv().ok();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let config_path = Settings::config_path();
    let settings = Settings::load(&config_path)
        .with_context(|| format!("Falha ao carregar a configuração de {}", config_path.display()))?;
    init_tracing(settings.debug);
    tracing::info!(" * Using CONFIG_FILE={}", config_path.display());

    let app_state = AppState::new(settings).context("Falha ao inicializar o estado da aplicação")?;
    let app = app::router(app_state);

    let port = match std::env::var("CONNECTOR_PORT") {
        Ok(raw) => raw.parse::<u16>().context("CONNECTOR_PORT inválida")?,
        Err(_) => DEFAULT_PORT,
    };

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!("🚀 Conector FallBall a ouvir em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
