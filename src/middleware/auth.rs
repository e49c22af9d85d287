// src/middleware/auth.rs

use axum::{
    body::{to_bytes, Body},
    extract::{OriginalUri, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use reqwest::Url;
use tracing::{debug, field, info_span, warn, Instrument, Span};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        logging::redact_headers,
        naming::generate_reseller_name,
        oauth1::{client_key, verify_request, OAuthCredentials},
    },
    config::AppState,
    fallball::ResellerRepository,
    middleware::context::{RequestContext, PHASE_SYNC},
    models::fallball::Reseller,
};

const INSTANCE_ID_HEADER: &str = "aps-instance-id";
const CONTROLLER_URI_HEADER: &str = "aps-controller-uri";
const TRANSACTION_ID_HEADER: &str = "aps-transaction-id";
const IDENTITY_ID_HEADER: &str = "aps-identity-id";
const REQUEST_PHASE_HEADER: &str = "aps-request-phase";
const FORWARDED_PROTO_HEADER: &str = "x-forwarded-proto";

// Limite do corpo lido para o log de entrada
const MAX_LOGGED_BODY: usize = 2 * 1024 * 1024;

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Guard das rotas normais: o revendedor tem de existir e ter token.
pub async fn reseller_guard(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    guarded(app_state, request, next, false).await
}

/// Guard do `POST /app`: o revendedor ainda não existe e recebe um nome novo.
pub async fn new_reseller_guard(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    guarded(app_state, request, next, true).await
}

async fn guarded(app_state: AppState, request: Request, next: Next, is_new: bool) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let span = info_span!(
        "request",
        request_id = %request_id,
        reseller = field::Empty,
        company = field::Empty
    );

    async move {
        let request = match authenticate(&app_state, request, request_id, is_new).await {
            Ok(request) => request,
            Err(e) => return e.into_response(),
        };

        let response = next.run(request).await;
        debug!(
            status = %response.status(),
            headers = ?redact_headers(response.headers()),
            "⬅️ Resposta enviada"
        );
        response
    }
    .instrument(span)
    .await
}

// URL usado na verificação da assinatura: o mesmo que o OA assinou.
fn signed_url(request: &Request) -> Option<Url> {
    let headers = request.headers();
    let scheme = header_value(headers, FORWARDED_PROTO_HEADER).unwrap_or_else(|| "http".to_string());
    let host = header_value(headers, header::HOST.as_str())
        .or_else(|| request.uri().authority().map(|a| a.to_string()))?;
    let uri = request
        .extensions()
        .get::<OriginalUri>()
        .map(|o| o.0.clone())
        .unwrap_or_else(|| request.uri().clone());
    let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");

    Url::parse(&format!("{}://{}{}", scheme, host, path)).ok()
}

async fn resolve_reseller_name(
    app_state: &AppState,
    instance_id: &str,
) -> Result<Option<String>, AppError> {
    let key = instance_id.to_string();
    if let Some(name) = app_state.caches.reseller_names.get(&key).await {
        return Ok(Some(name));
    }

    let repo = ResellerRepository::new(app_state.fallball.clone());
    let name = repo.find_name_by_instance(instance_id).await?;
    // Só guardamos quando encontramos: um revendedor criado depois tem de ser visto.
    if let Some(name) = &name {
        app_state.caches.reseller_names.insert(key, name.clone()).await;
    }
    Ok(name)
}

async fn authenticate(
    app_state: &AppState,
    request: Request,
    request_id: String,
    is_new: bool,
) -> Result<Request, AppError> {
    // 1. Log do pedido de entrada (com o corpo, que depois é reposto)
    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, MAX_LOGGED_BODY)
        .await
        .map_err(|e| AppError::BadRequest(format!("Corpo do pedido ilegível: {}", e)))?;
    debug!(
        method = %parts.method,
        uri = %parts.uri,
        headers = ?redact_headers(&parts.headers),
        body = %String::from_utf8_lossy(&bytes),
        "➡️ Pedido recebido"
    );
    let mut request = Request::from_parts(parts, Body::from(bytes));

    // 2. Quem é o revendedor?
    let headers = request.headers().clone();
    let instance_id = header_value(&headers, INSTANCE_ID_HEADER);
    let Some(instance) = instance_id.as_deref() else {
        warn!("Pedido sem Aps-Instance-Id");
        return Err(AppError::Unauthorized);
    };

    let reseller_name = if is_new {
        Some(generate_reseller_name())
    } else {
        resolve_reseller_name(app_state, instance).await?
    };
    let Some(reseller_name) = reseller_name else {
        warn!(instance_id = %instance, "Nenhum revendedor para esta instância");
        return Err(AppError::Unauthorized);
    };
    Span::current().record("reseller", reseller_name.as_str());

    // 3. Assinatura OAuth
    let authorization = header_value(&headers, header::AUTHORIZATION.as_str()).unwrap_or_default();
    let settings = &app_state.settings;
    let inbound = OAuthCredentials::new(settings.oauth_key.clone(), settings.oauth_secret.clone());
    let url = signed_url(&request).ok_or(AppError::Unauthorized)?;

    if !verify_request(request.method().as_str(), &url, &authorization, &inbound) {
        warn!(url = %url, "🚫 Assinatura OAuth inválida");
        return Err(AppError::Unauthorized);
    }
    let oauth = client_key(&authorization)
        .map(|key| OAuthCredentials::new(key, settings.oauth_secret.clone()));

    // 4. Estado atual do revendedor no FallBall
    let repo = ResellerRepository::new(app_state.fallball.clone());
    let mut reseller = match repo.refresh(&reseller_name).await? {
        Some(existing) => existing,
        None => Reseller::new(reseller_name.clone(), None),
    };
    if reseller.rid.is_none() {
        reseller.rid = instance_id.clone();
    }

    if !reseller.has_token() && !is_new {
        warn!(reseller = %reseller_name, "🚫 Revendedor sem token");
        return Err(AppError::Forbidden);
    }

    let context = RequestContext {
        request_id,
        reseller,
        is_new_reseller: is_new,
        instance_id,
        controller_uri: header_value(&headers, CONTROLLER_URI_HEADER),
        transaction_id: header_value(&headers, TRANSACTION_ID_HEADER),
        identity_id: header_value(&headers, IDENTITY_ID_HEADER),
        phase: header_value(&headers, REQUEST_PHASE_HEADER).unwrap_or_else(|| PHASE_SYNC.to_string()),
        oauth,
    };
    request.extensions_mut().insert(context);

    Ok(request)
}
