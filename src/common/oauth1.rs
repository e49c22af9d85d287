// src/common/oauth1.rs

//! Assinatura OAuth 1.0a (HMAC-SHA1), só na variante de dois pés usada pelo
//! controlador OA: chave de consumidor + segredo, sem token.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use reqwest::Url;
use sha1::Sha1;
use uuid::Uuid;

type HmacSha1 = Hmac<Sha1>;

pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
}

impl OAuthCredentials {
    pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
        }
    }
}

/// Percent-encoding da RFC 3986 (só `A-Z a-z 0-9 - . _ ~` ficam como estão).
pub fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

fn base_url(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}://{}:{}{}", url.scheme(), host, port, url.path()),
        None => format!("{}://{}{}", url.scheme(), host, url.path()),
    }
}

/// Monta a "signature base string": MÉTODO & url-base & parâmetros normalizados.
/// `oauth_params` não deve conter `oauth_signature` nem `realm`.
pub fn signature_base_string(method: &str, url: &Url, oauth_params: &BTreeMap<String, String>) -> String {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (encode(&k), encode(&v)))
        .chain(oauth_params.iter().map(|(k, v)| (encode(k), encode(v))))
        .collect();
    params.sort();

    let normalized = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(&base_url(url)),
        encode(&normalized)
    )
}

fn signing_mac(consumer_secret: &str) -> HmacSha1 {
    // Sem token: a chave termina no '&'.
    let key = format!("{}&", encode(consumer_secret));
    HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC aceita chaves de qualquer tamanho")
}

pub fn sign(base_string: &str, consumer_secret: &str) -> String {
    let mut mac = signing_mac(consumer_secret);
    mac.update(base_string.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Gera o valor completo do cabeçalho `Authorization: OAuth ...` para um pedido de saída.
pub fn authorization_header(method: &str, url: &Url, credentials: &OAuthCredentials) -> String {
    let timestamp = chrono::Utc::now().timestamp().to_string();
    let nonce = Uuid::new_v4().simple().to_string();
    authorization_header_with(method, url, credentials, &timestamp, &nonce)
}

pub fn authorization_header_with(
    method: &str,
    url: &Url,
    credentials: &OAuthCredentials,
    timestamp: &str,
    nonce: &str,
) -> String {
    let mut params = BTreeMap::new();
    params.insert("oauth_consumer_key".to_string(), credentials.consumer_key.clone());
    params.insert("oauth_nonce".to_string(), nonce.to_string());
    params.insert("oauth_signature_method".to_string(), SIGNATURE_METHOD.to_string());
    params.insert("oauth_timestamp".to_string(), timestamp.to_string());
    params.insert("oauth_version".to_string(), "1.0".to_string());

    let base = signature_base_string(method, url, &params);
    params.insert(
        "oauth_signature".to_string(),
        sign(&base, &credentials.consumer_secret),
    );

    let fields = params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("OAuth {}", fields)
}

/// Lê os parâmetros de um cabeçalho `OAuth k="v", ...`. Devolve `None` se não for OAuth.
pub fn parse_authorization_header(value: &str) -> Option<BTreeMap<String, String>> {
    let rest = value.trim().strip_prefix("OAuth")?.trim_start();
    let mut params = BTreeMap::new();

    for part in rest.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (key, raw) = part.split_once('=')?;
        let raw = raw.trim().trim_matches('"');
        let decoded = urlencoding::decode(raw).ok()?.into_owned();
        params.insert(key.trim().to_string(), decoded);
    }

    Some(params)
}

/// Chave de consumidor indicada no cabeçalho, se houver.
pub fn client_key(authorization: &str) -> Option<String> {
    parse_authorization_header(authorization)?
        .remove("oauth_consumer_key")
        .filter(|k| !k.is_empty())
}

/// Valida a assinatura de um pedido recebido. Nonce e timestamp não são verificados.
pub fn verify_request(
    method: &str,
    url: &Url,
    authorization: &str,
    credentials: &OAuthCredentials,
) -> bool {
    let Some(mut params) = parse_authorization_header(authorization) else {
        return false;
    };

    if params.get("oauth_consumer_key") != Some(&credentials.consumer_key) {
        return false;
    }
    if params
        .get("oauth_signature_method")
        .is_some_and(|m| m != SIGNATURE_METHOD)
    {
        return false;
    }

    let Some(signature) = params.remove("oauth_signature") else {
        return false;
    };
    params.remove("realm");

    let Ok(expected) = STANDARD.decode(signature.as_bytes()) else {
        return false;
    };

    let base = signature_base_string(method, url, &params);
    let mut mac = signing_mac(&credentials.consumer_secret);
    mac.update(base.as_bytes());
    mac.verify_slice(&expected).is_ok()
}
