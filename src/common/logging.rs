// src/common/logging.rs

use std::collections::BTreeMap;

use axum::http::HeaderMap;

// Cabeçalhos que nunca devem aparecer nos logs em claro
const SECRET_HEADERS: [&str; 3] = ["authorization", "proxy-authorization", "cookie"];

/// Converte os cabeçalhos num mapa legível para o log, com os segredos mascarados.
pub fn redact_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            let key = name.as_str().to_ascii_lowercase();
            let shown = if SECRET_HEADERS.contains(&key.as_str()) {
                "***".to_string()
            } else {
                value.to_str().unwrap_or("<binary>").to_string()
            };
            (key, shown)
        })
        .collect()
}
