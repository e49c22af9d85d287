// src/common/naming.rs

//! Derivação determinística de nomes.
//!
//! O conector não guarda estado próprio: o mesmo pedido de provisionamento
//! tem de chegar sempre ao mesmo nome de cliente no FallBall, e o mesmo
//! e-mail tem de chegar sempre ao mesmo id de usuário.

use uuid::Uuid;

const UNNAMED_COMPANY: &str = "unnamed";

/// Remove pontuação e troca cada sequência de espaços por um hífen.
pub fn urlify(data: &str) -> String {
    let kept: String = data
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join("-")
}

/// `urlify` em minúsculas. É a forma usada nos nomes de clientes.
pub fn slug(data: &str) -> String {
    urlify(data).to_lowercase()
}

/// Deixa apenas caracteres válidos num nome de domínio e apara hífens nas pontas.
pub fn escape_domain_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                c
            } else {
                '-'
            }
        })
        .collect();
    replaced.trim_matches('-').to_string()
}

/// Nome do cliente no FallBall: `slug(empresa)-sub<id da subscrição>`.
pub fn tenant_name(company_name: &str, subscription_id: &str) -> String {
    let company = slug(company_name);
    let company = if company.is_empty() {
        UNNAMED_COMPANY.to_string()
    } else {
        company
    };
    format!("{}-sub{}", company, subscription_id)
}

/// E-mail do administrador sintético criado quando a aplicação não gere os seus usuários.
pub fn default_admin_email(client_name: &str, reseller_name: &str) -> String {
    format!(
        "admin@{}.{}.fallball.io",
        escape_domain_name(client_name),
        escape_domain_name(reseller_name)
    )
}

/// Id estável de usuário: UUID v5 (hash SHA-1) do e-mail normalizado.
pub fn user_id_for_email(email: &str) -> String {
    let normalized = email.trim().to_ascii_lowercase();
    Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("mailto:{}", normalized).as_bytes())
        .to_string()
}

/// Nome para um revendedor novo (instalação nova da aplicação).
pub fn generate_reseller_name() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("reseller-{}", &suffix[..12])
}
