// src/fallball/user_repo.rs

use reqwest::Method;
use serde_json::Value;

use crate::{
    common::naming::user_id_for_email,
    fallball::client::{segment, FallballClient, FallballError},
    models::fallball::{Reseller, Storage, User},
};

const DEFAULT_PASSWORD: &str = "password";
const DEFAULT_USER_STORAGE_LIMIT: i64 = 2;

// Operações sobre usuários de um cliente. O usuário é endereçado pelo id
// derivado do e-mail, por isso o mesmo e-mail chega sempre à mesma conta.
#[derive(Clone)]
pub struct UserRepository {
    client: FallballClient,
}

fn token(reseller: &Reseller) -> &str {
    reseller.token.as_deref().unwrap_or_default()
}

fn users_path(reseller: &Reseller, client_name: &str) -> String {
    format!(
        "resellers/{}/clients/{}/users",
        segment(&reseller.name),
        segment(client_name)
    )
}

fn user_path(reseller: &Reseller, client_name: &str, email: &str) -> String {
    format!(
        "{}/{}",
        users_path(reseller, client_name),
        user_id_for_email(email)
    )
}

// O link de login vem como string JSON; aceitamos também texto simples.
fn as_link(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

impl UserRepository {
    pub fn new(client: FallballClient) -> Self {
        Self { client }
    }

    pub async fn create(
        &self,
        reseller: &Reseller,
        client_name: &str,
        user: &User,
    ) -> Result<(), FallballError> {
        let mut body = user.clone();
        body.user_id = Some(user_id_for_email(&user.email));
        if body.storage.is_none() {
            body.storage = Some(Storage::with_limit(DEFAULT_USER_STORAGE_LIMIT));
        }
        if body.password.is_none() {
            body.password = Some(DEFAULT_PASSWORD.to_string());
        }
        let body = serde_json::to_value(&body)?;

        self.client
            .send::<Value>(
                Method::POST,
                &users_path(reseller, client_name),
                token(reseller),
                Some(&body),
            )
            .await?;
        Ok(())
    }

    pub async fn get(
        &self,
        reseller: &Reseller,
        client_name: &str,
        email: &str,
    ) -> Result<User, FallballError> {
        self.client
            .send(Method::GET, &user_path(reseller, client_name, email), token(reseller), None)
            .await
    }

    /// Atualiza o usuário. A senha nunca é reenviada.
    pub async fn update(
        &self,
        reseller: &Reseller,
        client_name: &str,
        user: &User,
    ) -> Result<(), FallballError> {
        let mut body = user.clone();
        body.password = None;
        body.user_id = Some(user_id_for_email(&user.email));
        let body = serde_json::to_value(&body)?;

        self.client
            .send::<Value>(
                Method::PUT,
                &user_path(reseller, client_name, &user.email),
                token(reseller),
                Some(&body),
            )
            .await?;
        Ok(())
    }

    pub async fn delete(
        &self,
        reseller: &Reseller,
        client_name: &str,
        email: &str,
    ) -> Result<(), FallballError> {
        self.client
            .send::<Value>(
                Method::DELETE,
                &user_path(reseller, client_name, email),
                token(reseller),
                None,
            )
            .await?;
        Ok(())
    }

    pub async fn token(
        &self,
        reseller: &Reseller,
        client_name: &str,
        email: &str,
    ) -> Result<Value, FallballError> {
        let path = format!("{}/token", user_path(reseller, client_name, email));
        self.client.send(Method::GET, &path, token(reseller), None).await
    }

    pub async fn login_link(
        &self,
        reseller: &Reseller,
        client_name: &str,
        email: &str,
    ) -> Result<String, FallballError> {
        let path = format!("{}/link", user_path(reseller, client_name, email));
        let value: Value = self.client.send(Method::GET, &path, token(reseller), None).await?;
        Ok(as_link(value))
    }
}
