// src/fallball/client_repo.rs

use reqwest::Method;
use serde_json::Value;

use crate::{
    fallball::client::{segment, FallballClient, FallballError},
    models::fallball::{Client, Reseller, Storage},
};

// Operações sobre clientes de um revendedor (token do revendedor)
#[derive(Clone)]
pub struct ClientRepository {
    client: FallballClient,
}

fn token(reseller: &Reseller) -> &str {
    reseller.token.as_deref().unwrap_or_default()
}

fn clients_path(reseller: &Reseller) -> String {
    format!("resellers/{}/clients", segment(&reseller.name))
}

fn client_path(reseller: &Reseller, name: &str) -> String {
    format!("{}/{}", clients_path(reseller), segment(name))
}

impl ClientRepository {
    pub fn new(client: FallballClient) -> Self {
        Self { client }
    }

    /// Cria o cliente. Sem quota informada, a quota é zero.
    pub async fn create(&self, reseller: &Reseller, client: &Client) -> Result<(), FallballError> {
        let mut body = client.clone();
        if body.storage.is_none() {
            body.storage = Some(Storage::with_limit(0));
        }
        let body = serde_json::to_value(&body)?;

        self.client
            .send::<Value>(Method::POST, &clients_path(reseller), token(reseller), Some(&body))
            .await?;
        Ok(())
    }

    pub async fn get(&self, reseller: &Reseller, name: &str) -> Result<Client, FallballError> {
        self.client
            .send(Method::GET, &client_path(reseller, name), token(reseller), None)
            .await
    }

    pub async fn update(&self, reseller: &Reseller, client: &Client) -> Result<(), FallballError> {
        let body = serde_json::to_value(client)?;
        self.client
            .send::<Value>(
                Method::PUT,
                &client_path(reseller, &client.name),
                token(reseller),
                Some(&body),
            )
            .await?;
        Ok(())
    }

    pub async fn delete(&self, reseller: &Reseller, name: &str) -> Result<(), FallballError> {
        self.client
            .send::<Value>(Method::DELETE, &client_path(reseller, name), token(reseller), None)
            .await?;
        Ok(())
    }
}
