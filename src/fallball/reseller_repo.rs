// src/fallball/reseller_repo.rs

use reqwest::Method;
use serde_json::Value;

use crate::{
    fallball::client::{segment, FallballClient, FallballError},
    models::fallball::{Reseller, Storage},
};

// Quota inicial de um revendedor novo
const DEFAULT_RESELLER_STORAGE_LIMIT: i64 = 1_000_000;

// Operações sobre revendedores. Usam sempre o token do serviço.
#[derive(Clone)]
pub struct ResellerRepository {
    client: FallballClient,
}

impl ResellerRepository {
    pub fn new(client: FallballClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, reseller: &Reseller) -> Result<Value, FallballError> {
        let mut body = reseller.clone();
        if body.storage.is_none() {
            body.storage = Some(Storage::with_limit(DEFAULT_RESELLER_STORAGE_LIMIT));
        }
        let body = serde_json::to_value(&body)?;

        self.client
            .send(Method::POST, "resellers", self.client.service_token(), Some(&body))
            .await
    }

    /// Busca o estado atual do revendedor. `None` se ainda não existe (404).
    pub async fn refresh(&self, name: &str) -> Result<Option<Reseller>, FallballError> {
        let path = format!("resellers/{}", segment(name));
        match self
            .client
            .send::<Reseller>(Method::GET, &path, self.client.service_token(), None)
            .await
        {
            Ok(reseller) => Ok(Some(reseller)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn delete(&self, name: &str) -> Result<(), FallballError> {
        let path = format!("resellers/{}", segment(name));
        self.client
            .send::<Value>(Method::DELETE, &path, self.client.service_token(), None)
            .await?;
        Ok(())
    }

    pub async fn all(&self) -> Result<Vec<Reseller>, FallballError> {
        self.client
            .send(Method::GET, "resellers", self.client.service_token(), None)
            .await
    }

    /// Procura o revendedor cujo `rid` é o id da instância da aplicação.
    pub async fn find_name_by_instance(&self, instance_id: &str) -> Result<Option<String>, FallballError> {
        let resellers = self.all().await?;
        Ok(resellers
            .into_iter()
            .find(|r| r.rid.as_deref() == Some(instance_id))
            .map(|r| r.name))
    }
}
