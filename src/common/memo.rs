// src/common/memo.rs

use std::{future::Future, hash::Hash, sync::Arc};

use moka::future::Cache;

// Limite de segurança; o número de chaves é o de tenants vistos pelo processo
const MAX_ENTRIES: u64 = 10_000;

/// Cache chave -> valor para buscas puras, vivo durante o processo.
///
/// Pedidos concorrentes para a mesma chave esperam pelo mesmo cálculo.
/// Só resultados de sucesso são guardados.
pub struct Memo<K, V> {
    cache: Cache<K, V>,
}

impl<K, V> Clone for Memo<K, V> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
        }
    }
}

impl<K, V> Default for Memo<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self {
            cache: Cache::builder().max_capacity(MAX_ENTRIES).build(),
        }
    }
}

impl<K, V> Memo<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        self.cache.get(key).await
    }

    pub async fn insert(&self, key: K, value: V) {
        self.cache.insert(key, value).await;
    }

    /// Devolve o valor em cache ou calcula-o com `compute`. Erros não ficam em cache.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: Clone + Send + Sync + 'static,
    {
        self.cache
            .try_get_with(key, compute())
            .await
            .map_err(|e: Arc<E>| E::clone(&e))
    }
}
