//! Record Store
//!
//! Owns client records and runs filtered, paginated queries. The in-memory
//! implementation keeps rows ordered by id.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use crate::records::model::{Client, ClientCreate, ClientUpdate, SearchFilter};
use crate::records::validation::{digits_only, format_cpf};

// == Record Error ==
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("Client {0} not found")]
    NotFound(i64),

    #[error("CPF already registered: {0}")]
    DuplicateCpf(String),
}

// == Record Store ==
/// Source of truth for client records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Returns one page of matching records and the total match count.
    async fn search(
        &self,
        filter: &SearchFilter,
        page: u32,
        size: u32,
    ) -> Result<(Vec<Client>, u64), RecordError>;

    async fn get(&self, id: i64) -> Result<Option<Client>, RecordError>;

    async fn create(&self, data: ClientCreate) -> Result<Client, RecordError>;

    async fn update(&self, id: i64, data: ClientUpdate) -> Result<Client, RecordError>;

    /// Marks the record inactive.
    async fn soft_delete(&self, id: i64) -> Result<Client, RecordError>;
}

// == In-Memory Store ==
#[derive(Debug)]
struct RecordTable {
    rows: BTreeMap<i64, Client>,
    next_id: i64,
}

/// Record store kept in process memory.
#[derive(Debug)]
pub struct InMemoryRecordStore {
    table: RwLock<RecordTable>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(RecordTable {
                rows: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.table.read().await.rows.is_empty()
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase()))
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// True when `client` satisfies every present predicate of `filter`.
fn matches(client: &Client, filter: &SearchFilter) -> bool {
    if let Some(cpf) = non_blank(&filter.cpf) {
        if !digits_only(&client.cpf).contains(&digits_only(cpf)) {
            return false;
        }
    }
    if let Some(nome) = non_blank(&filter.nome) {
        if !contains_ci(Some(&client.nome_completo), nome) {
            return false;
        }
    }
    if let Some(cidade) = non_blank(&filter.cidade) {
        if !contains_ci(client.cidade.as_deref(), cidade) {
            return false;
        }
    }
    if let Some(uf) = non_blank(&filter.uf) {
        if client.uf.as_deref() != Some(uf.to_uppercase().as_str()) {
            return false;
        }
    }
    if let Some(ativo) = filter.ativo {
        if client.ativo != ativo {
            return false;
        }
    }
    true
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn search(
        &self,
        filter: &SearchFilter,
        page: u32,
        size: u32,
    ) -> Result<(Vec<Client>, u64), RecordError> {
        let table = self.table.read().await;
        let matching: Vec<&Client> = table
            .rows
            .values()
            .filter(|client| matches(client, filter))
            .collect();

        let total = matching.len() as u64;
        let offset = (page.saturating_sub(1) as usize).saturating_mul(size as usize);
        let items = matching
            .into_iter()
            .skip(offset)
            .take(size as usize)
            .cloned()
            .collect();

        debug!("Record search matched {} rows", total);
        Ok((items, total))
    }

    async fn get(&self, id: i64) -> Result<Option<Client>, RecordError> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn create(&self, data: ClientCreate) -> Result<Client, RecordError> {
        let mut table = self.table.write().await;

        let cpf = format_cpf(&data.cpf);
        if table.rows.values().any(|client| client.cpf == cpf) {
            return Err(RecordError::DuplicateCpf(cpf));
        }

        let id = table.next_id;
        table.next_id += 1;

        let client = data.into_client(id, Utc::now());
        table.rows.insert(id, client.clone());
        Ok(client)
    }

    async fn update(&self, id: i64, data: ClientUpdate) -> Result<Client, RecordError> {
        let mut table = self.table.write().await;
        let client = table.rows.get_mut(&id).ok_or(RecordError::NotFound(id))?;

        data.apply_to(client);
        client.updated_at = Some(Utc::now());
        Ok(client.clone())
    }

    async fn soft_delete(&self, id: i64) -> Result<Client, RecordError> {
        let mut table = self.table.write().await;
        let client = table.rows.get_mut(&id).ok_or(RecordError::NotFound(id))?;

        client.ativo = false;
        client.updated_at = Some(Utc::now());
        Ok(client.clone())
    }
}
