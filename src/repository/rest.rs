//! Remote Row API Backend
//!
//! Talks to a PostgREST-style endpoint (`{url}/rest/v1/{table}`) with the
//! project's anon key and, when signed in, the user's access token.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use std::sync::RwLock;
use std::time::Duration;

use super::query::{value_text, Clause, Filter, Order, Row};
use super::traits::PersistenceService;
use crate::config::RemoteConfig;
use crate::error::{PersistenceError, PersistenceResult};

/// HTTP implementation of [`PersistenceService`]
pub struct RestPersistence {
    client: Client,
    base_url: String,
    anon_key: String,
    access_token: RwLock<Option<String>>,
}

impl RestPersistence {
    pub fn new(config: &RemoteConfig) -> PersistenceResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            access_token: RwLock::new(config.access_token.clone()),
        })
    }

    /// Bearer token for the next request: the user's token, else the anon key
    fn bearer(&self) -> String {
        let token = match self.access_token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        token.unwrap_or_else(|| self.anon_key.clone())
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer())
            .header("Prefer", "return=representation")
    }
}

/// Query-string pairs for a filter and optional ordering
pub fn query_params(filter: &Filter, order: Option<&Order>) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    for clause in filter.clauses() {
        let condition = match clause {
            Clause::Eq { value, .. } => format!("eq.{}", value_text(value)),
            Clause::In { values, .. } => {
                let list: Vec<String> = values.iter().map(quote_list_item).collect();
                format!("in.({})", list.join(","))
            }
        };
        params.push((clause.column().to_string(), condition));
    }
    if let Some(order) = order {
        let direction = if order.ascending { "asc" } else { "desc" };
        params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
    }
    params
}

fn quote_list_item(value: &serde_json::Value) -> String {
    let text = value_text(value);
    if text.contains([',', '(', ')', '"']) {
        format!("\"{}\"", text.replace('"', "\\\""))
    } else {
        text
    }
}

async fn read_rows(response: Response) -> PersistenceResult<Vec<Row>> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PersistenceError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json::<Vec<Row>>().await?)
}

#[async_trait]
impl PersistenceService for RestPersistence {
    fn set_access_token(&self, token: Option<String>) {
        let mut slot = match self.access_token.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = token;
    }

    async fn query(&self, table: &str, filter: &Filter, order: Option<&Order>) -> PersistenceResult<Vec<Row>> {
        let request = self
            .client
            .get(self.table_url(table))
            .query(&query_params(filter, order));
        read_rows(self.authorize(request).send().await?).await
    }

    async fn insert(&self, table: &str, row: Row) -> PersistenceResult<Row> {
        let request = self.client.post(self.table_url(table)).json(&row);
        let mut rows = read_rows(self.authorize(request).send().await?).await?;
        if rows.is_empty() {
            return Err(PersistenceError::InvalidRow(format!(
                "insert into {} returned no row",
                table
            )));
        }
        Ok(rows.swap_remove(0))
    }

    async fn update(&self, table: &str, id: &str, patch: Row) -> PersistenceResult<Row> {
        let request = self
            .client
            .patch(self.table_url(table))
            .query(&[("id", format!("eq.{}", id))])
            .json(&patch);
        let mut rows = read_rows(self.authorize(request).send().await?).await?;
        if rows.is_empty() {
            return Err(PersistenceError::NotFound {
                table: table.to_string(),
                id: id.to_string(),
            });
        }
        Ok(rows.swap_remove(0))
    }
}
