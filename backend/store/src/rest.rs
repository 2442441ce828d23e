//! PostgREST-style HTTP store for the `ocr_conversions` table.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use inkread_core::{
    Conversion, ConversionId, ConversionPatch, ConversionStore, ListQuery, NewConversion,
    StoreError,
};

/// Default table name.
pub const DEFAULT_TABLE: &str = "ocr_conversions";

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Store client speaking the PostgREST dialect (`?id=eq.<id>`, `Prefer` headers).
pub struct RestConversionStore {
    client: Client,
    table_url: String,
    token: String,
}

impl RestConversionStore {
    /// `rest_url` is the REST root, e.g. `https://project.example.co/rest/v1`.
    pub fn new(rest_url: &str, table: &str, token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            table_url: format!("{}/{}", rest_url.trim_end_matches('/'), table),
            token: token.into(),
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn table_url(&self) -> &str {
        &self.table_url
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.token)
            .bearer_auth(&self.token)
    }

    fn create_request(&self, record: &NewConversion) -> RequestBuilder {
        self.authorized(self.client.post(&self.table_url))
            .header("Prefer", "return=representation")
            .header(ACCEPT, HeaderValue::from_static(SINGLE_OBJECT))
            .json(record)
    }

    fn update_request(&self, id: &ConversionId, patch: &ConversionPatch) -> RequestBuilder {
        self.authorized(self.client.patch(&self.table_url))
            .query(&[("id", format!("eq.{id}")), ("select", "id".to_string())])
            .header("Prefer", "return=representation")
            .json(patch)
    }

    fn delete_request(&self, id: &ConversionId) -> RequestBuilder {
        self.authorized(self.client.delete(&self.table_url))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=minimal")
    }

    fn list_request(&self, query: ListQuery) -> RequestBuilder {
        let order = if query.newest_first {
            "created_at.desc"
        } else {
            "created_at.asc"
        };
        self.authorized(self.client.get(&self.table_url)).query(&[
            ("select", "*".to_string()),
            ("order", order.to_string()),
            ("limit", query.limit.to_string()),
        ])
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<String, StoreError> {
        let response = builder
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        check_status(status, &body)?;
        Ok(body)
    }
}

#[derive(Deserialize)]
struct RestError {
    message: Option<String>,
    details: Option<String>,
}

fn check_status(status: StatusCode, body: &str) -> Result<(), StoreError> {
    if status.is_success() {
        return Ok(());
    }
    let message = serde_json::from_str::<RestError>(body)
        .ok()
        .and_then(|e| match (e.message, e.details) {
            (Some(m), Some(d)) if !d.is_empty() => Some(format!("{m} ({d})")),
            (Some(m), _) => Some(m),
            (None, d) => d,
        })
        .unwrap_or_else(|| body.trim().to_string());
    Err(StoreError::Status {
        status: status.as_u16(),
        message,
    })
}

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, StoreError> {
    serde_json::from_str(body).map_err(|e| StoreError::MalformedResponse(e.to_string()))
}

#[async_trait]
impl ConversionStore for RestConversionStore {
    async fn create(&self, record: NewConversion) -> Result<Conversion, StoreError> {
        let body = self.execute(self.create_request(&record)).await?;
        let created: Conversion = parse_body(&body)?;
        debug!(id = %created.id, "Conversion inserted");
        Ok(created)
    }

    async fn update(&self, id: &ConversionId, patch: ConversionPatch) -> Result<(), StoreError> {
        let body = self.execute(self.update_request(id, &patch)).await?;
        let updated: Vec<serde_json::Value> = parse_body(&body)?;
        if updated.is_empty() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        debug!(id = %id, "Conversion updated");
        Ok(())
    }

    async fn delete(&self, id: &ConversionId) -> Result<(), StoreError> {
        self.execute(self.delete_request(id)).await?;
        debug!(id = %id, "Conversion deleted");
        Ok(())
    }

    async fn list(&self, query: ListQuery) -> Result<Vec<Conversion>, StoreError> {
        let body = self.execute(self.list_request(query)).await?;
        let rows: Vec<Conversion> = parse_body(&body)?;
        debug!(count = rows.len(), "Conversions listed");
        Ok(rows)
    }
}
