//! PostgREST-style record store (the hosted backend's `/rest/v1` surface).

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, StatusCode};
use runtime::StoreConfig;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, Instrument};
use url::Url;
use uuid::Uuid;

use crate::domain::repo::{ListQuery, RecordStore};

/// Failures reported by the hosted store. `Display` is the store's own
/// message so it can be surfaced as-is.
#[derive(Error, Debug)]
pub enum RestStoreError {
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("no row with id {id} in '{collection}'")]
    Missing { collection: String, id: Uuid },

    #[error("unexpected response from '{collection}': {detail}")]
    Malformed { collection: String, detail: String },
}

#[derive(Clone)]
pub struct RestRecordStore {
    http: reqwest::Client,
    base: Url,
}

impl RestRecordStore {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> anyhow::Result<Self> {
        let mut base = Url::parse(base_url.trim())
            .with_context(|| format!("invalid store base_url '{base_url}'"))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let mut headers = HeaderMap::new();
        if !api_key.is_empty() {
            let key = HeaderValue::from_str(api_key).context("api_key is not a valid header")?;
            let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
                .context("api_key is not a valid header")?;
            headers.insert("apikey", key);
            headers.insert(AUTHORIZATION, bearer);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { http, base })
    }

    pub fn from_config(cfg: &StoreConfig) -> anyhow::Result<Self> {
        Self::new(
            &cfg.base_url,
            &cfg.api_key,
            Duration::from_secs(cfg.timeout_sec.max(1)),
        )
    }

    fn collection_url(&self, collection: &str) -> Result<Url, RestStoreError> {
        self.base
            .join(&format!("rest/v1/{collection}"))
            .map_err(|e| RestStoreError::Malformed {
                collection: collection.to_string(),
                detail: e.to_string(),
            })
    }

    fn request(&self, method: Method, collection: &str) -> Result<RequestBuilder, RestStoreError> {
        Ok(self.http.request(method, self.collection_url(collection)?))
    }

    async fn send(&self, collection: &str, req: RequestBuilder) -> Result<Value, RestStoreError> {
        let req = req.build()?;
        let span = tracing::debug_span!(
            "outgoing_http",
            http.method = %req.method(),
            http.url = %req.url(),
        );

        async move {
            let response = self.http.execute(req).await?;
            let status = response.status();
            let body = response.text().await?;
            debug!(status = status.as_u16(), bytes = body.len(), "store responded");

            if !status.is_success() {
                return Err(RestStoreError::Rejected {
                    status,
                    message: error_message(status, &body),
                });
            }
            if body.trim().is_empty() {
                return Ok(Value::Null);
            }
            serde_json::from_str(&body).map_err(|e| RestStoreError::Malformed {
                collection: collection.to_string(),
                detail: e.to_string(),
            })
        }
        .instrument(span)
        .await
    }

    /// `return=representation` answers with an array; take its single row.
    fn single_row(collection: &str, body: Value) -> Result<Value, RestStoreError> {
        match body {
            Value::Array(mut rows) if !rows.is_empty() => Ok(rows.swap_remove(0)),
            Value::Object(_) => Ok(body),
            other => Err(RestStoreError::Malformed {
                collection: collection.to_string(),
                detail: format!("expected the stored row, got {other}"),
            }),
        }
    }
}

/// The store's `message` field when present, else the raw body, else the status.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error_description", "error", "hint"] {
            if let Some(Value::String(msg)) = fields.get(key) {
                return msg.clone();
            }
        }
    }
    let body = body.trim();
    if body.is_empty() {
        format!("HTTP {status}")
    } else {
        body.to_string()
    }
}

#[async_trait]
impl RecordStore for RestRecordStore {
    async fn query_all(&self, collection: &str, query: &ListQuery) -> anyhow::Result<Vec<Value>> {
        let order = format!("{}.{}", query.order.field, query.order.direction.as_str());
        let mut params = vec![("select", "*".to_string()), ("order", order)];
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }
        let body = self
            .send(collection, self.request(Method::GET, collection)?.query(&params))
            .await?;
        match body {
            Value::Array(rows) => Ok(rows),
            other => Err(RestStoreError::Malformed {
                collection: collection.to_string(),
                detail: format!("expected an array, got {other}"),
            }
            .into()),
        }
    }

    async fn insert(&self, collection: &str, record: Value) -> anyhow::Result<Value> {
        let req = self
            .request(Method::POST, collection)?
            .header("Prefer", "return=representation")
            .json(&record);
        let body = self.send(collection, req).await?;
        Ok(Self::single_row(collection, body)?)
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: Uuid,
        patch: Value,
    ) -> anyhow::Result<Value> {
        let req = self
            .request(Method::PATCH, collection)?
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(&patch);
        match self.send(collection, req).await? {
            Value::Array(rows) if rows.is_empty() => Err(RestStoreError::Missing {
                collection: collection.to_string(),
                id,
            }
            .into()),
            body => Ok(Self::single_row(collection, body)?),
        }
    }

    async fn delete_by_id(&self, collection: &str, id: Uuid) -> anyhow::Result<()> {
        let req = self
            .request(Method::DELETE, collection)?
            .query(&[("id", format!("eq.{id}"))]);
        self.send(collection, req).await?;
        Ok(())
    }
}
