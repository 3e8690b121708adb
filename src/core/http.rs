/// reqwest-backed collection client
///
/// Wire defaults follow conventional REST pagination and are configurable:
/// `GET <base>/<version>/<endpoint>?page=<n>&size=<m>`, `POST` with a JSON
/// body, `DELETE` with a JSON `{ "id": .. }` body.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::api::{ApiError, CollectionApi};
use super::record::{FormPayload, PageMeta, PageResult, Record};
use crate::utils::truncate_string;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaginationStyle {
    /// `?page=<n>&size=<m>`
    Page,
    /// `?limit=<m>&offset=<(n - 1) * m>`
    Offset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub style: PaginationStyle,
    pub page_param: String,
    pub size_param: String,
    /// Server counts pages from 0
    pub zero_based: bool,
    pub limit_param: String,
    pub offset_param: String,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            style: PaginationStyle::Page,
            page_param: "page".to_string(),
            size_param: "size".to_string(),
            zero_based: false,
            limit_param: "limit".to_string(),
            offset_param: "offset".to_string(),
        }
    }
}

impl PaginationConfig {
    /// Query parameters for a 1-based page
    pub fn query(&self, page: u32, page_size: u32) -> Vec<(String, String)> {
        let page = page.max(1);
        match self.style {
            PaginationStyle::Page => {
                let wire_page = if self.zero_based { page - 1 } else { page };
                vec![
                    (self.page_param.clone(), wire_page.to_string()),
                    (self.size_param.clone(), page_size.to_string()),
                ]
            }
            PaginationStyle::Offset => {
                let offset = u64::from(page - 1) * u64::from(page_size);
                vec![
                    (self.limit_param.clone(), page_size.to_string()),
                    (self.offset_param.clone(), offset.to_string()),
                ]
            }
        }
    }

    /// Convert a page number reported by the server back to 1-based
    fn from_wire_page(&self, wire_page: u32) -> u32 {
        if self.zero_based {
            wire_page + 1
        } else {
            wire_page.max(1)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyEncoding {
    Json,
    Form,
}

/// Everything the HTTP client needs to know about the remote API
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub version: String,
    pub page_size: u32,
    pub timeout: Duration,
    pub pagination: PaginationConfig,
    pub body: BodyEncoding,
}

impl ClientSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            version: String::new(),
            page_size: 10,
            timeout: Duration::from_secs(10),
            pagination: PaginationConfig::default(),
            body: BodyEncoding::Json,
        }
    }
}

/// List response: an envelope with metadata, or a bare array of records
#[derive(Deserialize)]
#[serde(untagged)]
enum ListBody {
    Envelope(ListEnvelope),
    Bare(Vec<Record>),
}

#[derive(Deserialize)]
struct ListEnvelope {
    data: Vec<Record>,
    page: Option<u32>,
    #[serde(alias = "totalPages")]
    total_pages: Option<u32>,
    #[serde(alias = "totalCount", alias = "total")]
    total_count: Option<u64>,
}

/// Created record: bare, or wrapped as `{ "data": record }`.
///
/// A top-level `id` marks a bare record even when it has its own `data` field.
fn decode_created(body: &[u8]) -> Result<Record, ApiError> {
    let value: Value = serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))?;
    let record = match value {
        Value::Object(mut map) if !map.contains_key("id") && map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    };
    serde_json::from_value(record).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Classify a non-success response.
///
/// Field-level detail makes it a validation error, provided the operation
/// accepts user payloads; everything else is a server error.
pub fn classify_failure(status: u16, body: &[u8], allow_validation: bool) -> ApiError {
    let parsed: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
    let text_of = |key: &str| {
        parsed
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
    };

    let message = text_of("message").or_else(|| text_of("error")).unwrap_or_else(|| {
        let text = String::from_utf8_lossy(body);
        let text = text.trim();
        if text.is_empty() {
            reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("request failed")
                .to_string()
        } else {
            truncate_string(text, 200)
        }
    });

    let mut fields = BTreeMap::new();
    for key in ["errors", "fields"] {
        if let Some(detail) = parsed.get(key) {
            for (field, messages) in field_messages(detail.clone()) {
                fields.entry(field).or_insert_with(Vec::new).extend(messages);
            }
        }
    }

    if allow_validation && !fields.is_empty() {
        ApiError::Validation { status, message, fields }
    } else {
        ApiError::Server { status, message }
    }
}

/// `{ field: "msg" | ["msg", ..] }` into a field -> messages map
fn field_messages(errors: Value) -> BTreeMap<String, Vec<String>> {
    let mut fields = BTreeMap::new();
    if let Value::Object(map) = errors {
        for (field, value) in map {
            let messages: Vec<String> = match value {
                Value::String(s) => vec![s],
                Value::Array(items) => items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .collect(),
                Value::Null => continue,
                other => vec![other.to_string()],
            };
            if !messages.is_empty() {
                fields.insert(field, messages);
            }
        }
    }
    fields
}

pub struct HttpApiClient {
    client: Client,
    settings: ClientSettings,
}

impl HttpApiClient {
    pub fn new(settings: ClientSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("catalog-admin/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, settings })
    }

    /// `<base>/<version>/<endpoint>`, skipping an empty version
    pub fn url_for(&self, endpoint: &str) -> String {
        let base = self.settings.base_url.trim_end_matches('/');
        let endpoint = endpoint.trim_start_matches('/');
        let version = self.settings.version.trim_matches('/');

        if version.is_empty() {
            format!("{}/{}", base, endpoint)
        } else {
            format!("{}/{}/{}", base, version, endpoint)
        }
    }

    /// Send a request and return the body of a successful response
    async fn execute(
        &self,
        request: RequestBuilder,
        method: &str,
        url: &str,
        allow_validation: bool,
    ) -> Result<Vec<u8>, ApiError> {
        let start = Instant::now();
        debug!(method, url, "sending request");

        let response = request.send().await.map_err(|e| {
            warn!(method, url, error = %e, "request failed");
            ApiError::Network(e.to_string())
        })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(format!("failed to read response body: {}", e)))?;

        debug!(
            method,
            url,
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "response received"
        );

        if !status.is_success() {
            let error = classify_failure(status.as_u16(), &body, allow_validation);
            warn!(method, url, status = status.as_u16(), kind = error.kind(), "request rejected");
            return Err(error);
        }

        Ok(body.to_vec())
    }

    fn with_payload<T: Serialize + ?Sized>(&self, request: RequestBuilder, payload: &T, pairs: Vec<(String, String)>) -> RequestBuilder {
        match self.settings.body {
            BodyEncoding::Json => request.json(payload),
            BodyEncoding::Form => request.form(&pairs),
        }
    }

    fn decode_list(&self, body: &[u8], requested_page: u32) -> Result<PageResult, ApiError> {
        let parsed: ListBody =
            serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))?;

        let page_size = self.settings.page_size;
        let (records, page, total_pages, total_count) = match parsed {
            ListBody::Envelope(envelope) => (
                envelope.data,
                envelope
                    .page
                    .map(|p| self.settings.pagination.from_wire_page(p))
                    .unwrap_or(requested_page),
                envelope.total_pages,
                envelope.total_count,
            ),
            ListBody::Bare(records) => (records, requested_page, None, None),
        };

        let page_full = records.len() as u64 >= u64::from(page_size);
        Ok(PageResult {
            records,
            meta: PageMeta {
                page,
                page_size,
                total_pages,
                total_count,
                page_full,
            },
        })
    }
}

#[async_trait]
impl CollectionApi for HttpApiClient {
    async fn list(&self, endpoint: &str, page: u32) -> Result<PageResult, ApiError> {
        let url = self.url_for(endpoint);
        let query = self.settings.pagination.query(page, self.settings.page_size);
        let request = self.client.get(&url).query(&query);

        let body = self.execute(request, "GET", &url, false).await?;
        self.decode_list(&body, page.max(1))
    }

    async fn create(&self, endpoint: &str, payload: &FormPayload) -> Result<Record, ApiError> {
        let url = self.url_for(endpoint);
        let request = self.with_payload(self.client.post(&url), payload, payload.to_form_pairs());

        let body = self.execute(request, "POST", &url, true).await?;
        decode_created(&body)
    }

    async fn delete(&self, endpoint: &str, id: &Value) -> Result<(), ApiError> {
        let url = self.url_for(endpoint);
        let body = json!({ "id": id });
        let pairs = vec![("id".to_string(), crate::core::record::display_value(id))];
        let request = self.with_payload(self.client.delete(&url), &body, pairs);

        self.execute(request, "DELETE", &url, true).await?;
        Ok(())
    }
}
