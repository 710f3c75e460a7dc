//! Cosmos DB REST client
//!
//! Minimal client for the Cosmos DB SQL API: single-partition queries with
//! continuation paging and an account read for health checks. Requests are
//! signed with the account's primary key.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use sha2::Sha256;
use std::time::Duration;

use super::{validate_resource_id, ContainerRef, DocumentStore, Page, ResultPager};
use super::error::{StoreError, StoreResult};

/// REST API version sent with every request
pub const API_VERSION: &str = "2018-12-31";

const HEADER_DATE: &str = "x-ms-date";
const HEADER_VERSION: &str = "x-ms-version";
const HEADER_CONTINUATION: &str = "x-ms-continuation";
const HEADER_MAX_ITEM_COUNT: &str = "x-ms-max-item-count";
const HEADER_IS_QUERY: &str = "x-ms-documentdb-isquery";
const HEADER_PARTITION_KEY: &str = "x-ms-documentdb-partitionkey";
const QUERY_CONTENT_TYPE: &str = "application/query+json";

type HmacSha256 = Hmac<Sha256>;

/// Options for [`CosmosClient`]
#[derive(Debug, Clone)]
pub struct CosmosClientOptions {
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Page size hint; the store picks when unset
    pub max_item_count: Option<u32>,
}

impl Default for CosmosClientOptions {
    fn default() -> Self {
        Self {
            request_timeout_ms: 30_000,
            max_item_count: None,
        }
    }
}

/// Cosmos DB client authenticated with a primary key
#[derive(Clone)]
pub struct CosmosClient {
    http: Client,
    endpoint: String,
    key: Vec<u8>,
    max_item_count: Option<u32>,
}

impl std::fmt::Debug for CosmosClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CosmosClient")
            .field("endpoint", &self.endpoint)
            .field("max_item_count", &self.max_item_count)
            .finish_non_exhaustive()
    }
}

impl CosmosClient {
    /// Build a client from an endpoint URI and a base64 primary key
    pub fn new(
        endpoint_uri: &str,
        primary_key: &str,
        options: CosmosClientOptions,
    ) -> StoreResult<Self> {
        let endpoint = parse_endpoint(endpoint_uri)?;

        let primary_key = primary_key.trim();
        if primary_key.is_empty() {
            return Err(StoreError::InvalidCredential("primary key is empty".to_string()));
        }
        let key = STANDARD
            .decode(primary_key)
            .map_err(|e| StoreError::InvalidCredential(format!("primary key is not base64: {}", e)))?;

        let http = Client::builder()
            .timeout(Duration::from_millis(options.request_timeout_ms))
            .build()?;

        Ok(Self {
            http,
            endpoint,
            key,
            max_item_count: options.max_item_count,
        })
    }

    /// `authorization` header value for one request
    fn authorization(&self, verb: &str, resource_type: &str, resource_link: &str, date: &str) -> String {
        let signature = sign(&self.key, verb, resource_type, resource_link, date);
        urlencoding::encode(&format!("type=master&ver=1.0&sig={}", signature)).into_owned()
    }

    /// Fetch one page of a query; returns the page and the next continuation
    async fn query_page(
        &self,
        container: &ContainerRef,
        query: &str,
        partition_key: &str,
        continuation: Option<&str>,
    ) -> StoreResult<(Page, Option<String>)> {
        let url = format!(
            "{}/dbs/{}/colls/{}/docs",
            self.endpoint,
            urlencoding::encode(&container.database),
            urlencoding::encode(&container.container),
        );
        let resource_link = container.link();
        let date = http_date();

        let mut request = self
            .http
            .post(&url)
            .header(
                reqwest::header::AUTHORIZATION,
                self.authorization("post", "docs", &resource_link, &date),
            )
            .header(HEADER_DATE, &date)
            .header(HEADER_VERSION, API_VERSION)
            .header(HEADER_IS_QUERY, "True")
            .header(HEADER_PARTITION_KEY, serde_json::to_string(&[partition_key])?)
            .header(reqwest::header::CONTENT_TYPE, QUERY_CONTENT_TYPE)
            .body(serde_json::to_vec(&QueryBody {
                query,
                parameters: Vec::new(),
            })?);

        if let Some(max_item_count) = self.max_item_count {
            request = request.header(HEADER_MAX_ITEM_COUNT, max_item_count.to_string());
        }
        if let Some(continuation) = continuation {
            request = request.header(HEADER_CONTINUATION, continuation);
        }

        let response = request.send().await.map_err(StoreError::from_transport)?;
        let response = check_status(response).await?;

        let next = response
            .headers()
            .get(HEADER_CONTINUATION)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        let body = response.bytes().await.map_err(StoreError::from_transport)?;
        let parsed: QueryResponseBody = serde_json::from_slice(&body)?;
        let items = parsed
            .documents
            .into_iter()
            .map(|doc| doc.get().as_bytes().to_vec())
            .collect();

        Ok((Page::new(items), next))
    }
}

#[async_trait]
impl DocumentStore for CosmosClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn query_items(
        &self,
        container: &ContainerRef,
        query: &str,
        partition_key: &str,
    ) -> StoreResult<Box<dyn ResultPager + '_>> {
        validate_resource_id("database", &container.database)?;
        validate_resource_id("container", &container.container)?;

        Ok(Box::new(CosmosPager {
            client: self,
            container: container.clone(),
            query: query.to_string(),
            partition_key: partition_key.to_string(),
            continuation: None,
            started: false,
        }))
    }

    async fn ping(&self) -> StoreResult<()> {
        let date = http_date();
        let response = self
            .http
            .get(format!("{}/", self.endpoint))
            .header(reqwest::header::AUTHORIZATION, self.authorization("get", "", "", &date))
            .header(HEADER_DATE, &date)
            .header(HEADER_VERSION, API_VERSION)
            .send()
            .await
            .map_err(StoreError::from_transport)?;

        check_status(response).await.map(|_| ())
    }
}

/// Continuation-driven pager over one query
struct CosmosPager<'a> {
    client: &'a CosmosClient,
    container: ContainerRef,
    query: String,
    partition_key: String,
    continuation: Option<String>,
    started: bool,
}

#[async_trait]
impl<'a> ResultPager for CosmosPager<'a> {
    fn more(&self) -> bool {
        !self.started || self.continuation.is_some()
    }

    async fn next_page(&mut self) -> StoreResult<Page> {
        if !self.more() {
            return Err(StoreError::Exhausted);
        }

        let (page, next) = self
            .client
            .query_page(
                &self.container,
                &self.query,
                &self.partition_key,
                self.continuation.as_deref(),
            )
            .await?;

        self.started = true;
        self.continuation = next;
        Ok(page)
    }
}

#[derive(Serialize)]
struct QueryBody<'a> {
    query: &'a str,
    parameters: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct QueryResponseBody {
    #[serde(rename = "Documents", default)]
    documents: Vec<Box<RawValue>>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Turn a non-success response into [`StoreError::Api`]
async fn check_status(response: Response) -> StoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) if !body.message.is_empty() => format!("{}: {}", body.code, body.message),
        _ => text,
    };

    Err(StoreError::Api {
        status: status.as_u16(),
        message,
    })
}

fn parse_endpoint(endpoint_uri: &str) -> StoreResult<String> {
    let endpoint_uri = endpoint_uri.trim();
    if endpoint_uri.is_empty() {
        return Err(StoreError::InvalidEndpoint("endpoint URI is empty".to_string()));
    }

    let url = Url::parse(endpoint_uri)
        .map_err(|e| StoreError::InvalidEndpoint(format!("{}: {}", endpoint_uri, e)))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(StoreError::InvalidEndpoint(format!(
            "{}: expected an http(s) URL",
            endpoint_uri
        )));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// RFC 1123 date in GMT, as `x-ms-date` expects
fn http_date() -> String {
    Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Master-key signature over `verb\ntype\nlink\ndate\n\n`
fn sign(key: &[u8], verb: &str, resource_type: &str, resource_link: &str, date: &str) -> String {
    let payload = format!(
        "{}\n{}\n{}\n{}\n\n",
        verb.to_lowercase(),
        resource_type.to_lowercase(),
        resource_link,
        date.to_lowercase()
    );

    // HMAC accepts keys of any length
    let mut mac = match HmacSha256::new_from_slice(key) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(payload.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}
