//! HTTP client for the ChEMBL web services.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use hyper::body::to_bytes;
use hyper::header::{ACCEPT, CONTENT_TYPE};
use hyper::{Body, Method, Request, Uri};
use serde_json::Value;
use tokio::time::timeout;
use tracing::debug;

use crate::http_client::{HyperClient, build_client, is_json};
use crate::traits::{
    ChemUtilities, ClientError, ClientResult, DataService, Record, Resource, UtilityFunction,
};

/// Public ChEMBL deployment.
pub const DEFAULT_BASE_URL: &str = "https://www.ebi.ac.uk/chembl/api/";

const ERROR_BODY_LIMIT: usize = 512;

/// Configuration for [`ChemblClient`].
#[derive(Clone, Debug)]
pub struct ChemblConfig {
    base_url: String,
    timeout: Duration,
    page_limit: u32,
}

impl Default for ChemblConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: Duration::from_secs(30),
            page_limit: 20,
        }
    }
}

impl ChemblConfig {
    /// Creates a configuration pointing at the public deployment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the base URL of the web services.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] if the supplied URL is invalid.
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> ClientResult<Self> {
        self.base_url = sanitize_base_url(base_url.as_ref())?;
        Ok(self)
    }

    /// Sets the per-request HTTP timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the number of records requested per data query.
    #[must_use]
    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.page_limit = limit.max(1);
        self
    }

    /// Base URL, always ending in `/`.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Records requested per data query.
    #[must_use]
    pub fn page_limit(&self) -> u32 {
        self.page_limit
    }
}

/// Client implementing both [`DataService`] and [`ChemUtilities`].
pub struct ChemblClient {
    client: HyperClient,
    config: ChemblConfig,
}

impl fmt::Debug for ChemblClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChemblClient")
            .field("base_url", &self.config.base_url)
            .field("timeout", &self.config.timeout)
            .finish_non_exhaustive()
    }
}

impl ChemblClient {
    /// Constructs a client from the supplied configuration.
    #[must_use]
    pub fn new(config: ChemblConfig) -> Self {
        let client = build_client(config.timeout.max(Duration::from_secs(30)));
        Self { client, config }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ChemblConfig {
        &self.config
    }

    fn data_uri(&self, resource: Resource, criteria: &[(String, Value)]) -> ClientResult<Uri> {
        let mut query: Vec<(String, String)> = criteria
            .iter()
            .map(|(field, value)| (field.clone(), query_value(value)))
            .collect();
        query.push(("limit".to_owned(), self.config.page_limit.to_string()));
        parse_uri(&format!(
            "{}data/{}.json?{}",
            self.config.base_url,
            resource.as_str(),
            encode_query(&query)
        ))
    }

    fn utility_request(
        &self,
        function: UtilityFunction,
        inputs: &[(String, Value)],
    ) -> ClientResult<Request<Body>> {
        if function == UtilityFunction::Status {
            let uri = parse_uri(&format!("{}data/status.json", self.config.base_url))?;
            return Request::get(uri)
                .header(ACCEPT, "application/json")
                .body(Body::empty())
                .map_err(|err| ClientError::transport(format!("failed to build request: {err}")));
        }

        let (body, rest) = match inputs.split_first() {
            Some(((_, first), rest)) => (query_value(first), rest),
            None => (String::new(), inputs),
        };
        let query: Vec<(String, String)> = rest
            .iter()
            .map(|(name, value)| (name.clone(), query_value(value)))
            .collect();
        let mut target = format!("{}utils/{}", self.config.base_url, function.endpoint());
        if !query.is_empty() {
            target.push('?');
            target.push_str(&encode_query(&query));
        }

        Request::builder()
            .method(Method::POST)
            .uri(parse_uri(&target)?)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "text/plain")
            .body(Body::from(body))
            .map_err(|err| ClientError::transport(format!("failed to build request: {err}")))
    }

    async fn send(&self, request: Request<Body>) -> ClientResult<(bool, Vec<u8>)> {
        let uri = request.uri().clone();
        debug!(%uri, method = %request.method(), "sending upstream request");

        let response = timeout(self.config.timeout, self.client.request(request))
            .await
            .map_err(|_| ClientError::TimedOut {
                after: self.config.timeout,
            })?
            .map_err(|err| ClientError::transport(format!("request to {uri} failed: {err}")))?;

        let status = response.status();
        let json = is_json(&response);
        let bytes = to_bytes(response.into_body())
            .await
            .map_err(|err| ClientError::transport(format!("failed to read response: {err}")))?;

        if !status.is_success() {
            let mut body = String::from_utf8_lossy(&bytes).into_owned();
            truncate(&mut body, ERROR_BODY_LIMIT);
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok((json, bytes.to_vec()))
    }

    async fn fetch_records(&self, uri: Uri) -> ClientResult<Vec<Record>> {
        let request = Request::get(uri)
            .header(ACCEPT, "application/json")
            .body(Body::empty())
            .map_err(|err| ClientError::transport(format!("failed to build request: {err}")))?;
        let (_, bytes) = self.send(request).await?;
        let payload: Value = serde_json::from_slice(&bytes)
            .map_err(|err| ClientError::response(format!("invalid JSON: {err}")))?;
        extract_records(payload)
    }
}

#[async_trait]
impl DataService for ChemblClient {
    async fn filter(
        &self,
        resource: Resource,
        criteria: &[(String, Value)],
    ) -> ClientResult<Vec<Record>> {
        let uri = self.data_uri(resource, criteria)?;
        self.fetch_records(uri).await
    }

    async fn all(&self, resource: Resource) -> ClientResult<Vec<Record>> {
        let uri = self.data_uri(resource, &[])?;
        self.fetch_records(uri).await
    }
}

#[async_trait]
impl ChemUtilities for ChemblClient {
    async fn call(
        &self,
        function: UtilityFunction,
        inputs: &[(String, Value)],
    ) -> ClientResult<Value> {
        let request = self.utility_request(function, inputs)?;
        let (json, bytes) = self.send(request).await?;
        Ok(parse_utility_body(json, &bytes))
    }
}

/// Pulls the record list out of a paged collection response.
///
/// # Errors
///
/// Returns [`ClientError::Response`] if no collection array is present or an
/// element is not an object.
pub fn extract_records(payload: Value) -> ClientResult<Vec<Record>> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(mut fields) => {
            let key = fields
                .iter()
                .find(|(key, value)| key.as_str() != "page_meta" && value.is_array())
                .map(|(key, _)| key.clone())
                .ok_or_else(|| ClientError::response("no collection found in response"))?;
            match fields.remove(&key) {
                Some(Value::Array(items)) => items,
                _ => return Err(ClientError::response("no collection found in response")),
            }
        }
        other => {
            return Err(ClientError::response(format!(
                "expected an object or array, got {}",
                kind_of(&other)
            )));
        }
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::Object(record) => Ok(record),
            other => Err(ClientError::response(format!(
                "expected record objects, got {}",
                kind_of(&other)
            ))),
        })
        .collect()
}

fn parse_utility_body(json: bool, bytes: &[u8]) -> Value {
    if let Ok(value) = serde_json::from_slice::<Value>(bytes) {
        if json || value.is_object() || value.is_array() {
            return value;
        }
    }
    Value::String(String::from_utf8_lossy(bytes).trim().to_owned())
}

fn sanitize_base_url(input: &str) -> ClientResult<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ClientError::configuration("base URL cannot be empty"));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ClientError::configuration(
            "base URL must use http or https scheme",
        ));
    }

    let mut owned = trimmed.to_owned();
    if !owned.ends_with('/') {
        owned.push('/');
    }
    owned
        .parse::<Uri>()
        .map_err(|err| ClientError::configuration(format!("invalid base URL: {err}")))?;
    Ok(owned)
}

fn parse_uri(target: &str) -> ClientResult<Uri> {
    target
        .parse::<Uri>()
        .map_err(|err| ClientError::configuration(format!("invalid request URL {target}: {err}")))
}

fn encode_query(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn query_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn truncate(text: &mut String, limit: usize) {
    if text.len() > limit {
        let mut cut = limit;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
}
