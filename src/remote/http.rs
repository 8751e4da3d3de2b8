//! Blocking HTTP clients for the provider's listing APIs
//!
//! All clients share one [`ApiConnection`] (agent + endpoint + credentials),
//! constructed once per run and passed by reference - there is no process-wide
//! session state. The wire shape is uniform across resources:
//!
//! ```text
//! GET {endpoint}/{path}?region=...&...&token=...
//! -> { "records": [ {..}, .. ], "next_token": "..." }   (token absent on the last page)
//! ```
//!
//! Non-2xx responses are returned as a [`ListPage`] carrying the status code
//! rather than as errors; the engine decides what statuses are acceptable.

use crate::config::ConnectionConfig;
use crate::error::{ApiError, ApiResult};
use crate::remote::{is_ok_status, ListApi, ListPage, Record};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Request timeout for a single list call. Pagination as a whole is not
/// bounded; a stuck call is surfaced by the transport, not by the engine.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Page size requested from key listings.
const MAX_KEYS: &str = "1000";

/// Page size requested from stream enumeration.
const STREAM_LIMIT: &str = "20";

/// Shared connection state: agent, endpoint and credentials.
pub struct ApiConnection {
    agent: ureq::Agent,
    endpoint: String,
    access_key: String,
    secret_key: String,
    region: String,
}

impl ApiConnection {
    /// Build a connection from the validated run configuration.
    pub fn new(config: &ConnectionConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();

        Self {
            agent,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            access_key: config.access_key.clone(),
            secret_key: config.secret_key.clone(),
            region: config.region.clone(),
        }
    }

    /// The region this connection is scoped to.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Issue one GET and decode the JSON body.
    ///
    /// Status responses (4xx/5xx) are not transport failures: the status is
    /// returned and the body is ignored.
    fn get_json(&self, path: &str, params: &[(&str, &str)]) -> ApiResult<(u16, Value)> {
        let url = format!("{}/{}", self.endpoint, path);

        let mut request = self
            .agent
            .get(&url)
            .set("x-access-key", &self.access_key)
            .set("x-secret-key", &self.secret_key)
            .query("region", &self.region);

        for (key, value) in params {
            request = request.query(key, value);
        }

        match request.call() {
            Ok(response) => {
                let status = response.status();
                let body: Value = response.into_json().map_err(|e| ApiError::Decode {
                    reason: e.to_string(),
                })?;
                Ok((status, body))
            }
            Err(ureq::Error::Status(code, _)) => Ok((code, Value::Null)),
            Err(e) => Err(ApiError::Transport {
                reason: e.to_string(),
            }),
        }
    }

    /// Issue one list call and shape the response into a [`ListPage`].
    fn list_page(&self, path: &str, params: &[(&str, &str)]) -> ApiResult<ListPage> {
        let (status, body) = self.get_json(path, params)?;

        let records: Vec<Record> = match body.get("records").and_then(Value::as_array) {
            Some(items) => items.iter().filter_map(|v| v.as_object().cloned()).collect(),
            None => Vec::new(),
        };

        let next_token = body
            .get("next_token")
            .and_then(Value::as_str)
            .map(String::from);

        Ok(ListPage {
            records,
            next_token,
            status,
        })
    }
}

/// Key-metadata listings for one bucket.
pub struct ObjectStoreClient {
    conn: Arc<ApiConnection>,
    bucket: String,
}

impl ObjectStoreClient {
    pub fn new(conn: Arc<ApiConnection>, bucket: impl Into<String>) -> Self {
        Self {
            conn,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

impl ListApi for ObjectStoreClient {
    fn list(&self, filter: &str, token: Option<&str>) -> ApiResult<ListPage> {
        let mut params = vec![
            ("bucket", self.bucket.as_str()),
            ("prefix", filter),
            ("max_keys", MAX_KEYS),
        ];
        if let Some(token) = token {
            params.push(("token", token));
        }
        self.conn.list_page("keys", &params)
    }
}

impl crate::remote::GroupingApi for ObjectStoreClient {
    fn list_groupings(&self, prefix: &str, delimiter: &str) -> ApiResult<Vec<String>> {
        let params = [
            ("bucket", self.bucket.as_str()),
            ("prefix", prefix),
            ("delimiter", delimiter),
            ("max_keys", MAX_KEYS),
        ];
        let (status, body) = self.conn.get_json("groupings", &params)?;
        if !is_ok_status(status) {
            return Err(ApiError::Status { code: status });
        }

        let groupings = match body.get("groupings").and_then(Value::as_array) {
            Some(items) => items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect(),
            None => Vec::new(),
        };
        Ok(groupings)
    }
}

/// Metric-descriptor listings for one namespace.
pub struct MetricCatalogClient {
    conn: Arc<ApiConnection>,
    namespace: String,
}

impl MetricCatalogClient {
    pub fn new(conn: Arc<ApiConnection>, namespace: impl Into<String>) -> Self {
        Self {
            conn,
            namespace: namespace.into(),
        }
    }
}

impl ListApi for MetricCatalogClient {
    fn list(&self, filter: &str, token: Option<&str>) -> ApiResult<ListPage> {
        let mut params = vec![("namespace", self.namespace.as_str())];
        if !filter.is_empty() {
            params.push(("metric", filter));
        }
        if let Some(token) = token {
            params.push(("token", token));
        }
        self.conn.list_page("metrics", &params)
    }
}

/// Stream enumeration and per-stream describe calls.
pub struct StreamCatalogClient {
    conn: Arc<ApiConnection>,
}

impl StreamCatalogClient {
    pub fn new(conn: Arc<ApiConnection>) -> Self {
        Self { conn }
    }

    /// Enumerate every stream name in the region.
    ///
    /// This is the discovery step for the streams resource: a failure here
    /// is fatal to the run, unlike per-stream describe failures.
    pub fn enumerate(&self) -> ApiResult<Vec<String>> {
        let mut names = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let mut params = vec![("limit", STREAM_LIMIT)];
            if let Some(token) = token.as_deref() {
                params.push(("token", token));
            }

            let page = self.conn.list_page("streams", &params)?;
            if !is_ok_status(page.status) {
                return Err(ApiError::Status { code: page.status });
            }

            names.extend(
                page.records
                    .iter()
                    .filter_map(|r| r.get("StreamName").and_then(Value::as_str))
                    .map(String::from),
            );

            match page.next_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        Ok(names)
    }
}

impl ListApi for StreamCatalogClient {
    /// Describe one stream. A describe response is a single-record page
    /// with no continuation token.
    fn list(&self, filter: &str, token: Option<&str>) -> ApiResult<ListPage> {
        let mut params = vec![("name", filter)];
        if let Some(token) = token {
            params.push(("token", token));
        }
        self.conn.list_page("streams/describe", &params)
    }
}

/// Entity-catalog lookups (instances, volumes) for dimension validation.
pub struct EntityCatalogClient {
    conn: Arc<ApiConnection>,
}

impl EntityCatalogClient {
    pub fn new(conn: Arc<ApiConnection>) -> Self {
        Self { conn }
    }

    /// Collect the ids of every live entity of `kind`, following pagination
    /// to exhaustion. `id_key` names the record field carrying the id.
    pub fn valid_ids(&self, kind: &str, id_key: &str) -> ApiResult<HashSet<String>> {
        let mut ids = HashSet::new();
        let mut token: Option<String> = None;

        loop {
            let mut params = vec![("kind", kind)];
            if let Some(token) = token.as_deref() {
                params.push(("token", token));
            }

            let page = self.conn.list_page("entities", &params)?;
            if !is_ok_status(page.status) {
                return Err(ApiError::Status { code: page.status });
            }

            ids.extend(
                page.records
                    .iter()
                    .filter_map(|r| r.get(id_key).and_then(Value::as_str))
                    .map(String::from),
            );

            match page.next_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        Ok(ids)
    }
}
