//! Remote API boundary
//!
//! The collection engine talks to the provider through two narrow traits:
//! a paginated "list" operation and a delimiter-based "grouping" operation
//! used by prefix discovery. Concrete clients live in [`http`]; tests supply
//! scripted in-memory implementations.
//!
//! Records are schema-agnostic JSON objects - the engine never validates
//! their shape, it only moves them from the remote API to the output writer.

pub mod http;

use crate::error::ApiResult;

pub use http::{
    ApiConnection, EntityCatalogClient, MetricCatalogClient, ObjectStoreClient,
    StreamCatalogClient,
};

/// One raw metadata record: field name -> value, schema varies by resource.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// One page of a paginated list response.
///
/// `next_token` is opaque and remote-supplied; it is threaded back into the
/// next request byte-for-byte and never inspected.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    /// Raw records in remote order
    pub records: Vec<Record>,

    /// Continuation token; `None` means pagination is exhausted
    pub next_token: Option<String>,

    /// Response status code as reported by the transport
    pub status: u16,
}

impl ListPage {
    /// A successful page, for fakes and tests.
    pub fn ok(records: Vec<Record>, next_token: Option<String>) -> Self {
        Self {
            records,
            next_token,
            status: 200,
        }
    }
}

/// Paginated list operation, scoped by a work-unit filter.
///
/// Implementations must be idempotent per page; the engine never retries a
/// call, but nothing here precludes a retrying wrapper.
pub trait ListApi: Send + Sync {
    /// Issue one list call for `filter`, continuing from `token` if given.
    fn list(&self, filter: &str, token: Option<&str>) -> ApiResult<ListPage>;
}

/// Delimiter-based grouping listing, used only during prefix discovery.
pub trait GroupingApi {
    /// Return the immediate child groupings under `prefix`.
    fn list_groupings(&self, prefix: &str, delimiter: &str) -> ApiResult<Vec<String>>;
}

/// Success statuses accepted from the remote API.
pub fn is_ok_status(status: u16) -> bool {
    matches!(status, 200 | 201)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_status() {
        assert!(is_ok_status(200));
        assert!(is_ok_status(201));
        assert!(!is_ok_status(204));
        assert!(!is_ok_status(403));
        assert!(!is_ok_status(500));
    }

    #[test]
    fn test_list_page_ok() {
        let page = ListPage::ok(Vec::new(), Some("abc".into()));
        assert_eq!(page.status, 200);
        assert_eq!(page.next_token.as_deref(), Some("abc"));
    }
}
