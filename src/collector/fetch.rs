//! Pagination driver for one work unit
//!
//! [`PageFetcher`] repeatedly issues the remote list call, threading the
//! continuation token from each response into the next request, and streams
//! every page to the result channel as soon as it arrives rather than
//! buffering the whole unit.
//!
//! Termination: a response with no token, or with zero records, ends the
//! unit. The zero-records rule guards against a provider returning an empty
//! page with a stale token.

use super::queue::ResultSender;
use crate::error::ApiError;
use crate::remote::{is_ok_status, ListApi, Record};
use std::sync::Arc;
use thiserror::Error;

/// Predicate applied to each record before it is forwarded.
pub type RecordFilter = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

/// Failure modes of a single unit's fetch.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Remote call failed; scoped to this unit, the worker moves on
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The sink went away; the whole run is winding down
    #[error("result channel closed while forwarding pages")]
    ChannelClosed,
}

/// Counters for one completed unit.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchStats {
    /// Pages forwarded to the result channel
    pub pages: u64,

    /// Records forwarded (after filtering)
    pub records: u64,

    /// Records dropped by the post-filter predicate
    pub filtered: u64,
}

/// Drives one remote list operation to pagination exhaustion.
pub struct PageFetcher<'a> {
    api: &'a dyn ListApi,
    filter: Option<&'a RecordFilter>,
}

impl<'a> PageFetcher<'a> {
    pub fn new(api: &'a dyn ListApi) -> Self {
        Self { api, filter: None }
    }

    pub fn with_filter(api: &'a dyn ListApi, filter: Option<&'a RecordFilter>) -> Self {
        Self { api, filter }
    }

    /// Fetch every page for `unit`, forwarding each to `out` as it arrives.
    ///
    /// A non-success status aborts the unit exactly like a transport error.
    /// Pages emptied by the post-filter are not forwarded, but termination is
    /// judged on the raw page so filtering never ends pagination early.
    pub fn fetch_into(&self, unit: &str, out: &ResultSender) -> Result<FetchStats, FetchError> {
        let mut stats = FetchStats::default();
        let mut token: Option<String> = None;

        loop {
            let page = self.api.list(unit, token.as_deref())?;
            if !is_ok_status(page.status) {
                return Err(FetchError::Api(ApiError::Status { code: page.status }));
            }

            let raw_len = page.records.len();
            if raw_len > 0 {
                let records = match self.filter {
                    Some(keep) => {
                        let kept: Vec<Record> =
                            page.records.into_iter().filter(|r| keep(r)).collect();
                        stats.filtered += (raw_len - kept.len()) as u64;
                        kept
                    }
                    None => page.records,
                };

                if !records.is_empty() {
                    stats.pages += 1;
                    stats.records += records.len() as u64;
                    out.send_page(records)
                        .map_err(|_| FetchError::ChannelClosed)?;
                }
            }

            if page.next_token.is_none() || raw_len == 0 {
                break;
            }
            token = page.next_token;
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::queue::{ResultChannel, ResultItem};
    use crate::error::ApiResult;
    use crate::remote::ListPage;
    use serde_json::json;
    use std::sync::Mutex;

    /// Replays a scripted sequence of responses for any filter.
    struct ScriptedApi {
        responses: Mutex<Vec<ApiResult<ListPage>>>,
        calls: Mutex<Vec<Option<String>>>,
    }

    impl ScriptedApi {
        fn new(responses: Vec<ApiResult<ListPage>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl ListApi for ScriptedApi {
        fn list(&self, _filter: &str, token: Option<&str>) -> ApiResult<ListPage> {
            self.calls.lock().unwrap().push(token.map(String::from));
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Ok(ListPage::ok(Vec::new(), None));
            }
            responses.remove(0)
        }
    }

    fn record(key: &str) -> Record {
        json!({ "Key": key }).as_object().cloned().unwrap()
    }

    fn page_of(keys: &[&str], token: Option<&str>) -> ListPage {
        ListPage::ok(
            keys.iter().map(|k| record(k)).collect(),
            token.map(String::from),
        )
    }

    fn drain_pages(channel: ResultChannel) -> Vec<Vec<Record>> {
        let receiver = channel.into_receiver();
        let mut pages = Vec::new();
        while let Some(ResultItem::Page(page)) = receiver.recv() {
            pages.push(page);
        }
        pages
    }

    #[test]
    fn test_token_threading() {
        let api = ScriptedApi::new(vec![
            Ok(page_of(&["a"], Some("t1"))),
            Ok(page_of(&["b"], Some("t2"))),
            Ok(page_of(&["c"], None)),
        ]);
        let channel = ResultChannel::with_capacity(16);
        let sender = channel.sender();

        let stats = PageFetcher::new(&api).fetch_into("logs/", &sender).unwrap();
        drop(sender);

        assert_eq!(stats.pages, 3);
        assert_eq!(stats.records, 3);
        assert_eq!(
            *api.calls.lock().unwrap(),
            vec![None, Some("t1".to_string()), Some("t2".to_string())]
        );
        assert_eq!(drain_pages(channel).len(), 3);
    }

    #[test]
    fn test_stale_token_with_empty_page_terminates() {
        // Third response carries a token but zero records: fetching must stop
        // after that call and keep only the first two pages.
        let api = ScriptedApi::new(vec![
            Ok(page_of(&["a", "b"], Some("t1"))),
            Ok(page_of(&["c"], Some("t2"))),
            Ok(page_of(&[], Some("t3"))),
            Ok(page_of(&["never"], None)),
        ]);
        let channel = ResultChannel::with_capacity(16);
        let sender = channel.sender();

        let stats = PageFetcher::new(&api).fetch_into("logs/", &sender).unwrap();
        drop(sender);

        assert_eq!(api.call_count(), 3);
        assert_eq!(stats.records, 3);
        let pages = drain_pages(channel);
        assert_eq!(pages.len(), 2);
    }

    #[test]
    fn test_bad_status_aborts_unit() {
        let api = ScriptedApi::new(vec![
            Ok(page_of(&["a"], Some("t1"))),
            Ok(ListPage {
                records: vec![record("b")],
                next_token: None,
                status: 500,
            }),
        ]);
        let channel = ResultChannel::with_capacity(16);
        let sender = channel.sender();

        let err = PageFetcher::new(&api)
            .fetch_into("logs/", &sender)
            .unwrap_err();
        drop(sender);

        assert!(matches!(err, FetchError::Api(ApiError::Status { code: 500 })));
        // The first page was already forwarded before the failure.
        assert_eq!(drain_pages(channel).len(), 1);
    }

    #[test]
    fn test_transport_error_aborts_unit() {
        let api = ScriptedApi::new(vec![Err(ApiError::Transport {
            reason: "connection refused".into(),
        })]);
        let channel = ResultChannel::with_capacity(16);
        let sender = channel.sender();

        let err = PageFetcher::new(&api)
            .fetch_into("logs/", &sender)
            .unwrap_err();
        assert!(matches!(err, FetchError::Api(ApiError::Transport { .. })));
    }

    #[test]
    fn test_record_filter_drops_but_does_not_terminate() {
        let api = ScriptedApi::new(vec![
            Ok(page_of(&["keep", "drop"], Some("t1"))),
            Ok(page_of(&["drop"], Some("t2"))),
            Ok(page_of(&["keep"], None)),
        ]);
        let channel = ResultChannel::with_capacity(16);
        let sender = channel.sender();

        let filter: RecordFilter = Arc::new(|record| {
            record.get("Key").and_then(|v| v.as_str()) == Some("keep")
        });
        let stats = PageFetcher::with_filter(&api, Some(&filter))
            .fetch_into("logs/", &sender)
            .unwrap();
        drop(sender);

        // The all-filtered middle page is not forwarded, but pagination
        // continued past it.
        assert_eq!(api.call_count(), 3);
        assert_eq!(stats.records, 2);
        assert_eq!(stats.filtered, 2);
        assert_eq!(drain_pages(channel).len(), 2);
    }
}
