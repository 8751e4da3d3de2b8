//! Adaptive prefix discovery for hierarchical key spaces
//!
//! Before collection starts, the key space is partitioned into leaf prefixes
//! that can be collected independently. Two policies are supported:
//!
//! - [`DiscoveryPolicy::NarrowSinglePath`] descends while a prefix has
//!   exactly one child grouping and stops at the first leaf or fan-out
//!   point. Cheap, and good enough for shallow layouts.
//!
//! - [`DiscoveryPolicy::BoundedWidening`] expands a breadth-first frontier
//!   until it stops growing, or until the size or round caps hit. The caps
//!   exist because an unbounded key space could produce arbitrarily many
//!   leaves and blow up worker fan-out; they trade discovery completeness
//!   for predictable parallelism.

use crate::error::ApiResult;
use crate::remote::GroupingApi;
use tracing::debug;

/// Cap on the accumulated leaf set for bounded widening.
pub const DEFAULT_MAX_PREFIXES: usize = 100;

/// Cap on widening rounds.
pub const DEFAULT_MAX_ROUNDS: usize = 5;

/// How the prefix space is partitioned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryPolicy {
    /// Descend single-child chains, stop at the first fan-out point or leaf.
    NarrowSinglePath,

    /// Breadth-first frontier expansion under size and round caps.
    BoundedWidening {
        max_prefixes: usize,
        max_rounds: usize,
    },
}

impl Default for DiscoveryPolicy {
    fn default() -> Self {
        DiscoveryPolicy::BoundedWidening {
            max_prefixes: DEFAULT_MAX_PREFIXES,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }
}

/// Partitions a hierarchical key space into leaf prefixes.
pub struct PrefixDiscoverer<'a> {
    api: &'a dyn GroupingApi,
    delimiter: String,
}

impl<'a> PrefixDiscoverer<'a> {
    pub fn new(api: &'a dyn GroupingApi, delimiter: impl Into<String>) -> Self {
        Self {
            api,
            delimiter: delimiter.into(),
        }
    }

    /// Discover the leaf prefix set under `root`.
    ///
    /// Any grouping-call failure aborts discovery; there is no partial
    /// result, the run fails before workers start.
    pub fn discover(&self, root: &str, policy: &DiscoveryPolicy) -> ApiResult<Vec<String>> {
        match policy {
            DiscoveryPolicy::NarrowSinglePath => self.narrow(root),
            DiscoveryPolicy::BoundedWidening {
                max_prefixes,
                max_rounds,
            } => self.widen(root, *max_prefixes, *max_rounds),
        }
    }

    fn narrow(&self, root: &str) -> ApiResult<Vec<String>> {
        let mut prefix = root.to_string();

        loop {
            let mut groupings = self.api.list_groupings(&prefix, &self.delimiter)?;
            match groupings.len() {
                0 => return Ok(vec![prefix]),
                1 => prefix = groupings.remove(0),
                _ => return Ok(groupings),
            }
        }
    }

    fn widen(&self, root: &str, max_prefixes: usize, max_rounds: usize) -> ApiResult<Vec<String>> {
        let mut frontier = vec![root.to_string()];
        let mut accumulated: Vec<String> = Vec::new();

        for round in 1..=max_rounds {
            for prefix in &frontier {
                let groupings = self.api.list_groupings(prefix, &self.delimiter)?;
                if groupings.is_empty() {
                    // Leaf: carries itself forward.
                    accumulated.push(prefix.clone());
                } else {
                    accumulated.extend(groupings);
                }

                if accumulated.len() >= max_prefixes {
                    accumulated.truncate(max_prefixes);
                    debug!(round, prefixes = accumulated.len(), "Prefix cap reached");
                    return Ok(accumulated);
                }
            }

            debug!(round, frontier = frontier.len(), accumulated = accumulated.len(), "Widening round complete");

            // No new groupings discovered, excluding the trivial
            // single-element frontier.
            if frontier.len() != 1 && frontier.len() == accumulated.len() {
                break;
            }

            if round < max_rounds {
                frontier = std::mem::take(&mut accumulated);
            }
        }

        if accumulated.is_empty() {
            Ok(frontier)
        } else {
            Ok(accumulated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Maps each prefix to its immediate child groupings, counting calls.
    struct TreeApi {
        children: HashMap<String, Vec<String>>,
        calls: RefCell<usize>,
    }

    impl TreeApi {
        fn new(edges: &[(&str, &[&str])]) -> Self {
            let children = edges
                .iter()
                .map(|(p, cs)| {
                    (
                        p.to_string(),
                        cs.iter().map(|c| c.to_string()).collect::<Vec<_>>(),
                    )
                })
                .collect();
            Self {
                children,
                calls: RefCell::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.borrow()
        }
    }

    impl GroupingApi for TreeApi {
        fn list_groupings(&self, prefix: &str, _delimiter: &str) -> ApiResult<Vec<String>> {
            *self.calls.borrow_mut() += 1;
            Ok(self.children.get(prefix).cloned().unwrap_or_default())
        }
    }

    #[test]
    fn test_narrow_leaf_root() {
        let api = TreeApi::new(&[("logs/", &[])]);
        let discoverer = PrefixDiscoverer::new(&api, "/");
        let leaves = discoverer
            .discover("logs/", &DiscoveryPolicy::NarrowSinglePath)
            .unwrap();
        assert_eq!(leaves, vec!["logs/".to_string()]);
    }

    #[test]
    fn test_narrow_descends_single_chains() {
        let api = TreeApi::new(&[
            ("logs/", &["logs/2024/"]),
            ("logs/2024/", &["logs/2024/01/", "logs/2024/02/"]),
        ]);
        let discoverer = PrefixDiscoverer::new(&api, "/");
        let leaves = discoverer
            .discover("logs/", &DiscoveryPolicy::NarrowSinglePath)
            .unwrap();
        assert_eq!(
            leaves,
            vec!["logs/2024/01/".to_string(), "logs/2024/02/".to_string()]
        );
    }

    #[test]
    fn test_widen_two_level_tree() {
        let api = TreeApi::new(&[
            ("data/", &["data/a/", "data/b/"]),
            ("data/a/", &[]),
            ("data/b/", &[]),
        ]);
        let discoverer = PrefixDiscoverer::new(&api, "/");
        let leaves = discoverer
            .discover("data/", &DiscoveryPolicy::default())
            .unwrap();
        assert_eq!(leaves, vec!["data/a/".to_string(), "data/b/".to_string()]);
        // Two rounds: one for the root, one for the two children.
        assert_eq!(api.calls(), 3);
    }

    #[test]
    fn test_widen_leaf_root() {
        let api = TreeApi::new(&[("logs/", &[])]);
        let discoverer = PrefixDiscoverer::new(&api, "/");
        let leaves = discoverer
            .discover("logs/", &DiscoveryPolicy::default())
            .unwrap();
        assert_eq!(leaves, vec!["logs/".to_string()]);
    }

    /// Unbounded synthetic tree: every prefix has `width` children.
    struct FanOutApi {
        width: usize,
        calls: RefCell<usize>,
    }

    impl FanOutApi {
        fn calls(&self) -> usize {
            *self.calls.borrow()
        }
    }

    impl GroupingApi for FanOutApi {
        fn list_groupings(&self, prefix: &str, _delimiter: &str) -> ApiResult<Vec<String>> {
            *self.calls.borrow_mut() += 1;
            Ok((0..self.width)
                .map(|i| format!("{prefix}{i}/"))
                .collect())
        }
    }

    #[test]
    fn test_widen_size_cap() {
        let api = FanOutApi {
            width: 64,
            calls: RefCell::new(0),
        };
        let discoverer = PrefixDiscoverer::new(&api, "/");
        let leaves = discoverer
            .discover(
                "root/",
                &DiscoveryPolicy::BoundedWidening {
                    max_prefixes: 100,
                    max_rounds: 5,
                },
            )
            .unwrap();
        assert_eq!(leaves.len(), 100);
    }

    #[test]
    fn test_widen_round_cap() {
        // Width 1 keeps the frontier at a single element forever, so only
        // the round cap stops discovery: one call per round.
        let api = FanOutApi {
            width: 1,
            calls: RefCell::new(0),
        };
        let discoverer = PrefixDiscoverer::new(&api, "/");
        let leaves = discoverer
            .discover(
                "root/",
                &DiscoveryPolicy::BoundedWidening {
                    max_prefixes: 100,
                    max_rounds: 5,
                },
            )
            .unwrap();
        assert_eq!(api.calls(), 5);
        assert_eq!(leaves, vec!["root/0/0/0/0/0/".to_string()]);
    }

    struct FailingApi;

    impl GroupingApi for FailingApi {
        fn list_groupings(&self, _prefix: &str, _delimiter: &str) -> ApiResult<Vec<String>> {
            Err(ApiError::Status { code: 403 })
        }
    }

    #[test]
    fn test_discovery_failure_is_fatal() {
        let api = FailingApi;
        let discoverer = PrefixDiscoverer::new(&api, "/");
        assert!(discoverer
            .discover("data/", &DiscoveryPolicy::default())
            .is_err());
        assert!(discoverer
            .discover("data/", &DiscoveryPolicy::NarrowSinglePath)
            .is_err());
    }
}
