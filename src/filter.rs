//! Dimension post-filtering for metric descriptors
//!
//! A [`DimensionMatcher`] keeps a metric record only when its dimension set
//! is exactly covered by the configured name -> pattern map: same dimension
//! names, every pattern matching. Patterns are anchored with a trailing `$`
//! if not already, so `i-0abc` does not leak through an `i-0` filter.
//!
//! Several matchers combine with OR semantics: a record passes if any one
//! matcher covers it.

use crate::error::ConfigError;
use crate::remote::Record;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

/// Exact-cover matcher over a record's `Dimensions` array.
#[derive(Debug, Clone)]
pub struct DimensionMatcher {
    patterns: HashMap<String, Vec<Regex>>,
}

impl DimensionMatcher {
    /// Parse a `Name=REGEX,Name=REGEX` expression into one matcher.
    pub fn parse(spec: &str) -> Result<Self, ConfigError> {
        let mut patterns: HashMap<String, Vec<Regex>> = HashMap::new();

        for pair in spec.split(',') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }

            let (name, pattern) =
                pair.split_once('=')
                    .ok_or_else(|| ConfigError::InvalidDimensionFilter {
                        filter: spec.to_string(),
                        reason: format!("expected NAME=REGEX, got '{pair}'"),
                    })?;

            let anchored = if pattern.ends_with('$') {
                pattern.to_string()
            } else {
                format!("{pattern}$")
            };

            let regex =
                Regex::new(&anchored).map_err(|e| ConfigError::InvalidDimensionFilter {
                    filter: spec.to_string(),
                    reason: e.to_string(),
                })?;

            patterns
                .entry(name.trim().to_string())
                .or_default()
                .push(regex);
        }

        if patterns.is_empty() {
            return Err(ConfigError::InvalidDimensionFilter {
                filter: spec.to_string(),
                reason: "no NAME=REGEX pairs".into(),
            });
        }

        Ok(Self { patterns })
    }

    /// Check whether a record's dimensions exactly match this filter.
    pub fn matches_record(&self, record: &Record) -> bool {
        let dimensions = match record.get("Dimensions").and_then(Value::as_array) {
            Some(dims) => dims,
            None => return false,
        };

        let mut by_name: HashMap<&str, &str> = HashMap::new();
        for dim in dimensions {
            if let (Some(name), Some(value)) = (
                dim.get("Name").and_then(Value::as_str),
                dim.get("Value").and_then(Value::as_str),
            ) {
                by_name.insert(name, value);
            }
        }

        // Exact cover: same dimension names on both sides.
        if by_name.len() != self.patterns.len() {
            return false;
        }

        for (name, regexes) in &self.patterns {
            match by_name.get(name.as_str()) {
                Some(value) => {
                    if !regexes.iter().all(|re| re.is_match(value)) {
                        return false;
                    }
                }
                None => return false,
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metric(dimensions: Value) -> Record {
        json!({ "MetricName": "CPUUtilization", "Dimensions": dimensions })
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(DimensionMatcher::parse("").is_err());
        assert!(DimensionMatcher::parse("no-equals-sign").is_err());
        assert!(DimensionMatcher::parse("Name=[unclosed").is_err());
    }

    #[test]
    fn test_exact_cover_match() {
        let matcher = DimensionMatcher::parse("InstanceId=i-.*").unwrap();

        let hit = metric(json!([{ "Name": "InstanceId", "Value": "i-0abc123" }]));
        assert!(matcher.matches_record(&hit));

        // Extra dimension breaks exact cover.
        let extra = metric(json!([
            { "Name": "InstanceId", "Value": "i-0abc123" },
            { "Name": "AutoScalingGroupName", "Value": "web" }
        ]));
        assert!(!matcher.matches_record(&extra));

        let miss = metric(json!([{ "Name": "VolumeId", "Value": "vol-1" }]));
        assert!(!matcher.matches_record(&miss));
    }

    #[test]
    fn test_patterns_are_anchored() {
        let matcher = DimensionMatcher::parse("InstanceId=i-0").unwrap();
        let longer = metric(json!([{ "Name": "InstanceId", "Value": "i-0abc" }]));
        assert!(!matcher.matches_record(&longer));

        let exact = metric(json!([{ "Name": "InstanceId", "Value": "i-0" }]));
        assert!(matcher.matches_record(&exact));
    }

    #[test]
    fn test_multi_dimension_filter() {
        let matcher =
            DimensionMatcher::parse("FunctionName=.*, Resource=.*").unwrap();
        let hit = metric(json!([
            { "Name": "FunctionName", "Value": "ingest" },
            { "Name": "Resource", "Value": "ingest:prod" }
        ]));
        assert!(matcher.matches_record(&hit));

        let partial = metric(json!([{ "Name": "FunctionName", "Value": "ingest" }]));
        assert!(!matcher.matches_record(&partial));
    }

    #[test]
    fn test_record_without_dimensions() {
        let matcher = DimensionMatcher::parse("InstanceId=.*").unwrap();
        let record = json!({ "MetricName": "x" }).as_object().cloned().unwrap();
        assert!(!matcher.matches_record(&record));
    }
}
