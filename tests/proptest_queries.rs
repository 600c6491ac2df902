//! Property-based tests using proptest
//!
//! These tests verify query-string construction, task state classification,
//! JSON value extraction and the poll loop's fetch count using randomized
//! inputs.

use oneview::activity::{await_task, ActivityError, PollPolicy, Task, TaskPhase, TaskSource, TaskState};
use oneview::resource::{extract_json_value, id_from_uri, make_url, with_force, with_query, ListQuery};
use oneview::storage::requests::{gib_to_bytes, GIB};
use proptest::prelude::*;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const KNOWN_STATES: &[&str] = &[
    "New",
    "Pending",
    "Running",
    "Starting",
    "Stopping",
    "Suspended",
    "Interrupted",
    "Completed",
    "Warning",
    "Error",
    "Terminated",
    "Killed",
];

/// Filter expressions in the appliance's syntax, quotes and all
fn arb_filter() -> impl Strategy<Value = String> {
    (
        prop_oneof!["name", "state", "status", "model", "provisionType"],
        prop_oneof!["=", "<>", " EQ "],
        "[A-Za-z0-9 _:/.-]{0,20}",
    )
        .prop_map(|(field, op, value)| format!("{}{}'{}'", field, op, value))
}

fn arb_query() -> impl Strategy<Value = ListQuery> {
    (
        prop::option::of((0u32..1000, -1i32..500)),
        prop::option::of("[a-zA-Z]{1,12}:(asc|desc)"),
        prop::collection::vec(arb_filter(), 0..4),
        prop::option::of("[a-zA-Z ]{1,20} IN \\[[a-z/0-9,-]{1,30}\\]"),
    )
        .prop_map(|(page, sort, filters, query)| {
            let mut q = ListQuery::new();
            if let Some((start, count)) = page {
                q = q.page(start, count);
            }
            if let Some(sort) = sort {
                q = q.sort(&sort);
            }
            for filter in &filters {
                q = q.filter(filter);
            }
            if let Some(query) = query {
                q = q.query(&query);
            }
            q
        })
}

fn decode_pairs(rendered: &str) -> Vec<(String, String)> {
    rendered
        .trim_start_matches('?')
        .split('&')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (key, value) = part.split_once('=').unwrap_or((part, ""));
            (
                urlencoding::decode(key).unwrap().into_owned(),
                urlencoding::decode(value).unwrap().into_owned(),
            )
        })
        .collect()
}

proptest! {
    /// An empty query renders nothing, anything else starts with '?'
    #[test]
    fn query_string_prefix(query in arb_query()) {
        let rendered = query.to_query_string();
        prop_assert_eq!(rendered.is_empty(), query.is_empty());
        if !rendered.is_empty() {
            prop_assert!(rendered.starts_with('?'));
            prop_assert_eq!(rendered.matches('?').count(), 1);
        }
    }

    /// Every filter survives encoding and comes back in order
    #[test]
    fn filters_roundtrip_through_encoding(query in arb_query()) {
        let pairs = decode_pairs(&query.to_query_string());
        let filters: Vec<String> = pairs
            .iter()
            .filter(|(k, _)| k == "filter")
            .map(|(_, v)| v.clone())
            .collect();
        prop_assert_eq!(filters, query.filter.clone());

        let sort = pairs.iter().find(|(k, _)| k == "sort").map(|(_, v)| v.clone());
        prop_assert_eq!(sort, query.sort.clone());
    }

    /// Extra parameters are appended after the standard ones
    #[test]
    fn extra_param_comes_last(query in arb_query()) {
        let rendered = query
            .clone()
            .param("alertFixType", "ExtraUnmanagedStorageVolumes")
            .to_query_string();
        prop_assert!(rendered.ends_with("alertFixType=ExtraUnmanagedStorageVolumes"));
        let expected_separator = if query.is_empty() { "?" } else { "&" };
        let expected_fragment = format!("{}alertFixType=", expected_separator);
        prop_assert!(rendered.contains(&expected_fragment));
    }

    /// Appending force keeps exactly one '?'
    #[test]
    fn force_is_always_last(query in arb_query(), force in any::<bool>()) {
        let path = with_force(&with_query("/rest/storage-volumes/V1", &query), force);
        prop_assert_eq!(path.matches('?').count(), 1);
        let expected = format!("force={}", force);
        prop_assert!(path.ends_with(&expected));
    }

    /// Ids put into a URL by make_url come back out of id_from_uri
    #[test]
    fn make_url_id_roundtrip(id in "[A-Za-z0-9-]{1,36}") {
        let uri = make_url("/rest/storage-pools", &[&id]);
        prop_assert_eq!(id_from_uri(&uri), id.as_str());
    }

    /// Ids with reserved characters are encoded into a single segment
    #[test]
    fn make_url_encodes_segments(id in "[a-z]{1,5}[ ?&#%][a-z]{1,5}") {
        let uri = make_url("/rest/storage-volumes", &[&id, "snapshots"]);
        prop_assert!(uri.ends_with("/snapshots"));
        prop_assert_eq!(uri.matches('/').count(), 4);
        prop_assert!(!uri.contains('?'));
        prop_assert!(!uri.contains(' '));
    }

    /// Unknown state strings are never terminal
    #[test]
    fn unknown_states_are_pending(state in "[A-Za-z]{1,16}") {
        prop_assume!(!KNOWN_STATES.contains(&state.as_str()));
        let parsed: TaskState = state.parse().unwrap();
        prop_assert_eq!(parsed.phase(), TaskPhase::Pending);
        prop_assert!(!parsed.is_terminal());
        prop_assert_eq!(parsed.as_str(), state.as_str());
    }

    /// Capacity conversion is exact
    #[test]
    fn gib_conversion(gib in 0u64..16_384) {
        let bytes = gib_to_bytes(gib).unwrap();
        prop_assert_eq!(bytes, gib * GIB);
        prop_assert_eq!(bytes % GIB, 0);
    }

    /// Top-level string fields are extracted verbatim
    #[test]
    fn extract_top_level_strings(name in "[a-zA-Z0-9_-]{1,30}", state in "[A-Za-z]{1,12}") {
        let item = json!({"name": &name, "state": &state, "capacity": 1024});
        prop_assert_eq!(extract_json_value(&item, "name"), name);
        prop_assert_eq!(extract_json_value(&item, "state"), state);
        prop_assert_eq!(extract_json_value(&item, "capacity"), "1024");
        prop_assert_eq!(extract_json_value(&item, "missing"), "-");
    }
}

#[test]
fn known_states_classify() {
    for state in KNOWN_STATES {
        let parsed = TaskState::from(*state);
        assert_eq!(parsed.as_str(), *state);
        let expected = match *state {
            "Completed" | "Warning" => TaskPhase::Succeeded,
            "Error" | "Terminated" | "Killed" => TaskPhase::Failed,
            _ => TaskPhase::Pending,
        };
        assert_eq!(parsed.phase(), expected, "{}", state);
    }
}

/// Reports `Running` until fetch number `complete_at`
struct CountingSource {
    complete_at: usize,
    fetches: AtomicUsize,
}

impl TaskSource for CountingSource {
    async fn fetch_task(&self, uri: &str) -> anyhow::Result<Task> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
        let state = if n >= self.complete_at { "Completed" } else { "Running" };
        Ok(Task::from_value(json!({"uri": uri, "taskState": state}))?)
    }
}

fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Completion on fetch N within the deadline takes exactly N fetches and
    /// (N - 1) intervals; past the deadline the wait ends after max_fetches
    #[test]
    fn fetch_count_matches_completion_point(
        complete_at in 1usize..30,
        timeout_secs in 1u64..20,
        interval_secs in 1u64..4,
    ) {
        let policy = PollPolicy::from_secs(timeout_secs, interval_secs);
        let source = CountingSource { complete_at, fetches: AtomicUsize::new(0) };
        let initial = Task::from_value(json!({"uri": "/rest/tasks/P", "taskState": "New"})).unwrap();

        let (result, elapsed) = paused_runtime().block_on(async {
            let started = tokio::time::Instant::now();
            let result = await_task(&source, &initial, &policy, None).await;
            (result, started.elapsed())
        });

        let fetches = source.fetches.load(Ordering::SeqCst);
        let max_fetches = policy.max_fetches() as usize;

        if complete_at <= max_fetches {
            prop_assert!(result.is_ok());
            prop_assert_eq!(fetches, complete_at);
            prop_assert_eq!(elapsed, Duration::from_secs(interval_secs * (complete_at as u64 - 1)));
        } else {
            let is_timeout = matches!(result, Err(ActivityError::Timeout { .. }));
            prop_assert!(is_timeout);
            prop_assert_eq!(fetches, max_fetches);
            prop_assert!(elapsed >= policy.timeout);
            prop_assert!(elapsed <= policy.timeout + policy.interval);
        }
    }
}
