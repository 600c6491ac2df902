//! Collection responses
//!
//! Collection GETs answer with `{members, total, count, start, nextPageUri}`.
//! Some endpoints (host types, paths) answer with a bare array instead.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use super::query::{with_query, ListQuery};
use crate::appliance::client::OneViewClient;

/// Upper bound on pages followed by [`fetch_all_members`]
const MAX_PAGES: usize = 1000;

/// One page of a collection
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    #[serde(default)]
    pub members: Vec<Value>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub start: Option<u64>,
    #[serde(default)]
    pub next_page_uri: Option<String>,
}

impl Collection {
    /// Parse a collection body, accepting a bare array as a single page
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Array(members) => Ok(Self {
                count: Some(members.len() as u64),
                total: Some(members.len() as u64),
                members,
                ..Default::default()
            }),
            Value::Null => Ok(Self::default()),
            other => serde_json::from_value(other).context("Failed to parse collection"),
        }
    }

    /// Next page, ignoring the empty strings some endpoints send
    pub fn next_page(&self) -> Option<&str> {
        self.next_page_uri.as_deref().filter(|uri| !uri.is_empty())
    }
}

/// Fetch one page of `path`
pub async fn fetch_members(
    client: &OneViewClient,
    path: &str,
    query: &ListQuery,
) -> Result<Collection> {
    let body = client.get(&with_query(path, query)).await?;
    Collection::from_value(body)
}

/// Fetch every member of `path`, following `nextPageUri`
pub async fn fetch_all_members(
    client: &OneViewClient,
    path: &str,
    query: &ListQuery,
) -> Result<Vec<Value>> {
    let mut page = fetch_members(client, path, query).await?;
    let mut all_members = std::mem::take(&mut page.members);

    for _ in 0..MAX_PAGES {
        let Some(next) = page.next_page().map(str::to_string) else {
            return Ok(all_members);
        };
        tracing::debug!("Following next page {}", next);
        page = Collection::from_value(client.get(&next).await?)?;
        all_members.append(&mut page.members);
    }

    tracing::warn!("Stopped paging {} after {} pages", path, MAX_PAGES);
    Ok(all_members)
}

/// Members of a collection list call
///
/// A query with a non-negative `count` asks for exactly one page, which is
/// returned as is. Otherwise every page is followed.
pub async fn fetch_list(
    client: &OneViewClient,
    path: &str,
    query: &ListQuery,
) -> Result<Vec<Value>> {
    if !query.is_single_page() {
        return fetch_all_members(client, path, query).await;
    }

    let page = fetch_members(client, path, query).await?;
    if page.next_page().is_some() {
        tracing::debug!(
            "Returning one page of {} ({} of {:?} members)",
            path,
            page.members.len(),
            page.total
        );
    }
    Ok(page.members)
}

/// Extract a value from JSON using a dot-notation path
pub fn extract_json_value(item: &Value, path: &str) -> String {
    let parts: Vec<&str> = path.split('.').collect();
    let mut current = item;

    for part in parts {
        // Handle array index
        if let Ok(idx) = part.parse::<usize>() {
            current = match current.get(idx) {
                Some(v) => v,
                None => return "-".to_string(),
            };
        } else {
            current = match current.get(part) {
                Some(v) => v,
                None => return "-".to_string(),
            };
        }
    }

    match current {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(_) => "[object]".to_string(),
    }
}
