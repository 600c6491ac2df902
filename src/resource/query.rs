//! URL and query-string construction
//!
//! Collection endpoints accept `start`, `count`, `sort`, `filter` and `query`
//! parameters; mutating endpoints accept `force`. Everything here produces
//! appliance-relative paths such as `/rest/storage-pools?start=0&count=-1`.

/// Paging, sorting and filtering for a collection GET
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub start: Option<u32>,
    /// `-1` asks the appliance for every member
    pub count: Option<i32>,
    /// e.g. `freeCapacity:desc`
    pub sort: Option<String>,
    /// Each entry becomes one `filter=` parameter, e.g. `name='pool1'`
    pub filter: Vec<String>,
    /// e.g. `availableNetworks IN [/rest/fc-networks/1,/rest/fc-networks/2]`
    pub query: Option<String>,
    /// Endpoint specific parameters, emitted last in insertion order
    pub params: Vec<(String, String)>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything, in one page
    pub fn all() -> Self {
        Self::new().page(0, -1)
    }

    pub fn page(mut self, start: u32, count: i32) -> Self {
        self.start = Some(start);
        self.count = Some(count);
        self
    }

    pub fn sort(mut self, sort: &str) -> Self {
        self.sort = Some(sort.to_string());
        self
    }

    pub fn filter(mut self, filter: &str) -> Self {
        self.filter.push(filter.to_string());
        self
    }

    pub fn query(mut self, query: &str) -> Self {
        self.query = Some(query.to_string());
        self
    }

    pub fn param(mut self, key: &str, value: &str) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    /// Whether the caller sized the page, so paging is left to them
    pub fn is_single_page(&self) -> bool {
        matches!(self.count, Some(count) if count >= 0)
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none()
            && self.count.is_none()
            && self.sort.is_none()
            && self.filter.is_empty()
            && self.query.is_none()
            && self.params.is_empty()
    }

    /// Render as `?k=v&...`, or an empty string when nothing is set
    pub fn to_query_string(&self) -> String {
        let mut query_parts: Vec<String> = Vec::new();

        if let Some(start) = self.start {
            query_parts.push(format!("start={}", start));
        }
        if let Some(count) = self.count {
            query_parts.push(format!("count={}", count));
        }
        if let Some(ref sort) = self.sort {
            query_parts.push(format!("sort={}", urlencoding::encode(sort)));
        }
        for filter in &self.filter {
            query_parts.push(format!("filter={}", urlencoding::encode(filter)));
        }
        if let Some(ref query) = self.query {
            query_parts.push(format!("query={}", urlencoding::encode(query)));
        }
        for (key, value) in &self.params {
            query_parts.push(format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            ));
        }

        if query_parts.is_empty() {
            String::new()
        } else {
            format!("?{}", query_parts.join("&"))
        }
    }
}

/// Join a base path and id segments: `make_url("/rest/storage-volumes", &["abc", "snapshots"])`
pub fn make_url(base: &str, segments: &[&str]) -> String {
    let mut url = base.trim_end_matches('/').to_string();
    for segment in segments {
        let segment = segment.trim_matches('/');
        if segment.is_empty() {
            continue;
        }
        url.push('/');
        url.push_str(&urlencoding::encode(segment));
    }
    url
}

/// Append a rendered query to a path
pub fn with_query(path: &str, query: &ListQuery) -> String {
    let rendered = query.to_query_string();
    if rendered.is_empty() {
        return path.to_string();
    }
    if path.contains('?') {
        format!("{}&{}", path, &rendered[1..])
    } else {
        format!("{}{}", path, rendered)
    }
}

/// Append `force=true|false`
pub fn with_force(path: &str, force: bool) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{}{}force={}", path, separator, force)
}

/// Last path segment of a resource URI, e.g. `/rest/storage-pools/123` -> `123`
pub fn id_from_uri(uri: &str) -> &str {
    uri.trim_end_matches('/').rsplit('/').next().unwrap_or(uri)
}
