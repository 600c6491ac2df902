//! Plain-text rendering of resources for the command line

use serde_json::Value;

use crate::activity::Task;
use crate::resource::{extract_json_value, get_resource, ColumnDef};

/// Aligned table of `items` using the registry columns of `resource_key`
///
/// Unknown resources, or resources without columns, fall back to pretty JSON.
pub fn render_table(resource_key: &str, items: &[Value]) -> String {
    let Some(columns) = get_resource(resource_key)
        .map(|r| r.columns.as_slice())
        .filter(|c| !c.is_empty())
    else {
        return render_json(&Value::Array(items.to_vec()));
    };

    let mut lines = Vec::with_capacity(items.len() + 2);
    lines.push(render_row(columns, |col| col.header.clone()));
    lines.push(render_row(columns, |col| "-".repeat(col.header.chars().count())));
    for item in items {
        lines.push(render_row(columns, |col| extract_json_value(item, &col.json_path)));
    }
    lines.join("\n")
}

fn render_row(columns: &[ColumnDef], cell: impl Fn(&ColumnDef) -> String) -> String {
    let row = columns
        .iter()
        .map(|col| {
            let width = col.width as usize;
            format!("{:<width$}", truncate_string(&cell(col), width), width = width)
        })
        .collect::<Vec<_>>()
        .join("  ");
    row.trim_end().to_string()
}

/// One line describing a task
pub fn render_task(task: &Task) -> String {
    let mut line = format!("{}  {}", task.uri, task.state);
    if let Some(percent) = task.percent_complete {
        line.push_str(&format!("  {}%", percent));
    }
    if let Some(status) = task.task_status.as_deref() {
        line.push_str(&format!("  {}", status));
    }
    if let Some(uri) = task.resource_uri() {
        line.push_str(&format!("  -> {}", uri));
    }
    line
}

pub fn render_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Truncate string for display (Unicode-safe)
fn truncate_string(s: &str, max_len: usize) -> String {
    let char_count = s.chars().count();
    if char_count > max_len {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_fc_network_table() {
        let items = vec![json!({
            "name": "SAN-A",
            "fabricType": "FabricAttach",
            "autoLoginRedistribution": true,
            "linkStabilityTime": 30,
            "managedSanUri": null,
            "state": "Active"
        })];
        let table = render_table("fc-networks", &items);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("NAME"));
        assert!(lines[1].starts_with("----"));
        assert!(lines[2].starts_with("SAN-A"));
        assert!(lines[2].contains("FabricAttach"));
        assert!(lines[2].contains("true"));
    }

    #[test]
    fn test_unknown_resource_renders_json() {
        let rendered = render_table("no-such-resource", &[json!({"a": 1})]);
        assert!(rendered.starts_with('['));
        assert!(rendered.contains("\"a\": 1"));
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("short", 10), "short");
        assert_eq!(truncate_string("a-very-long-name", 8), "a-ver...");
        assert_eq!(truncate_string("ééééé", 4), "é...");
    }

    #[test]
    fn test_render_task() {
        let task = Task::from_value(json!({
            "type": "TaskResourceV2",
            "uri": "/rest/tasks/1",
            "taskState": "Completed",
            "percentComplete": 100,
            "associatedResource": {"resourceUri": "/rest/storage-pools/9"}
        }))
        .unwrap();
        let line = render_task(&task);
        assert!(line.starts_with("/rest/tasks/1  Completed  100%"));
        assert!(line.ends_with("-> /rest/storage-pools/9"));
    }
}
