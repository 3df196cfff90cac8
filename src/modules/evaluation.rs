// Evaluation output rendering - Pure logic.
// Turns values captured while running a tab's content into the text shown in
// the result pane, one output line per source line.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A value captured on a 1-based source line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineValue {
    pub line: usize,
    pub value: Value,
}

/// Everything one evaluation run produced for a tab.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EvaluationOutput {
    pub values: Vec<LineValue>,
    pub errors: Vec<String>,
}

impl EvaluationOutput {
    pub fn result_text(&self) -> String {
        render_result(&self.values)
    }

    pub fn error_text(&self) -> String {
        self.errors.join("\n")
    }
}

/// Values captured past this line are dropped.
pub const MAX_RESULT_LINE: usize = 100_000;

/// Lays values out so each sits on its source line. Values sharing a line
/// are joined by a space. Non-empty output always ends with a newline.
pub fn render_result(values: &[LineValue]) -> String {
    let mut sorted: Vec<&LineValue> = values
        .iter()
        .filter(|v| {
            if v.line > MAX_RESULT_LINE {
                log::warn!("[Tabs] Dropping value captured on line {}", v.line);
                return false;
            }
            true
        })
        .collect();
    if sorted.is_empty() {
        return String::new();
    }

    sorted.sort_by_key(|v| v.line.max(1));

    let last_line = sorted.last().map(|v| v.line.max(1)).unwrap_or(1);
    let mut lines: Vec<Vec<String>> = vec![Vec::new(); last_line];
    for item in sorted {
        lines[item.line.max(1) - 1].push(value_to_string(&item.value));
    }

    let mut out = lines
        .iter()
        .map(|parts| parts.join(" "))
        .collect::<Vec<_>>()
        .join("\n");
    out.push('\n');
    out
}

/// Display form of a captured value. Strings print raw, containers recurse.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => format!(
            "[{}]",
            items.iter().map(value_to_string).collect::<Vec<_>>().join(", ")
        ),
        Value::Object(map) => format!(
            "{{{}}}",
            map.iter()
                .map(|(k, v)| format!("\"{}\": {}", k, value_to_string(v)))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}
