//! Output formatting

use serde_json::{Map, Value};

/// Output builder: one JSON object, or `key: value` lines for humans
pub struct Output {
    json_mode: bool,
    fields: Map<String, Value>,
    order: Vec<String>,
    message: Option<String>,
}

impl Output {
    /// Create a new output builder
    pub fn new(json_mode: bool) -> Self {
        Self {
            json_mode,
            fields: Map::new(),
            order: Vec::new(),
            message: None,
        }
    }

    /// Add a field rendered with `Display`
    pub fn field(self, key: &str, value: impl std::fmt::Display) -> Self {
        self.field_value(key, Value::String(value.to_string()))
    }

    /// Add a u64 field
    pub fn field_u64(self, key: &str, value: u64) -> Self {
        self.field_value(key, Value::Number(value.into()))
    }

    /// Add a boolean field
    pub fn field_bool(self, key: &str, value: bool) -> Self {
        self.field_value(key, Value::Bool(value))
    }

    /// Add a JSON value field
    pub fn field_value(mut self, key: &str, value: Value) -> Self {
        if self.fields.insert(key.to_string(), value).is_none() {
            self.order.push(key.to_string());
        }
        self
    }

    /// Set a human-readable headline printed before the fields
    pub fn message(mut self, msg: &str) -> Self {
        self.message = Some(msg.to_string());
        self
    }

    /// Render without printing
    pub fn render(&self) -> String {
        if self.json_mode {
            return serde_json::to_string_pretty(&Value::Object(self.fields.clone()))
                .unwrap_or_default();
        }
        let mut lines = Vec::new();
        if let Some(msg) = &self.message {
            lines.push(msg.clone());
        }
        for key in &self.order {
            match &self.fields[key] {
                Value::String(s) => lines.push(format!("{}: {}", key, s)),
                other => lines.push(format!("{}: {}", key, other)),
            }
        }
        lines.join("\n")
    }

    /// Print the output
    pub fn print(self) {
        println!("{}", self.render());
    }
}
