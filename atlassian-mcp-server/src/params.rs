//! Typed tool parameter model
//!
//! Each tool declares an ordered table of [`ParamSpec`]s. The table is
//! validated once at registration, rendered into the tool's JSON input
//! schema, and drives the single [`coerce`] routine every invocation goes
//! through before its handler runs.

use crate::error::{AtlassianMcpError, AtlassianMcpResult};
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Number,
    Boolean,
}

impl ParamKind {
    fn schema_type(self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Number => "number",
            ParamKind::Boolean => "boolean",
        }
    }
}

/// A coerced parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    String(String),
    Number(i64),
    Boolean(bool),
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::String(_) => ParamKind::String,
            ParamValue::Number(_) => ParamKind::Number,
            ParamValue::Boolean(_) => ParamKind::Boolean,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            ParamValue::String(s) => Value::String(s.clone()),
            ParamValue::Number(n) => Value::from(*n),
            ParamValue::Boolean(b) => Value::Bool(*b),
        }
    }
}

/// One named parameter of a tool
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub description: &'static str,
    /// `None` exactly when the parameter is required
    pub default: Option<ParamValue>,
}

impl ParamSpec {
    pub fn required_string(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::String,
            description,
            default: None,
        }
    }

    pub fn required_number(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Number,
            description,
            default: None,
        }
    }

    pub fn string(name: &'static str, description: &'static str, default: &str) -> Self {
        Self {
            name,
            kind: ParamKind::String,
            description,
            default: Some(ParamValue::String(default.to_string())),
        }
    }

    pub fn number(name: &'static str, description: &'static str, default: i64) -> Self {
        Self {
            name,
            kind: ParamKind::Number,
            description,
            default: Some(ParamValue::Number(default)),
        }
    }

    pub fn boolean(name: &'static str, description: &'static str, default: bool) -> Self {
        Self {
            name,
            kind: ParamKind::Boolean,
            description,
            default: Some(ParamValue::Boolean(default)),
        }
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    /// Coerce a raw JSON value to this parameter's kind.
    fn coerce_value(&self, raw: &Value) -> Option<ParamValue> {
        match self.kind {
            ParamKind::String => match raw {
                Value::String(s) => Some(ParamValue::String(s.clone())),
                Value::Number(n) => Some(ParamValue::String(n.to_string())),
                Value::Bool(b) => Some(ParamValue::String(b.to_string())),
                _ => None,
            },
            ParamKind::Number => match raw {
                Value::Number(n) => number_from_json(n).map(ParamValue::Number),
                Value::String(s) => number_from_str(s.trim()).map(ParamValue::Number),
                _ => None,
            },
            ParamKind::Boolean => match raw {
                Value::Bool(b) => Some(ParamValue::Boolean(*b)),
                Value::String(s) => match s.trim().to_lowercase().as_str() {
                    "true" | "1" => Some(ParamValue::Boolean(true)),
                    "false" | "0" => Some(ParamValue::Boolean(false)),
                    _ => None,
                },
                _ => None,
            },
        }
    }
}

fn number_from_json(n: &serde_json::Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    n.as_f64()
        .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
        .map(|f| f as i64)
}

fn number_from_str(s: &str) -> Option<i64> {
    s.parse::<i64>().ok().or_else(|| {
        s.parse::<f64>()
            .ok()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

/// Check a parameter table: defaults match required-ness and kind, names are unique.
pub fn validate_specs(tool: &str, specs: &[ParamSpec]) -> AtlassianMcpResult<()> {
    let mut seen = HashSet::new();
    for spec in specs {
        if !seen.insert(spec.name) {
            return Err(AtlassianMcpError::config(format!(
                "tool '{}' declares parameter '{}' twice",
                tool, spec.name
            )));
        }
        if let Some(default) = &spec.default {
            if default.kind() != spec.kind {
                return Err(AtlassianMcpError::config(format!(
                    "tool '{}' parameter '{}' has a {:?} default for a {:?} parameter",
                    tool,
                    spec.name,
                    default.kind(),
                    spec.kind
                )));
            }
        }
    }
    Ok(())
}

/// JSON schema advertised in `tools/list`
pub fn input_schema(specs: &[ParamSpec]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for spec in specs {
        let mut property = json!({
            "type": spec.kind.schema_type(),
            "description": spec.description,
        });
        match &spec.default {
            Some(default) => {
                property["default"] = default.to_json();
            }
            None => required.push(Value::String(spec.name.to_string())),
        }
        properties.insert(spec.name.to_string(), property);
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Coerced parameters handed to a tool handler
#[derive(Debug, Clone, Default)]
pub struct ToolParams {
    values: HashMap<&'static str, ParamValue>,
}

impl ToolParams {
    /// String value, or "" when the tool declares no such parameter
    pub fn string(&self, name: &str) -> String {
        match self.values.get(name) {
            Some(ParamValue::String(s)) => s.clone(),
            _ => String::new(),
        }
    }

    pub fn number(&self, name: &str) -> i64 {
        match self.values.get(name) {
            Some(ParamValue::Number(n)) => *n,
            _ => 0,
        }
    }

    pub fn boolean(&self, name: &str) -> bool {
        matches!(self.values.get(name), Some(ParamValue::Boolean(true)))
    }

    /// Trimmed string value, `None` when blank
    pub fn non_empty(&self, name: &str) -> Option<String> {
        let value = self.string(name);
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

/// Coerce a raw argument bag against a parameter table.
///
/// Required parameters that are absent, null, or blank strings fail with
/// `MissingParameter`; ones that do not coerce fail with `InvalidParameter`.
/// Optional parameters fall back to their default in both cases.
pub fn coerce(specs: &[ParamSpec], arguments: Option<&Value>) -> AtlassianMcpResult<ToolParams> {
    let empty = Map::new();
    let args = match arguments {
        None | Some(Value::Null) => &empty,
        Some(Value::Object(map)) => map,
        Some(_) => {
            return Err(AtlassianMcpError::invalid_param(
                "arguments",
                "expected an object of named parameters",
            ))
        }
    };

    let mut values = HashMap::with_capacity(specs.len());
    for spec in specs {
        let raw = args.get(spec.name).filter(|v| !v.is_null());

        let value = match (raw, &spec.default) {
            (None, None) => return Err(AtlassianMcpError::missing_param(spec.name)),
            (None, Some(default)) => default.clone(),
            (Some(raw), None) => match spec.coerce_value(raw) {
                Some(ParamValue::String(s)) if s.trim().is_empty() => {
                    return Err(AtlassianMcpError::missing_param(spec.name))
                }
                Some(value) => value,
                None => {
                    return Err(AtlassianMcpError::invalid_param(
                        spec.name,
                        format!("expected a {}", spec.kind.schema_type()),
                    ))
                }
            },
            (Some(raw), Some(default)) => spec.coerce_value(raw).unwrap_or_else(|| {
                debug!(
                    "Parameter '{}' could not be read as {}, using default",
                    spec.name,
                    spec.kind.schema_type()
                );
                default.clone()
            }),
        };

        values.insert(spec.name, value);
    }

    Ok(ToolParams { values })
}
