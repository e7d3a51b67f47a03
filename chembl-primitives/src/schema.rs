//! Parameter and result schema building blocks.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{Error, Result};

const MAX_PARAM_LEN: usize = 64;

/// Semantic type of an operation parameter.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    /// UTF-8 text.
    String,
    /// Whole number.
    Integer,
    /// Any JSON number.
    Number,
    /// `true` or `false`.
    Boolean,
}

impl ParamType {
    /// Returns the JSON Schema type keyword.
    #[must_use]
    pub const fn json_type(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }

    /// Returns `true` if the supplied JSON value inhabits this type.
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
        }
    }

    /// Names the JSON type of an arbitrary value, for diagnostics.
    #[must_use]
    pub fn describe(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(n) if n.is_f64() => "number",
            Value::Number(_) => "integer",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.json_type())
    }
}

/// One entry of an operation's ordered parameter list.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    name: String,
    #[serde(rename = "type")]
    kind: ParamType,
    required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl ParamSpec {
    /// Declares a required parameter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if the name is empty, too long, or
    /// contains characters other than ASCII alphanumerics and `_`.
    pub fn required(name: impl Into<String>, kind: ParamType) -> Result<Self> {
        Self::new(name.into(), kind, true)
    }

    /// Declares an optional parameter.
    ///
    /// # Errors
    ///
    /// Same conditions as [`ParamSpec::required`].
    pub fn optional(name: impl Into<String>, kind: ParamType) -> Result<Self> {
        Self::new(name.into(), kind, false)
    }

    fn new(name: String, kind: ParamType, required: bool) -> Result<Self> {
        if name.is_empty() || name.len() > MAX_PARAM_LEN {
            return Err(Error::InvalidParameter {
                reason: format!("parameter name must be 1..={MAX_PARAM_LEN} characters"),
            });
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::InvalidParameter {
                reason: format!(
                    "parameter `{name}` must contain ASCII alphanumerics or underscore"
                ),
            });
        }
        Ok(Self {
            name,
            kind,
            required,
            description: None,
        })
    }

    /// Attaches a description shown to the agent.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the semantic type.
    #[must_use]
    pub const fn kind(&self) -> ParamType {
        self.kind
    }

    /// Returns `true` if the parameter must be supplied.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Renders this parameter as a JSON Schema property.
    #[must_use]
    pub fn schema(&self) -> Value {
        let mut property = json!({ "type": self.kind.json_type() });
        if let (Some(description), Some(map)) = (&self.description, property.as_object_mut()) {
            map.insert("description".into(), Value::from(description.clone()));
        }
        property
    }
}

/// Shape of the value an operation returns.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultShape {
    /// A single string.
    Text,
    /// A single boolean.
    Boolean,
    /// A JSON object.
    Mapping,
    /// An ordered sequence of JSON objects.
    Records,
}

impl ResultShape {
    /// Returns `true` if the value already has this shape.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Text => value.is_string(),
            Self::Boolean => value.is_boolean(),
            Self::Mapping => value.is_object(),
            Self::Records => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_object)),
        }
    }

    /// Returns the lowercase label used in discovery payloads.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Boolean => "boolean",
            Self::Mapping => "mapping",
            Self::Records => "records",
        }
    }
}

impl fmt::Display for ResultShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_types_match_json_values() {
        assert!(ParamType::String.matches(&json!("CCO")));
        assert!(ParamType::Integer.matches(&json!(9606)));
        assert!(!ParamType::Integer.matches(&json!(1.5)));
        assert!(ParamType::Number.matches(&json!(1.5)));
        assert!(ParamType::Number.matches(&json!(2)));
        assert!(ParamType::Boolean.matches(&json!(false)));
        assert!(!ParamType::String.matches(&Value::Null));
    }

    #[test]
    fn describe_names_value_types() {
        assert_eq!(ParamType::describe(&json!(1)), "integer");
        assert_eq!(ParamType::describe(&json!(1.0)), "number");
        assert_eq!(ParamType::describe(&json!([1])), "array");
        assert_eq!(ParamType::describe(&Value::Null), "null");
    }

    #[test]
    fn param_spec_validates_name() {
        let spec = ParamSpec::required("assay_chembl_id", ParamType::String)
            .expect("valid")
            .with_description("ChEMBL assay ID");
        assert!(spec.is_required());
        assert_eq!(
            spec.schema(),
            json!({"type": "string", "description": "ChEMBL assay ID"})
        );

        let err = ParamSpec::optional("bad-name", ParamType::String).expect_err("dash");
        assert!(matches!(err, Error::InvalidParameter { .. }));
        assert!(ParamSpec::optional("", ParamType::String).is_err());
    }

    #[test]
    fn result_shape_accepts() {
        assert!(ResultShape::Records.accepts(&json!([{"a": 1}, {"b": 2}])));
        assert!(!ResultShape::Records.accepts(&json!([1, 2])));
        assert!(ResultShape::Mapping.accepts(&json!({"ok": true})));
        assert!(!ResultShape::Text.accepts(&json!(3)));
        assert_eq!(ResultShape::Records.to_string(), "records");
    }
}
