//! Declarative parameter schema.
//!
//! Operation tables are `static` slices, so every builder here is a `const fn`.

use rmcp::model::JsonObject;
use serde_json::{Value, json};

/// Declared kind of a parameter; coercion targets one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Float,
    Boolean,
    /// Calendar date, `YYYY-MM-DD`.
    Date,
    /// RFC 3339 timestamp.
    DateTime,
    /// Absolute `http`/`https` URL.
    Url,
    /// Free-form JSON object, forwarded as-is.
    Object,
    /// String restricted to the listed values.
    Enum(&'static [&'static str]),
}

impl ParamKind {
    /// Short human name used in type errors.
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            Self::String => "a string",
            Self::Integer => "an integer",
            Self::Float => "a number",
            Self::Boolean => "a boolean",
            Self::Date => "a date (YYYY-MM-DD)",
            Self::DateTime => "an RFC 3339 timestamp",
            Self::Url => "an http(s) URL",
            Self::Object => "an object",
            Self::Enum(_) => "a string",
        }
    }
}

/// Where a parameter goes in the upstream request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamLocation {
    /// Substituted into a `{name}` placeholder of the endpoint path.
    Path,
    Query,
    /// Field of the JSON request body.
    Body,
}

/// Compile-time default value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Str(&'static str),
}

impl Literal {
    #[must_use]
    pub fn to_value(self) -> Value {
        match self {
            Self::Integer(i) => json!(i),
            Self::Float(f) => json!(f),
            Self::Boolean(b) => json!(b),
            Self::Str(s) => json!(s),
        }
    }
}

/// What happens to an integer outside `min..=max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsMode {
    Reject,
    Clamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min: i64,
    pub max: i64,
    pub mode: BoundsMode,
}

impl Bounds {
    /// Apply the bounds to `value`. `Err` carries a message for a rejected value.
    pub fn apply(self, name: &str, value: i64) -> Result<i64, String> {
        if (self.min..=self.max).contains(&value) {
            return Ok(value);
        }
        match self.mode {
            BoundsMode::Clamp => Ok(value.clamp(self.min, self.max)),
            BoundsMode::Reject if self.max == i64::MAX => {
                Err(format!("{name} must be at least {}, got {value}", self.min))
            }
            BoundsMode::Reject => Err(format!(
                "{name} must be between {} and {}, got {value}",
                self.min, self.max
            )),
        }
    }
}

/// One declared parameter of an operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub default: Option<Literal>,
    pub location: ParamLocation,
    /// Name sent upstream, when it differs from `name`.
    pub wire_name: Option<&'static str>,
    pub description: &'static str,
    pub bounds: Option<Bounds>,
    /// Reject strings that are empty after trimming.
    pub non_empty: bool,
}

impl ParameterSpec {
    /// Optional query parameter with no default.
    #[must_use]
    pub const fn new(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            default: None,
            location: ParamLocation::Query,
            wire_name: None,
            description: "",
            bounds: None,
            non_empty: false,
        }
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub const fn with_default(mut self, value: Literal) -> Self {
        self.default = Some(value);
        self
    }

    #[must_use]
    pub const fn in_path(mut self) -> Self {
        self.location = ParamLocation::Path;
        self
    }

    #[must_use]
    pub const fn in_body(mut self) -> Self {
        self.location = ParamLocation::Body;
        self
    }

    #[must_use]
    pub const fn wire(mut self, name: &'static str) -> Self {
        self.wire_name = Some(name);
        self
    }

    #[must_use]
    pub const fn doc(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Reject integers outside `min..=max`. Use `i64::MAX` for an open upper bound.
    #[must_use]
    pub const fn bounded(mut self, min: i64, max: i64) -> Self {
        self.bounds = Some(Bounds {
            min,
            max,
            mode: BoundsMode::Reject,
        });
        self
    }

    /// Clamp integers into `min..=max`.
    #[must_use]
    pub const fn clamped(mut self, min: i64, max: i64) -> Self {
        self.bounds = Some(Bounds {
            min,
            max,
            mode: BoundsMode::Clamp,
        });
        self
    }

    #[must_use]
    pub const fn non_empty(mut self) -> Self {
        self.non_empty = true;
        self
    }

    #[must_use]
    pub fn wire_name(&self) -> &'static str {
        self.wire_name.unwrap_or(self.name)
    }

    /// JSON Schema fragment for this parameter.
    #[must_use]
    pub fn json_schema(&self) -> Value {
        let mut schema = match self.kind {
            ParamKind::String => json!({ "type": "string" }),
            ParamKind::Integer => json!({ "type": "integer" }),
            ParamKind::Float => json!({ "type": "number" }),
            ParamKind::Boolean => json!({ "type": "boolean" }),
            ParamKind::Date => json!({ "type": "string", "format": "date" }),
            ParamKind::DateTime => json!({ "type": "string", "format": "date-time" }),
            ParamKind::Url => json!({ "type": "string", "format": "uri" }),
            ParamKind::Object => json!({ "type": "object" }),
            ParamKind::Enum(values) => json!({ "type": "string", "enum": values }),
        };

        if !self.description.is_empty() {
            schema["description"] = json!(self.description);
        }
        if let Some(default) = self.default {
            schema["default"] = default.to_value();
        }
        if let Some(bounds) = self.bounds {
            schema["minimum"] = json!(bounds.min);
            if bounds.max != i64::MAX {
                schema["maximum"] = json!(bounds.max);
            }
        }
        if self.non_empty {
            schema["minLength"] = json!(1);
        }
        schema
    }
}

/// Build the MCP input schema (`{type: object, properties, required}`) for a parameter list.
#[must_use]
pub fn input_schema(parameters: &[ParameterSpec]) -> JsonObject {
    let mut properties = JsonObject::new();
    let mut required: Vec<&str> = Vec::new();

    for param in parameters {
        properties.insert(param.name.to_string(), param.json_schema());
        if param.required && param.default.is_none() {
            required.push(param.name);
        }
    }

    let mut schema = JsonObject::new();
    schema.insert("type".to_string(), json!("object"));
    schema.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".to_string(), json!(required));
    }
    schema
}
