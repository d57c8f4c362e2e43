//! Coercion of loosely-typed tool arguments into a typed [`Arguments`] record.

use crate::error::{ErrorKind, Failure};
use crate::schema::{ParamKind, ParameterSpec};
use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat};
use rmcp::model::JsonObject;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use url::Url;

/// A coerced argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
    Url(Url),
    Object(JsonObject),
}

impl ArgValue {
    /// JSON form used for request bodies.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::String(s) => json!(s),
            Self::Integer(i) => json!(i),
            Self::Float(f) => json!(f),
            Self::Boolean(b) => json!(b),
            Self::Date(_) | Self::DateTime(_) | Self::Url(_) => json!(self.to_wire_string()),
            Self::Object(o) => Value::Object(o.clone()),
        }
    }

    /// String form used for path segments and query values.
    #[must_use]
    pub fn to_wire_string(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Boolean(b) => b.to_string(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::DateTime(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            Self::Url(u) => u.to_string(),
            Self::Object(o) => Value::Object(o.clone()).to_string(),
        }
    }
}

/// Validated arguments of one invocation, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: BTreeMap<&'static str, ArgValue>,
}

impl Arguments {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    #[must_use]
    pub fn str(&self, name: &str) -> Option<&str> {
        match self.values.get(name)? {
            ArgValue::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.values.get(name)? {
            ArgValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn boolean(&self, name: &str) -> Option<bool> {
        match self.values.get(name)? {
            ArgValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn url(&self, name: &str) -> Option<&Url> {
        match self.values.get(name)? {
            ArgValue::Url(u) => Some(u),
            _ => None,
        }
    }

    /// Wire-string form of any present argument.
    #[must_use]
    pub fn display(&self, name: &str) -> Option<String> {
        self.values.get(name).map(ArgValue::to_wire_string)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ArgValue)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn insert(&mut self, name: &'static str, value: ArgValue) {
        self.values.insert(name, value);
    }
}

/// Validate `raw` against `parameters`, in declaration order.
///
/// `null` counts as absent. Arguments not named by any parameter are ignored.
///
/// # Errors
///
/// Returns the first [`Failure`] encountered: `MissingParameter`, `InvalidParameterType`,
/// `InvalidEnumValue` or `InvalidParameterValue`.
pub fn coerce_arguments(parameters: &[ParameterSpec], raw: &JsonObject) -> Result<Arguments, Failure> {
    let mut out = Arguments::default();

    for param in parameters {
        let provided = raw.get(param.name).filter(|v| !v.is_null());
        let value = match (provided, param.default) {
            (Some(v), _) => coerce_value(param, v)?,
            (None, Some(default)) => coerce_value(param, &default.to_value())?,
            (None, None) if param.required => return Err(Failure::missing_parameter(param.name)),
            (None, None) => continue,
        };
        out.insert(param.name, value);
    }

    Ok(out)
}

/// Coerce a single present value to the parameter's declared kind.
///
/// # Errors
///
/// Returns a [`Failure`] describing why the value is unacceptable.
pub fn coerce_value(param: &ParameterSpec, value: &Value) -> Result<ArgValue, Failure> {
    let name = param.name;
    match param.kind {
        ParamKind::String => {
            let Value::String(s) = value else {
                return Err(type_error(param, value));
            };
            if param.non_empty && s.trim().is_empty() {
                return Err(Failure::new(
                    ErrorKind::InvalidParameterValue,
                    format!("{name} must not be empty"),
                ));
            }
            Ok(ArgValue::String(s.clone()))
        }
        ParamKind::Integer => {
            let i = as_integer(value).ok_or_else(|| type_error(param, value))?;
            let i = match param.bounds {
                Some(bounds) => bounds
                    .apply(name, i)
                    .map_err(|msg| Failure::new(ErrorKind::InvalidParameterValue, msg))?,
                None => i,
            };
            Ok(ArgValue::Integer(i))
        }
        ParamKind::Float => as_float(value)
            .map(ArgValue::Float)
            .ok_or_else(|| type_error(param, value)),
        ParamKind::Boolean => as_boolean(value)
            .map(ArgValue::Boolean)
            .ok_or_else(|| type_error(param, value)),
        ParamKind::Date => value
            .as_str()
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
            .map(ArgValue::Date)
            .ok_or_else(|| type_error(param, value)),
        ParamKind::DateTime => value
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
            .map(ArgValue::DateTime)
            .ok_or_else(|| type_error(param, value)),
        ParamKind::Url => value
            .as_str()
            .and_then(|s| Url::parse(s.trim()).ok())
            .filter(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
            .map(ArgValue::Url)
            .ok_or_else(|| type_error(param, value)),
        ParamKind::Object => match value {
            Value::Object(o) => Ok(ArgValue::Object(o.clone())),
            _ => Err(type_error(param, value)),
        },
        ParamKind::Enum(allowed) => {
            let Value::String(s) = value else {
                return Err(type_error(param, value));
            };
            if allowed.contains(&s.as_str()) {
                Ok(ArgValue::String(s.clone()))
            } else {
                Err(Failure::new(
                    ErrorKind::InvalidEnumValue,
                    format!("{name} must be one of [{}], got '{s}'", allowed.join(", ")),
                ))
            }
        }
    }
}

fn type_error(param: &ParameterSpec, value: &Value) -> Failure {
    Failure::new(
        ErrorKind::InvalidParameterType,
        format!(
            "{} must be {}, got {}",
            param.name,
            param.kind.describe(),
            describe_value(value)
        ),
    )
}

fn describe_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string {s:?}"),
        Value::Array(_) => "an array".to_string(),
        Value::Object(_) => "an object".to_string(),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            let f = n.as_f64()?;
            (f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64).then(|| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn as_float(value: &Value) -> Option<f64> {
    let f = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    f.is_finite().then_some(f)
}

fn as_boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64()? {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Some(true),
            "false" | "no" | "0" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
