//! Input parameters of physics objects.
//!
//! Parameters are keyed by their input file name. They can be built in code or deserialized from
//! any `serde` format, e.g.
//! ```json
//! { "f_name": "F", "coupled_variables": ["c", "eta"], "derivative_order": 2 }
//! ```
use eyre::eyre;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::{Display, Formatter};

use crate::value::Real;

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Bool(bool),
    Integer(i64),
    Real(Real),
    String(String),
    StringList(Vec<String>),
    RealList(Vec<Real>),
}

impl ParameterValue {
    fn type_name(&self) -> &'static str {
        match self {
            ParameterValue::Bool(_) => "bool",
            ParameterValue::Integer(_) => "integer",
            ParameterValue::Real(_) => "real",
            ParameterValue::String(_) => "string",
            ParameterValue::StringList(_) => "string list",
            ParameterValue::RealList(_) => "real list",
        }
    }

    /// Number of entries for list values.
    pub fn len(&self) -> Option<usize> {
        match self {
            ParameterValue::StringList(list) => Some(list.len()),
            ParameterValue::RealList(list) => Some(list.len()),
            _ => None,
        }
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        ParameterValue::Bool(value)
    }
}

impl From<i64> for ParameterValue {
    fn from(value: i64) -> Self {
        ParameterValue::Integer(value)
    }
}

impl From<Real> for ParameterValue {
    fn from(value: Real) -> Self {
        ParameterValue::Real(value)
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        ParameterValue::String(value.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        ParameterValue::String(value)
    }
}

impl From<Vec<String>> for ParameterValue {
    fn from(value: Vec<String>) -> Self {
        ParameterValue::StringList(value)
    }
}

impl From<&[&str]> for ParameterValue {
    fn from(value: &[&str]) -> Self {
        ParameterValue::StringList(value.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ParameterValue {
    fn from(value: [&str; N]) -> Self {
        ParameterValue::from(&value[..])
    }
}

impl From<Vec<Real>> for ParameterValue {
    fn from(value: Vec<Real>) -> Self {
        ParameterValue::RealList(value)
    }
}

/// The name of a material property as given in an input file.
///
/// In place of a name, a numeric literal may be given. Such a value denotes a constant property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialPropertyName(String);

impl MaterialPropertyName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The constant value, if the name is a numeric literal.
    pub fn constant_value(&self) -> Option<Real> {
        self.0.trim().parse::<Real>().ok()
    }
}

impl Display for MaterialPropertyName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MaterialPropertyName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Conversion from a parameter value to a typed value.
pub trait FromParameter: Sized {
    const TYPE_NAME: &'static str;

    fn from_parameter(value: &ParameterValue) -> Option<Self>;
}

impl FromParameter for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_parameter(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::Bool(value) => Some(*value),
            _ => None,
        }
    }
}

impl FromParameter for i64 {
    const TYPE_NAME: &'static str = "integer";

    fn from_parameter(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::Integer(value) => Some(*value),
            _ => None,
        }
    }
}

impl FromParameter for usize {
    const TYPE_NAME: &'static str = "non-negative integer";

    fn from_parameter(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::Integer(value) => usize::try_from(*value).ok(),
            _ => None,
        }
    }
}

impl FromParameter for Real {
    const TYPE_NAME: &'static str = "real";

    fn from_parameter(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::Real(value) => Some(*value),
            ParameterValue::Integer(value) => Some(*value as Real),
            _ => None,
        }
    }
}

impl FromParameter for String {
    const TYPE_NAME: &'static str = "string";

    fn from_parameter(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::String(value) => Some(value.clone()),
            _ => None,
        }
    }
}

impl FromParameter for MaterialPropertyName {
    const TYPE_NAME: &'static str = "material property name";

    fn from_parameter(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::String(value) => Some(MaterialPropertyName::new(value.clone())),
            // A numeric value given for a property name is a constant property
            ParameterValue::Real(value) => Some(MaterialPropertyName::new(value.to_string())),
            ParameterValue::Integer(value) => Some(MaterialPropertyName::new(value.to_string())),
            _ => None,
        }
    }
}

impl FromParameter for Vec<String> {
    const TYPE_NAME: &'static str = "string list";

    fn from_parameter(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::StringList(list) => Some(list.clone()),
            // A single string is a list of one entry
            ParameterValue::String(value) => Some(vec![value.clone()]),
            _ => None,
        }
    }
}

impl FromParameter for Vec<Real> {
    const TYPE_NAME: &'static str = "real list";

    fn from_parameter(value: &ParameterValue) -> Option<Self> {
        match value {
            ParameterValue::RealList(list) => Some(list.clone()),
            ParameterValue::StringList(list) if list.is_empty() => Some(Vec::new()),
            _ => None,
        }
    }
}

/// Typed input parameters of a physics object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputParameters {
    values: BTreeMap<String, ParameterValue>,
}

impl InputParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the parameter, replacing any existing value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ParameterValue>) -> &mut Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn raw(&self, key: &str) -> Option<&ParameterValue> {
        self.values.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Returns the value of a required parameter.
    pub fn get<T: FromParameter>(&self, key: &str) -> eyre::Result<T> {
        self.get_optional(key)?
            .ok_or_else(|| eyre!("Missing required parameter '{}'", key))
    }

    /// Returns the value of an optional parameter, or `None` if it is not set.
    pub fn get_optional<T: FromParameter>(&self, key: &str) -> eyre::Result<Option<T>> {
        match self.values.get(key) {
            None => Ok(None),
            Some(value) => T::from_parameter(value).map(Some).ok_or_else(|| {
                eyre!(
                    "Parameter '{}' is of type {}, but {} was expected",
                    key,
                    value.type_name(),
                    T::TYPE_NAME
                )
            }),
        }
    }

    /// Returns the value of a parameter, or `default` if it is not set.
    pub fn get_or<T: FromParameter>(&self, key: &str, default: T) -> eyre::Result<T> {
        Ok(self.get_optional(key)?.unwrap_or(default))
    }

    /// Checks that two list parameters have the same number of entries.
    ///
    /// Unset parameters count as empty lists.
    pub fn check_equal_lengths(&self, key_a: &str, key_b: &str) -> eyre::Result<()> {
        let len = |key: &str| -> eyre::Result<usize> {
            match self.values.get(key) {
                None => Ok(0),
                Some(value) => value.len().ok_or_else(|| {
                    eyre!(
                        "Parameter '{}' is of type {}, but a list was expected",
                        key,
                        value.type_name()
                    )
                }),
            }
        };
        let (len_a, len_b) = (len(key_a)?, len(key_b)?);
        if len_a == len_b {
            Ok(())
        } else {
            Err(eyre!(
                "Parameters '{}' and '{}' must have the same number of entries, but have {} and {}",
                key_a,
                key_b,
                len_a,
                len_b
            ))
        }
    }
}
