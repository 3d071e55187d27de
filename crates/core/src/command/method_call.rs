use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArgumentError {
    #[error("argument `{key}` must be {expected}, got {actual}")]
    WrongType {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("argument `{key}` is out of range: {value}")]
    OutOfRange { key: String, value: i64 },
}

/// A value in a command's argument map.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
}

impl ArgValue {
    fn type_name(&self) -> &'static str {
        match self {
            ArgValue::Null => "null",
            ArgValue::Bool(_) => "bool",
            ArgValue::Int(_) => "int",
            ArgValue::Float(_) => "float",
            ArgValue::Str(_) => "string",
            ArgValue::Bytes(_) => "bytes",
        }
    }
}

impl From<bool> for ArgValue {
    fn from(v: bool) -> Self {
        ArgValue::Bool(v)
    }
}

impl From<i32> for ArgValue {
    fn from(v: i32) -> Self {
        ArgValue::Int(v as i64)
    }
}

impl From<i64> for ArgValue {
    fn from(v: i64) -> Self {
        ArgValue::Int(v)
    }
}

impl From<u32> for ArgValue {
    fn from(v: u32) -> Self {
        ArgValue::Int(v as i64)
    }
}

impl From<f64> for ArgValue {
    fn from(v: f64) -> Self {
        ArgValue::Float(v)
    }
}

impl From<&str> for ArgValue {
    fn from(v: &str) -> Self {
        ArgValue::Str(v.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(v: String) -> Self {
        ArgValue::Str(v)
    }
}

impl From<Vec<u8>> for ArgValue {
    fn from(v: Vec<u8>) -> Self {
        ArgValue::Bytes(v)
    }
}

/// Typed extraction from an [`ArgValue`].
pub trait FromArg: Sized {
    const EXPECTED: &'static str;

    /// `None` when the value has a different type.
    fn from_arg(value: &ArgValue) -> Option<Self>;
}

impl FromArg for bool {
    const EXPECTED: &'static str = "a bool";

    fn from_arg(value: &ArgValue) -> Option<Self> {
        match value {
            ArgValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromArg for i64 {
    const EXPECTED: &'static str = "an int";

    fn from_arg(value: &ArgValue) -> Option<Self> {
        match value {
            ArgValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromArg for String {
    const EXPECTED: &'static str = "a string";

    fn from_arg(value: &ArgValue) -> Option<Self> {
        match value {
            ArgValue::Str(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromArg for Vec<u8> {
    const EXPECTED: &'static str = "bytes";

    fn from_arg(value: &ArgValue) -> Option<Self> {
        match value {
            ArgValue::Bytes(v) => Some(v.clone()),
            _ => None,
        }
    }
}

/// A command from the host: method name plus named arguments.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MethodCall {
    pub method: String,
    pub arguments: HashMap<String, ArgValue>,
}

impl MethodCall {
    pub fn new(method: &str) -> Self {
        Self {
            method: method.to_string(),
            arguments: HashMap::new(),
        }
    }

    pub fn arg(mut self, key: &str, value: impl Into<ArgValue>) -> Self {
        self.arguments.insert(key.to_string(), value.into());
        self
    }

    /// Absent and null arguments are `Ok(None)`; a value of another type is
    /// an error.
    pub fn argument<T: FromArg>(&self, key: &str) -> Result<Option<T>, ArgumentError> {
        match self.arguments.get(key) {
            None | Some(ArgValue::Null) => Ok(None),
            Some(value) => T::from_arg(value)
                .map(Some)
                .ok_or_else(|| ArgumentError::WrongType {
                    key: key.to_string(),
                    expected: T::EXPECTED,
                    actual: value.type_name(),
                }),
        }
    }

    /// A 32-bit integer argument.
    pub fn int_argument(&self, key: &str) -> Result<Option<i32>, ArgumentError> {
        match self.argument::<i64>(key)? {
            None => Ok(None),
            Some(v) => i32::try_from(v).map(Some).map_err(|_| ArgumentError::OutOfRange {
                key: key.to_string(),
                value: v,
            }),
        }
    }

    /// Any numeric argument, floats truncated toward zero.
    pub fn number_argument(&self, key: &str) -> Result<Option<i64>, ArgumentError> {
        match self.arguments.get(key) {
            None | Some(ArgValue::Null) => Ok(None),
            Some(ArgValue::Int(v)) => Ok(Some(*v)),
            Some(ArgValue::Float(v)) => Ok(Some(*v as i64)),
            Some(other) => Err(ArgumentError::WrongType {
                key: key.to_string(),
                expected: "a number",
                actual: other.type_name(),
            }),
        }
    }
}

/// Reply to a [`MethodCall`].
#[derive(Debug, Clone, PartialEq)]
pub enum MethodResult {
    Success(Value),
    Error { code: String, message: String },
    /// The method name is not handled. Distinct from an error.
    NotImplemented,
}

impl MethodResult {
    pub fn ack() -> Self {
        MethodResult::Success(Value::Null)
    }

    pub fn error(code: &str, message: impl Into<String>) -> Self {
        MethodResult::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MethodResult::Success(_))
    }
}
