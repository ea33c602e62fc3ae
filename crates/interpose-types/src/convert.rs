//! Conversions between `Value` and Rust types.
//!
//! `From<T> for Value` covers the outbound direction; implement `FromValue`
//! to read a typed result back out of a call.

use std::sync::Arc;

use crate::error::InvocationError;
use crate::object::Object;
use crate::value::Value;

/// Convert from Value to a Rust type.
pub trait FromValue: Sized {
    /// Convert, returning an error if the kind doesn't match
    fn from_value(value: Value) -> Result<Self, InvocationError>;
}

fn mismatch(expected: &str, value: &Value) -> InvocationError {
    InvocationError::TypeMismatch {
        expected: expected.to_string(),
        got: value.kind_name().to_string(),
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, InvocationError> {
        Ok(value)
    }
}

impl FromValue for () {
    fn from_value(value: Value) -> Result<Self, InvocationError> {
        match value {
            Value::Unit => Ok(()),
            other => Err(mismatch("unit", &other)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, InvocationError> {
        value.as_bool().ok_or_else(|| mismatch("bool", &value))
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Result<Self, InvocationError> {
        value.as_i32().ok_or_else(|| mismatch("i32", &value))
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self, InvocationError> {
        value.as_i64().ok_or_else(|| mismatch("i64", &value))
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, InvocationError> {
        value.as_f64().ok_or_else(|| mismatch("f64", &value))
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, InvocationError> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch("string", &value))
    }
}

// Null maps to None for any convertible type
impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, InvocationError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Unit
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::I32(i)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::I64(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::F64(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(Arc::from(items))
    }
}

impl From<Arc<dyn Object>> for Value {
    fn from(obj: Arc<dyn Object>) -> Self {
        Value::Object(obj)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}
