//! Return-shape classification
//!
//! Every intercepted method falls into one of four shapes depending on its
//! declared return type. The shape decides what a proceed call yields when
//! no implementation exists and how the handler's normalized result is
//! turned back into the declared return.

use std::fmt;

use futures::future::FutureExt;
use interpose_types::{wait_for, InvocationError, Returned, TypeInfo, Value, ValueFuture};
use serde::Serialize;

/// Classification of a method's declared return type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "shape", content = "type", rename_all = "snake_case")]
pub enum ReturnShape {
    /// Returns nothing
    Void,
    /// Returns a value synchronously
    Value(TypeInfo),
    /// Returns a task without a result
    Async,
    /// Returns a task producing a value
    AsyncValue(TypeInfo),
}

impl ReturnShape {
    /// Classify a declared return type.
    ///
    /// Pure function of the type; runtime values never influence it.
    pub fn classify(return_type: &TypeInfo) -> Self {
        if return_type.is_task() {
            match return_type.task_result() {
                Some(result) => ReturnShape::AsyncValue(result.clone()),
                None => ReturnShape::Async,
            }
        } else if return_type.is_void() {
            ReturnShape::Void
        } else {
            ReturnShape::Value(return_type.clone())
        }
    }

    /// Whether callers receive a task
    pub fn is_async(&self) -> bool {
        matches!(self, ReturnShape::Async | ReturnShape::AsyncValue(_))
    }

    /// Type of the produced value, if any
    pub fn value_type(&self) -> Option<&TypeInfo> {
        match self {
            ReturnShape::Value(ty) | ReturnShape::AsyncValue(ty) => Some(ty),
            ReturnShape::Void | ReturnShape::Async => None,
        }
    }

    /// Zero value carried by this shape (`Unit` for the value-less shapes)
    pub fn default_value(&self) -> Value {
        self.value_type()
            .map(Value::default_for)
            .unwrap_or(Value::Unit)
    }

    /// Shape-appropriate default return: no-op, zero value, or an
    /// already-completed task
    pub fn default_returned(&self) -> Returned {
        let value = self.default_value();
        if self.is_async() {
            Returned::ready(value)
        } else {
            Returned::Value(value)
        }
    }

    /// Turn a normalized result back into the declared return shape.
    ///
    /// Synchronous shapes block until the result completes; results that are
    /// already complete are taken without entering an executor. Asynchronous
    /// shapes hand the future back untouched, except that value-less shapes
    /// discard whatever value the handler produced.
    pub fn adapt(&self, result: ValueFuture) -> Result<Returned, InvocationError> {
        match self {
            ReturnShape::Void => wait_for(result).map(|_| Returned::Value(Value::Unit)),
            ReturnShape::Value(_) => wait_for(result).map(Returned::Value),
            ReturnShape::Async => Ok(Returned::Task(
                result.map(|r| r.map(|_| Value::Unit)).boxed(),
            )),
            ReturnShape::AsyncValue(_) => Ok(Returned::Task(result)),
        }
    }

    /// Short label used in logs and dumps
    pub fn label(&self) -> &'static str {
        match self {
            ReturnShape::Void => "void",
            ReturnShape::Value(_) => "value",
            ReturnShape::Async => "async",
            ReturnShape::AsyncValue(_) => "async_value",
        }
    }
}

impl fmt::Display for ReturnShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnShape::Void => write!(f, "void"),
            ReturnShape::Value(ty) => write!(f, "value({})", ty),
            ReturnShape::Async => write!(f, "async"),
            ReturnShape::AsyncValue(ty) => write!(f, "async_value({})", ty),
        }
    }
}
