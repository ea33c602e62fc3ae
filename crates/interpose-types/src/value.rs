//! Value: the opaque argument and result slot
//!
//! Every argument and every result crossing an interception boundary is a
//! `Value`, whatever the declared type of the method. Typed access goes
//! through the `as_*` accessors or the conversion traits in `convert`.

use std::fmt;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};

use crate::error::InvocationError;
use crate::object::Object;
use crate::ty::{PrimitiveType, TypeInfo, TypeKind};

/// A boxed, sendable future producing a single value.
///
/// This is the normalized asynchronous result every handler returns,
/// regardless of the intercepted method's declared return type.
pub type ValueFuture = BoxFuture<'static, Result<Value, InvocationError>>;

/// Dynamically typed value
#[derive(Clone, Default)]
pub enum Value {
    /// No value (result of void methods and value-less tasks)
    #[default]
    Unit,
    /// Null reference
    Null,
    /// Boolean
    Bool(bool),
    /// 32-bit integer
    I32(i32),
    /// 64-bit integer
    I64(i64),
    /// 64-bit float
    F64(f64),
    /// Immutable string
    Str(Arc<str>),
    /// Immutable array
    Array(Arc<[Value]>),
    /// Object reference
    Object(Arc<dyn Object>),
}

impl Value {
    /// Zero value of a declared type.
    ///
    /// `void` maps to `Unit`, numbers to zero, `bool` to false, and every
    /// reference type (strings, arrays, classes, interfaces, tasks) to `Null`.
    pub fn default_for(ty: &TypeInfo) -> Self {
        match ty.kind {
            TypeKind::Void => Value::Unit,
            TypeKind::Primitive(PrimitiveType::Bool) => Value::Bool(false),
            TypeKind::Primitive(PrimitiveType::I32) => Value::I32(0),
            TypeKind::Primitive(PrimitiveType::I64) => Value::I64(0),
            TypeKind::Primitive(PrimitiveType::F64) => Value::F64(0.0),
            TypeKind::String
            | TypeKind::Class
            | TypeKind::Interface
            | TypeKind::Task
            | TypeKind::Array => Value::Null,
        }
    }

    /// Check if this is the unit value
    pub fn is_unit(&self) -> bool {
        matches!(self, Value::Unit)
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as boolean if this is a bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i32 if this is an i32
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as i64 (i32 widens)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(i) => Some(*i),
            Value::I32(i) => Some(*i as i64),
            _ => None,
        }
    }

    /// Get as f64 if this is an f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as string slice if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get array elements if this is an array
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Get the object reference if this is an object
    pub fn as_object(&self) -> Option<&Arc<dyn Object>> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Short name of the value's kind, for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::F64(_) => "f64",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            // Objects compare by identity
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "Unit"),
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::I32(i) => write!(f, "I32({})", i),
            Value::I64(i) => write!(f, "I64({})", i),
            Value::F64(x) => write!(f, "F64({})", x),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::Array(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Object(obj) => write!(f, "Object({})", obj.contract().name()),
        }
    }
}

/// What a method body hands back, in its declared return shape.
///
/// Synchronous methods (void or plain value) return `Value`; methods whose
/// declared return type is a task return `Task`.
pub enum Returned {
    /// Synchronous result
    Value(Value),
    /// Pending asynchronous result
    Task(ValueFuture),
}

impl Returned {
    /// A task that is already complete
    pub fn ready(value: Value) -> Self {
        Returned::Task(future::ready(Ok(value)).boxed())
    }

    /// Normalize into a single asynchronous result.
    ///
    /// A synchronous value becomes an already-completed future, so awaiting
    /// it never suspends.
    pub fn into_future(self) -> ValueFuture {
        match self {
            Returned::Value(value) => future::ready(Ok(value)).boxed(),
            Returned::Task(task) => task,
        }
    }

    /// Resolve to a value, blocking the current thread on pending tasks
    pub fn wait(self) -> Result<Value, InvocationError> {
        match self {
            Returned::Value(value) => Ok(value),
            Returned::Task(task) => wait_for(task),
        }
    }

    /// Check whether this is a task
    pub fn is_task(&self) -> bool {
        matches!(self, Returned::Task(_))
    }
}

impl fmt::Debug for Returned {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Returned::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Returned::Task(_) => write!(f, "Task(..)"),
        }
    }
}

/// Drive a normalized result to completion on the calling thread.
///
/// Futures that are already complete are resolved without entering an
/// executor. Anything still pending blocks the thread until it resolves, so
/// callers must only hand in futures that make progress without this thread.
pub fn wait_for(mut task: ValueFuture) -> Result<Value, InvocationError> {
    match (&mut task).now_or_never() {
        Some(result) => result,
        None => futures::executor::block_on(task),
    }
}
