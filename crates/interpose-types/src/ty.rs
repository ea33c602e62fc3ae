//! Runtime type descriptions for method parameters and return types

use std::fmt;

use serde::Serialize;

/// Primitive value types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    /// Boolean
    Bool,
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
    /// 64-bit float
    F64,
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveType::Bool => write!(f, "bool"),
            PrimitiveType::I32 => write!(f, "i32"),
            PrimitiveType::I64 => write!(f, "i64"),
            PrimitiveType::F64 => write!(f, "f64"),
        }
    }
}

/// Type kind enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    /// The void marker (no return value)
    Void,
    /// Primitive value types
    Primitive(PrimitiveType),
    /// String type
    String,
    /// Class types
    Class,
    /// Interface types
    Interface,
    /// Asynchronous unit of work, optionally producing a value
    Task,
    /// Array types
    Array,
}

/// Runtime type information
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TypeInfo {
    /// Type kind
    pub kind: TypeKind,
    /// Type name
    pub name: String,
    /// Type arguments (task result type, array element type)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub type_arguments: Vec<TypeInfo>,
}

impl TypeInfo {
    fn simple(kind: TypeKind, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            type_arguments: Vec::new(),
        }
    }

    /// The void marker
    pub fn void() -> Self {
        Self::simple(TypeKind::Void, "void")
    }

    /// Create a primitive type info
    pub fn primitive(prim: PrimitiveType) -> Self {
        Self::simple(TypeKind::Primitive(prim), &prim.to_string())
    }

    /// `bool`
    pub fn bool() -> Self {
        Self::primitive(PrimitiveType::Bool)
    }

    /// `i32`
    pub fn i32() -> Self {
        Self::primitive(PrimitiveType::I32)
    }

    /// `i64`
    pub fn i64() -> Self {
        Self::primitive(PrimitiveType::I64)
    }

    /// `f64`
    pub fn f64() -> Self {
        Self::primitive(PrimitiveType::F64)
    }

    /// `string`
    pub fn string() -> Self {
        Self::simple(TypeKind::String, "string")
    }

    /// Create a class type info
    pub fn class(name: &str) -> Self {
        Self::simple(TypeKind::Class, name)
    }

    /// Create an interface type info
    pub fn interface(name: &str) -> Self {
        Self::simple(TypeKind::Interface, name)
    }

    /// A task that completes without a value
    pub fn task() -> Self {
        Self::simple(TypeKind::Task, "Task")
    }

    /// A task that completes with a value of type `result`
    pub fn task_of(result: TypeInfo) -> Self {
        Self {
            kind: TypeKind::Task,
            name: format!("Task<{}>", result.name),
            type_arguments: vec![result],
        }
    }

    /// A named type deriving from the task family
    pub fn derived_task(name: &str, result: Option<TypeInfo>) -> Self {
        Self {
            kind: TypeKind::Task,
            name: name.to_string(),
            type_arguments: result.into_iter().collect(),
        }
    }

    /// Create an array type info
    pub fn array(element_type: TypeInfo) -> Self {
        Self {
            kind: TypeKind::Array,
            name: format!("{}[]", element_type.name),
            type_arguments: vec![element_type],
        }
    }

    /// Check for the void marker
    pub fn is_void(&self) -> bool {
        self.kind == TypeKind::Void
    }

    /// Check whether this type is, or derives from, the task family
    pub fn is_task(&self) -> bool {
        self.kind == TypeKind::Task
    }

    /// Result type carried by a task, if this is a value-producing task
    pub fn task_result(&self) -> Option<&TypeInfo> {
        if self.is_task() {
            self.type_arguments.first()
        } else {
            None
        }
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
