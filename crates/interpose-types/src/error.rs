//! Error types shared by contracts, objects and invocations

use std::sync::Arc;

/// Result type for method calls
pub type InvocationResult<T> = Result<T, InvocationError>;

/// Errors raised while calling a method on an object.
///
/// Handler and method-body failures travel through the proxy unchanged, so
/// this type is cheap to clone and carries user errors verbatim.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InvocationError {
    /// No method with this identity exists on the contract
    #[error("Method not found: {contract}.{method}")]
    MethodNotFound {
        /// Contract name
        contract: String,
        /// Method name or signature
        method: String,
    },

    /// A by-name lookup matched more than one overload
    #[error("Ambiguous call: {contract}.{name} has {count} overloads taking {arity} arguments")]
    AmbiguousMethod {
        /// Contract name
        contract: String,
        /// Method name
        name: String,
        /// Number of arguments supplied
        arity: usize,
        /// Number of matching overloads
        count: usize,
    },

    /// Wrong number of arguments for the method
    #[error("Arity mismatch calling {method}: expected {expected}, got {got}")]
    ArityMismatch {
        /// Method signature
        method: String,
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        got: usize,
    },

    /// Type mismatch during value conversion
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type name
        expected: String,
        /// Actual value kind
        got: String,
    },

    /// Called an abstract method that has no implementation
    #[error("Abstract method has no implementation: {0}")]
    AbstractMethod(String),

    /// Called through a base-class delegate whose proxy is already being dropped
    #[error("Proxy instance dropped before the call: {0}")]
    Detached(String),

    /// Failure raised by user code (handler or method body)
    #[error("{0}")]
    Failed(String),

    /// Arbitrary user error, passed through untouched
    #[error(transparent)]
    Custom(Arc<dyn std::error::Error + Send + Sync>),
}

impl InvocationError {
    /// Wrap an arbitrary error so it can cross the proxy boundary
    pub fn custom(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        InvocationError::Custom(Arc::new(error))
    }
}

impl From<String> for InvocationError {
    fn from(s: String) -> Self {
        InvocationError::Failed(s)
    }
}

impl From<&str> for InvocationError {
    fn from(s: &str) -> Self {
        InvocationError::Failed(s.to_string())
    }
}

/// Errors raised while building a contract type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractError {
    /// Two methods share the same name and parameter types
    #[error("Method '{method}' already exists in contract {contract}")]
    DuplicateMethod {
        /// Contract name
        contract: String,
        /// Method signature
        method: String,
    },

    /// Interface methods cannot carry an implementation
    #[error("Interface method {contract}.{method} cannot have a body")]
    InterfaceMethodBody {
        /// Contract name
        contract: String,
        /// Method signature
        method: String,
    },

    /// A concrete class method was declared without a body
    #[error("Method {contract}.{method} is not abstract but has no body")]
    MissingBody {
        /// Contract name
        contract: String,
        /// Method signature
        method: String,
    },

    /// Modifiers that cannot be combined
    #[error("Invalid modifiers on {contract}.{method}: {reason}")]
    InvalidModifiers {
        /// Contract name
        contract: String,
        /// Method signature
        method: String,
        /// What is wrong
        reason: String,
    },

    /// Parent or extended type is of the wrong kind
    #[error("Contract {contract} cannot inherit from {parent}: {reason}")]
    InvalidParent {
        /// Contract name
        contract: String,
        /// Parent contract name
        parent: String,
        /// What is wrong
        reason: String,
    },
}
