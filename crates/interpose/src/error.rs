//! Errors raised while synthesizing proxy types and creating instances

use std::path::PathBuf;

use interpose_types::InvocationError;

/// Proxy creation result
pub type ProxyResult<T> = Result<T, ProxyError>;

/// Proxy synthesis and construction errors.
///
/// Contract shape problems surface here on first use of a contract, never
/// at call time.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// The contract's method set cannot be enumerated
    #[error("Contract {0} is not reflectable")]
    NotReflectable(String),

    /// The class forbids subclassing
    #[error("Class {0} is sealed and cannot be proxied")]
    SealedContract(String),

    /// The class has nothing a subtype could override
    #[error("Class {0} has no overridable methods")]
    NoOverridableMethods(String),

    /// One method key is inherited with different return types
    #[error("Contract {contract} inherits {method} with conflicting return types ({first} vs {second})")]
    ConflictingMethod {
        /// Contract being proxied
        contract: String,
        /// Method key
        method: String,
        /// First declaration seen, as `Declarer: type`
        first: String,
        /// Conflicting declaration, as `Declarer: type`
        second: String,
    },

    /// The supplied target does not implement the contract
    #[error("Target of type {target} does not implement {contract}")]
    TargetMismatch {
        /// Proxied contract name
        contract: String,
        /// Target's contract name
        target: String,
    },

    /// Tried to instantiate an interface or a class with abstract methods
    #[error("Cannot instantiate abstract type {0}")]
    AbstractType(String),

    /// An implementation leaves abstract methods uncovered
    #[error("Implementation of {contract} is missing {method}")]
    IncompleteImplementation {
        /// Contract name
        contract: String,
        /// Missing method signature
        method: String,
    },

    /// Writing a diagnostic dump failed
    #[error("Failed to write proxy dump to {path}: {source}")]
    Dump {
        /// Destination file
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Serializing a diagnostic dump failed
    #[error("Failed to serialize proxy dump: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A call failed
    #[error(transparent)]
    Invocation(#[from] InvocationError),
}
