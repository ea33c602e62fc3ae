//! Interpose types - value and contract model for method interception
//!
//! This crate provides the types shared between contract authors and the
//! interception engine, without depending on the engine itself:
//!
//! - `Value`: the opaque slot every argument and result travels in
//! - `TypeInfo`: runtime descriptions of parameter and return types
//! - `ContractType`: reflectable interfaces and classes, built with
//!   `ContractBuilder`
//! - `Object`: the trait every callable instance implements
//!
//! # Example
//!
//! ```ignore
//! use interpose_types::{ContractBuilder, MethodDefinition, TypeInfo};
//!
//! let calc = ContractBuilder::interface("ICalculator")
//!     .method(
//!         MethodDefinition::new("sum")
//!             .param("a", TypeInfo::i32())
//!             .param("b", TypeInfo::i32())
//!             .returns(TypeInfo::i32()),
//!     )
//!     .build()?;
//! ```

#![warn(missing_docs)]

pub mod contract;
pub mod convert;
pub mod error;
pub mod object;
pub mod ty;
pub mod value;

pub use contract::{
    async_body, sync_body, ContractBuilder, ContractId, ContractKind, ContractType, MethodBody,
    MethodDefinition, MethodInfo, MethodKey, Modifiers, ParameterInfo,
};
pub use convert::FromValue;
pub use error::{ContractError, InvocationError, InvocationResult};
pub use object::Object;
pub use ty::{PrimitiveType, TypeInfo, TypeKind};
pub use value::{wait_for, Returned, Value, ValueFuture};
