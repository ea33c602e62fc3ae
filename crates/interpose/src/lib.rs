//! Interpose - runtime proxy synthesis and method interception
//!
//! Given a reflectable contract (an interface or a class) and a handler,
//! `create_proxy` produces an object that implements the contract and
//! routes every overridable method call through the handler. The handler can
//! inspect or rewrite the arguments, proceed to the real implementation,
//! and replace the result.
//!
//! Proxy types are synthesized once per contract and cached for the life of
//! the process:
//!
//! - `collector`: enumerates the interceptable methods of a contract
//! - `shape`: classifies each method's return type and adapts results
//! - `defaults`: the zero-value stand-in used by target-less interface proxies
//! - `proxy`: the synthesized dispatch table and proxy instances
//! - `invocation` / `handler`: what a handler receives and how it is written
//! - `factory`: the concurrent, first-writer-wins type cache
//!
//! # Example
//!
//! ```ignore
//! use interpose::{create_proxy, Handler, ObjectExt, Value};
//!
//! let proxy = create_proxy(&contract, Some(target), Handler::new(|inv| async move {
//!     let value = inv.proceed().await?;
//!     Ok(Value::from(format!("{} Test", value.as_str().unwrap_or_default())))
//! }))?;
//! let greeting = proxy.call_sync("greet", vec![Value::from("world")])?;
//! ```

#![warn(missing_docs)]

pub mod collector;
pub mod config;
pub mod defaults;
pub mod dump;
pub mod error;
pub mod factory;
pub mod handler;
pub mod invocation;
pub mod object;
pub mod proxy;
pub mod shape;

pub use config::FactoryOptions;
pub use defaults::DefaultImplementation;
pub use dump::{write_dump, MethodDump, ProxyTypeDump};
pub use error::{ProxyError, ProxyResult};
pub use factory::{create_proxy, ProxyFactory};
pub use handler::{Handler, HandlerFn};
pub use invocation::{Invocation, TargetKind};
pub use object::{ClassInstance, Implementation, ImplementationBuilder, ObjectExt};
pub use proxy::{MethodDescriptor, ProxyObject, ProxyType};
pub use shape::ReturnShape;

pub use interpose_types::{
    async_body, sync_body, wait_for, ContractBuilder, ContractError, ContractId, ContractKind,
    ContractType, FromValue, InvocationError, InvocationResult, MethodBody, MethodDefinition,
    MethodInfo, MethodKey, Modifiers, Object, ParameterInfo, PrimitiveType, Returned, TypeInfo,
    TypeKind, Value, ValueFuture,
};
