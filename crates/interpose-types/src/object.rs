//! The object interface every callable instance implements

use std::sync::Arc;

use crate::contract::{ContractType, MethodKey};
use crate::error::InvocationError;
use crate::value::{Returned, Value};

/// An instance of some contract type.
///
/// Plain class instances, hand-built implementations, default stand-ins and
/// proxies all implement this trait, so any of them can serve as the target
/// of a proxy or as the `this` receiver of a method body.
pub trait Object: Send + Sync {
    /// The contract this object was created for
    fn contract(&self) -> &Arc<ContractType>;

    /// Invoke a method by identity.
    ///
    /// The result keeps the method's declared shape: synchronous methods
    /// return `Returned::Value`, task-returning methods `Returned::Task`.
    fn invoke(&self, method: &MethodKey, args: Vec<Value>) -> Result<Returned, InvocationError>;
}
