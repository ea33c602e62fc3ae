//! Default-value stand-ins
//!
//! When an interface is proxied without a target, proceeding still needs
//! something that implements the whole contract. The companion built here
//! answers every collected method with its shape's default: void methods do
//! nothing, value methods return the zero value, task methods return an
//! already-completed task carrying the zero value (or nothing).

use std::sync::Arc;

use interpose_types::{ContractType, InvocationError, MethodKey, Object, Returned, Value};
use rustc_hash::FxHashMap;

use crate::proxy::check_arity;
use crate::shape::ReturnShape;

/// Contract implementation that returns shape-appropriate defaults
pub struct DefaultImplementation {
    contract: Arc<ContractType>,
    shapes: FxHashMap<MethodKey, ReturnShape>,
}

impl DefaultImplementation {
    /// Build the stand-in for a contract from its classified methods
    pub fn synthesize<'a>(
        contract: Arc<ContractType>,
        methods: impl IntoIterator<Item = (&'a MethodKey, &'a ReturnShape)>,
    ) -> Self {
        let shapes = methods
            .into_iter()
            .map(|(key, shape)| (key.clone(), shape.clone()))
            .collect();
        Self { contract, shapes }
    }

    /// Shape answered for a method
    pub fn shape(&self, key: &MethodKey) -> Option<&ReturnShape> {
        self.shapes.get(key)
    }

    /// Number of methods covered
    pub fn method_count(&self) -> usize {
        self.shapes.len()
    }
}

impl Object for DefaultImplementation {
    fn contract(&self) -> &Arc<ContractType> {
        &self.contract
    }

    fn invoke(&self, method: &MethodKey, args: Vec<Value>) -> Result<Returned, InvocationError> {
        let shape = self
            .shapes
            .get(method)
            .ok_or_else(|| InvocationError::MethodNotFound {
                contract: self.contract.name().to_string(),
                method: method.to_string(),
            })?;
        check_arity(method, &args)?;
        Ok(shape.default_returned())
    }
}
