//! Proxy type synthesis
//!
//! A `ProxyType` is the generated counterpart of a contract: one dispatch
//! slot per interceptable method, each with its classified return shape,
//! plus (for interfaces) the default-value companion used when no target is
//! supplied. It is built once per contract and shared by every proxy
//! instance of that contract.
//!
//! A `ProxyObject` is an instance: the proxy type, a delegate fixed at
//! construction, and the handler. Calls on intercepted slots are packaged
//! into an `Invocation`, handed to the handler, and the handler's normalized
//! result is adapted back to the method's declared shape. Calls on anything
//! else (non-virtual or sealed class methods) run the class's own body with
//! the proxy as `this`, without interception.
//!
//! ## Target resolution
//!
//! | Contract  | Target   | Proceed calls                         |
//! |-----------|----------|---------------------------------------|
//! | interface | supplied | the target                            |
//! | interface | none     | the default-value companion           |
//! | class     | supplied | the target (base bodies are bypassed) |
//! | class     | none     | the class's own bodies, `this` = proxy |
//!
//! The proxy refers to itself only weakly. Each intercepted call takes a
//! strong reference for its `Invocation`, so a call started before the last
//! handle is dropped still completes against the class's bodies.

use std::fmt;
use std::sync::Arc;

use interpose_types::{
    ContractType, InvocationError, MethodInfo, MethodKey, Object, Returned, Value,
};
use rustc_hash::FxHashMap;

use crate::collector::collect_methods;
use crate::defaults::DefaultImplementation;
use crate::error::{ProxyError, ProxyResult};
use crate::handler::Handler;
use crate::invocation::{Delegate, Invocation, TargetKind};
use crate::shape::ReturnShape;

/// One interceptable method of a proxy type
#[derive(Debug)]
pub struct MethodDescriptor {
    slot: usize,
    key: MethodKey,
    shape: ReturnShape,
    info: MethodInfo,
}

impl MethodDescriptor {
    /// Dispatch slot index
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Method identity
    pub fn key(&self) -> &MethodKey {
        &self.key
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Classified return shape
    pub fn shape(&self) -> &ReturnShape {
        &self.shape
    }

    /// Full reflection info for the method
    pub fn info(&self) -> &MethodInfo {
        &self.info
    }

    /// Name of the contract that declares the method
    pub fn declaring_contract(&self) -> &str {
        &self.info.declaring_contract
    }

    /// Whether the contract itself provides a body for this method
    pub fn has_implementation(&self) -> bool {
        self.info.body.is_some()
    }
}

/// Synthesized proxy type for one contract
pub struct ProxyType {
    name: String,
    contract: Arc<ContractType>,
    methods: Vec<Arc<MethodDescriptor>>,
    slots: FxHashMap<MethodKey, usize>,
    defaults: Option<Arc<DefaultImplementation>>,
}

impl ProxyType {
    /// Build the proxy type for a contract.
    ///
    /// Fails for contracts that cannot be proxied (opaque, sealed, or a class
    /// with nothing to override).
    pub fn synthesize(contract: &Arc<ContractType>) -> ProxyResult<Self> {
        let methods: Vec<Arc<MethodDescriptor>> = collect_methods(contract)?
            .into_iter()
            .enumerate()
            .map(|(slot, info)| {
                Arc::new(MethodDescriptor {
                    slot,
                    key: info.key(),
                    shape: ReturnShape::classify(&info.return_type),
                    info,
                })
            })
            .collect();

        let slots = methods.iter().map(|m| (m.key.clone(), m.slot)).collect();

        let defaults = if contract.is_interface() {
            Some(Arc::new(DefaultImplementation::synthesize(
                contract.clone(),
                methods.iter().map(|m| (&m.key, &m.shape)),
            )))
        } else {
            None
        };

        Ok(Self {
            name: format!("{}Proxy", contract.name()),
            contract: contract.clone(),
            methods,
            slots,
            defaults,
        })
    }

    /// Generated type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The proxied contract
    pub fn contract(&self) -> &Arc<ContractType> {
        &self.contract
    }

    /// Interceptable methods, in slot order
    pub fn methods(&self) -> &[Arc<MethodDescriptor>] {
        &self.methods
    }

    /// Look up an interceptable method
    pub fn method(&self, key: &MethodKey) -> Option<&Arc<MethodDescriptor>> {
        self.slots.get(key).map(|&slot| &self.methods[slot])
    }

    /// Number of interceptable methods
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    /// Whether a default-value companion was synthesized
    pub fn has_defaults(&self) -> bool {
        self.defaults.is_some()
    }

    /// Create an instance.
    ///
    /// A supplied target must be assignable to the proxied contract.
    pub fn instantiate(
        self: &Arc<Self>,
        target: Option<Arc<dyn Object>>,
        handler: Handler,
    ) -> ProxyResult<Arc<ProxyObject>> {
        if let Some(target) = &target {
            if !target.contract().is_assignable_to(&self.contract) {
                return Err(ProxyError::TargetMismatch {
                    contract: self.contract.name().to_string(),
                    target: target.contract().name().to_string(),
                });
            }
        }

        Ok(Arc::new_cyclic(|this| {
            let delegate = match (target, &self.defaults) {
                (Some(target), _) => Delegate::Target(target),
                (None, Some(defaults)) => Delegate::Defaults(defaults.clone()),
                (None, None) => Delegate::Base(this.clone()),
            };
            ProxyObject {
                ty: self.clone(),
                delegate,
                handler,
            }
        }))
    }
}

impl fmt::Debug for ProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyType")
            .field("name", &self.name)
            .field("contract", &self.contract.name())
            .field("methods", &self.methods.len())
            .field("has_defaults", &self.defaults.is_some())
            .finish()
    }
}

/// A proxy instance
pub struct ProxyObject {
    ty: Arc<ProxyType>,
    delegate: Delegate,
    handler: Handler,
}

impl ProxyObject {
    /// The synthesized type this instance belongs to
    pub fn proxy_type(&self) -> &Arc<ProxyType> {
        &self.ty
    }

    /// What proceeded calls are delegated to
    pub fn target_kind(&self) -> TargetKind {
        self.delegate.kind()
    }

    /// The caller-supplied target, if any
    pub fn target(&self) -> Option<&Arc<dyn Object>> {
        match &self.delegate {
            Delegate::Target(target) => Some(target),
            _ => None,
        }
    }

    fn intercept(
        &self,
        method: &Arc<MethodDescriptor>,
        args: Vec<Value>,
    ) -> Result<Returned, InvocationError> {
        check_arity(&method.key, &args)?;
        tracing::trace!(
            proxy = %self.ty.name,
            method = %method.key,
            shape = method.shape.label(),
            delegate = ?self.delegate.kind(),
            "intercepting call"
        );
        let delegate = self.delegate.bind(&method.key)?;
        let invocation = Invocation::new(method.clone(), args, delegate);
        let result = self.handler.handle(invocation);
        method.shape.adapt(result)
    }

    fn call_direct(&self, key: &MethodKey, args: Vec<Value>) -> Result<Returned, InvocationError> {
        let method = self
            .ty
            .contract
            .find_method(key)
            .ok_or_else(|| InvocationError::MethodNotFound {
                contract: self.ty.contract.name().to_string(),
                method: key.to_string(),
            })?;
        check_arity(key, &args)?;
        match &method.body {
            Some(body) => body(self, args),
            None => Err(InvocationError::AbstractMethod(key.to_string())),
        }
    }
}

impl Object for ProxyObject {
    fn contract(&self) -> &Arc<ContractType> {
        &self.ty.contract
    }

    fn invoke(&self, method: &MethodKey, args: Vec<Value>) -> Result<Returned, InvocationError> {
        match self.ty.method(method) {
            Some(descriptor) => self.intercept(descriptor, args),
            None => self.call_direct(method, args),
        }
    }
}

impl fmt::Debug for ProxyObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyObject")
            .field("type", &self.ty.name)
            .field("target", &self.delegate.kind())
            .finish()
    }
}

pub(crate) fn check_arity(key: &MethodKey, args: &[Value]) -> Result<(), InvocationError> {
    if args.len() != key.arity() {
        return Err(InvocationError::ArityMismatch {
            method: key.to_string(),
            expected: key.arity(),
            got: args.len(),
        });
    }
    Ok(())
}
