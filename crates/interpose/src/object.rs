//! Plain objects: class instances, hand-built implementations, call helpers
//!
//! These are the non-proxy objects a program works with. A `ClassInstance`
//! runs a concrete class's own method bodies. An `Implementation` fulfils a
//! contract with closures, which is how interface targets are usually
//! supplied. `ObjectExt` adds name-based calling to every `Object`.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{self, FutureExt};
use interpose_types::{
    async_body, sync_body, ContractType, InvocationError, MethodBody, MethodInfo, MethodKey,
    Object, Returned, Value, ValueFuture,
};
use rustc_hash::FxHashMap;

use crate::error::{ProxyError, ProxyResult};
use crate::proxy::check_arity;

/// Run the contract's own most-derived body for `key` with `this` as receiver
fn invoke_contract_body(
    this: &dyn Object,
    key: &MethodKey,
    args: Vec<Value>,
) -> Result<Returned, InvocationError> {
    let contract = this.contract();
    let method = contract
        .find_method(key)
        .ok_or_else(|| InvocationError::MethodNotFound {
            contract: contract.name().to_string(),
            method: key.to_string(),
        })?;
    check_arity(key, &args)?;
    match &method.body {
        Some(body) => body(this, args),
        None => Err(InvocationError::AbstractMethod(key.to_string())),
    }
}

/// An instance of a concrete class
pub struct ClassInstance {
    contract: Arc<ContractType>,
}

impl ClassInstance {
    /// Instantiate a class.
    ///
    /// Interfaces and classes with unimplemented methods are rejected.
    pub fn new(contract: &Arc<ContractType>) -> ProxyResult<Arc<Self>> {
        if contract.is_abstract() {
            return Err(ProxyError::AbstractType(contract.name().to_string()));
        }
        Ok(Arc::new(Self {
            contract: contract.clone(),
        }))
    }
}

impl Object for ClassInstance {
    fn contract(&self) -> &Arc<ContractType> {
        &self.contract
    }

    fn invoke(&self, method: &MethodKey, args: Vec<Value>) -> Result<Returned, InvocationError> {
        invoke_contract_body(self, method, args)
    }
}

impl fmt::Debug for ClassInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassInstance")
            .field("class", &self.contract.name())
            .finish()
    }
}

/// A contract fulfilled by closures
pub struct Implementation {
    contract: Arc<ContractType>,
    methods: FxHashMap<MethodKey, MethodBody>,
}

impl Implementation {
    /// Start building an implementation of `contract`
    pub fn builder(contract: &Arc<ContractType>) -> ImplementationBuilder {
        ImplementationBuilder::new(contract)
    }

    /// Whether this implementation overrides a method
    pub fn overrides(&self, key: &MethodKey) -> bool {
        self.methods.contains_key(key)
    }
}

impl Object for Implementation {
    fn contract(&self) -> &Arc<ContractType> {
        &self.contract
    }

    fn invoke(&self, method: &MethodKey, args: Vec<Value>) -> Result<Returned, InvocationError> {
        match self.methods.get(method) {
            Some(body) => {
                check_arity(method, &args)?;
                body(self, args)
            }
            None => invoke_contract_body(self, method, args),
        }
    }
}

impl fmt::Debug for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self.methods.keys().map(|k| k.to_string()).collect();
        keys.sort();
        f.debug_struct("Implementation")
            .field("contract", &self.contract.name())
            .field("methods", &keys)
            .finish()
    }
}

enum MethodRef {
    Name(String),
    Key(MethodKey),
}

/// Builder for an `Implementation`
pub struct ImplementationBuilder {
    contract: Arc<ContractType>,
    methods: Vec<(MethodRef, MethodBody)>,
}

impl ImplementationBuilder {
    /// Create a builder for `contract`
    pub fn new(contract: &Arc<ContractType>) -> Self {
        Self {
            contract: contract.clone(),
            methods: Vec::new(),
        }
    }

    /// Implement the method called `name`; the name must not be overloaded
    pub fn method(mut self, name: impl Into<String>, body: MethodBody) -> Self {
        self.methods.push((MethodRef::Name(name.into()), body));
        self
    }

    /// Implement one specific overload
    pub fn method_key(mut self, key: MethodKey, body: MethodBody) -> Self {
        self.methods.push((MethodRef::Key(key), body));
        self
    }

    /// Implement a method with a synchronous closure
    pub fn sync_method<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&dyn Object, Vec<Value>) -> Result<Value, InvocationError> + Send + Sync + 'static,
    {
        self.method(name, sync_body(f))
    }

    /// Implement a task-returning method with an async closure
    pub fn async_method<F, Fut>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&dyn Object, Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, InvocationError>> + Send + 'static,
    {
        self.method(name, async_body(f))
    }

    /// Resolve method names and check every abstract method is covered
    pub fn build(self) -> ProxyResult<Arc<Implementation>> {
        let mut methods = FxHashMap::default();
        for (target, body) in self.methods {
            let key = match target {
                MethodRef::Name(name) => resolve_unique(&self.contract, &name)?.key(),
                MethodRef::Key(key) => {
                    if self.contract.find_method(&key).is_none() {
                        return Err(InvocationError::MethodNotFound {
                            contract: self.contract.name().to_string(),
                            method: key.to_string(),
                        }
                        .into());
                    }
                    key
                }
            };
            methods.insert(key, body);
        }

        let missing = self
            .contract
            .resolved_methods()
            .into_iter()
            .find(|m| !m.modifiers.is_static && m.is_abstract() && !methods.contains_key(&m.key()));
        if let Some(method) = missing {
            return Err(ProxyError::IncompleteImplementation {
                contract: self.contract.name().to_string(),
                method: method.key().to_string(),
            });
        }

        Ok(Arc::new(Implementation {
            contract: self.contract,
            methods,
        }))
    }
}

fn resolve_unique<'a>(contract: &'a ContractType, name: &str) -> ProxyResult<&'a MethodInfo> {
    let mut candidates = contract.methods_named(name);
    match candidates.len() {
        0 => Err(InvocationError::MethodNotFound {
            contract: contract.name().to_string(),
            method: name.to_string(),
        }
        .into()),
        1 => Ok(candidates.remove(0)),
        count => Err(InvocationError::AmbiguousMethod {
            contract: contract.name().to_string(),
            name: name.to_string(),
            arity: candidates[0].parameters.len(),
            count,
        }
        .into()),
    }
}

/// Name-based calling for any object
pub trait ObjectExt: Object {
    /// Call the method `name` whose arity matches `args`
    fn call(&self, name: &str, args: Vec<Value>) -> Result<Returned, InvocationError> {
        let key = resolve_call(self.contract(), name, args.len())?;
        self.invoke(&key, args)
    }

    /// Call and block until the result is available
    fn call_sync(&self, name: &str, args: Vec<Value>) -> Result<Value, InvocationError> {
        self.call(name, args)?.wait()
    }

    /// Call and receive the normalized asynchronous result
    fn call_async(&self, name: &str, args: Vec<Value>) -> ValueFuture {
        match self.call(name, args) {
            Ok(returned) => returned.into_future(),
            Err(err) => future::ready(Err(err)).boxed(),
        }
    }
}

impl<T: Object + ?Sized> ObjectExt for T {}

fn resolve_call(
    contract: &ContractType,
    name: &str,
    arity: usize,
) -> Result<MethodKey, InvocationError> {
    let candidates: Vec<&MethodInfo> = contract
        .methods_named(name)
        .into_iter()
        .filter(|m| m.parameters.len() == arity)
        .collect();
    match candidates.as_slice() {
        [] => Err(InvocationError::MethodNotFound {
            contract: contract.name().to_string(),
            method: format!("{}/{}", name, arity),
        }),
        [method] => Ok(method.key()),
        _ => Err(InvocationError::AmbiguousMethod {
            contract: contract.name().to_string(),
            name: name.to_string(),
            arity,
            count: candidates.len(),
        }),
    }
}
