//! Contract types: runtime descriptions of interfaces and classes
//!
//! A contract is what a proxy is generated against. Interfaces declare
//! abstract methods and may extend other interfaces; classes carry method
//! bodies, may extend one parent class and implement interfaces. Only
//! methods marked virtual (and not sealed) can be overridden by a subtype.
//!
//! Contracts are immutable once built and shared behind `Arc`.

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use serde::Serialize;

use crate::error::{ContractError, InvocationError};
use crate::object::Object;
use crate::ty::TypeInfo;
use crate::value::{Returned, Value};

/// Global counter for contract IDs
static NEXT_CONTRACT_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identity of a contract type within the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ContractId(u64);

impl ContractId {
    fn next() -> Self {
        ContractId(NEXT_CONTRACT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric ID
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContractId({})", self.0)
    }
}

/// Interface or class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractKind {
    /// Interface: abstract methods only, multiple inheritance of interfaces
    Interface,
    /// Class: concrete and abstract methods, single parent
    Class,
}

/// Modifier flags for methods
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Modifiers {
    /// Public visibility
    pub is_public: bool,
    /// Private visibility
    pub is_private: bool,
    /// Protected visibility
    pub is_protected: bool,
    /// Static member
    pub is_static: bool,
    /// May be overridden by a subtype
    pub is_virtual: bool,
    /// Declared without an implementation
    pub is_abstract: bool,
    /// Override that may not be overridden further
    pub is_sealed: bool,
    /// The object-finalization hook
    pub is_finalizer: bool,
}

/// Parameter information
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterInfo {
    /// Parameter name
    pub name: String,
    /// Parameter type info
    pub type_info: TypeInfo,
    /// Parameter index
    pub index: usize,
}

/// Method identity: name plus parameter types.
///
/// Overloads differ by key; return types do not participate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MethodKey {
    name: String,
    params: Vec<String>,
}

impl MethodKey {
    /// Create a key from a name and parameter types
    pub fn new(name: impl Into<String>, params: &[TypeInfo]) -> Self {
        Self {
            name: name.into(),
            params: params.iter().map(|p| p.name.clone()).collect(),
        }
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter type names
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Number of parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.params.join(", "))
    }
}

/// Implementation of a method.
///
/// Receives the `this` object and the arguments, and returns the result in
/// the method's declared shape.
pub type MethodBody =
    Arc<dyn Fn(&dyn Object, Vec<Value>) -> Result<Returned, InvocationError> + Send + Sync>;

/// Wrap a synchronous closure as a method body
pub fn sync_body<F>(f: F) -> MethodBody
where
    F: Fn(&dyn Object, Vec<Value>) -> Result<Value, InvocationError> + Send + Sync + 'static,
{
    Arc::new(move |this, args| f(this, args).map(Returned::Value))
}

/// Wrap a task-producing closure as a method body
pub fn async_body<F, Fut>(f: F) -> MethodBody
where
    F: Fn(&dyn Object, Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, InvocationError>> + Send + 'static,
{
    Arc::new(move |this, args| Ok(Returned::Task(f(this, args).boxed())))
}

/// Method information
#[derive(Clone)]
pub struct MethodInfo {
    /// Method name
    pub name: String,
    /// Parameter infos
    pub parameters: Vec<ParameterInfo>,
    /// Return type info
    pub return_type: TypeInfo,
    /// Modifier flags
    pub modifiers: Modifiers,
    /// Name of the contract that declares this method
    pub declaring_contract: String,
    /// Implementation, absent for abstract methods
    pub body: Option<MethodBody>,
}

impl MethodInfo {
    /// Identity of this method
    pub fn key(&self) -> MethodKey {
        let params: Vec<TypeInfo> = self
            .parameters
            .iter()
            .map(|p| p.type_info.clone())
            .collect();
        MethodKey::new(self.name.clone(), &params)
    }

    /// Whether the method has no implementation
    pub fn is_abstract(&self) -> bool {
        self.body.is_none()
    }

    /// Whether a subtype may override this method
    pub fn is_overridable(&self) -> bool {
        let m = &self.modifiers;
        (m.is_virtual || m.is_abstract)
            && !m.is_sealed
            && !m.is_static
            && !m.is_private
            && !m.is_finalizer
    }

    /// Human-readable signature, e.g. `sum(a: i32, b: i32) -> i32`
    pub fn signature(&self) -> String {
        let params: Vec<String> = self
            .parameters
            .iter()
            .map(|p| format!("{}: {}", p.name, p.type_info))
            .collect();
        format!("{}({}) -> {}", self.name, params.join(", "), self.return_type)
    }
}

impl fmt::Debug for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInfo")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("return_type", &self.return_type)
            .field("modifiers", &self.modifiers)
            .field("declaring_contract", &self.declaring_contract)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// Definition for a method to be added to a contract
#[derive(Clone)]
pub struct MethodDefinition {
    name: String,
    parameters: Vec<(String, TypeInfo)>,
    return_type: TypeInfo,
    modifiers: Modifiers,
    body: Option<MethodBody>,
}

impl MethodDefinition {
    /// Create a new public method returning void
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            return_type: TypeInfo::void(),
            modifiers: Modifiers {
                is_public: true,
                ..Modifiers::default()
            },
            body: None,
        }
    }

    /// Add a parameter
    pub fn param(mut self, name: impl Into<String>, type_info: TypeInfo) -> Self {
        self.parameters.push((name.into(), type_info));
        self
    }

    /// Set return type
    pub fn returns(mut self, type_info: TypeInfo) -> Self {
        self.return_type = type_info;
        self
    }

    /// Mark as overridable
    pub fn as_virtual(mut self) -> Self {
        self.modifiers.is_virtual = true;
        self
    }

    /// Mark as abstract (no body)
    pub fn as_abstract(mut self) -> Self {
        self.modifiers.is_abstract = true;
        self.modifiers.is_virtual = true;
        self
    }

    /// Mark as a sealed override
    pub fn as_sealed(mut self) -> Self {
        self.modifiers.is_sealed = true;
        self
    }

    /// Mark as static method
    pub fn as_static(mut self) -> Self {
        self.modifiers.is_static = true;
        self
    }

    /// Mark as private
    pub fn as_private(mut self) -> Self {
        self.modifiers.is_public = false;
        self.modifiers.is_protected = false;
        self.modifiers.is_private = true;
        self
    }

    /// Mark as protected
    pub fn as_protected(mut self) -> Self {
        self.modifiers.is_public = false;
        self.modifiers.is_private = false;
        self.modifiers.is_protected = true;
        self
    }

    /// Mark as the finalization hook
    pub fn as_finalizer(mut self) -> Self {
        self.modifiers.is_finalizer = true;
        self.modifiers.is_virtual = true;
        self.modifiers.is_public = false;
        self.modifiers.is_protected = true;
        self
    }

    /// Set the implementation
    pub fn body(mut self, body: MethodBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Set a synchronous implementation
    pub fn sync_body<F>(self, f: F) -> Self
    where
        F: Fn(&dyn Object, Vec<Value>) -> Result<Value, InvocationError> + Send + Sync + 'static,
    {
        self.body(sync_body(f))
    }

    /// Set a task-producing implementation
    pub fn async_body<F, Fut>(self, f: F) -> Self
    where
        F: Fn(&dyn Object, Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, InvocationError>> + Send + 'static,
    {
        self.body(async_body(f))
    }

    fn key(&self) -> MethodKey {
        let params: Vec<TypeInfo> = self.parameters.iter().map(|(_, t)| t.clone()).collect();
        MethodKey::new(self.name.clone(), &params)
    }

    fn into_info(self, declaring_contract: &str) -> MethodInfo {
        MethodInfo {
            name: self.name,
            parameters: self
                .parameters
                .into_iter()
                .enumerate()
                .map(|(index, (name, type_info))| ParameterInfo {
                    name,
                    type_info,
                    index,
                })
                .collect(),
            return_type: self.return_type,
            modifiers: self.modifiers,
            declaring_contract: declaring_contract.to_string(),
            body: self.body,
        }
    }
}

/// An interface or class type, as seen through reflection
pub struct ContractType {
    id: ContractId,
    name: String,
    kind: ContractKind,
    is_sealed: bool,
    is_reflectable: bool,
    extends: Vec<Arc<ContractType>>,
    parent: Option<Arc<ContractType>>,
    interfaces: Vec<Arc<ContractType>>,
    methods: Vec<MethodInfo>,
}

impl ContractType {
    /// Unique contract ID
    pub fn id(&self) -> ContractId {
        self.id
    }

    /// Contract name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Interface or class
    pub fn kind(&self) -> ContractKind {
        self.kind
    }

    /// Check if this is an interface
    pub fn is_interface(&self) -> bool {
        self.kind == ContractKind::Interface
    }

    /// Check if this is a class
    pub fn is_class(&self) -> bool {
        self.kind == ContractKind::Class
    }

    /// Whether the class forbids subclassing
    pub fn is_sealed(&self) -> bool {
        self.is_sealed
    }

    /// Whether the full method set can be enumerated
    pub fn is_reflectable(&self) -> bool {
        self.is_reflectable
    }

    /// Parent class (classes only)
    pub fn parent(&self) -> Option<&Arc<ContractType>> {
        self.parent.as_ref()
    }

    /// Directly extended interfaces (interfaces only)
    pub fn extends(&self) -> &[Arc<ContractType>] {
        &self.extends
    }

    /// Directly implemented interfaces (classes only)
    pub fn interfaces(&self) -> &[Arc<ContractType>] {
        &self.interfaces
    }

    /// Methods declared by this contract itself, in declaration order
    pub fn declared_methods(&self) -> &[MethodInfo] {
        &self.methods
    }

    /// The inheritance chain, from this contract up to the root class.
    ///
    /// For an interface this is just the interface itself.
    pub fn hierarchy(&self) -> Vec<&ContractType> {
        let mut chain = vec![self];
        let mut current = self.parent.as_deref();
        while let Some(class) = current {
            chain.push(class);
            current = class.parent.as_deref();
        }
        chain
    }

    /// Every interface reachable from this contract, depth-first in
    /// declaration order, each listed once.
    ///
    /// An interface includes itself first.
    pub fn interface_closure(&self) -> Vec<&ContractType> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let roots: Vec<&ContractType> = if self.is_interface() {
            vec![self]
        } else {
            self.hierarchy()
                .into_iter()
                .flat_map(|c| c.interfaces.iter().map(|i| i.as_ref()))
                .collect()
        };
        for root in roots {
            collect_interfaces(root, &mut seen, &mut out);
        }
        out
    }

    /// Whether an instance of this contract can stand in for `other`
    pub fn is_assignable_to(&self, other: &ContractType) -> bool {
        self.hierarchy().iter().any(|c| c.id == other.id)
            || self.interface_closure().iter().any(|c| c.id == other.id)
    }

    /// Every method visible on this contract, one per key.
    ///
    /// Class methods come first, most-derived declaration winning; methods
    /// required by implemented interfaces but never declared by the class
    /// follow as abstract entries.
    pub fn resolved_methods(&self) -> Vec<&MethodInfo> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let declaring: Vec<&ContractType> = if self.is_class() {
            self.hierarchy()
        } else {
            Vec::new()
        };
        for contract in declaring.into_iter().chain(self.interface_closure()) {
            for method in &contract.methods {
                if seen.insert(method.key()) {
                    out.push(method);
                }
            }
        }
        out
    }

    /// Look up the most-derived declaration of a method
    pub fn find_method(&self, key: &MethodKey) -> Option<&MethodInfo> {
        self.resolved_methods().into_iter().find(|m| &m.key() == key)
    }

    /// All overloads with the given name
    pub fn methods_named(&self, name: &str) -> Vec<&MethodInfo> {
        self.resolved_methods()
            .into_iter()
            .filter(|m| m.name == name)
            .collect()
    }

    /// Whether any instance method lacks an implementation.
    ///
    /// Interfaces are always abstract.
    pub fn is_abstract(&self) -> bool {
        self.is_interface()
            || self
                .resolved_methods()
                .iter()
                .any(|m| !m.modifiers.is_static && m.is_abstract())
    }
}

fn collect_interfaces<'a>(
    iface: &'a ContractType,
    seen: &mut HashSet<ContractId>,
    out: &mut Vec<&'a ContractType>,
) {
    if !seen.insert(iface.id) {
        return;
    }
    out.push(iface);
    for parent in &iface.extends {
        collect_interfaces(parent, seen, out);
    }
}

impl fmt::Debug for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractType")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("methods", &self.methods.len())
            .finish()
    }
}

/// Builder for a contract type
pub struct ContractBuilder {
    name: String,
    kind: ContractKind,
    is_sealed: bool,
    is_reflectable: bool,
    extends: Vec<Arc<ContractType>>,
    parent: Option<Arc<ContractType>>,
    interfaces: Vec<Arc<ContractType>>,
    methods: Vec<MethodDefinition>,
}

impl ContractBuilder {
    fn new(name: impl Into<String>, kind: ContractKind) -> Self {
        Self {
            name: name.into(),
            kind,
            is_sealed: false,
            is_reflectable: true,
            extends: Vec::new(),
            parent: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Start an interface
    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name, ContractKind::Interface)
    }

    /// Start a class
    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, ContractKind::Class)
    }

    /// Extend another interface
    pub fn extends(mut self, iface: Arc<ContractType>) -> Self {
        self.extends.push(iface);
        self
    }

    /// Set the parent class
    pub fn parent(mut self, class: Arc<ContractType>) -> Self {
        self.parent = Some(class);
        self
    }

    /// Implement an interface
    pub fn implements(mut self, iface: Arc<ContractType>) -> Self {
        self.interfaces.push(iface);
        self
    }

    /// Forbid subclassing
    pub fn sealed(mut self) -> Self {
        self.is_sealed = true;
        self
    }

    /// Hide the method set from reflection
    pub fn opaque(mut self) -> Self {
        self.is_reflectable = false;
        self
    }

    /// Add a method
    pub fn method(mut self, method: MethodDefinition) -> Self {
        self.methods.push(method);
        self
    }

    /// Validate and finalize the contract
    pub fn build(self) -> Result<Arc<ContractType>, ContractError> {
        self.check_inheritance()?;

        let mut keys = HashSet::new();
        let mut methods = Vec::with_capacity(self.methods.len());
        for mut def in self.methods {
            let key = def.key();
            if !keys.insert(key.clone()) {
                return Err(ContractError::DuplicateMethod {
                    contract: self.name,
                    method: key.to_string(),
                });
            }
            match self.kind {
                ContractKind::Interface => check_interface_method(&self.name, &key, &mut def)?,
                ContractKind::Class => check_class_method(&self.name, &key, &def)?,
            }
            methods.push(def.into_info(&self.name));
        }

        Ok(Arc::new(ContractType {
            id: ContractId::next(),
            name: self.name,
            kind: self.kind,
            is_sealed: self.is_sealed,
            is_reflectable: self.is_reflectable,
            extends: self.extends,
            parent: self.parent,
            interfaces: self.interfaces,
            methods,
        }))
    }

    fn check_inheritance(&self) -> Result<(), ContractError> {
        let invalid = |parent: &ContractType, reason: &str| ContractError::InvalidParent {
            contract: self.name.clone(),
            parent: parent.name.clone(),
            reason: reason.to_string(),
        };

        match self.kind {
            ContractKind::Interface => {
                if let Some(parent) = &self.parent {
                    return Err(invalid(parent, "interfaces cannot have a base class"));
                }
                if let Some(iface) = self.interfaces.first() {
                    return Err(invalid(iface, "interfaces extend, not implement"));
                }
                if let Some(class) = self.extends.iter().find(|c| c.is_class()) {
                    return Err(invalid(class, "interfaces can only extend interfaces"));
                }
            }
            ContractKind::Class => {
                if let Some(parent) = &self.parent {
                    if parent.is_interface() {
                        return Err(invalid(parent, "base type must be a class"));
                    }
                    if parent.is_sealed {
                        return Err(invalid(parent, "base class is sealed"));
                    }
                }
                if let Some(iface) = self.extends.first() {
                    return Err(invalid(iface, "classes implement, not extend"));
                }
                if let Some(class) = self.interfaces.iter().find(|c| c.is_class()) {
                    return Err(invalid(class, "only interfaces can be implemented"));
                }
            }
        }
        Ok(())
    }
}

fn check_interface_method(
    contract: &str,
    key: &MethodKey,
    def: &mut MethodDefinition,
) -> Result<(), ContractError> {
    if def.body.is_some() {
        return Err(ContractError::InterfaceMethodBody {
            contract: contract.to_string(),
            method: key.to_string(),
        });
    }
    if def.modifiers.is_static {
        return Err(ContractError::InvalidModifiers {
            contract: contract.to_string(),
            method: key.to_string(),
            reason: "interface methods cannot be static".to_string(),
        });
    }
    // Interface members are implicitly abstract
    def.modifiers.is_abstract = true;
    def.modifiers.is_virtual = true;
    Ok(())
}

fn check_class_method(
    contract: &str,
    key: &MethodKey,
    def: &MethodDefinition,
) -> Result<(), ContractError> {
    let m = &def.modifiers;
    let invalid = |reason: &str| ContractError::InvalidModifiers {
        contract: contract.to_string(),
        method: key.to_string(),
        reason: reason.to_string(),
    };

    if m.is_abstract && def.body.is_some() {
        return Err(invalid("abstract methods cannot have a body"));
    }
    if !m.is_abstract && def.body.is_none() {
        return Err(ContractError::MissingBody {
            contract: contract.to_string(),
            method: key.to_string(),
        });
    }
    if m.is_static && (m.is_virtual || m.is_abstract || m.is_sealed) {
        return Err(invalid("static methods cannot be virtual"));
    }
    if m.is_private && (m.is_virtual || m.is_abstract) {
        return Err(invalid("private methods cannot be virtual"));
    }
    if m.is_abstract && m.is_sealed {
        return Err(invalid("abstract methods cannot be sealed"));
    }
    Ok(())
}
