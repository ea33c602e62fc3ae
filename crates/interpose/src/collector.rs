//! Method descriptor collection
//!
//! Enumerates the methods a proxy for a contract must intercept:
//!
//! - Interfaces: every instance method declared by the interface and by
//!   every interface it extends, transitively, whatever its visibility.
//! - Classes: every instance method reachable through the inheritance chain
//!   whose most-derived declaration is still overridable, plus interface
//!   methods the class never implements. Sealed overrides, non-virtual and
//!   private methods are left alone; calling them on a proxy runs the
//!   class's own behavior.
//!
//! The finalization hook is never collected. Output order is discovery
//! order, deduplicated by method key, so synthesis is reproducible.
//!
//! A method key reached through several declarations must agree on its
//! return type everywhere; otherwise one slot cannot serve all of them and
//! synthesis fails with `ProxyError::ConflictingMethod`.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use interpose_types::{ContractType, MethodInfo, MethodKey};

use crate::error::{ProxyError, ProxyResult};

/// Collect the interceptable methods of a contract
pub fn collect_methods(contract: &ContractType) -> ProxyResult<Vec<MethodInfo>> {
    if !contract.is_reflectable() {
        return Err(ProxyError::NotReflectable(contract.name().to_string()));
    }
    check_return_types(contract)?;

    if contract.is_interface() {
        return Ok(collect_interface_methods(contract));
    }

    if contract.is_sealed() {
        return Err(ProxyError::SealedContract(contract.name().to_string()));
    }
    let methods = collect_class_methods(contract);
    if methods.is_empty() {
        return Err(ProxyError::NoOverridableMethods(
            contract.name().to_string(),
        ));
    }
    Ok(methods)
}

fn check_return_types(contract: &ContractType) -> ProxyResult<()> {
    let declaring: Vec<&ContractType> = if contract.is_class() {
        contract.hierarchy()
    } else {
        Vec::new()
    };
    let mut first: HashMap<MethodKey, &MethodInfo> = HashMap::new();
    for declarer in declaring.into_iter().chain(contract.interface_closure()) {
        for method in declarer.declared_methods() {
            if method.modifiers.is_static || method.modifiers.is_finalizer {
                continue;
            }
            match first.entry(method.key()) {
                Entry::Vacant(slot) => {
                    slot.insert(method);
                }
                Entry::Occupied(slot) if slot.get().return_type != method.return_type => {
                    let existing = slot.get();
                    return Err(ProxyError::ConflictingMethod {
                        contract: contract.name().to_string(),
                        method: slot.key().to_string(),
                        first: format!("{}: {}", existing.declaring_contract, existing.return_type),
                        second: format!("{}: {}", method.declaring_contract, method.return_type),
                    });
                }
                Entry::Occupied(_) => {}
            }
        }
    }
    Ok(())
}

fn collect_interface_methods(contract: &ContractType) -> Vec<MethodInfo> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for iface in contract.interface_closure() {
        for method in iface.declared_methods() {
            if method.modifiers.is_static || method.modifiers.is_finalizer {
                continue;
            }
            if seen.insert(method.key()) {
                out.push(method.clone());
            }
        }
    }
    out
}

fn collect_class_methods(contract: &ContractType) -> Vec<MethodInfo> {
    // resolved_methods already yields the most-derived declaration per key,
    // so a sealed override hides the virtual method it replaced.
    contract
        .resolved_methods()
        .into_iter()
        .filter(|m| m.is_overridable())
        .cloned()
        .collect()
}
