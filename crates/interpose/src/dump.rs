//! Diagnostic dumps of synthesized proxy types
//!
//! A dump is a JSON description of what was generated for a contract: the
//! dispatch slots, their shapes, and where proceeded calls go. Dumps exist
//! for inspection only; nothing reads them back.

use std::fs;
use std::path::{Path, PathBuf};

use interpose_types::{ContractKind, MethodKey, Modifiers, TypeInfo};
use serde::Serialize;

use crate::error::{ProxyError, ProxyResult};
use crate::proxy::ProxyType;
use crate::shape::ReturnShape;

/// Serializable description of a proxy type
#[derive(Debug, Clone, Serialize)]
pub struct ProxyTypeDump {
    /// Generated type name
    pub name: String,
    /// Proxied contract name
    pub contract: String,
    /// Interface or class
    pub kind: ContractKind,
    /// Whether a default-value companion was generated
    pub has_defaults: bool,
    /// Dispatch slots
    pub methods: Vec<MethodDump>,
}

/// One dispatch slot in a dump
#[derive(Debug, Clone, Serialize)]
pub struct MethodDump {
    /// Slot index
    pub slot: usize,
    /// Method identity
    pub key: MethodKey,
    /// Readable signature
    pub signature: String,
    /// Declared return type
    pub return_type: TypeInfo,
    /// Classified return shape
    pub shape: ReturnShape,
    /// Declaring contract
    pub declaring_contract: String,
    /// Declared modifiers
    pub modifiers: Modifiers,
    /// Whether the contract supplies a body
    pub has_implementation: bool,
}

impl ProxyType {
    /// Describe this proxy type
    pub fn describe(&self) -> ProxyTypeDump {
        ProxyTypeDump {
            name: self.name().to_string(),
            contract: self.contract().name().to_string(),
            kind: self.contract().kind(),
            has_defaults: self.has_defaults(),
            methods: self
                .methods()
                .iter()
                .map(|m| MethodDump {
                    slot: m.slot(),
                    key: m.key().clone(),
                    signature: m.info().signature(),
                    return_type: m.info().return_type.clone(),
                    shape: m.shape().clone(),
                    declaring_contract: m.declaring_contract().to_string(),
                    modifiers: m.info().modifiers,
                    has_implementation: m.has_implementation(),
                })
                .collect(),
        }
    }
}

/// File a dump is written to inside `dir`
pub fn dump_path(dir: &Path, ty: &ProxyType) -> PathBuf {
    let file: String = ty
        .contract()
        .name()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    dir.join(format!("{}-{}.proxy.json", file, ty.contract().id().raw()))
}

/// Write a pretty-printed dump of `ty` into `dir`, creating it if needed
pub fn write_dump(dir: &Path, ty: &ProxyType) -> ProxyResult<PathBuf> {
    let path = dump_path(dir, ty);
    let json = serde_json::to_string_pretty(&ty.describe())?;
    fs::create_dir_all(dir)
        .and_then(|_| fs::write(&path, json))
        .map_err(|source| ProxyError::Dump {
            path: path.clone(),
            source,
        })?;
    Ok(path)
}
