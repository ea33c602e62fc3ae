//! Proxy factory and the process-wide proxy type cache
//!
//! Proxy types are synthesized lazily, at most once per contract, and shared
//! by every instance afterwards. Each contract gets its own `OnceCell` slot
//! in a concurrent map, so the first caller synthesizes while concurrent
//! callers for the same contract wait on that slot and then observe the same
//! `Arc<ProxyType>`. Callers for other contracts are not blocked.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use interpose_types::{ContractId, ContractType, Object};
use once_cell::sync::{Lazy, OnceCell};

use crate::config::FactoryOptions;
use crate::dump::write_dump;
use crate::error::ProxyResult;
use crate::handler::Handler;
use crate::proxy::{ProxyObject, ProxyType};

type TypeSlot = Arc<OnceCell<Arc<ProxyType>>>;

static GLOBAL_FACTORY: Lazy<ProxyFactory> =
    Lazy::new(|| ProxyFactory::with_options(FactoryOptions::from_env()));

/// Creates proxies and caches their synthesized types
pub struct ProxyFactory {
    options: FactoryOptions,
    types: DashMap<ContractId, TypeSlot>,
    synthesized: AtomicUsize,
}

impl ProxyFactory {
    /// Factory with default options
    pub fn new() -> Self {
        Self::with_options(FactoryOptions::default())
    }

    /// Factory with explicit options
    pub fn with_options(options: FactoryOptions) -> Self {
        Self {
            options,
            types: DashMap::new(),
            synthesized: AtomicUsize::new(0),
        }
    }

    /// The process-wide factory, configured from the environment on first use
    pub fn global() -> &'static ProxyFactory {
        &GLOBAL_FACTORY
    }

    /// Options this factory was created with
    pub fn options(&self) -> &FactoryOptions {
        &self.options
    }

    /// Get or synthesize the proxy type for a contract.
    ///
    /// Synthesis failures are returned to the caller and not cached; a later
    /// call for the same contract tries again.
    pub fn proxy_type(&self, contract: &Arc<ContractType>) -> ProxyResult<Arc<ProxyType>> {
        // Clone the slot out so the shard lock is not held during synthesis
        let slot: TypeSlot = self
            .types
            .entry(contract.id())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .value()
            .clone();

        slot.get_or_try_init(|| self.synthesize(contract)).cloned()
    }

    fn synthesize(&self, contract: &Arc<ContractType>) -> ProxyResult<Arc<ProxyType>> {
        let ty = Arc::new(ProxyType::synthesize(contract)?);
        self.synthesized.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            contract = contract.name(),
            proxy = ty.name(),
            methods = ty.method_count(),
            has_defaults = ty.has_defaults(),
            "synthesized proxy type"
        );

        if let Some(dir) = &self.options.dump_dir {
            match write_dump(dir, &ty) {
                Ok(path) => tracing::debug!(path = %path.display(), "wrote proxy type dump"),
                Err(err) => tracing::warn!(
                    contract = contract.name(),
                    error = %err,
                    "failed to write proxy type dump"
                ),
            }
        }

        Ok(ty)
    }

    /// Create a proxy for `contract`.
    ///
    /// With a target, proceeded calls go to the target. Without one,
    /// interfaces proceed to default values and classes to their own
    /// method bodies.
    pub fn create_proxy(
        &self,
        contract: &Arc<ContractType>,
        target: Option<Arc<dyn Object>>,
        handler: Handler,
    ) -> ProxyResult<Arc<ProxyObject>> {
        let ty = self.proxy_type(contract)?;
        ty.instantiate(target, handler)
    }

    /// Proxy types synthesized so far
    pub fn cached_types(&self) -> Vec<Arc<ProxyType>> {
        self.types
            .iter()
            .filter_map(|entry| entry.value().get().cloned())
            .collect()
    }

    /// Number of successful syntheses performed by this factory
    pub fn synthesis_count(&self) -> usize {
        self.synthesized.load(Ordering::Relaxed)
    }
}

impl Default for ProxyFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProxyFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyFactory")
            .field("options", &self.options)
            .field("cached", &self.types.len())
            .field("synthesized", &self.synthesis_count())
            .finish()
    }
}

/// Create a proxy using the process-wide factory
pub fn create_proxy(
    contract: &Arc<ContractType>,
    target: Option<Arc<dyn Object>>,
    handler: Handler,
) -> ProxyResult<Arc<ProxyObject>> {
    ProxyFactory::global().create_proxy(contract, target, handler)
}
