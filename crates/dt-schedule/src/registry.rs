//! `OperationRegistry` — the process-wide name → prototype mapping.

use std::collections::HashMap;
use std::sync::OnceLock;

use parking_lot::Mutex;

use crate::default_ops;
use crate::operation::{AnyBody, OpComputeTarget, Operation};

/// A registry of operation prototypes, one per name, each potentially
/// carrying more than one [`OpComputeTarget`] implementation. Every
/// `Scheduler` clones what it needs out of the one process-wide instance
/// (see [`OperationRegistry::global`]) rather than sharing mutable
/// `Operation`s across simulations.
pub struct OperationRegistry {
    prototypes: Mutex<HashMap<String, Operation>>,
}

impl OperationRegistry {
    /// A fresh, empty registry, with none of the default catalogue
    /// registered. Exposed crate-internally for tests that need to probe
    /// registration behavior without touching the shared [`global`](Self::global)
    /// instance.
    pub(crate) fn empty() -> Self {
        Self { prototypes: Mutex::new(HashMap::new()) }
    }

    /// The process-wide instance, populated with the default catalogue
    /// (`set_up_iteration`, `behavior`, `discretization`, ...) on first
    /// access.
    pub fn global() -> &'static OperationRegistry {
        static INSTANCE: OnceLock<OperationRegistry> = OnceLock::new();
        INSTANCE.get_or_init(|| {
            let registry = OperationRegistry::empty();
            default_ops::register_defaults(&registry);
            registry
        })
    }

    /// Register `body` as `target`'s implementation of the operation named
    /// `name`, creating that named operation (with `frequency`) if this is
    /// its first implementation. Fatal if `(name, target)` is already
    /// registered — re-registration is a programming error, not a runtime
    /// condition.
    pub fn add_operation_impl(
        &self,
        name: &str,
        target: OpComputeTarget,
        body: impl Into<AnyBody>,
        frequency: u64,
    ) {
        let mut prototypes = self.prototypes.lock();
        match prototypes.get_mut(name) {
            Some(existing) => {
                if existing.is_compute_target_supported(target) {
                    tracing::error!(name, ?target, "operation implementation already registered for this target");
                    panic!("operation '{name}' already has a {target:?} implementation registered");
                }
                existing.add_implementation(target, body.into());
            }
            None => {
                prototypes.insert(name.to_string(), Operation::new(name, frequency, target, body.into()));
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.prototypes.lock().contains_key(name)
    }

    /// Look up `name` and return a fresh clone of its prototype. Fatal if
    /// `name` is not registered — looking up an unknown operation name is a
    /// programming error, not a condition a caller can recover from.
    pub fn new_operation(&self, name: &str) -> Operation {
        let prototypes = self.prototypes.lock();
        match prototypes.get(name) {
            Some(op) => op.clone(),
            None => {
                tracing::error!(name, "operation not found in registry");
                panic!("operation not found in registry: {name}");
            }
        }
    }
}
