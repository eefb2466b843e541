use thiserror::Error;

use crate::{
    bootstrap::BootstrapError,
    config::AllocatorConfig,
    counter::CounterStore,
    mapping::MappingStore,
    namespace::Namespace,
    store::{Store, StoreError},
    Id
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AllocationError {
    #[error("Failed to bootstrap namespace {namespace}: {source}")]
    NamespaceBootstrapFailed {
        namespace: Namespace,

        #[source]
        source: BootstrapError,
    },

    #[error("Could not allocate an id in namespace {namespace}: {source}")]
    AllocationUnavailable {
        namespace: Namespace,

        #[source]
        source: StoreError,
    },

    #[error("Mapping store unavailable for key {key:?} in namespace {namespace}: {source}")]
    MappingStoreUnavailable {
        namespace: Namespace,
        key: String,

        #[source]
        source: StoreError,
    },

    #[error("Empty key in namespace {namespace}")]
    InvalidKey {
        namespace: Namespace,
    },
}

impl AllocationError {
    pub fn is_transient(&self) -> bool {
        match self {
            AllocationError::AllocationUnavailable { source, .. } |
            AllocationError::MappingStoreUnavailable { source, .. } => source.is_transient(),
            AllocationError::NamespaceBootstrapFailed { .. } |
            AllocationError::InvalidKey { .. } => false,
        }
    }

    fn mapping(namespace: &Namespace, key: &str, source: StoreError) -> Self {
        Self::MappingStoreUnavailable {
            namespace: namespace.clone(),
            key: key.to_string(),
            source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Existing,

    Allocated,

    // `burned` came from this call's increment and is never assigned.
    Raced { burned: Id },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub id: Id,
    pub outcome: Outcome,
}

pub struct Allocator<S> {
    counters: CounterStore<S>,
    mappings: MappingStore<S>,
}

impl<S: Store + Clone> Allocator<S> {
    pub fn new(store: S, config: AllocatorConfig) -> Self {
        Self {
            counters: CounterStore::new(store.clone(), config.clone()),
            mappings: MappingStore::new(store, config),
        }
    }
}

impl<S: Store> Allocator<S> {
    pub fn counters(&self) -> &CounterStore<S> {
        &self.counters
    }

    pub fn mappings(&self) -> &MappingStore<S> {
        &self.mappings
    }

    // Idempotent. Blocks until both tables are active.
    pub fn ensure_namespace(&self, namespace: &Namespace) -> Result<(), AllocationError> {
        let bootstrap_failed = |source| AllocationError::NamespaceBootstrapFailed {
            namespace: namespace.clone(),
            source,
        };

        self.counters.ensure_namespace(namespace).map_err(bootstrap_failed)?;
        self.mappings.ensure_namespace(namespace).map_err(bootstrap_failed)?;

        info!("Namespace {} is ready", namespace);
        Ok(())
    }

    pub fn resolve(&self, namespace: &Namespace, key: &str) -> Result<u64, AllocationError> {
        self.resolve_detailed(namespace, key).map(|r| r.id.as_u64())
    }

    pub fn resolve_detailed(
        &self,
        namespace: &Namespace,
        key: &str
    ) -> Result<Resolution, AllocationError> {
        if key.is_empty() {
            return Err(AllocationError::InvalidKey { namespace: namespace.clone() });
        }

        let existing = self.mappings
            .lookup(namespace, key)
            .map_err(|e| AllocationError::mapping(namespace, key, e))?;

        if let Some(id) = existing {
            return Ok(Resolution { id, outcome: Outcome::Existing });
        }

        let candidate = self.counters.next(namespace).map_err(|source| {
            error!("Counter increment failed for namespace {}: {}", namespace, source);
            AllocationError::AllocationUnavailable {
                namespace: namespace.clone(),
                source,
            }
        })?;

        let inserted = self.mappings
            .insert_if_absent(namespace, key, candidate)
            .map_err(|e| AllocationError::mapping(namespace, key, e))?;

        if inserted {
            debug!("Mapped {:?} to {} in {}", key, candidate, namespace);
            return Ok(Resolution { id: candidate, outcome: Outcome::Allocated });
        }

        // Lost the insert. Mappings are never deleted, so the winner's must be there.
        let winner = self.mappings
            .lookup(namespace, key)
            .map_err(|e| AllocationError::mapping(namespace, key, e))?
            .ok_or_else(|| AllocationError::mapping(
                namespace,
                key,
                StoreError::item_not_found(namespace.as_str(), key)
            ))?;

        debug!(
            "Key {:?} in {} was mapped concurrently to {}, burned {}",
            key, namespace, winner, candidate
        );

        Ok(Resolution { id: winner, outcome: Outcome::Raced { burned: candidate } })
    }
}
