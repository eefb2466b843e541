use crate::{
    bootstrap::{self, BootstrapError},
    config::AllocatorConfig,
    namespace::Namespace,
    store::{Store, StoreError},
    Id
};

pub struct MappingStore<S> {
    store: S,
    config: AllocatorConfig,
}

impl<S: Store> MappingStore<S> {
    pub fn new(store: S, config: AllocatorConfig) -> Self {
        Self { store, config }
    }

    pub fn ensure_namespace(&self, namespace: &Namespace) -> Result<(), BootstrapError> {
        bootstrap::ensure_table(&self.store, namespace.as_str(), &self.config)
    }

    pub fn lookup(&self, namespace: &Namespace, key: &str) -> Result<Option<Id>, StoreError> {
        Ok(self.store.get(namespace.as_str(), key)?.map(Id::new))
    }

    pub fn insert_if_absent(
        &self,
        namespace: &Namespace,
        key: &str,
        id: Id
    ) -> Result<bool, StoreError> {
        self.store.put_if_absent(namespace.as_str(), key, id.as_u64())
    }
}
