use crate::{
    bootstrap::{self, BootstrapError},
    config::AllocatorConfig,
    namespace::Namespace,
    store::{Store, StoreError},
    Id
};

pub struct CounterStore<S> {
    store: S,
    config: AllocatorConfig,
}

impl<S: Store> CounterStore<S> {
    pub fn new(store: S, config: AllocatorConfig) -> Self {
        Self { store, config }
    }

    pub fn table(&self) -> &str {
        &self.config.counter_table
    }

    // An existing counter row is never reset.
    pub fn ensure_namespace(&self, namespace: &Namespace) -> Result<(), BootstrapError> {
        let table = self.table();
        if namespace.as_str() == table {
            return Err(BootstrapError::ReservedName(namespace.to_string()));
        }

        bootstrap::ensure_table(&self.store, table, &self.config)?;

        let seeded = self.store
            .put_if_absent(table, namespace.as_str(), 0)
            .map_err(|source| BootstrapError::Store { table: table.to_string(), source })?;

        if seeded {
            info!("Seeded counter for namespace {}", namespace);
        }
        Ok(())
    }

    pub fn next(&self, namespace: &Namespace) -> Result<Id, StoreError> {
        self.store
            .increment(self.table(), namespace.as_str())
            .map(Id::new)
    }

    pub fn current(&self, namespace: &Namespace) -> Result<Option<u64>, StoreError> {
        self.store.get(self.table(), namespace.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FaultyStore, MemoryStore, Operation};

    fn plop() -> Namespace {
        Namespace::new("plop").unwrap()
    }

    #[test]
    fn test_next_starts_at_one() {
        let counters = CounterStore::new(MemoryStore::new(), AllocatorConfig::default());
        counters.ensure_namespace(&plop()).unwrap();

        assert_eq!(counters.current(&plop()), Ok(Some(0)));
        assert_eq!(counters.next(&plop()), Ok(Id::new(1)));
        assert_eq!(counters.next(&plop()), Ok(Id::new(2)));
    }

    #[test]
    fn test_ensure_namespace_never_resets() {
        let counters = CounterStore::new(MemoryStore::new(), AllocatorConfig::default());
        counters.ensure_namespace(&plop()).unwrap();
        counters.next(&plop()).unwrap();
        counters.next(&plop()).unwrap();

        counters.ensure_namespace(&plop()).unwrap();
        assert_eq!(counters.current(&plop()), Ok(Some(2)));
        assert_eq!(counters.next(&plop()), Ok(Id::new(3)));
    }

    #[test]
    fn test_namespaces_are_independent() {
        let counters = CounterStore::new(MemoryStore::new(), AllocatorConfig::default());
        let other = Namespace::new("other").unwrap();
        counters.ensure_namespace(&plop()).unwrap();
        counters.ensure_namespace(&other).unwrap();

        assert_eq!(counters.next(&plop()), Ok(Id::new(1)));
        assert_eq!(counters.next(&plop()), Ok(Id::new(2)));
        assert_eq!(counters.next(&other), Ok(Id::new(1)));
    }

    #[test]
    fn test_next_without_bootstrap_fails() {
        let counters = CounterStore::new(MemoryStore::new(), AllocatorConfig::default());
        assert_eq!(
            counters.next(&plop()),
            Err(StoreError::TableNotFound("idHwm".to_string()))
        );
    }

    #[test]
    fn test_reserved_name_rejected() {
        let counters = CounterStore::new(MemoryStore::new(), AllocatorConfig::default());
        let ns = Namespace::new("idHwm").unwrap();
        assert_eq!(
            counters.ensure_namespace(&ns),
            Err(BootstrapError::ReservedName("idHwm".to_string()))
        );
    }

    #[test]
    fn test_failed_increment_leaves_counter() {
        let counters = CounterStore::new(
            FaultyStore::new(MemoryStore::new()),
            AllocatorConfig::default()
        );
        counters.ensure_namespace(&plop()).unwrap();
        counters.store.fail_next(Operation::Increment, 1);

        assert!(counters.next(&plop()).is_err());
        assert_eq!(counters.current(&plop()), Ok(Some(0)));
        assert_eq!(counters.next(&plop()), Ok(Id::new(1)));
    }

    #[test]
    fn test_concurrent_next_strictly_increasing() {
        let counters = CounterStore::new(MemoryStore::new(), AllocatorConfig::default());
        counters.ensure_namespace(&plop()).unwrap();
        let ns = plop();

        let per_thread: Vec<Vec<Id>> = crossbeam::thread::scope(|s| {
            let handles: Vec<_> = (0..6).map(|_| {
                s.spawn(|_| (0..300).map(|_| counters.next(&ns).unwrap()).collect::<Vec<_>>())
            }).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        }).unwrap();

        // Each caller observes its own values in strictly increasing order.
        for ids in &per_thread {
            assert!(ids.windows(2).all(|w| w[0] < w[1]));
        }

        let mut all: Vec<u64> = per_thread.iter().flatten().map(|id| id.as_u64()).collect();
        all.sort_unstable();
        assert_eq!(all, (1..=1800).collect::<Vec<u64>>());
    }

    #[test]
    fn test_concurrent_ensure_namespace_never_resets() {
        let store = MemoryStore::new();
        let ns = plop();

        let seeder = CounterStore::new(&store, AllocatorConfig::default());
        seeder.ensure_namespace(&ns).unwrap();

        let ids: Vec<Id> = crossbeam::thread::scope(|s| {
            for _ in 0..6 {
                s.spawn(|_| {
                    let counters = CounterStore::new(&store, AllocatorConfig::default());
                    for _ in 0..50 {
                        counters.ensure_namespace(&ns).unwrap();
                    }
                });
            }

            s.spawn(|_| (0..500).map(|_| seeder.next(&ns).unwrap()).collect::<Vec<Id>>())
                .join()
                .unwrap()
        }).unwrap();

        assert_eq!(ids, (1..=500).map(Id::new).collect::<Vec<_>>());
        assert_eq!(seeder.current(&ns), Ok(Some(500)));
        assert_eq!(seeder.next(&ns), Ok(Id::new(501)));
    }

    #[test]
    fn test_racing_first_bootstrap_seeds_once() {
        let store = MemoryStore::new();
        let ns = plop();

        crossbeam::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|_| {
                    let counters = CounterStore::new(&store, AllocatorConfig::default());
                    counters.ensure_namespace(&ns).unwrap();
                    counters.next(&ns).unwrap();
                });
            }
        }).unwrap();

        // Every increment survived; no late bootstrapper put the row back to 0.
        let counters = CounterStore::new(&store, AllocatorConfig::default());
        assert_eq!(counters.current(&ns), Ok(Some(8)));
    }
}
