use std::{
    sync::Arc,
    time::{Duration, Instant}
};

use dashmap::{mapref::entry::Entry, DashMap};

use super::{Store, StoreError, TableStatus};

struct Table {
    // `None` when the delay overflows; such a table never activates.
    ready_at: Option<Instant>,
    items: DashMap<String, u64>,
}

impl Table {
    fn new(provisioning_delay: Duration) -> Self {
        Self {
            ready_at: Instant::now().checked_add(provisioning_delay),
            items: DashMap::new(),
        }
    }

    fn status(&self) -> TableStatus {
        match self.ready_at {
            Some(ready_at) if Instant::now() >= ready_at => TableStatus::Active,
            _ => TableStatus::Creating,
        }
    }
}

// Item operations lock only the owning shard, so put_if_absent and
// increment are atomic per item.
pub struct MemoryStore {
    tables: DashMap<String, Arc<Table>>,
    provisioning_delay: Duration,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_provisioning_delay(Duration::ZERO)
    }

    pub fn with_provisioning_delay(delay: Duration) -> Self {
        Self {
            tables: DashMap::new(),
            provisioning_delay: delay,
        }
    }

    pub fn item_count(&self, table: &str) -> Option<usize> {
        self.tables.get(table).map(|t| t.items.len())
    }

    fn active_table(&self, table: &str) -> Result<Arc<Table>, StoreError> {
        let t = self.tables
            .get(table)
            .map(|t| Arc::clone(t.value()))
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;

        match t.status() {
            TableStatus::Active => Ok(t),
            TableStatus::Creating => Err(StoreError::TableNotActive(table.to_string())),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    fn describe_table(&self, table: &str) -> Result<Option<TableStatus>, StoreError> {
        Ok(self.tables.get(table).map(|t| t.status()))
    }

    fn create_table(&self, table: &str) -> Result<(), StoreError> {
        match self.tables.entry(table.to_string()) {
            Entry::Occupied(_) => Err(StoreError::TableAlreadyExists(table.to_string())),
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(Table::new(self.provisioning_delay)));
                Ok(())
            }
        }
    }

    fn get(&self, table: &str, key: &str) -> Result<Option<u64>, StoreError> {
        let t = self.active_table(table)?;
        Ok(t.items.get(key).map(|v| *v.value()))
    }

    fn put_if_absent(&self, table: &str, key: &str, value: u64) -> Result<bool, StoreError> {
        let t = self.active_table(table)?;
        match t.items.entry(key.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(entry) => {
                entry.insert(value);
                Ok(true)
            }
        }
    }

    fn increment(&self, table: &str, key: &str) -> Result<u64, StoreError> {
        let t = self.active_table(table)?;

        // The shard stays write-locked until `item` drops.
        let mut item = t.items
            .get_mut(key)
            .ok_or_else(|| StoreError::item_not_found(table, key))?;

        let next = item.value().checked_add(1).ok_or_else(|| StoreError::CounterOverflow {
            table: table.to_string(),
            key: key.to_string(),
        })?;

        *item.value_mut() = next;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(table: &str) -> MemoryStore {
        let store = MemoryStore::new();
        store.create_table(table).unwrap();
        store
    }

    #[test]
    fn test_create_and_describe() {
        let store = MemoryStore::new();
        assert_eq!(store.describe_table("t1").unwrap(), None);
        store.create_table("t1").unwrap();
        assert_eq!(store.describe_table("t1").unwrap(), Some(TableStatus::Active));
        assert_eq!(
            store.create_table("t1"),
            Err(StoreError::TableAlreadyExists("t1".to_string()))
        );
    }

    #[test]
    fn test_missing_table() {
        let store = MemoryStore::new();
        assert_eq!(store.get("nope", "k"), Err(StoreError::TableNotFound("nope".to_string())));
        assert_eq!(store.item_count("nope"), None);
    }

    #[test]
    fn test_provisioning_delay() {
        let store = MemoryStore::with_provisioning_delay(Duration::from_millis(50));
        store.create_table("slow").unwrap();
        assert_eq!(store.describe_table("slow").unwrap(), Some(TableStatus::Creating));
        assert_eq!(
            store.put_if_absent("slow", "k", 1),
            Err(StoreError::TableNotActive("slow".to_string()))
        );

        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(store.describe_table("slow").unwrap(), Some(TableStatus::Active));
        assert_eq!(store.put_if_absent("slow", "k", 1), Ok(true));
    }

    #[test]
    fn test_unbounded_provisioning_delay() {
        let store = MemoryStore::with_provisioning_delay(Duration::MAX);
        store.create_table("never").unwrap();
        assert_eq!(store.describe_table("never").unwrap(), Some(TableStatus::Creating));
        assert_eq!(
            store.get("never", "k"),
            Err(StoreError::TableNotActive("never".to_string()))
        );
    }

    #[test]
    fn test_put_if_absent_first_write_wins() {
        let store = store_with("map");
        assert_eq!(store.put_if_absent("map", "abc", 1), Ok(true));
        assert_eq!(store.put_if_absent("map", "abc", 2), Ok(false));
        assert_eq!(store.get("map", "abc"), Ok(Some(1)));
        assert_eq!(store.get("map", "xyz"), Ok(None));
        assert_eq!(store.item_count("map"), Some(1));
    }

    #[test]
    fn test_increment() {
        let store = store_with("hwm");
        assert_eq!(
            store.increment("hwm", "plop"),
            Err(StoreError::item_not_found("hwm", "plop"))
        );

        store.put_if_absent("hwm", "plop", 0).unwrap();
        assert_eq!(store.increment("hwm", "plop"), Ok(1));
        assert_eq!(store.increment("hwm", "plop"), Ok(2));
        assert_eq!(store.get("hwm", "plop"), Ok(Some(2)));
    }

    #[test]
    fn test_increment_does_not_wrap() {
        let store = store_with("hwm");
        store.put_if_absent("hwm", "full", u64::MAX).unwrap();
        assert!(matches!(
            store.increment("hwm", "full"),
            Err(StoreError::CounterOverflow { .. })
        ));
        assert_eq!(store.get("hwm", "full"), Ok(Some(u64::MAX)));
    }

    #[test]
    fn test_concurrent_increments_are_unique() {
        let store = store_with("hwm");
        store.put_if_absent("hwm", "c", 0).unwrap();

        let threads = 8;
        let per_thread = 500;

        let mut seen: Vec<u64> = crossbeam::thread::scope(|s| {
            let handles: Vec<_> = (0..threads).map(|_| {
                s.spawn(|_| {
                    (0..per_thread)
                        .map(|_| store.increment("hwm", "c").unwrap())
                        .collect::<Vec<_>>()
                })
            }).collect();

            handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
        }).unwrap();

        seen.sort_unstable();
        let expected: Vec<u64> = (1..=(threads * per_thread) as u64).collect();
        assert_eq!(seen, expected);
    }
}
