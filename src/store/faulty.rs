use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::{Operation, Store, StoreError, TableStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fault {
    Times(u32),
    Always,
}

#[derive(Default)]
struct FaultTable {
    faults: FxHashMap<Operation, Fault>,
    calls: FxHashMap<Operation, u64>,
}

// Failed calls never reach the inner store.
pub struct FaultyStore<S> {
    inner: S,
    table: Mutex<FaultTable>,
}

impl<S: Store> FaultyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            table: Mutex::new(FaultTable::default()),
        }
    }

    pub fn fail_next(&self, op: Operation, n: u32) {
        let mut table = self.table.lock();
        if n == 0 {
            table.faults.remove(&op);
        } else {
            table.faults.insert(op, Fault::Times(n));
        }
    }

    pub fn fail_always(&self, op: Operation) {
        self.table.lock().faults.insert(op, Fault::Always);
    }

    pub fn heal(&self, op: Operation) {
        self.table.lock().faults.remove(&op);
    }

    pub fn calls(&self, op: Operation) -> u64 {
        self.table.lock().calls.get(&op).copied().unwrap_or(0)
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn check(&self, op: Operation) -> Result<(), StoreError> {
        let mut table = self.table.lock();
        *table.calls.entry(op).or_insert(0) += 1;

        let fail = match table.faults.get(&op).copied() {
            None => false,
            Some(Fault::Always) => true,
            Some(Fault::Times(1)) => {
                table.faults.remove(&op);
                true
            }
            Some(Fault::Times(n)) => {
                table.faults.insert(op, Fault::Times(n - 1));
                true
            }
        };

        if fail {
            Err(StoreError::Unavailable(format!("injected {} failure", op)))
        } else {
            Ok(())
        }
    }
}

impl<S: Store> Store for FaultyStore<S> {
    fn describe_table(&self, table: &str) -> Result<Option<TableStatus>, StoreError> {
        self.check(Operation::DescribeTable)?;
        self.inner.describe_table(table)
    }

    fn create_table(&self, table: &str) -> Result<(), StoreError> {
        self.check(Operation::CreateTable)?;
        self.inner.create_table(table)
    }

    fn get(&self, table: &str, key: &str) -> Result<Option<u64>, StoreError> {
        self.check(Operation::Get)?;
        self.inner.get(table, key)
    }

    fn put_if_absent(&self, table: &str, key: &str, value: u64) -> Result<bool, StoreError> {
        self.check(Operation::PutIfAbsent)?;
        self.inner.put_if_absent(table, key, value)
    }

    fn increment(&self, table: &str, key: &str) -> Result<u64, StoreError> {
        self.check(Operation::Increment)?;
        self.inner.increment(table, key)
    }
}
