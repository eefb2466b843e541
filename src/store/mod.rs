pub mod faulty;
pub mod memory;

pub use faulty::FaultyStore;
pub use memory::MemoryStore;

use std::{fmt, sync::Arc};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Request was throttled")]
    Throttled,

    #[error("Request timed out")]
    TimedOut,

    #[error("Table {0} does not exist")]
    TableNotFound(String),

    #[error("Table {0} is not active yet")]
    TableNotActive(String),

    #[error("Table {0} already exists")]
    TableAlreadyExists(String),

    #[error("Item {key} not found in table {table}")]
    ItemNotFound { table: String, key: String },

    #[error("Counter {key} in table {table} is exhausted")]
    CounterOverflow { table: String, key: String },
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Unavailable(_) |
            StoreError::Throttled |
            StoreError::TimedOut |
            StoreError::TableNotActive(_)
        )
    }

    pub fn item_not_found(table: &str, key: &str) -> Self {
        Self::ItemNotFound { table: table.to_string(), key: key.to_string() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableStatus {
    Creating,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    DescribeTable,
    CreateTable,
    Get,
    PutIfAbsent,
    Increment,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::DescribeTable => "describe_table",
            Operation::CreateTable => "create_table",
            Operation::Get => "get",
            Operation::PutIfAbsent => "put_if_absent",
            Operation::Increment => "increment",
        };
        write!(f, "{}", name)
    }
}

pub trait Store: Send + Sync {
    fn describe_table(&self, table: &str) -> Result<Option<TableStatus>, StoreError>;

    fn create_table(&self, table: &str) -> Result<(), StoreError>;

    fn get(&self, table: &str, key: &str) -> Result<Option<u64>, StoreError>;

    // One conditional write.
    fn put_if_absent(&self, table: &str, key: &str, value: u64) -> Result<bool, StoreError>;

    // One read-modify-write. Never wraps.
    fn increment(&self, table: &str, key: &str) -> Result<u64, StoreError>;
}

impl<S: Store + ?Sized> Store for Arc<S> {
    fn describe_table(&self, table: &str) -> Result<Option<TableStatus>, StoreError> {
        (**self).describe_table(table)
    }

    fn create_table(&self, table: &str) -> Result<(), StoreError> {
        (**self).create_table(table)
    }

    fn get(&self, table: &str, key: &str) -> Result<Option<u64>, StoreError> {
        (**self).get(table, key)
    }

    fn put_if_absent(&self, table: &str, key: &str, value: u64) -> Result<bool, StoreError> {
        (**self).put_if_absent(table, key, value)
    }

    fn increment(&self, table: &str, key: &str) -> Result<u64, StoreError> {
        (**self).increment(table, key)
    }
}

impl<S: Store + ?Sized> Store for &S {
    fn describe_table(&self, table: &str) -> Result<Option<TableStatus>, StoreError> {
        (**self).describe_table(table)
    }

    fn create_table(&self, table: &str) -> Result<(), StoreError> {
        (**self).create_table(table)
    }

    fn get(&self, table: &str, key: &str) -> Result<Option<u64>, StoreError> {
        (**self).get(table, key)
    }

    fn put_if_absent(&self, table: &str, key: &str, value: u64) -> Result<bool, StoreError> {
        (**self).put_if_absent(table, key, value)
    }

    fn increment(&self, table: &str, key: &str) -> Result<u64, StoreError> {
        (**self).increment(table, key)
    }
}
