#[macro_use]
pub (crate) mod logging;

mod id;

pub mod allocator;
pub mod bootstrap;
pub mod config;
pub mod counter;
pub mod mapping;
pub mod namespace;
pub mod store;

use thiserror::Error;

pub use allocator::{AllocationError, Allocator, Outcome, Resolution};
pub use bootstrap::BootstrapError;
pub use config::AllocatorConfig;
pub use counter::CounterStore;
pub use id::Id;
pub use mapping::MappingStore;
pub use namespace::{Namespace, NamespaceError};
pub use store::{FaultyStore, MemoryStore, Operation, Store, StoreError, TableStatus};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Allocation error: {0}")]
    Allocation(#[from] AllocationError),

    #[error("Bootstrap error: {0}")]
    Bootstrap(#[from] BootstrapError),

    #[error("Namespace error: {0}")]
    Namespace(#[from] NamespaceError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, Error>;
