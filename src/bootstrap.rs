use std::time::{Duration, Instant};
use thiserror::Error;

use crate::{
    config::AllocatorConfig,
    store::{Store, StoreError, TableStatus}
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BootstrapError {
    #[error("Failed to provision table {table}: {source}")]
    Store {
        table: String,

        #[source]
        source: StoreError,
    },

    #[error("Table {table} did not become active within {waited:?}")]
    NotReady {
        table: String,
        waited: Duration,
    },

    #[error("Namespace {0} is reserved for the counter table")]
    ReservedName(String),
}

impl BootstrapError {
    fn store(table: &str, source: StoreError) -> Self {
        Self::Store { table: table.to_string(), source }
    }
}

// Losing a create race to another bootstrapper counts as success.
pub fn ensure_table<S>(
    store: &S,
    table: &str,
    config: &AllocatorConfig
) -> Result<(), BootstrapError>
where
    S: Store + ?Sized
{
    match store.describe_table(table).map_err(|e| BootstrapError::store(table, e))? {
        Some(TableStatus::Active) => return Ok(()),
        Some(TableStatus::Creating) => {
            info!("Table {} is still being created", table);
        }
        None => match store.create_table(table) {
            Ok(()) => info!("Creating table {}", table),
            Err(StoreError::TableAlreadyExists(_)) => {
                debug!("Table {} was created concurrently", table);
            }
            Err(e) => return Err(BootstrapError::store(table, e)),
        },
    }

    wait_until_active(store, table, config)
}

fn wait_until_active<S>(
    store: &S,
    table: &str,
    config: &AllocatorConfig
) -> Result<(), BootstrapError>
where
    S: Store + ?Sized
{
    let started = Instant::now();
    // No deadline when the timeout does not fit in an Instant.
    let deadline = started.checked_add(config.bootstrap_timeout);

    loop {
        match store.describe_table(table).map_err(|e| BootstrapError::store(table, e))? {
            Some(TableStatus::Active) => {
                info!("Table {} is active after {:?}", table, started.elapsed());
                return Ok(());
            }
            Some(TableStatus::Creating) => {}
            None => {
                return Err(BootstrapError::store(
                    table,
                    StoreError::TableNotFound(table.to_string())
                ));
            }
        }

        let mut pause = config.bootstrap_poll_interval;
        if let Some(deadline) = deadline {
            let now = Instant::now();
            if now >= deadline {
                warn!("Gave up waiting for table {}", table);
                return Err(BootstrapError::NotReady {
                    table: table.to_string(),
                    waited: started.elapsed(),
                });
            }
            pause = pause.min(deadline - now);
        }

        std::thread::sleep(pause);
    }
}
