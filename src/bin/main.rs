use std::{hash::Hasher, time::Instant};

use cl_log::{level::Level, write_options::WriteOptions, Logger};
use idgen::{Allocator, AllocatorConfig, MemoryStore, Namespace, Outcome};
use log::{error, info, warn};
use once_cell::sync::OnceCell;
use rustc_hash::FxHasher;

const DEFAULT_NAMESPACE: &str = "plop";
const DEFAULT_KEYS: u64 = 1_000_000;
const REPORT_EVERY: u64 = 1000;
const QUEUE_PER_WORKER: usize = 256;
const MAX_QUEUE: usize = 1 << 16;

// Every REPEAT_EVERY-th key is one that was already submitted.
const REPEAT_EVERY: u64 = 10;

static STORE: OnceCell<MemoryStore> = OnceCell::new();

fn store() -> &'static MemoryStore {
    STORE.get_or_init(MemoryStore::new)
}

struct DriverConfig {
    namespace: String,
    keys: u64,
    workers: usize,
}

impl DriverConfig {
    // Usage: idgen [namespace] [keys] [workers]
    fn from_args() -> Result<Self, String> {
        let mut args = std::env::args().skip(1);

        let namespace = args.next().unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());

        let keys = match args.next() {
            Some(n) => n.parse().map_err(|e| format!("invalid key count {:?}: {}", n, e))?,
            None => DEFAULT_KEYS,
        };

        let workers = match args.next() {
            Some(n) => n.parse().map_err(|e| format!("invalid worker count {:?}: {}", n, e))?,
            None => num_cpus::get(),
        };

        if workers == 0 { return Err("worker count must be at least 1".to_string()); }

        Ok(Self { namespace, keys, workers })
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    allocated: u64,
    existing: u64,
    raced: u64,
    failed: u64,
}

impl Tally {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Allocated => self.allocated += 1,
            Outcome::Existing => self.existing += 1,
            Outcome::Raced { .. } => self.raced += 1,
        }
    }

    fn merge(mut self, other: Tally) -> Tally {
        self.allocated += other.allocated;
        self.existing += other.existing;
        self.raced += other.raced;
        self.failed += other.failed;
        self
    }
}

fn queue_capacity(workers: usize) -> usize {
    workers.saturating_mul(QUEUE_PER_WORKER).min(MAX_QUEUE)
}

// Stand-in for an external content hash: 32 hex digits derived from `seq`.
fn hash_key(seq: u64) -> String {
    let mut hi = FxHasher::default();
    hi.write_u64(seq);
    let hi = hi.finish();

    let mut lo = FxHasher::default();
    lo.write_u64(hi ^ seq.rotate_left(32));
    let lo = lo.finish();

    format!("{:016x}{:016x}", hi, lo)
}

fn main() -> idgen::Result<()> {

    let opt = Some(WriteOptions::EXPANDED);
    let err_opt = Some(WriteOptions::ALL);

    match Logger::builder()
        .with_stderr(Level::Error, err_opt)
        .with_stdout(Level::Warn, opt)
        .with_stdout(Level::Info, opt)
    .build() {
        Ok(_) => {},
        Err(err) => {
            eprintln!("Failed to initialize logger: {}", err);
            std::process::exit(1);
        }
    }

    let config = match DriverConfig::from_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            eprintln!("usage: idgen [namespace] [keys] [workers]");
            std::process::exit(2);
        }
    };

    let namespace = Namespace::new(config.namespace.as_str())?;
    let allocator = Allocator::new(store(), AllocatorConfig::default());
    allocator.ensure_namespace(&namespace)?;

    info!(
        "Resolving {} keys in namespace {} with {} workers",
        config.keys, namespace, config.workers
    );

    let started = Instant::now();
    let (tx, rx) = crossbeam_channel::bounded::<String>(queue_capacity(config.workers));

    let result = crossbeam::thread::scope(|s| {
        let allocator = &allocator;
        let namespace = &namespace;

        let handles: Vec<_> = (0..config.workers).map(|_| {
            let rx = rx.clone();
            s.spawn(move |_| {
                let mut tally = Tally::default();
                for key in rx.iter() {
                    match allocator.resolve_detailed(namespace, &key) {
                        Ok(resolution) => {
                            tally.record(resolution.outcome);
                            let id = resolution.id.as_u64();
                            if resolution.outcome != Outcome::Existing && id % REPORT_EVERY == 0 {
                                info!("{} at {:?}", id, started.elapsed());
                            }
                        }
                        Err(e) => {
                            error!("Failed to resolve {}: {}", key, e);
                            tally.failed += 1;
                        }
                    }
                }
                tally
            })
        }).collect();
        drop(rx);

        for seq in 0..config.keys {
            let key_seq = if seq % REPEAT_EVERY == REPEAT_EVERY - 1 { seq / 2 } else { seq };
            if tx.send(hash_key(key_seq)).is_err() {
                warn!("All workers exited early");
                break;
            }
        }
        drop(tx);

        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|_| {
                error!("A worker panicked");
                Tally::default()
            }))
            .fold(Tally::default(), Tally::merge)
    });

    let tally = match result {
        Ok(tally) => tally,
        Err(_) => {
            error!("Worker scope panicked");
            std::process::exit(1);
        }
    };

    let high_water = allocator.counters().current(&namespace)?.unwrap_or(0);

    info!(
        "Done in {:?}: {} allocated, {} existing, {} raced, {} failed, counter at {}",
        started.elapsed(), tally.allocated, tally.existing, tally.raced, tally.failed, high_water
    );

    Ok(())
}
