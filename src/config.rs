use std::time::Duration;

pub const DEFAULT_COUNTER_TABLE: &str = "idHwm";
pub const DEFAULT_BOOTSTRAP_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_BOOTSTRAP_POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocatorConfig {
    // One high-water-mark row per namespace lives in this table.
    pub counter_table: String,
    pub bootstrap_timeout: Duration,
    pub bootstrap_poll_interval: Duration,
}

impl AllocatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_counter_table(mut self, table: impl Into<String>) -> Self {
        self.counter_table = table.into();
        self
    }

    pub fn with_bootstrap_timeout(mut self, timeout: Duration) -> Self {
        self.bootstrap_timeout = timeout;
        self
    }

    pub fn with_bootstrap_poll_interval(mut self, interval: Duration) -> Self {
        self.bootstrap_poll_interval = interval;
        self
    }
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            counter_table: DEFAULT_COUNTER_TABLE.to_string(),
            bootstrap_timeout: DEFAULT_BOOTSTRAP_TIMEOUT,
            bootstrap_poll_interval: DEFAULT_BOOTSTRAP_POLL_INTERVAL,
        }
    }
}
