//! Executor configuration

use inwatch_core::env::env_get;

/// Tunables shared by `PollExecutor` and `UringExecutor`.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// io_uring SQ entries. Must be a power of 2.
    pub sq_entries: u32,

    /// Maximum CQEs reaped per loop turn.
    pub max_completions: usize,

    /// `poll(2)` timeout per wait, in milliseconds. -1 waits forever.
    pub poll_timeout_ms: i32,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            sq_entries: 64,
            max_completions: 64,
            poll_timeout_ms: -1,
        }
    }
}

impl ExecutorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `INW_SQ_ENTRIES`, `INW_MAX_COMPLETIONS`,
    /// `INW_POLL_TIMEOUT_MS`.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            sq_entries: env_get("INW_SQ_ENTRIES", d.sq_entries),
            max_completions: env_get("INW_MAX_COMPLETIONS", d.max_completions),
            poll_timeout_ms: env_get("INW_POLL_TIMEOUT_MS", d.poll_timeout_ms),
        }
    }

    pub fn sq_entries(mut self, n: u32) -> Self {
        self.sq_entries = n;
        self
    }

    pub fn max_completions(mut self, n: usize) -> Self {
        self.max_completions = n;
        self
    }

    pub fn poll_timeout_ms(mut self, ms: i32) -> Self {
        self.poll_timeout_ms = ms;
        self
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.sq_entries == 0 || !self.sq_entries.is_power_of_two() {
            return Err("sq_entries must be a non-zero power of two");
        }
        if self.max_completions == 0 {
            return Err("max_completions must be at least 1");
        }
        if self.poll_timeout_ms < -1 {
            return Err("poll_timeout_ms must be -1 or non-negative");
        }
        Ok(())
    }
}
