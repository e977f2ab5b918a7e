//! Global atomic counters for recipe-stage observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. at the end of a CLI run).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters.
pub struct Metrics {
    commands_executed: AtomicU64,
    stagings: AtomicU64,
    commits: AtomicU64,
    reverts: AtomicU64,
    locked_skips: AtomicU64,
    override_writes: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            commands_executed: AtomicU64::new(0),
            stagings: AtomicU64::new(0),
            commits: AtomicU64::new(0),
            reverts: AtomicU64::new(0),
            locked_skips: AtomicU64::new(0),
            override_writes: AtomicU64::new(0),
        }
    }

    pub fn inc_commands(&self) {
        self.commands_executed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "commands_executed", "counter incremented");
    }

    pub fn inc_stagings(&self) {
        self.stagings.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "stagings", "counter incremented");
    }

    /// Add `n` committed records.
    pub fn add_commits(&self, n: u64) {
        self.commits.fetch_add(n, Ordering::Relaxed);
        tracing::trace!(metric = "commits", n, "counter incremented");
    }

    /// Add `n` reverted records.
    pub fn add_reverts(&self, n: u64) {
        self.reverts.fetch_add(n, Ordering::Relaxed);
        tracing::trace!(metric = "reverts", n, "counter incremented");
    }

    pub fn inc_locked_skips(&self) {
        self.locked_skips.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "locked_skips", "counter incremented");
    }

    /// Add `n` override keys written.
    pub fn add_override_writes(&self, n: u64) {
        self.override_writes.fetch_add(n, Ordering::Relaxed);
        tracing::trace!(metric = "override_writes", n, "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    ///
    /// Call this at natural boundaries (end of a replay, etc.) rather than
    /// on every increment.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            commands_executed = self.commands_executed(),
            stagings = self.stagings(),
            commits = self.commits(),
            reverts = self.reverts(),
            locked_skips = self.locked_skips(),
            override_writes = self.override_writes(),
        );
    }

    pub fn commands_executed(&self) -> u64 {
        self.commands_executed.load(Ordering::Relaxed)
    }

    pub fn stagings(&self) -> u64 {
        self.stagings.load(Ordering::Relaxed)
    }

    pub fn commits(&self) -> u64 {
        self.commits.load(Ordering::Relaxed)
    }

    pub fn reverts(&self) -> u64 {
        self.reverts.load(Ordering::Relaxed)
    }

    pub fn locked_skips(&self) -> u64 {
        self.locked_skips.load(Ordering::Relaxed)
    }

    pub fn override_writes(&self) -> u64 {
        self.override_writes.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.commands_executed.store(0, Ordering::Relaxed);
        self.stagings.store(0, Ordering::Relaxed);
        self.commits.store(0, Ordering::Relaxed);
        self.reverts.store(0, Ordering::Relaxed);
        self.locked_skips.store(0, Ordering::Relaxed);
        self.override_writes.store(0, Ordering::Relaxed);
    }
}
