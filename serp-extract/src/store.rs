//! Ephemeral, ID-addressable result store.
//!
//! Holds extracted results keyed by an opaque ID so a later request can
//! resolve "result N" back to its link without the caller re-supplying it.
//! Memory and lifetime are bounded two ways, applied in this order by
//! [`ResultStore::cleanup`]:
//!
//! 1. **TTL**: records older than `ttl` (measured from insertion) are dropped.
//! 2. **Capacity**: if more than `max_entries` remain, the oldest by
//!    insertion time are dropped until the store is at capacity.
//!
//! Reads never refresh a record's age. Expired and never-inserted IDs are
//! indistinguishable to callers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use rand::Rng;

use crate::config::StoreConfig;
use crate::types::{SearchResult, StoredResult};

/// Destination for accepted results during an extraction run.
///
/// The pipeline asks the sink for a fresh ID for every accepted record and
/// then hands the completed record over. [`ResultStore`] is the production
/// implementation; tests can supply their own.
pub trait ResultSink {
    /// Produce a new identifier beginning with `prefix`.
    fn generate_id(&self, prefix: &str) -> String;

    /// Take ownership of a completed record.
    fn store(&self, record: SearchResult);
}

/// Outcome of a single cleanup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Records removed because they outlived the TTL.
    pub expired: usize,
    /// Records removed to bring the store back to capacity.
    pub evicted: usize,
}

impl CleanupReport {
    /// Total number of records removed.
    pub fn removed(&self) -> usize {
        self.expired + self.evicted
    }
}

/// The unsynchronised record table. Always accessed through [`ResultStore`].
#[derive(Debug, Default)]
struct ResultTable {
    entries: HashMap<String, StoredResult>,
    next_seq: u64,
}

impl ResultTable {
    fn put(&mut self, result: SearchResult, now: Instant) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(
            result.id.clone(),
            StoredResult {
                result,
                inserted_at: now,
                seq,
            },
        );
    }

    fn cleanup(&mut self, now: Instant, ttl: Duration, max_entries: usize) -> CleanupReport {
        let before = self.entries.len();
        self.entries
            .retain(|_, stored| now.saturating_duration_since(stored.inserted_at) <= ttl);
        let expired = before - self.entries.len();

        let mut evicted = 0;
        if self.entries.len() > max_entries {
            let mut by_age: Vec<(Instant, u64, String)> = self
                .entries
                .iter()
                .map(|(id, stored)| (stored.inserted_at, stored.seq, id.clone()))
                .collect();
            by_age.sort_unstable();

            let excess = self.entries.len() - max_entries;
            for (_, _, id) in by_age.into_iter().take(excess) {
                self.entries.remove(&id);
                evicted += 1;
            }
        }

        CleanupReport { expired, evicted }
    }
}

/// Capacity- and time-bounded mapping from opaque ID to [`SearchResult`].
///
/// Safe to share between tasks; every operation (including a full cleanup
/// pass) runs under a single lock, so lookups never observe a half-finished
/// cleanup.
#[derive(Debug)]
pub struct ResultStore {
    ttl: Duration,
    max_entries: usize,
    counter: AtomicU64,
    table: Mutex<ResultTable>,
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new(&StoreConfig::default())
    }
}

impl ResultStore {
    /// Create an empty store with the TTL and capacity from `config`.
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            ttl: Duration::from_secs(config.ttl_seconds),
            max_entries: config.max_entries,
            counter: AtomicU64::new(0),
            table: Mutex::new(ResultTable::default()),
        }
    }

    /// Generate a unique identifier of the form
    /// `<prefix>-<unix millis>-<counter>-<random>`.
    ///
    /// The process-wide counter guarantees uniqueness within a single
    /// millisecond; the random suffix keeps IDs from being guessable from
    /// one another.
    pub fn generate_id(&self, prefix: &str) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        self.generate_id_at(prefix, millis)
    }

    /// [`generate_id`](Self::generate_id) against an explicit clock reading
    /// in Unix milliseconds.
    pub fn generate_id_at(&self, prefix: &str, millis: u128) -> String {
        let count = self.counter.fetch_add(1, Ordering::Relaxed);
        let salt: u32 = rand::thread_rng().gen();
        format!("{prefix}-{millis:x}-{count:x}-{salt:08x}")
    }

    /// Insert or overwrite a record, stamping it with the current time.
    pub fn put(&self, result: SearchResult) {
        self.put_at(result, Instant::now());
    }

    /// Insert or overwrite a record with an explicit insertion time.
    pub fn put_at(&self, result: SearchResult, now: Instant) {
        tracing::trace!(id = %result.id, "storing result");
        self.lock().put(result, now);
    }

    /// Look up a record by ID. Does not refresh its age.
    pub fn get(&self, id: &str) -> Option<SearchResult> {
        self.lock().entries.get(id).map(|stored| stored.result.clone())
    }

    /// Remove expired records, then evict the oldest until at capacity.
    ///
    /// Idempotent: a second call with nothing to do removes nothing.
    pub fn cleanup(&self) -> CleanupReport {
        self.cleanup_at(Instant::now())
    }

    /// [`cleanup`](Self::cleanup) against an explicit clock reading.
    pub fn cleanup_at(&self, now: Instant) -> CleanupReport {
        let report = self.lock().cleanup(now, self.ttl, self.max_entries);
        if report.removed() > 0 {
            tracing::debug!(
                expired = report.expired,
                evicted = report.evicted,
                "result store cleanup"
            );
        }
        report
    }

    /// Number of records currently held (including any not yet cleaned up).
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Returns `true` if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum age of a record.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Capacity enforced by cleanup.
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    fn lock(&self) -> MutexGuard<'_, ResultTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ResultSink for ResultStore {
    fn generate_id(&self, prefix: &str) -> String {
        ResultStore::generate_id(self, prefix)
    }

    fn store(&self, record: SearchResult) {
        self.put(record);
    }
}
