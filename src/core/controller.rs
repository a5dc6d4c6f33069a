// src/core/controller.rs

//! The scan lifecycle controller: admission, per-identity exclusivity, the
//! concurrency ceiling, and the wall-clock deadline.
//!
//! The only cross-scan shared state is the slot registry. A slot is held for
//! exactly the duration of one scan and released on every exit path —
//! completion, timeout, failure, or panic unwind — via the guard's `Drop`.

use tracing::{debug, info, warn};

use crate::config::ScanConfig;
use crate::core::models::{ScanRecord, ScanReport};
use crate::core::scanner::run_full_scan;
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::timeout;

/// Everything `scan` can report besides a finished report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// The requesting identity already holds a scan slot.
    AlreadyScanning,
    /// The concurrency ceiling is reached across all identities.
    AtCapacity,
    /// The wall-clock deadline fired; in-flight work was abandoned and no
    /// partial report exists.
    TimedOut,
    /// An unexpected failure not absorbed by any pipeline stage, verbatim.
    Internal(String),
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::AlreadyScanning => write!(f, "a scan for this identity is already running"),
            ScanError::AtCapacity => write!(f, "maximum number of concurrent scans reached"),
            ScanError::TimedOut => write!(f, "the scan took too long to complete"),
            ScanError::Internal(msg) => write!(f, "scan failed: {}", msg),
        }
    }
}

impl std::error::Error for ScanError {}

/// Persistence collaborator notified after each completed scan. Failures are
/// logged by the controller and never fail the scan.
pub trait ScanSink: Send + Sync {
    fn record_scan(&self, record: &ScanRecord) -> Result<(), String>;
}

/// Admission gate and entry point for scans. Cheap to clone; clones share
/// the slot registry.
#[derive(Clone)]
pub struct ScanController {
    config: ScanConfig,
    slots: Arc<Mutex<HashSet<i64>>>,
    sink: Option<Arc<dyn ScanSink>>,
}

/// Registry entry held for the duration of one scan.
struct SlotGuard {
    slots: Arc<Mutex<HashSet<i64>>>,
    user_id: i64,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        let mut slots = lock_registry(&self.slots);
        slots.remove(&self.user_id);
        debug!(user_id = self.user_id, held = slots.len(), "Scan slot released.");
    }
}

fn lock_registry(slots: &Mutex<HashSet<i64>>) -> MutexGuard<'_, HashSet<i64>> {
    // The critical sections only insert/remove; a poisoned registry is still
    // structurally sound, so recover the guard instead of propagating.
    slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScanController {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            slots: Arc::new(Mutex::new(HashSet::new())),
            sink: None,
        }
    }

    /// Attaches the persistence collaborator.
    pub fn with_sink(mut self, sink: Arc<dyn ScanSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Pre-checks admission without occupying a slot. Callers use this for
    /// an immediate "busy" response; the answer can change before `scan` is
    /// invoked, which then re-checks atomically.
    pub fn can_admit(&self, user_id: i64) -> bool {
        let slots = lock_registry(&self.slots);
        !slots.contains(&user_id) && slots.len() < self.config.max_concurrent_scans
    }

    /// Number of currently held slots.
    pub fn active_scans(&self) -> usize {
        lock_registry(&self.slots).len()
    }

    /// Runs the full pipeline for `target` on behalf of `user_id`, bounded
    /// by the configured deadline.
    pub async fn scan(&self, user_id: i64, target: &str) -> Result<ScanReport, ScanError> {
        info!(user_id, target, "Scan requested.");
        let config = self.config.clone();
        let owned_target = target.to_string();
        let report = self
            .run_admitted(user_id, async move {
                run_full_scan(&owned_target, &config).await
            })
            .await?;
        info!(user_id, risk_score = report.risk_score, "Scan completed.");
        self.record_completion(user_id, target, &report);
        Ok(report)
    }

    /// Admission check and slot allocation, atomic under the registry lock.
    fn admit(&self, user_id: i64) -> Result<SlotGuard, ScanError> {
        let mut slots = lock_registry(&self.slots);
        if slots.contains(&user_id) {
            debug!(user_id, "Rejected: identity already holds a slot.");
            return Err(ScanError::AlreadyScanning);
        }
        if slots.len() >= self.config.max_concurrent_scans {
            debug!(user_id, held = slots.len(), "Rejected: concurrency ceiling reached.");
            return Err(ScanError::AtCapacity);
        }
        slots.insert(user_id);
        debug!(user_id, held = slots.len(), "Scan slot allocated.");
        Ok(SlotGuard {
            slots: Arc::clone(&self.slots),
            user_id,
        })
    }

    /// Runs `work` while holding a slot for `user_id`, under the deadline.
    ///
    /// The work runs on its own task so a panic inside the pipeline cannot
    /// unwind out of `scan` untyped; it comes back as `Internal` carrying the
    /// panic message. On timeout the task is aborted, which abandons its
    /// in-flight connections. The slot guard releases on every path.
    pub(crate) async fn run_admitted<F, T>(&self, user_id: i64, work: F) -> Result<T, ScanError>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let _slot = self.admit(user_id)?;
        let mut task = tokio::spawn(work);
        match timeout(self.config.scan_timeout, &mut task).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(join_error)) => {
                let message = match join_error.try_into_panic() {
                    Ok(payload) => {
                        if let Some(s) = payload.downcast_ref::<&str>() {
                            s.to_string()
                        } else if let Some(s) = payload.downcast_ref::<String>() {
                            s.clone()
                        } else {
                            "scan task panicked".to_string()
                        }
                    }
                    Err(e) => e.to_string(),
                };
                warn!(user_id, error = %message, "Scan pipeline failed unexpectedly.");
                Err(ScanError::Internal(message))
            }
            Err(_) => {
                task.abort();
                warn!(user_id, "Scan exceeded the wall-clock deadline, abandoning in-flight work.");
                Err(ScanError::TimedOut)
            }
        }
    }

    /// Fire-and-forget persistence of a completed scan.
    fn record_completion(&self, user_id: i64, target: &str, report: &ScanReport) {
        let Some(sink) = &self.sink else { return };
        let record = ScanRecord {
            user_id,
            target: target.to_string(),
            risk_score: report.risk_score,
            timestamp: report.timestamp,
        };
        if let Err(e) = sink.record_scan(&record) {
            warn!(user_id, error = %e, "Scan sink rejected the record; continuing.");
        }
    }
}
