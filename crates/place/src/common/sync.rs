use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::error;

static POISON_RECOVERY_COUNT: AtomicU64 = AtomicU64::new(0);

pub fn poison_recovery_count() -> u64 {
    POISON_RECOVERY_COUNT.load(Ordering::Relaxed)
}

fn record_poison_recovery() {
    POISON_RECOVERY_COUNT.fetch_add(1, Ordering::Relaxed);
}

/// Locks `lock`, taking the inner value back if a previous holder panicked.
///
/// Every grid mutation is a single cell assignment, so a poisoned canvas is
/// still a well-formed grid.
pub fn mutex_lock_or_recover<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    lock.lock().unwrap_or_else(|poisoned| {
        record_poison_recovery();
        error!(
            "Mutex poisoned - a thread panicked while holding this lock. \
             Recovering the inner value."
        );
        poisoned.into_inner()
    })
}
