//! Explicit process-wide state.
//!
//! The Python original keeps a handful of module-level globals (a disable flag, a verbose
//! debug flag, the logger namespace). Per Design Notes, these become explicit, documented
//! process state here rather than ambient module attributes: a `OnceLock`-cached env var read
//! and a thread-local task id scope, modeled on the teacher's `with_active_dialect` /
//! `DialectReset` RAII guard (`linter/rule.rs`).

use std::cell::Cell;
use std::sync::OnceLock;

/// Name of the environment variable that disables translation process-wide.
pub const DISABLE_ENV_VAR: &str = "ID_TRANSLATION_DISABLED";

static DISABLED: OnceLock<bool> = OnceLock::new();

/// Returns whether `translate` calls should short-circuit and return their input unchanged.
///
/// The environment variable is read once per process and cached; set it before the first
/// `Translator::translate` call if you need to flip this behavior.
pub fn translation_disabled() -> bool {
    *DISABLED.get_or_init(|| {
        std::env::var(DISABLE_ENV_VAR)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    })
}

thread_local! {
    static CURRENT_TASK_ID: Cell<u64> = const { Cell::new(0) };
}

/// Returns the task id of the innermost enclosing [`TaskIdGuard`], or `0` if none is active.
pub fn current_task_id() -> u64 {
    CURRENT_TASK_ID.with(|c| c.get())
}

/// RAII guard that scopes a task id for the duration of a single translate/map/fetch call,
/// so nested calls (e.g. an `AbstractFetcher::fetch` invoked from within `Translator::translate`)
/// share one id in key-event logs without threading it through every call site explicitly.
pub struct TaskIdGuard {
    previous: u64,
}

impl TaskIdGuard {
    /// Enters a new scope with `task_id` active, saving whatever was active before.
    pub fn enter(task_id: u64) -> Self {
        let previous = CURRENT_TASK_ID.with(|c| c.replace(task_id));
        Self { previous }
    }
}

impl Drop for TaskIdGuard {
    fn drop(&mut self) {
        CURRENT_TASK_ID.with(|c| c.set(self.previous));
    }
}

/// Allocates a fresh, process-unique task id.
pub fn next_task_id() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_id_guard_restores_previous_on_drop() {
        assert_eq!(current_task_id(), 0);
        {
            let _g = TaskIdGuard::enter(42);
            assert_eq!(current_task_id(), 42);
            {
                let _g2 = TaskIdGuard::enter(43);
                assert_eq!(current_task_id(), 43);
            }
            assert_eq!(current_task_id(), 42);
        }
        assert_eq!(current_task_id(), 0);
    }

    #[test]
    fn next_task_id_is_monotonic_and_unique() {
        let a = next_task_id();
        let b = next_task_id();
        assert_ne!(a, b);
    }
}
