//! Cancelable background tasks owned by a mounted component.
//!
//! ## Learning: Deterministic Teardown
//!
//! `JoinHandle::abort` cancels a task at its next `.await`. On a
//! multi-threaded runtime the task may already be past that point when
//! abort is requested, so every driver mutates and publishes only while
//! holding the lock on the shared `running` flag. `cancel` clears the
//! flag under the same lock, so once it returns no driver is mid-step and
//! none will start another.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;

type RunningFlag = Arc<Mutex<bool>>;

fn lock(flag: &Mutex<bool>) -> MutexGuard<'_, bool> {
    flag.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Liveness flag handed to a driver task.
#[derive(Debug, Clone)]
pub struct Liveness(RunningFlag);

impl Liveness {
    /// Locks the flag for one step, or `None` once the component is gone.
    ///
    /// `cancel` blocks while the guard is held. The guard is not `Send`, so
    /// it must be dropped before the driver's next `.await`.
    pub fn hold(&self) -> Option<MutexGuard<'_, bool>> {
        let guard = lock(&self.0);
        if *guard { Some(guard) } else { None }
    }
}

/// Owns a spawned driver task and cancels it on drop.
///
/// Must be created from within a tokio runtime.
#[derive(Debug)]
pub struct TaskGuard {
    running: RunningFlag,
    handle: Option<JoinHandle<()>>,
}

impl TaskGuard {
    /// Spawns the driver produced by `make`, passing it the liveness flag.
    pub fn spawn<F, Fut>(make: F) -> Self
    where
        F: FnOnce(Liveness) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let running = Arc::new(Mutex::new(true));
        let handle = tokio::spawn(make(Liveness(Arc::clone(&running))));
        Self {
            running,
            handle: Some(handle),
        }
    }

    /// Cancels the task. Idempotent.
    pub fn cancel(&mut self) {
        *lock(&self.running) = false;
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Returns true until `cancel` has been called.
    pub fn is_running(&self) -> bool {
        *lock(&self.running)
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// A join handle that aborts its task when dropped.
///
/// Used for work a driver starts on behalf of its component (an in-flight
/// delivery) so it dies together with the driver.
#[derive(Debug)]
pub struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> AbortOnDrop<T> {
    pub fn new(handle: JoinHandle<T>) -> Self {
        Self(handle)
    }

    /// Mutable access to the inner handle, which is itself a future.
    pub fn handle_mut(&mut self) -> &mut JoinHandle<T> {
        &mut self.0
    }
}

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_ticks() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);

        let mut guard = TaskGuard::spawn(move |alive| async move {
            loop {
                tokio::time::sleep(Duration::from_millis(10)).await;
                let Some(_live) = alive.hold() else {
                    break;
                };
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(35)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);

        guard.cancel();
        assert!(!guard.is_running());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancel_waits_for_step_in_progress() {
        let steps = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&steps);
        let (entered_tx, entered_rx) = std::sync::mpsc::channel();

        let mut guard = TaskGuard::spawn(move |alive| async move {
            let Some(_live) = alive.hold() else {
                return;
            };
            let _ = entered_tx.send(());
            std::thread::sleep(Duration::from_millis(50));
            counter.fetch_add(1, Ordering::SeqCst);
        });

        entered_rx.recv().unwrap();
        guard.cancel();
        assert_eq!(steps.load(Ordering::SeqCst), 1);
        assert!(!guard.is_running());
    }

    #[test]
    fn test_hold_after_cancel_is_refused() {
        let flag: RunningFlag = Arc::new(Mutex::new(true));
        let alive = Liveness(Arc::clone(&flag));
        assert!(alive.hold().is_some());

        *lock(&flag) = false;
        assert!(alive.hold().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);

        let guard = TaskGuard::spawn(move |_alive| async move {
            loop {
                tokio::time::sleep(Duration::from_millis(10)).await;
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(15)).await;
        drop(guard);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
    }
}
