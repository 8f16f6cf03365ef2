//! Named background tasks.
//!
//! At most one task runs per name. Spawning under a name that is already
//! running aborts the old task first, so a plugin reload can never leave two
//! sweeps behind.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use tokio::task::JoinHandle;

#[derive(Debug, Default)]
pub struct TaskRegistry {
    handles: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `fut` under `name`, replacing any task already registered there.
    /// Must be called from within a Tokio runtime.
    pub fn spawn<F>(&self, name: &str, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut handles = self.handles.lock().expect("task registry lock poisoned");
        if let Some(previous) = handles.remove(name) {
            if !previous.is_finished() {
                tracing::debug!("Replacing running task '{}'", name);
            }
            previous.abort();
        }
        handles.insert(name.to_string(), tokio::spawn(fut));
    }

    /// Aborts the task registered under `name`. Returns `true` if one was
    /// still running. Stopping an unknown or finished task is a no-op.
    pub fn stop(&self, name: &str) -> bool {
        let handle = self
            .handles
            .lock()
            .expect("task registry lock poisoned")
            .remove(name);

        match handle {
            Some(handle) => {
                let was_running = !handle.is_finished();
                handle.abort();
                was_running
            }
            None => false,
        }
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.handles
            .lock()
            .expect("task registry lock poisoned")
            .get(name)
            .is_some_and(|h| !h.is_finished())
    }

    pub fn stop_all(&self) {
        let mut handles = self.handles.lock().expect("task registry lock poisoned");
        for (name, handle) in handles.drain() {
            tracing::debug!("Stopping task '{}'", name);
            handle.abort();
        }
    }
}

impl Drop for TaskRegistry {
    fn drop(&mut self) {
        if let Ok(handles) = self.handles.get_mut() {
            for (_, handle) in handles.drain() {
                handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn stop_is_idempotent() {
        let registry = TaskRegistry::new();
        registry.spawn("sweep", std::future::pending());

        assert!(registry.is_running("sweep"));
        assert!(registry.stop("sweep"));
        assert!(!registry.stop("sweep"));
        assert!(!registry.stop("never-started"));
        assert!(!registry.is_running("sweep"));
    }

    #[tokio::test]
    async fn respawn_replaces_running_task() {
        let registry = TaskRegistry::new();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let first = tx.clone();
        registry.spawn("sweep", async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let _ = first.send("first");
        });
        registry.spawn("sweep", async move {
            let _ = tx.send("second");
        });

        assert_eq!(rx.recv().await, Some("second"));
        // The first task was aborted, so the channel closes without it.
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn finished_task_is_not_running() {
        let registry = TaskRegistry::new();
        let (tx, rx) = tokio::sync::oneshot::channel();
        registry.spawn("quick", async move {
            let _ = tx.send(());
        });
        rx.await.unwrap();
        tokio::task::yield_now().await;

        for _ in 0..100 {
            if !registry.is_running("quick") {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!("task never finished");
    }

    #[tokio::test]
    async fn stop_all_aborts_everything() {
        let registry = TaskRegistry::new();
        registry.spawn("a", std::future::pending());
        registry.spawn("b", std::future::pending());
        registry.stop_all();
        assert!(!registry.is_running("a"));
        assert!(!registry.is_running("b"));
    }
}
