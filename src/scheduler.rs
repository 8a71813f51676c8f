// src/scheduler.rs
use chrono::{DateTime, Local};
use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Deferred unit of work: sleep for `duration`, then complete.
#[derive(Debug, Clone)]
pub struct BackgroundTask {
    pub started_at: DateTime<Local>,
    pub duration: Duration,
    pub completion_message: String,
}

impl BackgroundTask {
    pub fn new(duration: Duration, completion_message: impl Into<String>) -> Self {
        Self {
            started_at: Local::now(),
            duration,
            completion_message: completion_message.into(),
        }
    }
}

/// Handle to a running background task.
///
/// Dropping the handle detaches the thread. Nothing joins it on exit, so a
/// task still sleeping when the process ends never completes.
#[derive(Debug)]
pub struct TaskHandle {
    inner: JoinHandle<()>,
}

impl TaskHandle {
    pub fn thread_name(&self) -> Option<&str> {
        self.inner.thread().name()
    }

    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }

    /// Waits for completion. The menu loop never calls this.
    #[cfg(test)]
    pub fn join(self) -> thread::Result<()> {
        self.inner.join()
    }
}

/// Starts `task` on its own thread and returns immediately. `on_complete`
/// runs once `task.duration` has elapsed.
pub fn spawn<F>(task: BackgroundTask, on_complete: F) -> io::Result<TaskHandle>
where
    F: FnOnce(&BackgroundTask) + Send + 'static,
{
    tracing::debug!(delay = ?task.duration, "spawning background task");
    let inner = thread::Builder::new()
        .name("background-task".into())
        .spawn(move || {
            thread::sleep(task.duration);
            on_complete(&task);
        })?;
    Ok(TaskHandle { inner })
}
