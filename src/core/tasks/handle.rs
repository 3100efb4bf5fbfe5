use std::{
    sync::{
        atomic::{
            AtomicBool,
            Ordering,
        },
        Arc,
    },
    thread::JoinHandle,
};

/// Owner-side handle of a background recalc.
pub struct TaskHandle {
    cancel_token: Arc<AtomicBool>,
    join_handle: Option<JoinHandle<()>>,
}

impl TaskHandle {
    pub fn new(cancel_token: Arc<AtomicBool>, join_handle: JoinHandle<()>) -> Self {
        Self { cancel_token, join_handle: Some(join_handle) }
    }

    /// Asks the worker to stop at its next checkpoint.
    pub fn cancel(&self) {
        self.cancel_token.store(true, Ordering::Relaxed);
    }

    /// Shared with whatever else may cancel the task, such as an input listener.
    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        self.cancel_token.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.load(Ordering::Relaxed)
    }

    pub fn is_finished(&self) -> bool {
        self.join_handle.as_ref().map(|h| h.is_finished()).unwrap_or(true)
    }

    pub fn join(&mut self) {
        if let Some(handle) = self.join_handle.take() {
            let _ = handle.join();
        }
    }
}
