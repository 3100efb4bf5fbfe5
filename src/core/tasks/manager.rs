use std::{
    path::PathBuf,
    sync::{
        atomic::AtomicBool,
        mpsc,
        Arc,
    },
    thread,
    time::Duration,
};

use super::{
    ProgressReporter,
    RecalcProgress,
    TaskHandle,
    TaskResult,
};
use crate::{
    anki::Collection,
    core::{
        config::RecalcConfig,
        pipeline::recalc,
    },
    segmentation::MorphemizerRegistry,
};

/// Runs work off the interactive thread. Results and progress come back
/// through `poll_results` / `recv_timeout`, never through callbacks on the worker.
pub struct TaskManager {
    receiver: mpsc::Receiver<TaskResult>,
    sender: mpsc::Sender<TaskResult>,
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskManager {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self { receiver, sender }
    }

    pub fn poll_results(&mut self) -> Vec<TaskResult> {
        let mut results = Vec::new();

        while let Ok(result) = self.receiver.try_recv() {
            results.push(result);
        }

        results
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<TaskResult> {
        self.receiver.recv_timeout(timeout).ok()
    }

    /// Starts a recalc on a worker thread. The collection and the morphemizers
    /// move to the worker for the duration of the run.
    pub fn start_recalc(
        &self,
        mut collection: Box<dyn Collection>,
        config: RecalcConfig,
        morphemizers: MorphemizerRegistry,
        cache_path: Option<PathBuf>,
    ) -> TaskHandle {
        let sender = self.sender.clone();
        let progress_sender = self.sender.clone();
        let cancel_token = Arc::new(AtomicBool::new(false));

        let progress = ProgressReporter::new(
            cancel_token.clone(),
            Some(Box::new(move |progress: RecalcProgress| {
                let _ = progress_sender.send(TaskResult::Progress(progress));
            })),
        );

        let join_handle = thread::spawn(move || {
            let result = recalc(
                collection.as_mut(),
                &config,
                &morphemizers,
                &progress,
                cache_path.as_deref(),
            );
            let _ = sender.send(TaskResult::Recalc(result));
        });

        TaskHandle::new(cancel_token, join_handle)
    }
}
