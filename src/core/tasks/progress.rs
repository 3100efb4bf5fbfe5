use std::sync::{
    atomic::{
        AtomicBool,
        Ordering,
    },
    Arc,
};

use crate::core::MorphRankError;

/// Long loops only look at the cancel flag and publish progress this often.
pub const CHECKPOINT_INTERVAL: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecalcProgress {
    pub label: String,
    pub current: usize,
    pub total: usize,
}

pub type ProgressCallback = Box<dyn Fn(RecalcProgress) + Send + Sync>;

/// Worker-side end of the progress channel. Reporting never blocks, and
/// cancellation is cooperative: a loop that reaches a checkpoint after the flag
/// was raised gets `MorphRankError::Cancelled` back.
#[derive(Default)]
pub struct ProgressReporter {
    cancel_flag: Arc<AtomicBool>,
    progress_callback: Option<ProgressCallback>,
}

impl ProgressReporter {
    pub fn new(cancel_flag: Arc<AtomicBool>, progress_callback: Option<ProgressCallback>) -> Self {
        Self { cancel_flag, progress_callback }
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel_flag.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::Relaxed)
    }

    pub fn check_cancelled(&self) -> Result<(), MorphRankError> {
        if self.is_cancelled() {
            return Err(MorphRankError::Cancelled);
        }
        Ok(())
    }

    pub fn report(&self, label: impl Into<String>, current: usize, total: usize) {
        if let Some(ref callback) = self.progress_callback {
            callback(RecalcProgress { label: label.into(), current, total });
        }
    }

    /// Called once per loop iteration. The label is only built on checkpoint iterations.
    pub fn checkpoint<F>(&self, label: F, counter: usize, total: usize) -> Result<(), MorphRankError>
    where
        F: FnOnce() -> String,
    {
        if counter % CHECKPOINT_INTERVAL != 0 {
            return Ok(());
        }

        self.check_cancelled()?;
        self.report(label(), counter, total);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn test_checkpoint_reports_every_thousand_items() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let reporter = ProgressReporter::new(
            Arc::new(AtomicBool::new(false)),
            Some(Box::new(move |progress: RecalcProgress| {
                seen_clone.lock().unwrap().push(progress.current);
            })),
        );

        for counter in 0..2500 {
            reporter.checkpoint(|| format!("card: {counter} of 2500"), counter, 2500).unwrap();
        }

        assert_eq!(*seen.lock().unwrap(), vec![0, 1000, 2000]);
    }

    #[test]
    fn test_cancellation_is_observed_at_the_next_checkpoint() {
        let reporter = ProgressReporter::default();
        reporter.checkpoint(String::new, 0, 10).unwrap();

        reporter.cancel_flag().store(true, Ordering::Relaxed);
        assert!(reporter.checkpoint(String::new, 999, 5000).is_ok());
        assert!(matches!(
            reporter.checkpoint(String::new, 1000, 5000),
            Err(MorphRankError::Cancelled)
        ));
    }
}
