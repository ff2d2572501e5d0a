#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    /// A per-molecule anomaly worth surfacing above the log.
    Diagnostic(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    /// Runs `f` between a `PhaseStart`/`PhaseFinish` pair.
    pub fn phase<T>(&self, name: &'static str, f: impl FnOnce() -> T) -> T {
        self.report(Progress::PhaseStart { name });
        let result = f();
        self.report(Progress::PhaseFinish);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn silent_reporter_accepts_events() {
        let reporter = ProgressReporter::new();
        reporter.report(Progress::TaskIncrement);
        assert_eq!(reporter.phase("noop", || 7), 7);
    }

    #[test]
    fn phase_wraps_work_in_start_and_finish() {
        let events = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|e| {
            events.lock().unwrap().push(e);
        }));
        reporter.phase("Matching", || {
            reporter.report(Progress::TaskStart { total_steps: 1 });
            reporter.report(Progress::TaskIncrement);
            reporter.report(Progress::TaskFinish);
        });
        drop(reporter);
        assert_eq!(
            events.into_inner().unwrap(),
            vec![
                Progress::PhaseStart { name: "Matching" },
                Progress::TaskStart { total_steps: 1 },
                Progress::TaskIncrement,
                Progress::TaskFinish,
                Progress::PhaseFinish,
            ]
        );
    }
}
