use std::fmt;

/// Request-scoped diagnostics for gate decisions.
///
/// `GateLog` is created by the controller for each evaluation and stamps
/// every event with the request id and path, so a disposition can be traced
/// back to the request that produced it.
///
/// Never log cookie values or tokens through this type.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GateLog<'a> {
    request_id: &'a str,
    path: &'a str,
}

impl<'a> GateLog<'a> {
    pub(crate) fn new(request_id: &'a str, path: &'a str) -> Self {
        Self { request_id, path }
    }

    /// Logs a routine decision.
    pub(crate) fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(request_id = %self.request_id, path = %self.path, "{}", args);
    }

    /// Logs a security-relevant event such as a bypass.
    pub(crate) fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(request_id = %self.request_id, path = %self.path, "{}", args);
    }

    /// Logs a failure that was converted into a closed disposition.
    pub(crate) fn error(&self, args: fmt::Arguments<'_>) {
        tracing::error!(request_id = %self.request_id, path = %self.path, "{}", args);
    }
}

/// Records the level of every event, for asserting how loud a code path is.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct LevelRecorder {
    levels: std::sync::Arc<std::sync::Mutex<Vec<tracing::Level>>>,
}

#[cfg(test)]
impl LevelRecorder {
    /// Runs `f` with this recorder installed as the thread's default subscriber.
    pub(crate) fn record<T>(&self, f: impl FnOnce() -> T) -> T {
        use tracing_subscriber::layer::SubscriberExt;

        let subscriber = tracing_subscriber::registry().with(self.clone());
        tracing::subscriber::with_default(subscriber, f)
    }

    /// Number of recorded events at exactly `level`.
    pub(crate) fn count(&self, level: tracing::Level) -> usize {
        self.levels
            .lock()
            .map(|levels| levels.iter().filter(|l| **l == level).count())
            .unwrap_or_default()
    }
}

#[cfg(test)]
impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for LevelRecorder {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        if let Ok(mut levels) = self.levels.lock() {
            levels.push(*event.metadata().level());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_log_does_not_panic_without_subscriber() {
        let log = GateLog::new("req-1", "/dashboard");
        log.debug(format_args!("allowed"));
        log.warn(format_args!("bypass"));
        log.error(format_args!("resolver failed"));
    }

    #[test]
    fn gate_log_emits_with_subscriber() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let log = GateLog::new("req-2", "/login");
            log.debug(format_args!("public route allowed"));
        });
    }

    #[test]
    fn level_recorder_counts_by_level() {
        let recorder = LevelRecorder::default();

        recorder.record(|| {
            let log = GateLog::new("req-3", "/dashboard");
            log.warn(format_args!("bypass"));
            log.error(format_args!("resolver failed"));
            log.error(format_args!("resolver failed again"));
        });

        assert_eq!(recorder.count(tracing::Level::WARN), 1);
        assert_eq!(recorder.count(tracing::Level::ERROR), 2);
        assert_eq!(recorder.count(tracing::Level::DEBUG), 0);
    }
}
