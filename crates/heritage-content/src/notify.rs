//! User notifications (toast/banner).

use heritage_core::types::Severity;

/// Fire-and-forget notification sink.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, description: &str, severity: Severity);
}

/// Notifier that writes to the tracing log at a level matching the severity.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, title: &str, description: &str, severity: Severity) {
        match severity {
            Severity::Success | Severity::Info => {
                tracing::info!(title = %title, description = %description, ?severity, "Notification shown")
            }
            Severity::Warning => {
                tracing::warn!(title = %title, description = %description, "Notification shown")
            }
            Severity::Error => {
                tracing::error!(title = %title, description = %description, "Notification shown")
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_notifier_all_severities() {
        let notifier = TracingNotifier;
        notifier.notify("Saved", "Comment sent", Severity::Success);
        notifier.notify("Heads up", "Slow network", Severity::Warning);
        notifier.notify("Failed", "Try again", Severity::Error);
    }

    #[test]
    fn test_recording_notifier() {
        let notifier = testing::RecordingNotifier::default();
        notifier.notify("a", "b", Severity::Info);
        assert_eq!(notifier.severities(), vec![Severity::Info]);
    }
}
