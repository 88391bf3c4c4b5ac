//! Progress logging for migration and synchronization runs.
//!
//! Engines report through [`UpgradeLog`] rather than a global logger so a
//! caller can capture run output wherever it wants (console, test buffer,
//! the `log` facade). Severity levels mirror what the engines need:
//! `verbose` for per-step detail, `critical` for the partial-completion
//! warning a failed run ends with.

/// Sink for engine progress messages.
pub trait UpgradeLog {
    /// Fine-grained detail (journal ids, hash prefixes, skipped entries).
    fn verbose(&self, message: &str);

    /// Normal progress.
    fn info(&self, message: &str);

    /// Degraded but recoverable situations.
    fn warning(&self, message: &str);

    /// Operation failures.
    fn error(&self, message: &str);

    /// Run left partially complete; manual intervention may be required.
    fn critical(&self, message: &str);
}

/// Forwards messages to the `log` facade.
///
/// The default sink: configurations fall back to it when no log is supplied,
/// so engine output lands wherever the host application routes `log` records.
#[derive(Debug, Default, Clone, Copy)]
pub struct TraceLog;

impl UpgradeLog for TraceLog {
    fn verbose(&self, message: &str) {
        tracing::debug!("{message}");
    }

    fn info(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn warning(&self, message: &str) {
        tracing::warn!("{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!("{message}");
    }

    fn critical(&self, message: &str) {
        tracing::error!("critical: {message}");
    }
}

/// Discards every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLog;

impl UpgradeLog for NullLog {
    fn verbose(&self, _message: &str) {}

    fn info(&self, _message: &str) {}

    fn warning(&self, _message: &str) {}

    fn error(&self, _message: &str) {}

    fn critical(&self, _message: &str) {}
}
