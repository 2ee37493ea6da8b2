pub mod logger;

pub use logger::AuditLogger;

use std::path::Path;

/// One git invocation as seen by an audit sink
#[derive(Debug, Clone, Copy)]
pub struct AuditEntry<'a> {
    pub work_dir: &'a Path,
    pub command_line: &'a str,
    pub result: &'a str,
    pub exit_code: i32,
}

/// Receives every command the executor runs.
///
/// Implementations must not block for long and must never fail the caller;
/// write errors are reported through `tracing` instead.
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: &AuditEntry<'_>);
}

/// Audit sink that forwards entries to the `tracing` subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAudit;

impl AuditSink for TracingAudit {
    fn record(&self, entry: &AuditEntry<'_>) {
        tracing::debug!(
            work_dir = %entry.work_dir.display(),
            exit_code = entry.exit_code,
            result = entry.result,
            "{}",
            entry.command_line
        );
    }
}
