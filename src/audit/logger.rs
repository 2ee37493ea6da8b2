use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;

use super::{AuditEntry, AuditSink};

const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024; // 10MB

/// Append-only audit file of every git command and its output
pub struct AuditLogger {
    log_path: PathBuf,
    // Serializes writers sharing this logger across controllers
    write_lock: Mutex<()>,
}

impl AuditLogger {
    /// Create an AuditLogger writing to `~/.config/gitward/audit.log`
    pub fn new() -> std::io::Result<Self> {
        Self::with_path(Self::default_log_path()?)
    }

    /// Create an AuditLogger with a custom log path
    pub fn with_path<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let log_path = path.as_ref().to_path_buf();

        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)?;
        }

        Ok(Self {
            log_path,
            write_lock: Mutex::new(()),
        })
    }

    fn default_log_path() -> std::io::Result<PathBuf> {
        let home = std::env::var("HOME").map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "HOME environment variable not set",
            )
        })?;

        Ok(PathBuf::from(home)
            .join(".config")
            .join("gitward")
            .join("audit.log"))
    }

    /// Append one entry; the result text is indented under the command line
    pub fn log_entry(&self, entry: &AuditEntry<'_>) -> std::io::Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        self.rotate_if_needed()?;

        let timestamp = Utc::now().to_rfc3339();
        let mut log_entry = format!(
            "[{}] [{}] [exit:{}] {}\n",
            timestamp,
            entry.work_dir.display(),
            entry.exit_code,
            entry.command_line
        );
        for line in entry.result.lines() {
            log_entry.push_str("    ");
            log_entry.push_str(line);
            log_entry.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;

        file.write_all(log_entry.as_bytes())?;
        file.flush()?;

        Ok(())
    }

    /// Rotate log file if it exceeds MAX_LOG_SIZE
    fn rotate_if_needed(&self) -> std::io::Result<()> {
        if !self.log_path.exists() {
            return Ok(());
        }

        let metadata = fs::metadata(&self.log_path)?;
        if metadata.len() > MAX_LOG_SIZE {
            // audit.log -> audit.log.1
            let backup_path = self.log_path.with_extension("log.1");
            fs::rename(&self.log_path, backup_path)?;
        }

        Ok(())
    }

    /// Get the path to the log file
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}

impl AuditSink for AuditLogger {
    fn record(&self, entry: &AuditEntry<'_>) {
        if let Err(e) = self.log_entry(entry) {
            tracing::warn!(path = %self.log_path.display(), "failed to write audit log: {}", e);
        }
    }
}
