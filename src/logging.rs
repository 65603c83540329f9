//! Access log: one JSON object per line, appended to a file.
//!
//! `tracing` covers operator diagnostics; this log is the durable record of who
//! called the gateway and what was forwarded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub component: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

impl LogEntry {
    pub fn new(level: LogLevel, component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            component: component.into(),
            message: message.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, ctx: serde_json::Value) -> Self {
        self.context = Some(ctx);
        self
    }
}

/// Cheap to clone; all clones append to the same file. A disabled logger drops
/// every entry.
#[derive(Clone, Default)]
pub struct SharedLogger(Option<Arc<Mutex<BufWriter<File>>>>);

impl SharedLogger {
    /// Open `file_path` for appending, creating it and its parent directories.
    pub fn new(file_path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file_path = file_path.as_ref();
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(file_path)?;
        Ok(Self(Some(Arc::new(Mutex::new(BufWriter::new(file))))))
    }

    pub fn disabled() -> Self {
        Self(None)
    }

    pub fn log(&self, entry: LogEntry) {
        let Some(ref writer) = self.0 else {
            return;
        };
        let Ok(json) = serde_json::to_string(&entry) else {
            return;
        };
        if let Ok(mut writer) = writer.lock() {
            if let Err(e) = writeln!(writer, "{json}").and_then(|()| writer.flush()) {
                tracing::warn!("Failed to write access log: {}", e);
            }
        }
    }

    pub fn info(&self, component: impl Into<String>, message: impl Into<String>) {
        self.log(LogEntry::new(LogLevel::Info, component, message));
    }

    pub fn warn(&self, component: impl Into<String>, message: impl Into<String>) {
        self.log(LogEntry::new(LogLevel::Warn, component, message));
    }

    pub fn error(&self, component: impl Into<String>, message: impl Into<String>) {
        self.log(LogEntry::new(LogLevel::Error, component, message));
    }

    pub fn log_with_context(
        &self,
        level: LogLevel,
        component: impl Into<String>,
        message: impl Into<String>,
        context: serde_json::Value,
    ) {
        self.log(LogEntry::new(level, component, message).with_context(context));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_entries(path: &Path) -> Vec<LogEntry> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_entries_are_appended_as_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("gateway.log");

        let logger = SharedLogger::new(&path).unwrap();
        logger.info("startup", "first");
        logger.clone().log_with_context(
            LogLevel::Warn,
            "access",
            "denied",
            serde_json::json!({ "caller": "8.8.8.8" }),
        );

        let entries = read_entries(&path);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "first");
        assert!(entries[0].context.is_none());
        assert_eq!(entries[1].level, LogLevel::Warn);
        assert_eq!(entries[1].context.as_ref().unwrap()["caller"], "8.8.8.8");
    }

    #[test]
    fn test_reopen_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway.log");

        SharedLogger::new(&path).unwrap().info("startup", "one");
        SharedLogger::new(&path).unwrap().error("proxy", "two");

        let messages: Vec<_> = read_entries(&path).into_iter().map(|e| e.message).collect();
        assert_eq!(messages, ["one", "two"]);
    }
}
