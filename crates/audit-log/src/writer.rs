use std::path::Path;

use tokio::io::{AsyncWriteExt, BufWriter};

use crate::entry::AuditEntry;

/// Errors that can occur during audit log I/O.
#[derive(Debug, thiserror::Error)]
pub enum AuditWriteError {
    #[error("failed to create parent directories: {0}")]
    CreateDir(std::io::Error),

    #[error("failed to open audit log file: {0}")]
    OpenFile(std::io::Error),

    #[error("failed to serialize audit entry: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write to audit log: {0}")]
    Write(std::io::Error),

    #[error("failed to flush audit log: {0}")]
    Flush(std::io::Error),
}

/// Buffered, append-only JSON-lines writer.
///
/// Lines accumulate in memory until [`flush`](Self::flush); the sink's
/// background task decides when that happens.
pub struct AuditWriter {
    file: BufWriter<tokio::fs::File>,
}

impl AuditWriter {
    /// Open (or create) the audit log at `path` in append mode, creating
    /// parent directories as needed.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self, AuditWriteError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(AuditWriteError::CreateDir)?;
        }

        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(AuditWriteError::OpenFile)?;

        Ok(Self {
            file: BufWriter::new(file),
        })
    }

    /// Serialise `entry` as a single JSON line.
    pub async fn write(&mut self, entry: &AuditEntry) -> Result<(), AuditWriteError> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');

        self.file
            .write_all(&line)
            .await
            .map_err(AuditWriteError::Write)
    }

    /// Push buffered lines through to the file.
    pub async fn flush(&mut self) -> Result<(), AuditWriteError> {
        self.file.flush().await.map_err(AuditWriteError::Flush)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{AuditEventType, AuditSource};

    #[tokio::test]
    async fn appends_one_line_per_entry() {
        let dir = std::env::temp_dir().join(format!("audit-writer-{}", uuid::Uuid::new_v4()));
        let path = dir.join("nested").join("audit.jsonl");

        let mut writer = AuditWriter::new(&path).await.unwrap();
        for event in [AuditEventType::GatewayStarted, AuditEventType::RulesLoaded] {
            writer
                .write(&AuditEntry::new(event, AuditSource::new("test"), serde_json::json!({})))
                .await
                .unwrap();
        }
        writer.flush().await.unwrap();

        // Reopening appends rather than truncating.
        let mut writer = AuditWriter::new(&path).await.unwrap();
        writer
            .write(&AuditEntry::new(
                AuditEventType::GatewayStopped,
                AuditSource::new("test"),
                serde_json::json!({}),
            ))
            .await
            .unwrap();
        writer.flush().await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let events: Vec<AuditEventType> = contents
            .lines()
            .map(|l| serde_json::from_str::<AuditEntry>(l).unwrap().event_type)
            .collect();
        assert_eq!(
            events,
            vec![
                AuditEventType::GatewayStarted,
                AuditEventType::RulesLoaded,
                AuditEventType::GatewayStopped,
            ]
        );

        tokio::fs::remove_dir_all(&dir).await.ok();
    }
}
