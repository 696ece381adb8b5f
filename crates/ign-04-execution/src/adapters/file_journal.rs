//! # File Journal
//!
//! One JSON object per line, appended and synced before `record` returns.
//! A crash can leave a partial last line. The message it held was never
//! acknowledged, so `read` cuts it off and the next record starts clean.

use crate::domain::JournalMessage;
use crate::errors::JournalError;
use crate::ports::Journal;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Journal stored in a JSON-lines file.
#[derive(Debug)]
pub struct FileJournal {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileJournal {
    /// Journal at `path`. The file is created on the first record.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Journal file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Journal for FileJournal {
    async fn record(&self, message: &JournalMessage) -> Result<(), JournalError> {
        let mut line = serde_json::to_vec(message)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path).await?;
        file.write_all(&line).await?;
        file.sync_data().await?;
        debug!(message = message.type_name(), "journaled");
        Ok(())
    }

    async fn read(&self) -> Result<Vec<JournalMessage>, JournalError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let complete = match contents.rfind('\n') {
            Some(end) => &contents[..=end],
            None => "",
        };
        if complete.len() < contents.len() {
            warn!(
                path = %self.path.display(),
                "truncating an incomplete trailing journal line"
            );
            let _guard = self.write_lock.lock().await;
            let file = OpenOptions::new().write(true).open(&self.path).await?;
            file.set_len(complete.len() as u64).await?;
            file.sync_data().await?;
        }

        complete
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                serde_json::from_str(line).map_err(|e| JournalError::Corrupt {
                    line: index + 1,
                    reason: e.to_string(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn resume(id: &str) -> JournalMessage {
        JournalMessage::ExecutionStateResume { future_id: id.into() }
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let journal = FileJournal::new(dir.path().join("journal.jsonl"));
        assert!(journal.read().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_round_trip_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployments").join("chain-31337").join("journal.jsonl");

        let messages = vec![
            JournalMessage::RunStart {
                run_id: Uuid::new_v4(),
                chain_id: 31337,
            },
            resume("M#A"),
        ];
        let journal = FileJournal::new(&path);
        for message in &messages {
            journal.record(message).await.unwrap();
        }

        let reopened = FileJournal::new(&path);
        assert_eq!(reopened.read().await.unwrap(), messages);
    }

    #[tokio::test]
    async fn test_partial_trailing_line_is_cut_off() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");
        let journal = FileJournal::new(&path);
        journal.record(&resume("M#A")).await.unwrap();

        let mut contents = std::fs::read_to_string(&path).unwrap();
        contents.push_str(r#"{"type":"EXECUTION_STATE_RES"#);
        std::fs::write(&path, contents).unwrap();

        assert_eq!(journal.read().await.unwrap(), vec![resume("M#A")]);

        journal.record(&resume("M#B")).await.unwrap();
        assert_eq!(journal.read().await.unwrap(), vec![resume("M#A"), resume("M#B")]);
    }

    #[tokio::test]
    async fn test_corrupt_line_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");
        std::fs::write(&path, "{\"type\":\"EXECUTION_STATE_RESUME\",\"futureId\":\"M#A\"}\nnot json\n").unwrap();

        let error = FileJournal::new(&path).read().await.unwrap_err();
        assert!(matches!(error, JournalError::Corrupt { line: 2, .. }));
    }
}
