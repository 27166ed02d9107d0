use std::io::Write;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::errors::ScreenLoopResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Assistant,
    Error,
}

/// One user-visible event: a capture, an analysis, an executed action, or a
/// failure. Every entry is timestamped and sender-tagged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub ts: chrono::DateTime<chrono::Utc>,
    pub sender: Sender,
    pub text: String,
}

impl TranscriptEntry {
    pub fn now(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            ts: chrono::Utc::now(),
            sender,
            text: text.into(),
        }
    }
}

pub type TranscriptTx = mpsc::UnboundedSender<TranscriptEntry>;
pub type TranscriptRx = mpsc::UnboundedReceiver<TranscriptEntry>;

pub fn channel() -> (TranscriptTx, TranscriptRx) {
    mpsc::unbounded_channel()
}

/// Append-only JSONL log of one session's transcript.
pub struct TranscriptLog {
    pub session_id: String,
    file_path: std::path::PathBuf,
}

impl TranscriptLog {
    pub fn new() -> Self {
        let session_id = uuid::Uuid::new_v4().to_string();
        let dir = data_dir_or_cwd();
        let file_path = dir.join(format!("session_{session_id}.jsonl"));
        Self {
            session_id,
            file_path,
        }
    }

    pub fn append(&self, entry: &TranscriptEntry) -> ScreenLoopResult<()> {
        let line = serde_json::to_string(entry)?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)?;
        writeln!(file, "{}", line)?;
        tracing::debug!(path = %self.file_path.display(), "transcript entry flushed");
        Ok(())
    }
}

impl Default for TranscriptLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns `%LOCALAPPDATA%\Screenloop` on Windows,
/// `~/.local/share/screenloop` on Linux/macOS,
/// falling back to the current working directory.
pub fn data_dir_or_cwd() -> std::path::PathBuf {
    #[cfg(target_os = "windows")]
    let base = std::env::var("LOCALAPPDATA").ok().map(std::path::PathBuf::from);

    #[cfg(not(target_os = "windows"))]
    let base = std::env::var("HOME")
        .ok()
        .map(|h| std::path::PathBuf::from(h).join(".local").join("share"));

    if let Some(data_dir) = base {
        let d = data_dir.join("screenloop");
        let _ = std::fs::create_dir_all(&d);
        return d;
    }
    std::env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_survive_a_jsonl_round_trip() {
        let entry = TranscriptEntry::now(Sender::Assistant, "Нажата кнопка 'Fold' (fold)");
        let line = serde_json::to_string(&entry).unwrap();
        let back: TranscriptEntry = serde_json::from_str(&line).unwrap();
        assert_eq!(back.sender, Sender::Assistant);
        assert_eq!(back.text, entry.text);
    }

    #[test]
    fn channel_delivers_in_order() {
        let (tx, mut rx) = channel();
        tx.send(TranscriptEntry::now(Sender::User, "first")).unwrap();
        tx.send(TranscriptEntry::now(Sender::Error, "second")).unwrap();
        assert_eq!(rx.try_recv().unwrap().text, "first");
        assert_eq!(rx.try_recv().unwrap().text, "second");
    }
}
