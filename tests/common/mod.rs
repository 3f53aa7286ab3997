use async_trait::async_trait;
use caja::error::{CajaError, Result};
use caja::history::Summarizer;
use caja::providers::{CompletionResponse, Message, Provider};
use caja::storage::{SqliteStorage, StoredMessage};
use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tempfile::TempDir;

#[allow(dead_code)]
pub fn create_temp_storage() -> (SqliteStorage, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("sessions.db");
    let storage =
        SqliteStorage::new_with_path(db_path).expect("failed to create sqlite storage with path");
    (storage, tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Provider answering with a fixed script, then `"Done"`
#[allow(dead_code)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Message>>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedProvider {
    pub fn new(replies: Vec<&str>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(Message::assistant).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn complete(
        &self,
        _messages: &[Message],
        _tools: &[serde_json::Value],
    ) -> Result<CompletionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Message::assistant("Done"));
        Ok(CompletionResponse::new(reply))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Summarizer that labels its output with a call counter
#[allow(dead_code)]
#[derive(Default)]
pub struct CountingSummarizer {
    calls: AtomicUsize,
    pub fail: bool,
}

#[allow(dead_code)]
impl CountingSummarizer {
    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Summarizer for CountingSummarizer {
    async fn summarize(&self, messages: &[StoredMessage]) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail {
            return Err(CajaError::Provider("summarizer unavailable".to_string()).into());
        }
        Ok(format!("summary #{} of {} messages", n, messages.len()))
    }
}
