//! Test utilities for Caja
//!
//! Scripted providers and temporary storage shared by the unit tests.

use crate::error::{CajaError, Result};
use crate::providers::{CompletionResponse, Message, Provider, ToolCall};
use crate::storage::{
    MessageRole, Session, SessionDetail, SessionStore, SessionSummary, SqliteStorage,
    StoredMessage,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::thread::ThreadId;
use tempfile::TempDir;

/// Provider that replays a fixed list of replies and records every request
///
/// When the script runs out it answers `"Done"`.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<std::result::Result<Message, String>>>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Message>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(Ok).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Provider whose next call fails with `CajaError::Provider(message)`
    pub fn failing(message: &str) -> Self {
        Self {
            replies: Mutex::new(VecDeque::from(vec![Err(message.to_string())])),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Messages sent on each call, in call order
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn complete(
        &self,
        messages: &[Message],
        _tools: &[serde_json::Value],
    ) -> Result<CompletionResponse> {
        self.requests.lock().unwrap().push(messages.to_vec());
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(message)) => Ok(CompletionResponse::new(message)),
            Some(Err(e)) => Err(CajaError::Provider(e).into()),
            None => Ok(CompletionResponse::new(Message::assistant("Done"))),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Assistant message requesting a single tool call
pub fn tool_call_message(id: &str, name: &str, arguments: serde_json::Value) -> Message {
    Message::assistant_with_tools(vec![ToolCall::function(id, name, arguments.to_string())])
}

/// Session storage in a fresh temporary directory
pub fn temp_storage() -> (SqliteStorage, TempDir) {
    let dir = TempDir::new().expect("Failed to create temporary directory");
    let storage = SqliteStorage::new_with_path(dir.path().join("sessions.db"))
        .expect("Failed to create storage");
    (storage, dir)
}

/// Store wrapper that records which threads its operations ran on
///
/// Used to check that async callers keep store I/O off the calling thread.
pub struct ThreadRecordingStore<S> {
    inner: S,
    threads: Mutex<Vec<ThreadId>>,
}

impl<S: SessionStore> ThreadRecordingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            threads: Mutex::new(Vec::new()),
        }
    }

    /// Whether any store operation ran on `thread`
    pub fn ran_on(&self, thread: ThreadId) -> bool {
        self.threads.lock().unwrap().contains(&thread)
    }

    pub fn call_count(&self) -> usize {
        self.threads.lock().unwrap().len()
    }

    fn record(&self) {
        self.threads
            .lock()
            .unwrap()
            .push(std::thread::current().id());
    }
}

impl<S: SessionStore> SessionStore for ThreadRecordingStore<S> {
    fn create_session(&self, name: Option<&str>) -> Result<Session> {
        self.record();
        self.inner.create_session(name)
    }

    fn get_session(&self, id: &str) -> Result<Option<Session>> {
        self.record();
        self.inner.get_session(id)
    }

    fn get_session_detail(&self, id: &str) -> Result<Option<SessionDetail>> {
        self.record();
        self.inner.get_session_detail(id)
    }

    fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        self.record();
        self.inner.list_sessions()
    }

    fn messages(&self, session_id: &str) -> Result<Vec<StoredMessage>> {
        self.record();
        self.inner.messages(session_id)
    }

    fn append_message(
        &self,
        session_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<StoredMessage> {
        self.record();
        self.inner.append_message(session_id, role, content)
    }

    fn delete_session(&self, id: &str) -> Result<bool> {
        self.record();
        self.inner.delete_session(id)
    }
}
