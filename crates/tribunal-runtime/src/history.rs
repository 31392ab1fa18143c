//! Append-only debate transcripts, one sequence per conversation.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use thiserror::Error;

use tribunal_core::DebateRecord;

/// Errors from a debate store.
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Invalid conversation id '{0}'")]
    InvalidConversationId(String),

    #[error("History I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("History file {path} is not a valid record list: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("History task failed: {0}")]
    Task(String),
}

/// Where completed debates go.
#[async_trait]
pub trait DebateStore: Send + Sync {
    /// Append one record to the conversation's sequence.
    async fn append(&self, conversation_id: &str, record: DebateRecord) -> Result<(), HistoryError>;

    /// All records for a conversation, oldest first. Unknown ids are empty.
    async fn load(&self, conversation_id: &str) -> Result<Vec<DebateRecord>, HistoryError>;
}

/// Conversation ids become file names, so anything that could escape the
/// directory is refused.
fn check_conversation_id(id: &str) -> Result<(), HistoryError> {
    let invalid = id.trim().is_empty()
        || id.contains("..")
        || id.contains('/')
        || id.contains('\\')
        || id.contains('\0');

    if invalid {
        return Err(HistoryError::InvalidConversationId(id.to_string()));
    }
    Ok(())
}

/// Stores each conversation as a pretty-printed JSON array in
/// `{dir}/{conversation_id}.json`.
///
/// Appends are read-modify-write; a store-wide lock serializes them and the
/// file work happens on the blocking pool.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    inner: Arc<FileStoreInner>,
}

#[derive(Debug)]
struct FileStoreInner {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(FileStoreInner {
                dir: dir.into(),
                lock: Mutex::new(()),
            }),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.inner.dir
    }

    fn path_for(&self, conversation_id: &str) -> Result<PathBuf, HistoryError> {
        check_conversation_id(conversation_id)?;
        Ok(self.inner.dir.join(format!("{conversation_id}.json")))
    }

    async fn blocking<T, F>(&self, work: F) -> Result<T, HistoryError>
    where
        T: Send + 'static,
        F: FnOnce(&FileStoreInner) -> Result<T, HistoryError> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || work(&inner))
            .await
            .map_err(|e| HistoryError::Task(e.to_string()))?
    }
}

impl FileStoreInner {
    fn read(&self, path: &Path) -> Result<Vec<DebateRecord>, HistoryError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(HistoryError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&text).map_err(|source| HistoryError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write(&self, path: &Path, records: &[DebateRecord]) -> Result<(), HistoryError> {
        let io_err = |source| HistoryError::Io {
            path: path.to_path_buf(),
            source,
        };

        std::fs::create_dir_all(&self.dir).map_err(io_err)?;
        let text = serde_json::to_string_pretty(records).map_err(|source| HistoryError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        // Readers see either the old file or the new one, never a partial write.
        let mut staged = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        staged.write_all(text.as_bytes()).map_err(io_err)?;
        staged.as_file().sync_all().map_err(io_err)?;
        staged.persist(path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

#[async_trait]
impl DebateStore for JsonFileStore {
    async fn append(&self, conversation_id: &str, record: DebateRecord) -> Result<(), HistoryError> {
        let path = self.path_for(conversation_id)?;

        let count = self
            .blocking(move |inner| {
                let _guard = inner.lock.lock();
                let mut records = inner.read(&path)?;
                records.push(record);
                inner.write(&path, &records)?;
                Ok(records.len())
            })
            .await?;

        tracing::debug!(conversation = conversation_id, records = count, "History appended");
        Ok(())
    }

    async fn load(&self, conversation_id: &str) -> Result<Vec<DebateRecord>, HistoryError> {
        let path = self.path_for(conversation_id)?;
        self.blocking(move |inner| {
            let _guard = inner.lock.lock();
            inner.read(&path)
        })
        .await
    }
}

/// Keeps records in memory. Used by tests and `--no-history` runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    conversations: Mutex<HashMap<String, Vec<DebateRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conversation_count(&self) -> usize {
        self.conversations.lock().len()
    }
}

#[async_trait]
impl DebateStore for MemoryStore {
    async fn append(&self, conversation_id: &str, record: DebateRecord) -> Result<(), HistoryError> {
        check_conversation_id(conversation_id)?;
        self.conversations
            .lock()
            .entry(conversation_id.to_string())
            .or_default()
            .push(record);
        Ok(())
    }

    async fn load(&self, conversation_id: &str) -> Result<Vec<DebateRecord>, HistoryError> {
        check_conversation_id(conversation_id)?;
        Ok(self
            .conversations
            .lock()
            .get(conversation_id)
            .cloned()
            .unwrap_or_default())
    }
}
