//! JSON-file message log behind a single writer.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use super::error::{StoreError, StoreResult};
use super::record::{MessageRecord, MessageStatus, timestamp_serde};

/// Boxed future type for store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outcome of an append.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The record was added to the log.
    Appended,
    /// A record with the same id already exists; nothing was written.
    Duplicate,
}

/// Append-only message log.
pub trait MessageStore: Send + Sync {
    /// Load every record in arrival order.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn load_all(&self) -> StoreFuture<'_, StoreResult<Vec<MessageRecord>>>;

    /// Append a record unless its id is already present.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn append(&self, record: MessageRecord) -> StoreFuture<'_, StoreResult<AppendOutcome>>;
}

/// On-disk record shape; timestamps are checked after decoding so errors can name the record.
#[derive(Deserialize)]
struct StoredRecord {
    id: String,
    phone: String,
    message: String,
    status: MessageStatus,
    created_at: String,
    #[serde(default)]
    api_response: Option<Value>,
}

impl StoredRecord {
    fn into_record(self) -> StoreResult<MessageRecord> {
        let Some(created_at) = timestamp_serde::parse(&self.created_at) else {
            return Err(StoreError::InvalidTimestamp {
                id: self.id,
                value: self.created_at,
            });
        };
        Ok(MessageRecord {
            id: self.id,
            phone: self.phone,
            message: self.message,
            status: self.status,
            created_at,
            api_response: self.api_response.and_then(api_response_text),
        })
    }
}

/// Older logs hold the decoded provider JSON instead of its text.
fn api_response_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

/// Message log persisted as a pretty-printed JSON array.
///
/// The log is read once when the store opens and kept in memory. Appends hold
/// the lock across the file rewrite, so writers in this process are
/// serialized. Other processes writing the same file are not coordinated.
pub struct JsonFileStore {
    path: PathBuf,
    log: Mutex<Vec<MessageRecord>>,
}

impl JsonFileStore {
    /// Open the log at `path`. A missing file is an empty log.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or decoded.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let log = read_log(&path).await?;
        debug!("Loaded {} messages from {}", log.len(), path.display());
        Ok(Self {
            path,
            log: Mutex::new(log),
        })
    }
}

impl MessageStore for JsonFileStore {
    fn load_all(&self) -> StoreFuture<'_, StoreResult<Vec<MessageRecord>>> {
        Box::pin(async move { Ok(self.log.lock().await.clone()) })
    }

    fn append(&self, record: MessageRecord) -> StoreFuture<'_, StoreResult<AppendOutcome>> {
        Box::pin(async move {
            let mut log = self.log.lock().await;
            if log.iter().any(|existing| existing.id == record.id) {
                debug!("Skipping duplicate message id {}", record.id);
                return Ok(AppendOutcome::Duplicate);
            }

            log.push(record);
            if let Err(err) = write_log(&self.path, &log).await {
                log.pop();
                return Err(err);
            }
            Ok(AppendOutcome::Appended)
        })
    }
}

async fn read_log(path: &Path) -> StoreResult<Vec<MessageRecord>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let raw: Vec<StoredRecord> = serde_json::from_slice(&bytes)?;
    raw.into_iter().map(StoredRecord::into_record).collect()
}

/// Replace the log file through a sibling temp file and rename.
async fn write_log(path: &Path, log: &[MessageRecord]) -> StoreResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_vec_pretty(log)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    use super::*;

    fn record(id: &str, secs: i64) -> MessageRecord {
        let at = Utc.timestamp_opt(1_700_000_000 + secs, 0).single().unwrap();
        MessageRecord::received(id, "3001234567", format!("body {id}"), at)
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_log() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path().join("messages.json")).await.unwrap();
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_persists_pretty_json_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("messages.json");
        let store = JsonFileStore::open(&path).await.unwrap();

        store.append(record("m1", 0)).await.unwrap();
        store.append(record("m2", 1)).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\n  {"));
        let value: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value[0]["id"], "m1");
        assert_eq!(value[1]["id"], "m2");
        assert_eq!(value[0]["phone"], "573001234567");

        let reopened = JsonFileStore::open(&path).await.unwrap();
        let ids: Vec<String> = reopened.load_all().await.unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, ["m1", "m2"]);
    }

    #[tokio::test]
    async fn test_duplicate_id_is_not_appended() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path().join("messages.json")).await.unwrap();

        assert_eq!(store.append(record("dup", 0)).await.unwrap(), AppendOutcome::Appended);
        assert_eq!(store.append(record("dup", 5)).await.unwrap(), AppendOutcome::Duplicate);
        assert_eq!(store.load_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_not_lost() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("messages.json");
        let store = Arc::new(JsonFileStore::open(&path).await.unwrap());

        let mut handles = Vec::new();
        for i in 0..20 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.append(record(&format!("m{i}"), i)).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let reopened = JsonFileStore::open(&path).await.unwrap();
        assert_eq!(reopened.load_all().await.unwrap().len(), 20);
    }

    #[tokio::test]
    async fn test_legacy_timestamps_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("messages.json");
        std::fs::write(
            &path,
            r#"[{"id":"old","phone":"573001234567","message":"hola","status":"sent","created_at":"2024-01-15 10:30:00","api_response":"mock"}]"#,
        )
        .unwrap();

        let store = JsonFileStore::open(&path).await.unwrap();
        let log = store.load_all().await.unwrap();
        assert_eq!(log[0].created_at, Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap());
    }

    #[tokio::test]
    async fn test_legacy_object_api_response_loads_as_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("messages.json");
        std::fs::write(
            &path,
            r#"[
                {"id":"a","phone":"573001234567","message":"hola","status":"sent","created_at":"2024-01-15 10:30:00","api_response":{"success":true}},
                {"id":"b","phone":"573001234567","message":"otra","status":"sent","created_at":"2024-01-15 10:31:00","api_response":null},
                {"id":"c","phone":"573001234567","message":"hey","status":"received","created_at":"2024-01-15 10:32:00"}
            ]"#,
        )
        .unwrap();

        let store = JsonFileStore::open(&path).await.unwrap();
        let log = store.load_all().await.unwrap();
        assert_eq!(log.len(), 3);
        assert_eq!(log[0].api_response.as_deref(), Some(r#"{"success":true}"#));
        assert!(log[1].api_response.is_none());
        assert!(log[2].api_response.is_none());

        store.append(record("d", 0)).await.unwrap();
        let reopened = JsonFileStore::open(&path).await.unwrap();
        let persisted = reopened.load_all().await.unwrap();
        assert_eq!(persisted[0].api_response.as_deref(), Some(r#"{"success":true}"#));
    }

    #[tokio::test]
    async fn test_invalid_timestamp_names_the_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("messages.json");
        std::fs::write(
            &path,
            r#"[{"id":"bad","phone":"1","message":"m","status":"received","created_at":"not a date"}]"#,
        )
        .unwrap();

        match JsonFileStore::open(&path).await {
            Err(StoreError::InvalidTimestamp { id, value }) => {
                assert_eq!(id, "bad");
                assert_eq!(value, "not a date");
            }
            other => panic!("expected invalid timestamp, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_blank_file_is_empty_log() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("messages.json");
        std::fs::write(&path, "  \n").unwrap();
        let store = JsonFileStore::open(&path).await.unwrap();
        assert!(store.load_all().await.unwrap().is_empty());
    }
}
