//! Per-user prediction history.
//!
//! Persistence is best-effort from the caller's point of view: the prediction
//! handler logs a failed append and still answers with the prediction.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use log::debug;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

/// Records kept per user; older ones are dropped on append.
pub const HISTORY_LIMIT: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed history file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub disease: String,
    pub symptoms: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl PredictionRecord {
    pub fn new(disease: impl Into<String>, symptoms: Vec<String>) -> Self {
        Self {
            disease: disease.into(),
            symptoms,
            timestamp: Utc::now(),
        }
    }
}

/// Who a record belongs to: an e-mail address, or an opaque user id when no
/// address is known.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UserRef {
    Email(String),
    Uid(String),
}

impl UserRef {
    /// Prefers a non-blank e-mail, then a non-blank uid.
    pub fn resolve(email: Option<&str>, uid: Option<&str>) -> Option<Self> {
        let non_blank = |s: Option<&str>| {
            s.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        non_blank(email)
            .map(UserRef::Email)
            .or_else(|| non_blank(uid).map(UserRef::Uid))
    }

    fn key(&self) -> String {
        match self {
            Self::Email(email) => format!("email:{}", email),
            Self::Uid(uid) => format!("uid:{}", uid),
        }
    }
}

pub trait HistoryStore: Send + Sync {
    /// Appends a record and keeps only the latest [`HISTORY_LIMIT`].
    fn append<'a>(
        &'a self,
        user: &'a UserRef,
        record: PredictionRecord,
    ) -> BoxFuture<'a, Result<(), HistoryError>>;

    /// Up to [`HISTORY_LIMIT`] records, oldest first.
    fn recent<'a>(
        &'a self,
        user: &'a UserRef,
    ) -> BoxFuture<'a, Result<Vec<PredictionRecord>, HistoryError>>;
}

type Histories = HashMap<String, Vec<PredictionRecord>>;

fn push_capped(histories: &mut Histories, user: &UserRef, record: PredictionRecord) {
    let records = histories.entry(user.key()).or_default();
    records.push(record);
    if records.len() > HISTORY_LIMIT {
        let excess = records.len() - HISTORY_LIMIT;
        records.drain(..excess);
    }
}

#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    histories: RwLock<Histories>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for InMemoryHistoryStore {
    fn append<'a>(
        &'a self,
        user: &'a UserRef,
        record: PredictionRecord,
    ) -> BoxFuture<'a, Result<(), HistoryError>> {
        Box::pin(async move {
            push_capped(&mut *self.histories.write().await, user, record);
            Ok(())
        })
    }

    fn recent<'a>(
        &'a self,
        user: &'a UserRef,
    ) -> BoxFuture<'a, Result<Vec<PredictionRecord>, HistoryError>> {
        Box::pin(async move {
            let histories = self.histories.read().await;
            Ok(histories.get(&user.key()).cloned().unwrap_or_default())
        })
    }
}

/// History kept in one JSON file, rewritten on every append.
#[derive(Debug)]
pub struct JsonFileHistoryStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileHistoryStore {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, HistoryError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Histories, HistoryError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Histories::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, histories: &Histories) -> Result<(), HistoryError> {
        let bytes = serde_json::to_vec_pretty(histories)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

impl HistoryStore for JsonFileHistoryStore {
    fn append<'a>(
        &'a self,
        user: &'a UserRef,
        record: PredictionRecord,
    ) -> BoxFuture<'a, Result<(), HistoryError>> {
        Box::pin(async move {
            let _guard = self.lock.lock().await;
            let mut histories = self.read_all().await?;
            push_capped(&mut histories, user, record);
            self.write_all(&histories).await?;
            debug!("History for {:?} written to {:?}", user, self.path);
            Ok(())
        })
    }

    fn recent<'a>(
        &'a self,
        user: &'a UserRef,
    ) -> BoxFuture<'a, Result<Vec<PredictionRecord>, HistoryError>> {
        Box::pin(async move {
            let _guard = self.lock.lock().await;
            let mut histories = self.read_all().await?;
            Ok(histories.remove(&user.key()).unwrap_or_default())
        })
    }
}
