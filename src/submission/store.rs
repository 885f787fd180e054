//! Submission storage
//!
//! The production store keeps every submission in one pretty-printed JSON array.
//! Each append is a read-modify-write of the whole file done under an async
//! mutex, and the rewrite lands through a temporary file plus rename.

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tokio::fs;
use tokio::sync::Mutex;

use super::Submission;
use crate::error::StorageError;

/// Boxed future returned by [`SubmissionStore`] methods
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

/// Durable, append-only collection of submissions
pub trait SubmissionStore: Send + Sync {
    /// Append one submission to the end of the collection
    fn append<'a>(&'a self, submission: &'a Submission) -> StoreFuture<'a, ()>;

    /// Every stored submission, oldest first
    fn load_all(&self) -> StoreFuture<'_, Vec<Submission>>;
}

/// Store backed by a single JSON file
pub struct FileSubmissionStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSubmissionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_collection(&self) -> Result<Vec<Submission>, StorageError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&contents).map_err(|source| StorageError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    async fn append_locked(&self, submission: &Submission) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|source| StorageError::Io {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
        }

        let mut submissions = self.read_collection().await?;
        submissions.push(submission.clone());

        let content =
            serde_json::to_string_pretty(&submissions).map_err(StorageError::Serialize)?;

        let tmp_path = self.temp_path();
        fs::write(&tmp_path, content)
            .await
            .map_err(|source| StorageError::Io {
                path: tmp_path.clone(),
                source,
            })?;
        fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|source| StorageError::Io {
                path: self.path.clone(),
                source,
            })
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SubmissionStore for FileSubmissionStore {
    fn append<'a>(&'a self, submission: &'a Submission) -> StoreFuture<'a, ()> {
        Box::pin(self.append_locked(submission))
    }

    fn load_all(&self) -> StoreFuture<'_, Vec<Submission>> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().await;
            self.read_collection().await
        })
    }
}

/// Store kept in process memory
#[derive(Default)]
pub struct MemorySubmissionStore {
    submissions: Mutex<Vec<Submission>>,
}

impl MemorySubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SubmissionStore for MemorySubmissionStore {
    fn append<'a>(&'a self, submission: &'a Submission) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.submissions.lock().await.push(submission.clone());
            Ok(())
        })
    }

    fn load_all(&self) -> StoreFuture<'_, Vec<Submission>> {
        Box::pin(async move { Ok(self.submissions.lock().await.clone()) })
    }
}
