//! Task persistence.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::definition::{StoreDocument, TaskDefinition, TaskStatus};
use crate::error::StoreError;

/// Durable, index-addressed storage of task definitions.
///
/// Every mutation rewrites the whole document.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Load all tasks in order.
    async fn load(&self) -> Result<Vec<TaskDefinition>, StoreError>;

    /// Load the task at `index`.
    async fn get(&self, index: usize) -> Result<TaskDefinition, StoreError>;

    /// Append a task with status inactive and return its index.
    async fn add(&self, task: TaskDefinition) -> Result<usize, StoreError>;

    /// Replace the fields of task `index`. The stored status is kept.
    async fn replace(&self, index: usize, task: TaskDefinition) -> Result<(), StoreError>;

    /// Remove task `index`. Later tasks shift down by one.
    async fn remove(&self, index: usize) -> Result<TaskDefinition, StoreError>;

    /// Set the status of task `index`.
    async fn set_status(&self, index: usize, status: TaskStatus) -> Result<(), StoreError>;

    /// Whether the application starts with the session.
    async fn auto_start(&self) -> Result<bool, StoreError>;

    async fn set_auto_start(&self, enabled: bool) -> Result<(), StoreError>;

    /// Ordered field names shown in task listings.
    async fn display_columns(&self) -> Result<Vec<String>, StoreError>;
}

/// In-memory task store for testing.
pub struct MemoryTaskStore {
    document: RwLock<StoreDocument>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::with_document(StoreDocument::default())
    }

    pub fn with_document(document: StoreDocument) -> Self {
        Self {
            document: RwLock::new(document),
        }
    }
}

impl Default for MemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn load(&self) -> Result<Vec<TaskDefinition>, StoreError> {
        Ok(self.document.read().await.tasks.clone())
    }

    async fn get(&self, index: usize) -> Result<TaskDefinition, StoreError> {
        self.document.read().await.get(index).cloned()
    }

    async fn add(&self, task: TaskDefinition) -> Result<usize, StoreError> {
        Ok(self.document.write().await.add(task))
    }

    async fn replace(&self, index: usize, task: TaskDefinition) -> Result<(), StoreError> {
        self.document.write().await.replace(index, task)
    }

    async fn remove(&self, index: usize) -> Result<TaskDefinition, StoreError> {
        self.document.write().await.remove(index)
    }

    async fn set_status(&self, index: usize, status: TaskStatus) -> Result<(), StoreError> {
        self.document.write().await.set_status(index, status)
    }

    async fn auto_start(&self) -> Result<bool, StoreError> {
        Ok(self.document.read().await.auto_start)
    }

    async fn set_auto_start(&self, enabled: bool) -> Result<(), StoreError> {
        self.document.write().await.auto_start = enabled;
        Ok(())
    }

    async fn display_columns(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.document.read().await.show_task_col.clone())
    }
}

/// Task store backed by a single JSON file.
///
/// The file is re-read on every call, so edits made by another process
/// between calls are picked up. Concurrent writers from other processes are
/// not coordinated.
pub struct FileTaskStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileTaskStore {
    /// Open the store at `path`, creating a default document if the file
    /// does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        if !fs::try_exists(&path).await? {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).await?;
                }
            }
            write_document(&path, &StoreDocument::default()).await?;
            info!("Created task store at {}", path.display());
        }

        debug!("FileTaskStore opened at {:?}", path);

        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the whole document.
    pub async fn read_document(&self) -> Result<StoreDocument, StoreError> {
        let content = fs::read_to_string(&self.path).await?;
        serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Load, change, and write back the document.
    async fn update<T>(
        &self,
        change: impl FnOnce(&mut StoreDocument) -> Result<T, StoreError> + Send,
    ) -> Result<T, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.read_document().await?;
        let value = change(&mut document)?;
        write_document(&self.path, &document).await?;
        Ok(value)
    }
}

/// Write through a sibling temp file and rename, so a crash mid-write
/// leaves the previous document in place.
async fn write_document(path: &Path, document: &StoreDocument) -> Result<(), StoreError> {
    let content = serde_json::to_string_pretty(document).map_err(StoreError::Serialize)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, content).await?;
    fs::rename(&tmp, path).await?;

    debug!("Saved {} tasks to {:?}", document.tasks.len(), path);
    Ok(())
}

#[async_trait]
impl TaskStore for FileTaskStore {
    async fn load(&self) -> Result<Vec<TaskDefinition>, StoreError> {
        Ok(self.read_document().await?.tasks)
    }

    async fn get(&self, index: usize) -> Result<TaskDefinition, StoreError> {
        self.read_document().await?.get(index).cloned()
    }

    async fn add(&self, task: TaskDefinition) -> Result<usize, StoreError> {
        self.update(|doc| Ok(doc.add(task))).await
    }

    async fn replace(&self, index: usize, task: TaskDefinition) -> Result<(), StoreError> {
        self.update(|doc| doc.replace(index, task)).await
    }

    async fn remove(&self, index: usize) -> Result<TaskDefinition, StoreError> {
        self.update(|doc| doc.remove(index)).await
    }

    async fn set_status(&self, index: usize, status: TaskStatus) -> Result<(), StoreError> {
        self.update(|doc| doc.set_status(index, status)).await
    }

    async fn auto_start(&self) -> Result<bool, StoreError> {
        Ok(self.read_document().await?.auto_start)
    }

    async fn set_auto_start(&self, enabled: bool) -> Result<(), StoreError> {
        self.update(|doc| {
            doc.auto_start = enabled;
            Ok(())
        })
        .await
    }

    async fn display_columns(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.read_document().await?.show_task_col)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
