//! Raw byte storage for moment files

use std::collections::BTreeMap;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tokio::sync::RwLock;

use crate::error::{Error, Result};

/// Key/value byte storage addressed by relative file names.
pub trait FileManager: Send + Sync + 'static {
    /// Write `content` under `file_name`, replacing any previous bytes.
    fn save(&self, file_name: &str, content: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Read the bytes stored under `file_name`, `None` if there are none.
    fn read(&self, file_name: &str) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Remove `file_name`. Missing files are not an error.
    fn delete(&self, file_name: &str) -> impl Future<Output = Result<()>> + Send;

    /// Whether bytes are stored under `file_name`.
    fn exists(&self, file_name: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Names of the entries at the top of the store, sorted.
    fn list(&self) -> impl Future<Output = Result<Vec<String>>> + Send;
}

/// Files stored below a root directory on disk
#[derive(Debug, Clone)]
pub struct LocalFileManager {
    root: PathBuf,
}

impl LocalFileManager {
    /// Use `root` as the storage directory, creating it if needed
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Storage directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `file_name` below the root, rejecting keys that would leave it
    fn resolve(&self, file_name: &str) -> Result<PathBuf> {
        let relative = Path::new(file_name);
        let mut has_normal = false;
        for component in relative.components() {
            match component {
                Component::Normal(_) => has_normal = true,
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(Error::InvalidInput(format!(
                        "file name must stay inside the storage directory: {file_name}"
                    )));
                }
            }
        }
        if !has_normal {
            return Err(Error::InvalidInput("file name cannot be empty".to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl FileManager for LocalFileManager {
    async fn save(&self, file_name: &str, content: &[u8]) -> Result<()> {
        let path = self.resolve(file_name)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content).await?;
        tracing::debug!("Saved {} bytes to {}", content.len(), path.display());
        Ok(())
    }

    async fn read(&self, file_name: &str) -> Result<Option<Vec<u8>>> {
        let path = self.resolve(file_name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    async fn delete(&self, file_name: &str) -> Result<()> {
        let path = self.resolve(file_name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!("Deleted {}", path.display());
                Ok(())
            }
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }

    async fn exists(&self, file_name: &str) -> Result<bool> {
        let path = self.resolve(file_name)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut dir = match tokio::fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(names),
            Err(error) => return Err(error.into()),
        };
        while let Some(entry) = dir.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}

/// Files kept in process memory
#[derive(Debug, Default)]
pub struct InMemoryFileManager {
    files: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryFileManager {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FileManager for InMemoryFileManager {
    async fn save(&self, file_name: &str, content: &[u8]) -> Result<()> {
        self.files
            .write()
            .await
            .insert(file_name.to_string(), content.to_vec());
        Ok(())
    }

    async fn read(&self, file_name: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.files.read().await.get(file_name).cloned())
    }

    async fn delete(&self, file_name: &str) -> Result<()> {
        self.files.write().await.remove(file_name);
        Ok(())
    }

    async fn exists(&self, file_name: &str) -> Result<bool> {
        Ok(self.files.read().await.contains_key(file_name))
    }

    async fn list(&self) -> Result<Vec<String>> {
        Ok(self.files.read().await.keys().cloned().collect())
    }
}
