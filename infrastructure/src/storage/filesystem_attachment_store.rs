use application::{ApplicationError, AttachmentStore};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

/// Stores each attachment as a single file directly under `root`.
#[derive(Debug, Clone)]
pub struct FilesystemAttachmentStore {
    root: PathBuf,
}

impl FilesystemAttachmentStore {
    /// Opens the store, creating the upload directory if it does not exist.
    pub async fn open(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        info!(root = %root.display(), "Attachment directory ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn write_new(path: &Path, data: &[u8]) -> std::io::Result<()> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await?;
        let written = async {
            file.write_all(data).await?;
            file.sync_all().await
        }
        .await;
        if let Err(e) = written {
            drop(file);
            // Partial file: best-effort cleanup
            if let Err(cleanup_err) = fs::remove_file(path).await {
                warn!(path = %path.display(), error = %cleanup_err, "Could not remove partially written attachment");
            }
            return Err(e);
        }
        Ok(())
    }
}

#[async_trait]
impl AttachmentStore for FilesystemAttachmentStore {
    #[instrument(skip(self, data), fields(size = data.len()))]
    async fn save(&self, file_name: &str, data: &[u8]) -> Result<PathBuf, ApplicationError> {
        let path = self.root.join(file_name);
        debug!(path = %path.display(), "Writing attachment");
        Self::write_new(&path, data).await.map_err(|source| {
            warn!(path = %path.display(), error = %source, "Attachment write failed");
            ApplicationError::StorageWriteFailure {
                file_name: file_name.to_string(),
                source,
            }
        })?;
        Ok(path)
    }

    #[instrument(skip(self))]
    async fn delete(&self, path: &Path) -> Result<(), ApplicationError> {
        match fs::remove_file(path).await {
            Ok(()) => {
                debug!("Attachment removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Attachment already absent");
                Ok(())
            }
            Err(source) => Err(ApplicationError::StorageDeleteFailure {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}
