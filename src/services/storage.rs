use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};

/// Binary storage collaborator. Paths are storage-relative keys such as
/// `shelf/2025/08/<name>.png`.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Writes `data` at `path`, replacing whatever was there, and returns the
    /// path the bytes were stored under.
    async fn put_file(&self, path: &str, data: Bytes) -> Result<String>;
    /// Removes the object at `path`. Removing a missing object succeeds.
    async fn delete_file(&self, path: &str) -> Result<()>;
    async fn file_exists(&self, path: &str) -> Result<bool>;
}

pub struct S3StorageService {
    client: Client,
    bucket: String,
}

impl S3StorageService {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl StorageService for S3StorageService {
    async fn put_file(&self, path: &str, data: Bytes) -> Result<String> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .body(ByteStream::from(data))
            .send()
            .await?;
        Ok(path.to_string())
    }

    async fn delete_file(&self, path: &str) -> Result<()> {
        let res = self
            .client
            .delete_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await;

        if let Err(e) = res {
            tracing::error!(
                "S3 delete_object failed: bucket={}, key={}, error={:?}",
                self.bucket,
                path,
                e
            );
            return Err(e.into());
        }
        Ok(())
    }

    async fn file_exists(&self, path: &str) -> Result<bool> {
        let res = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await;

        match res {
            Ok(_) => Ok(true),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    Ok(false)
                } else {
                    Err(anyhow!(service_error))
                }
            }
        }
    }
}

/// Stores objects under a directory on the local disk.
pub struct LocalStorageService {
    root: PathBuf,
}

impl LocalStorageService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves a storage path under the root, refusing anything that would
    /// escape it.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe || path.is_empty() {
            return Err(anyhow!("Invalid storage path: {}", path));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl StorageService for LocalStorageService {
    async fn put_file(&self, path: &str, data: Bytes) -> Result<String> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        tokio::fs::write(&target, &data)
            .await
            .with_context(|| format!("Failed to write {}", target.display()))?;
        Ok(path.to_string())
    }

    async fn delete_file(&self, path: &str) -> Result<()> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(anyhow!(e).context(format!("Failed to delete {}", target.display()))),
        }
    }

    async fn file_exists(&self, path: &str) -> Result<bool> {
        let target = self.resolve(path)?;
        Ok(tokio::fs::try_exists(&target).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_put_exists_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorageService::new(dir.path());

        let stored = storage
            .put_file("shelf/2025/08/a.txt", Bytes::from_static(b"hello"))
            .await
            .unwrap();
        assert_eq!(stored, "shelf/2025/08/a.txt");
        assert!(storage.file_exists(&stored).await.unwrap());
        assert_eq!(
            tokio::fs::read(dir.path().join(&stored)).await.unwrap(),
            b"hello"
        );

        storage.delete_file(&stored).await.unwrap();
        assert!(!storage.file_exists(&stored).await.unwrap());

        // Deleting again is not an error
        storage.delete_file(&stored).await.unwrap();
    }

    #[tokio::test]
    async fn test_local_put_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorageService::new(dir.path());

        storage
            .put_file("shelf/x.bin", Bytes::from_static(b"old"))
            .await
            .unwrap();
        storage
            .put_file("shelf/x.bin", Bytes::from_static(b"new"))
            .await
            .unwrap();
        assert_eq!(
            tokio::fs::read(dir.path().join("shelf/x.bin")).await.unwrap(),
            b"new"
        );
    }

    #[tokio::test]
    async fn test_local_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorageService::new(dir.path());

        assert!(
            storage
                .put_file("../escape.txt", Bytes::from_static(b"x"))
                .await
                .is_err()
        );
        assert!(storage.delete_file("/etc/passwd").await.is_err());
    }
}
