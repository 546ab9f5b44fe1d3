use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use embedflow_domain::error::{Error, Result};
use embedflow_domain::ports::providers::{ObjectMeta, ObjectStoreProvider};
use serde::{Deserialize, Serialize};

/// Sidecar metadata persisted next to each object body.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SidecarMeta {
    content_type: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

/// Filesystem object store: `<root>/<bucket>/<key>` holds the body, with a
/// `.meta.json` sidecar for content type and user metadata. Used for local
/// development and the filesystem-backed test environment.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Create a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        self.root.join(bucket).join(key)
    }

    fn sidecar_path(path: &Path) -> PathBuf {
        let mut sidecar = path.as_os_str().to_owned();
        sidecar.push(".meta.json");
        PathBuf::from(sidecar)
    }

    async fn read_sidecar(path: &Path) -> SidecarMeta {
        match tokio::fs::read(Self::sidecar_path(path)).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
            Err(_) => SidecarMeta::default(),
        }
    }
}

#[async_trait]
impl ObjectStoreProvider for FsObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let path = self.object_path(bucket, key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::not_found(format!("object {bucket}/{key}")))
            }
            Err(e) => Err(Error::object_store_with_source(
                format!("failed to read {bucket}/{key}"),
                e,
            )),
        }
    }

    async fn head(&self, bucket: &str, key: &str) -> Result<Option<ObjectMeta>> {
        let path = self.object_path(bucket, key);
        let stat = match tokio::fs::metadata(&path).await {
            Ok(stat) => stat,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::object_store_with_source(
                    format!("failed to stat {bucket}/{key}"),
                    e,
                ));
            }
        };

        let sidecar = Self::read_sidecar(&path).await;
        let last_modified = stat
            .modified()
            .ok()
            .map(DateTime::<Utc>::from);
        Ok(Some(ObjectMeta {
            content_type: sidecar.content_type,
            last_modified,
            metadata: sidecar.metadata,
            size: stat.len(),
        }))
    }

    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        let path = self.object_path(bucket, key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::object_store_with_source(format!("failed to create {bucket}"), e)
            })?;
        }
        tokio::fs::write(&path, body).await.map_err(|e| {
            Error::object_store_with_source(format!("failed to write {bucket}/{key}"), e)
        })?;

        let sidecar = SidecarMeta {
            content_type: Some(content_type.to_owned()),
            metadata: HashMap::new(),
        };
        let sidecar_bytes = serde_json::to_vec(&sidecar)?;
        tokio::fs::write(Self::sidecar_path(&path), sidecar_bytes)
            .await
            .map_err(|e| {
                Error::object_store_with_source(format!("failed to write {bucket}/{key} meta"), e)
            })?;
        Ok(())
    }

    async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let bucket_root = self.root.join(bucket);
        let mut keys = Vec::new();
        let mut pending = vec![bucket_root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(Error::object_store_with_source(
                        format!("failed to list {bucket}"),
                        e,
                    ));
                }
            };
            while let Some(entry) = entries.next_entry().await.map_err(|e| {
                Error::object_store_with_source(format!("failed to list {bucket}"), e)
            })? {
                let path = entry.path();
                if path.is_dir() {
                    pending.push(path);
                    continue;
                }
                if path.extension().is_some_and(|ext| ext == "json")
                    && path.to_string_lossy().ends_with(".meta.json")
                {
                    continue;
                }
                if let Ok(relative) = path.strip_prefix(&bucket_root) {
                    let key = relative.to_string_lossy().replace('\\', "/");
                    if key.starts_with(prefix) {
                        keys.push(key);
                    }
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}
