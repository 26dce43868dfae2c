//! JSON file persistent tier adapter.
//!
//! Each namespace lives in `<root>/<namespace>.json`. Every mutation rewrites
//! the whole document through a temporary file and a rename.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use super::PersistentTier;
use crate::cache::CacheEntry;
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamespaceDocument<T> {
    next_id: u64,
    records: Vec<StoredRecord<T>>,
}

impl<T> Default for NamespaceDocument<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            records: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord<T> {
    id: u64,
    entry: CacheEntry<T>,
}

// == JSON File Store ==
/// Durable tier backed by one JSON file per namespace.
#[derive(Debug)]
pub struct JsonFileStore {
    root: PathBuf,
    /// Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        debug!("JSON file store opened at {}", root.display());
        Ok(Self {
            root,
            lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn namespace_path(&self, namespace: &str) -> StoreResult<PathBuf> {
        let valid = !namespace.is_empty()
            && namespace
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidNamespace(namespace.to_string()));
        }
        Ok(self.root.join(format!("{namespace}.json")))
    }

    async fn load<T: DeserializeOwned>(&self, path: &Path) -> StoreResult<NamespaceDocument<T>> {
        match fs::read(path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(NamespaceDocument::default()),
            Err(err) => Err(err.into()),
        }
    }

    async fn save<T: Serialize>(&self, path: &Path, document: &NamespaceDocument<T>) -> StoreResult<()> {
        let bytes = serde_json::to_vec(document)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes).await?;
        fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[async_trait]
impl<T> PersistentTier<T> for JsonFileStore
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn get(&self, namespace: &str, key: &str) -> StoreResult<Option<CacheEntry<T>>> {
        let path = self.namespace_path(namespace)?;
        let _guard = self.lock.lock().await;
        let document: NamespaceDocument<T> = self.load(&path).await?;
        Ok(document
            .records
            .into_iter()
            .find(|record| record.entry.key == key)
            .map(|record| record.entry))
    }

    async fn add(&self, namespace: &str, entry: &CacheEntry<T>) -> StoreResult<u64> {
        let path = self.namespace_path(namespace)?;
        let _guard = self.lock.lock().await;
        let mut document: NamespaceDocument<serde_json::Value> = self.load(&path).await?;

        if document.records.iter().any(|record| record.entry.key == entry.key) {
            return Err(StoreError::DuplicateKey(entry.key.clone()));
        }

        let id = document.next_id;
        document.next_id += 1;
        document.records.push(StoredRecord {
            id,
            entry: encode_entry(entry)?,
        });
        self.save(&path, &document).await?;
        Ok(id)
    }

    async fn update(&self, namespace: &str, entry: &CacheEntry<T>) -> StoreResult<()> {
        let path = self.namespace_path(namespace)?;
        let _guard = self.lock.lock().await;
        let mut document: NamespaceDocument<serde_json::Value> = self.load(&path).await?;

        let record = document
            .records
            .iter_mut()
            .find(|record| record.entry.key == entry.key)
            .ok_or_else(|| StoreError::NotFound(entry.key.clone()))?;
        record.entry = encode_entry(entry)?;
        self.save(&path, &document).await
    }

    async fn delete(&self, namespace: &str, key: &str) -> StoreResult<()> {
        let path = self.namespace_path(namespace)?;
        let _guard = self.lock.lock().await;
        let mut document: NamespaceDocument<serde_json::Value> = self.load(&path).await?;

        let before = document.records.len();
        document.records.retain(|record| record.entry.key != key);
        if document.records.len() != before {
            self.save(&path, &document).await?;
        }
        Ok(())
    }

    async fn get_all(&self, namespace: &str) -> StoreResult<Vec<CacheEntry<T>>> {
        let path = self.namespace_path(namespace)?;
        let _guard = self.lock.lock().await;
        let document: NamespaceDocument<T> = self.load(&path).await?;
        Ok(document.records.into_iter().map(|record| record.entry).collect())
    }

    async fn clear(&self, namespace: &str) -> StoreResult<()> {
        let path = self.namespace_path(namespace)?;
        let _guard = self.lock.lock().await;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Encodes the value while keeping the entry metadata typed.
fn encode_entry<T: Serialize>(entry: &CacheEntry<T>) -> StoreResult<CacheEntry<serde_json::Value>> {
    Ok(CacheEntry {
        key: entry.key.clone(),
        value: serde_json::to_value(&entry.value)?,
        created_at: entry.created_at,
        expires_at: entry.expires_at,
        hit_count: entry.hit_count,
    })
}
