//! File-backed key/value storage with the same shape as a browser's
//! `localStorage`: string keys, JSON values, whole-document writes.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::DatabaseError;

type Document = BTreeMap<String, Value>;

pub struct LocalStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles on the backing file.
    write_lock: Mutex<()>,
}

impl LocalStorage {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, DatabaseError> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        info!("Local storage at {}", path.display());

        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get_item<T>(&self, key: &str) -> Result<Option<T>, DatabaseError>
    where
        T: DeserializeOwned,
    {
        let document = self.read_document().await?;

        match document.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    pub async fn set_item<T>(&self, key: &str, value: &T) -> Result<(), DatabaseError>
    where
        T: Serialize + ?Sized,
    {
        let value = serde_json::to_value(value)?;

        let _guard = self.write_lock.lock().await;
        let mut document = self.read_document().await?;
        document.insert(key.to_string(), value);
        self.write_document(&document).await
    }

    pub async fn remove_item(&self, key: &str) -> Result<bool, DatabaseError> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.read_document().await?;
        let removed = document.remove(key).is_some();
        if removed {
            self.write_document(&document).await?;
        }
        Ok(removed)
    }

    pub async fn keys(&self) -> Result<Vec<String>, DatabaseError> {
        Ok(self.read_document().await?.into_keys().collect())
    }

    async fn read_document(&self) -> Result<Document, DatabaseError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Document::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Document::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_document(&self, document: &Document) -> Result<(), DatabaseError> {
        let bytes = serde_json::to_vec_pretty(document)?;

        // Write beside the target then rename, so readers see old or new, never half.
        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        tokio::fs::write(&tmp_path, &bytes).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;

        debug!("Wrote {} bytes to {}", bytes.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Profile {
        name: String,
        age: u32,
    }

    #[tokio::test]
    async fn test_set_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::open(dir.path().join("nested/store.json")).await.unwrap();

        assert_eq!(storage.get_item::<Profile>("currentUser").await.unwrap(), None);

        let profile = Profile { name: "Meera".to_string(), age: 31 };
        storage.set_item("currentUser", &profile).await.unwrap();
        storage.set_item("theme", "dark").await.unwrap();

        assert_eq!(storage.get_item::<Profile>("currentUser").await.unwrap(), Some(profile));
        assert_eq!(storage.keys().await.unwrap(), vec!["currentUser", "theme"]);

        assert!(storage.remove_item("theme").await.unwrap());
        assert!(!storage.remove_item("theme").await.unwrap());
        assert_eq!(storage.keys().await.unwrap(), vec!["currentUser"]);
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("store.json");

        {
            let storage = LocalStorage::open(&file).await.unwrap();
            storage.set_item("counter", &7u32).await.unwrap();
        }

        let reopened = LocalStorage::open(&file).await.unwrap();
        assert_eq!(reopened.get_item::<u32>("counter").await.unwrap(), Some(7));
        assert!(!dir.path().join("store.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("store.json");
        tokio::fs::write(&file, b"{not json").await.unwrap();

        let storage = LocalStorage::open(&file).await.unwrap();
        assert!(matches!(
            storage.get_item::<u32>("counter").await,
            Err(DatabaseError::Serialization(_))
        ));
    }
}
