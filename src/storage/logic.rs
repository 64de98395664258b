use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;
use tracing::{debug, warn};
use super::domain::{Storage, StorageError};


type Entries = BTreeMap<String, String>;


impl Storage {

    /// Lee el valor asociado a `key`, `None` si no existe.
    pub async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self {
            Storage::File(path) => Ok(read_entries(path).await?.remove(key)),
            Storage::Memory(map) => Ok(map.get(key).map(|v| v.value().clone())),
        }
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        match self {
            Storage::File(path) => {
                let mut entries = read_entries(path).await?;
                entries.insert(key.to_string(), value.to_string());
                write_entries(path, &entries).await
            }
            Storage::Memory(map) => {
                map.insert(key.to_string(), value.to_string());
                Ok(())
            }
        }
    }

    /// Elimina `key`. Eliminar una clave inexistente no es un error.
    pub async fn remove(&self, key: &str) -> Result<(), StorageError> {
        match self {
            Storage::File(path) => {
                let mut entries = read_entries(path).await?;
                if entries.remove(key).is_some() {
                    write_entries(path, &entries).await?;
                }
                Ok(())
            }
            Storage::Memory(map) => {
                map.remove(key);
                Ok(())
            }
        }
    }
}


async fn read_entries(path: &Path) -> Result<Entries, StorageError> {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "Debug: almacenamiento inexistente, se asume vacío");
            return Ok(Entries::new());
        }
        Err(source) => {
            return Err(StorageError::Io { path: path.to_path_buf(), source });
        }
    };

    if raw.trim().is_empty() {
        return Ok(Entries::new());
    }

    serde_json::from_str(&raw).map_err(|source| {
        warn!(path = %path.display(), "Warning: almacenamiento corrupto");
        StorageError::Corrupt { path: path.to_path_buf(), source }
    })
}


async fn write_entries(path: &Path, entries: &Entries) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| StorageError::Io { path: parent.to_path_buf(), source })?;
        }
    }

    let raw = serde_json::to_string_pretty(entries)
        .map_err(|source| StorageError::Corrupt { path: path.to_path_buf(), source })?;

    fs::write(path, raw)
        .await
        .map_err(|source| StorageError::Io { path: path.to_path_buf(), source })
}
