//! Almacenamiento clave-valor persistente del dispositivo.
//!
//! Guarda cadenas bajo claves simples (hoy sólo `"token"`). El backend en archivo
//! serializa todo el mapa como un objeto JSON; el backend en memoria se usa en
//! pruebas y no sobrevive al proceso.


use std::path::PathBuf;
use std::sync::Arc;
use dashmap::DashMap;
use thiserror::Error;


#[derive(Debug, Error)]
pub enum StorageError {
    #[error("error de E/S en {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("contenido inválido en {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}


#[derive(Clone, Debug)]
pub enum Storage {
    /// Objeto JSON `{ clave: valor }` en disco.
    File(PathBuf),
    Memory(Arc<DashMap<String, String>>),
}


impl Storage {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Storage::File(path.into())
    }

    pub fn memory() -> Self {
        Storage::Memory(Arc::new(DashMap::new()))
    }
}
