//! Definición del Contexto de Aplicación (Shared State).
//!
//! El `AppContext` actúa como un contenedor de "Inyección de Dependencias" manual,
//! agrupando los recursos que usan todas las páginas: configuración, sesión y
//! registro de clientes HTTP. La sesión se pasa de forma explícita; no hay estado global.


use std::sync::Arc;
use crate::api::domain::ApiError;
use crate::api::logic::ApiRegistry;
use crate::session::logic::Session;
use crate::storage::domain::Storage;
use crate::system::domain::System;


#[derive(Clone, Debug)]
pub struct AppContext {
    pub system: Arc<System>,
    pub session: Arc<Session>,
    pub api: ApiRegistry,
}


impl AppContext {
    /// Contexto con la sesión persistida en `system.storage_path`.
    pub fn new(system: System) -> Result<Self, ApiError> {
        let storage = Storage::file(system.storage_path.clone());
        Self::with_storage(system, storage)
    }

    pub fn with_storage(system: System, storage: Storage) -> Result<Self, ApiError> {
        let session = Arc::new(Session::new(storage));
        let api = ApiRegistry::new(&system, session.subscribe())?;
        Ok(Self { system: Arc::new(system), session, api })
    }
}
