//! Contexto de sesión.
//!
//! `Session` es el único dueño del token. Publica cada transición en un canal
//! `watch`; los clientes HTTP y cualquier otro observador leen desde ahí, de modo
//! que el token vigente es siempre el que ve la siguiente petición.


use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};
use crate::api::logic::ApiRegistry;
use crate::config::storage::TOKEN_KEY;
use crate::services::auth;
use crate::storage::domain::{Storage, StorageError};
use super::domain::{LoginRequest, RegisterRequest, SessionError, SessionState};


#[derive(Debug)]
pub struct Session {
    state: watch::Sender<SessionState>,
    storage: Storage,
}


impl Session {
    pub fn new(storage: Storage) -> Self {
        let (state, _) = watch::channel(SessionState::Uninitialized);
        Self { state, storage }
    }

    /// Receptor para observar las transiciones de la sesión.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Token vigente, `None` si no hay sesión.
    pub fn session(&self) -> Option<String> {
        self.state.borrow().token().map(str::to_string)
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    /// Lectura inicial del almacenamiento persistente.
    ///
    /// Si la lectura falla la sesión queda anónima y se devuelve el error.
    #[instrument(name = "session_start", skip(self))]
    pub async fn start(&self) -> Result<(), StorageError> {
        self.publish(SessionState::Loading);

        match self.storage.get(TOKEN_KEY).await {
            Ok(Some(token)) if !token.is_empty() => {
                info!("Info: sesión restaurada desde almacenamiento");
                self.publish(SessionState::Authenticated(token));
                Ok(())
            }
            Ok(_) => {
                debug!("Debug: sin token almacenado");
                self.publish(SessionState::Anonymous);
                Ok(())
            }
            Err(e) => {
                warn!("Warning: no se pudo leer la sesión almacenada: {}", e);
                self.publish(SessionState::Anonymous);
                Err(e)
            }
        }
    }

    /// Autentica y persiste el token emitido por el servidor.
    ///
    /// El error del servicio se propaga sin cambios y el estado no se toca.
    pub async fn login(&self, api: &ApiRegistry, request: &LoginRequest) -> Result<(), SessionError> {
        let response = auth::login(api, request).await?;
        self.authenticate(response.token).await
    }

    pub async fn register(&self, api: &ApiRegistry, request: &RegisterRequest) -> Result<(), SessionError> {
        let response = auth::register(api, request).await?;
        self.authenticate(response.token).await
    }

    /// Cierra la sesión. Primero borra el token persistido; el estado pasa a
    /// anónimo aunque el borrado falle, y en ese caso se devuelve el error porque
    /// el próximo `start` restauraría la sesión.
    pub async fn logout(&self) -> Result<(), StorageError> {
        let borrado = self.storage.remove(TOKEN_KEY).await;
        self.publish(SessionState::Anonymous);
        if let Err(e) = borrado {
            warn!("Warning: el token sigue guardado tras cerrar sesión: {}", e);
            return Err(e);
        }
        info!("Info: sesión cerrada");
        Ok(())
    }

    async fn authenticate(&self, token: String) -> Result<(), SessionError> {
        self.storage.set(TOKEN_KEY, &token).await?;
        self.publish(SessionState::Authenticated(token));
        info!("Info: sesión iniciada");
        Ok(())
    }

    fn publish(&self, next: SessionState) {
        let previous = self.state.send_replace(next);
        debug!(?previous, "Debug: transición de sesión");
    }
}
