//! Estado de sesión y contratos de autenticación.
//!
//! La sesión es un único token bearer opaco o su ausencia. El `Session` de
//! `logic.rs` es su único escritor; cualquier otro componente la observa a través
//! de un `watch::Receiver<SessionState>`.


use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::api::domain::ApiError;
use crate::services::usuario::Rol;
use crate::storage::domain::StorageError;


/// Máquina de estados de la sesión.
///
/// `Uninitialized -> Loading -> {Anonymous | Authenticated}`, luego
/// `Anonymous <-> Authenticated` mediante login/registro y logout.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Uninitialized,
    Loading,
    Anonymous,
    Authenticated(String),
}


impl SessionState {
    pub fn token(&self) -> Option<&str> {
        match self {
            SessionState::Authenticated(token) => Some(token.as_str()),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    pub correo: String,
    pub contrasena: String,
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterRequest {
    pub nombre: String,
    pub correo: String,
    pub contrasena: String,
    pub rol: Rol,
}


/// Respuesta de `/auth/login` y `/auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthResponse {
    pub token: String,
}


#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
