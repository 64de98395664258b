//! Tipos compartidos por los clientes HTTP de cada backend.


use std::fmt;
use serde::Deserialize;
use thiserror::Error;


/// Backend lógico al que apunta un cliente.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendName {
    /// Auth, usuarios y empleados.
    Usuarios,
    /// Incidentes.
    Reportes,
}


impl BackendName {
    pub const ALL: [BackendName; 2] = [BackendName::Usuarios, BackendName::Reportes];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendName::Usuarios => "usuarios",
            BackendName::Reportes => "reportes",
        }
    }
}


impl fmt::Display for BackendName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}


/// Errores de una llamada al backend. No se reintentan ni se traducen.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no se pudo construir el cliente HTTP: {0}")]
    Client(#[source] reqwest::Error),

    #[error("error de red en {path}: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{path} respondió {status}: {}", .message.as_deref().unwrap_or("sin mensaje"))]
    Status {
        path: String,
        status: u16,
        message: Option<String>,
    },

    #[error("respuesta inválida de {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}


impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Mensaje para el usuario: el del servidor si existe, si no `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        self.server_message()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(fallback)
            .to_string()
    }
}


#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}


/// Extrae el mensaje de error de un cuerpo de respuesta no exitosa.
///
/// Acepta `{"message": ...}` o `{"error": ...}`; un cuerpo que no es JSON se usa tal cual.
pub fn extract_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.message.or(parsed.error),
        Err(_) if !body.starts_with('{') => Some(body.to_string()),
        Err(_) => None,
    }
}
