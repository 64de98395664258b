//! Módulo de configuración central y gestión del entorno de ejecución.
//!
//! Este módulo actúa como la fuente única de verdad para la configuración del cliente.
//! Se encarga de leer las variables de entorno, establecer valores por defecto
//! y proveer las estructuras necesarias para iniciar los subsistemas (API, Almacenamiento, Logging).
//!
//! # Funcionalidades Principales
//! * **Carga de Configuración:** Lee de `.env` en desarrollo y variables de sistema en producción.
//! * **Observabilidad:** Configura `tracing_subscriber` para logs estructurados o legibles.
//!


use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use crate::config::api::DEFAULT_TIMEOUT_SECS;
use crate::config::storage::{DEFAULT_DIR, DEFAULT_FILE};


/// Errores al construir la configuración desde el entorno.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} no está configurada")]
    Missing(&'static str),

    #[error("{name} debe ser un número (valor: {value})")]
    NotANumber { name: &'static str, value: String },
}


/// Representa la configuración global del cliente y el estado del entorno.
#[derive(Debug, Clone)]
pub struct System {
    /// URL base del backend de usuarios (auth, usuarios y empleados).
    /// **Requerido**.
    pub usuarios_url: String,

    /// URL base del backend de reportes (incidentes).
    /// **Requerido**.
    pub reportes_url: String,

    /// Archivo clave-valor donde se persiste la sesión.
    /// Por defecto: `$HOME/.alerta_utec/storage.json`.
    pub storage_path: PathBuf,

    /// Timeout por petición HTTP.
    /// Por defecto: `10` segundos.
    pub http_timeout_secs: u64,

    /// Entorno de ejecución actual (`development`, `staging`, `production`).
    /// Afecta el formato de logs y la carga de archivos `.env`.
    pub environment: String,

    /// Nivel de detalle de los logs (ej. `info`, `debug`, `warn`).
    /// Se autoconfigura según el `environment` si no se especifica.
    pub rust_log: String,
}


impl System {

    /// Carga la configuración desde las variables de entorno.
    ///
    /// # Comportamiento
    /// * Si `ENVIRONMENT` es "development", intenta cargar un archivo `.env`.
    /// * Establece valores por defecto para variables opcionales.
    ///
    /// # Errores
    /// * `USUARIOS_API_URL` o `REPORTES_API_URL` no definidas.
    /// * `HTTP_TIMEOUT_SECS` no es un número válido.
    pub fn new() -> Result<Self, ConfigError> {
        let environment = env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".into());

        if environment == "development" {
            dotenv::dotenv().ok();
        }

        let system = Self::from_lookup(|name| env::var(name).ok())?;
        info!(environment = %system.environment, "Info: configuración cargada");
        Ok(system)
    }

    /// Construye la configuración a partir de una función de búsqueda de variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .unwrap_or_else(|| "development".to_string());

        let http_timeout_secs = match lookup("HTTP_TIMEOUT_SECS") {
            Some(value) => value.parse().map_err(|_| ConfigError::NotANumber {
                name: "HTTP_TIMEOUT_SECS",
                value,
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let storage_path = lookup("ALERTA_STORAGE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                let home = lookup("HOME").unwrap_or_else(|| ".".to_string());
                PathBuf::from(home).join(DEFAULT_DIR).join(DEFAULT_FILE)
            });

        Ok(System {
            usuarios_url: lookup("USUARIOS_API_URL")
                .ok_or(ConfigError::Missing("USUARIOS_API_URL"))?,

            reportes_url: lookup("REPORTES_API_URL")
                .ok_or(ConfigError::Missing("REPORTES_API_URL"))?,

            storage_path,

            http_timeout_secs,

            rust_log: lookup("RUST_LOG")
                .unwrap_or_else(|| {
                    match environment.as_str() {
                        "development" => "debug".to_string(),
                        "staging" => "info".to_string(),
                        _ => "warn".to_string(),
                    }
                }),

            environment,
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}


/// Inicializa el sistema de trazabilidad y logs (Tracing).
///
/// Configura el formato de salida basándose en el entorno:
/// * **Production**: Salida JSON (para logs estructurados).
/// * **Development/Otros**: Salida "Pretty" (colores y formato legible).
///
/// Los logs se escriben en stderr para no mezclarse con la salida de los comandos.
pub fn init_tracing(system: &System) {

    let filter = EnvFilter::try_new(&system.rust_log)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if system.environment == "production" {
        builder.json().init();
    } else {
        builder.pretty().init();
    }
}
