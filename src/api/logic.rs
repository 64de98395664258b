//! Fábrica de clientes HTTP por backend.
//!
//! `ApiRegistry::get_instance` crea de forma perezosa un único `ApiClient` por
//! `BackendName` y lo reutiliza durante toda la vida del registro. Ningún cliente
//! guarda una copia del token: todos leen el estado de sesión del mismo
//! `watch::Receiver` en el momento de cada llamada.


use std::sync::Arc;
use dashmap::DashMap;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn};
use crate::config::api::USER_AGENT;
use crate::session::domain::SessionState;
use crate::system::domain::System;
use super::domain::{extract_message, ApiError, BackendName};


#[derive(Clone, Debug)]
pub struct ApiClient {
    name: BackendName,
    base_url: String,
    http: reqwest::Client,
    session: watch::Receiver<SessionState>,
}


impl ApiClient {
    #[cfg(test)]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Token vigente, o cadena vacía si no hay sesión.
    pub fn authorization(&self) -> String {
        self.session.borrow().token().unwrap_or_default().to_string()
    }

    pub async fn get<Res>(&self, path: &str, query: &[(&str, &str)]) -> Result<Res, ApiError>
    where
        Res: DeserializeOwned,
    {
        let builder = self.request(Method::GET, path).query(query);
        self.send(builder, path).await
    }

    pub async fn post<Req, Res>(&self, path: &str, body: &Req) -> Result<Res, ApiError>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let builder = self.request(Method::POST, path).json(body);
        self.send(builder, path).await
    }

    pub async fn put<Req, Res>(&self, path: &str, body: &Req) -> Result<Res, ApiError>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let builder = self.request(Method::PUT, path).json(body);
        self.send(builder, path).await
    }

    pub async fn delete<Req, Res>(&self, path: &str, body: &Req) -> Result<Res, ApiError>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let builder = self.request(Method::DELETE, path).json(body);
        self.send(builder, path).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(backend = %self.name, %method, %url, "Debug: petición saliente");

        let builder = self.http.request(method, url);
        let token = self.authorization();
        if token.is_empty() {
            builder
        } else {
            builder.bearer_auth(token)
        }
    }

    async fn send<Res>(&self, builder: RequestBuilder, path: &str) -> Result<Res, ApiError>
    where
        Res: DeserializeOwned,
    {
        let response = builder.send().await.map_err(|source| {
            warn!(backend = %self.name, path, "Warning: fallo de red: {}", source);
            ApiError::Transport { path: path.to_string(), source }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| ApiError::Transport {
            path: path.to_string(),
            source,
        })?;

        if !status.is_success() {
            warn!(backend = %self.name, path, status = status.as_u16(), "Warning: respuesta no exitosa");
            return Err(ApiError::Status {
                path: path.to_string(),
                status: status.as_u16(),
                message: extract_message(&body),
            });
        }

        // Un cuerpo vacío (204) se decodifica como `null`.
        let body = if body.trim().is_empty() { "null" } else { body.as_str() };
        serde_json::from_str(body).map_err(|source| ApiError::Decode {
            path: path.to_string(),
            source,
        })
    }
}


/// Registro de clientes: una instancia compartida por backend.
#[derive(Clone, Debug)]
pub struct ApiRegistry {
    clients: Arc<DashMap<BackendName, ApiClient>>,
    usuarios_url: String,
    reportes_url: String,
    http: reqwest::Client,
    session: watch::Receiver<SessionState>,
}


impl ApiRegistry {
    pub fn new(system: &System, session: watch::Receiver<SessionState>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(system.http_timeout())
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self {
            clients: Arc::new(DashMap::new()),
            usuarios_url: system.usuarios_url.trim_end_matches('/').to_string(),
            reportes_url: system.reportes_url.trim_end_matches('/').to_string(),
            http,
            session,
        })
    }

    /// Devuelve el cliente de `name`, creándolo la primera vez.
    pub fn get_instance(&self, name: BackendName) -> ApiClient {
        self.clients
            .entry(name)
            .or_insert_with(|| {
                debug!(backend = %name, "Debug: creando instancia de cliente");
                ApiClient {
                    name,
                    base_url: match name {
                        BackendName::Usuarios => self.usuarios_url.clone(),
                        BackendName::Reportes => self.reportes_url.clone(),
                    },
                    http: self.http.clone(),
                    session: self.session.clone(),
                }
            })
            .clone()
    }

    /// Clientes creados hasta ahora.
    #[cfg(test)]
    pub fn instances(&self) -> Vec<ApiClient> {
        self.clients.iter().map(|entry| entry.value().clone()).collect()
    }
}
