//! Recurso `incidentes` (backend `reportes`).
//!
//! El backend decide qué campos devuelve según el rol del token: `usuario_correo`
//! sólo llega para personal y autoridad, y `estado` puede faltar.


use serde::{Deserialize, Serialize};
use tracing::instrument;
use crate::api::domain::{ApiError, BackendName};
use crate::api::logic::ApiRegistry;


open_enum!(
    TipoIncidente {
        Mantenimiento => "mantenimiento",
        Seguridad => "seguridad",
        Infraestructura => "infraestructura",
        Servicios => "servicios",
        Emergencia => "emergencia",
        Limpieza => "limpieza",
    }
);

open_enum!(
    NivelUrgencia {
        Bajo => "bajo",
        Medio => "medio",
        Alto => "alto",
    }
);

open_enum!(
    /// Ciclo de vida: `pendiente -> en_progreso -> resuelto`.
    EstadoIncidente {
        Pendiente => "pendiente",
        EnProgreso => "en_progreso",
        Resuelto => "resuelto",
    }
);


#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Ubicacion {
    pub x: f64,
    pub y: f64,
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Evidencias {
    pub file_base64: String,
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Incidente {
    pub incidente_id: String,
    pub titulo: String,
    pub descripcion: String,
    pub piso: i64,
    pub ubicacion: Ubicacion,
    pub tipo: TipoIncidente,
    pub nivel_urgencia: NivelUrgencia,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estado: Option<EstadoIncidente>,
    /// Sólo visible para autoridad y personal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usuario_correo: Option<String>,
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrearIncidenteRequest {
    pub titulo: String,
    pub descripcion: String,
    pub piso: i64,
    pub ubicacion: Ubicacion,
    pub tipo: TipoIncidente,
    pub nivel_urgencia: NivelUrgencia,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidencias: Option<Evidencias>,
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CrearIncidenteResponse {
    pub incidente_id: String,
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActualizarIncidenteRequest {
    pub incidente_id: String,
    pub titulo: String,
    pub descripcion: String,
    pub piso: i64,
    pub ubicacion: Ubicacion,
    pub tipo: TipoIncidente,
    pub nivel_urgencia: NivelUrgencia,
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActualizarEstadoIncidenteRequest {
    pub incidente_id: String,
    pub estado: EstadoIncidente,
}


/// Respuesta de `update`, `update_estado` y `buscar`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncidenteResponse {
    pub incidente: Incidente,
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuscarIncidenteRequest {
    pub incidente_id: String,
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListarIncidentesRequest {
    pub size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_key: Option<String>,
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListarIncidentesResponse {
    #[serde(default)]
    pub contents: Vec<Incidente>,
    #[serde(default)]
    pub last_key: Option<String>,
}


/// POST /incidentes/crear (estudiante)
#[instrument(skip(api, payload), fields(titulo = %payload.titulo, piso = payload.piso))]
pub async fn crear_incidente(
    api: &ApiRegistry,
    payload: &CrearIncidenteRequest,
) -> Result<CrearIncidenteResponse, ApiError> {
    api.get_instance(BackendName::Reportes)
        .post("/incidentes/crear", payload)
        .await
}


/// PUT /incidentes/update (estudiante que lo reportó)
#[instrument(skip(api, payload), fields(incidente_id = %payload.incidente_id))]
pub async fn actualizar_incidente(
    api: &ApiRegistry,
    payload: &ActualizarIncidenteRequest,
) -> Result<IncidenteResponse, ApiError> {
    api.get_instance(BackendName::Reportes)
        .put("/incidentes/update", payload)
        .await
}


/// PUT /incidentes/update_estado (personal y autoridad)
#[instrument(skip(api, payload), fields(incidente_id = %payload.incidente_id, estado = %payload.estado))]
pub async fn actualizar_estado_incidente(
    api: &ApiRegistry,
    payload: &ActualizarEstadoIncidenteRequest,
) -> Result<IncidenteResponse, ApiError> {
    api.get_instance(BackendName::Reportes)
        .put("/incidentes/update_estado", payload)
        .await
}


/// POST /incidentes/buscar
#[instrument(skip(api, payload), fields(incidente_id = %payload.incidente_id))]
pub async fn buscar_incidente(
    api: &ApiRegistry,
    payload: &BuscarIncidenteRequest,
) -> Result<IncidenteResponse, ApiError> {
    api.get_instance(BackendName::Reportes)
        .post("/incidentes/buscar", payload)
        .await
}


/// POST /incidentes/listar
#[instrument(skip(api))]
pub async fn listar_incidentes(
    api: &ApiRegistry,
    payload: &ListarIncidentesRequest,
) -> Result<ListarIncidentesResponse, ApiError> {
    api.get_instance(BackendName::Reportes)
        .post("/incidentes/listar", payload)
        .await
}
