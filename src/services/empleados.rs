//! Recurso `empleados` (backend `usuarios`), sólo para personal y autoridad.


use serde::{Deserialize, Serialize};
use tracing::instrument;
use crate::api::domain::{ApiError, BackendName};
use crate::api::logic::ApiRegistry;


open_enum!(
    /// Área de trabajo del empleado.
    TipoArea {
        Ti => "ti",
        Mantenimiento => "mantenimiento",
        Seguridad => "seguridad",
    }
);

open_enum!(
    EstadoEmpleado {
        Activo => "activo",
        Inactivo => "inactivo",
    }
);


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmpleadoContacto {
    pub telefono: String,
    pub correo: String,
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Empleado {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empleado_id: Option<String>,
    pub nombre: String,
    pub tipo_area: TipoArea,
    pub estado: EstadoEmpleado,
    pub contacto: EmpleadoContacto,
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CrearEmpleadoRequest {
    pub nombre: String,
    pub tipo_area: TipoArea,
    pub estado: EstadoEmpleado,
    pub contacto: EmpleadoContacto,
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CrearEmpleadoResponse {
    pub empleado: Empleado,
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListarEmpleadosRequest {
    pub limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estado: Option<EstadoEmpleado>,
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListarEmpleadosResponse {
    #[serde(default)]
    pub contents: Vec<Empleado>,
    #[serde(default)]
    pub last_key: Option<String>,
}


/// POST /empleados/crear
#[instrument(skip(api, payload), fields(nombre = %payload.nombre, area = %payload.tipo_area))]
pub async fn crear_empleado(
    api: &ApiRegistry,
    payload: &CrearEmpleadoRequest,
) -> Result<CrearEmpleadoResponse, ApiError> {
    api.get_instance(BackendName::Usuarios)
        .post("/empleados/crear", payload)
        .await
}


/// POST /empleados/listar
#[instrument(skip(api))]
pub async fn listar_empleados(
    api: &ApiRegistry,
    payload: &ListarEmpleadosRequest,
) -> Result<ListarEmpleadosResponse, ApiError> {
    api.get_instance(BackendName::Usuarios)
        .post("/empleados/listar", payload)
        .await
}
