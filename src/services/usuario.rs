//! Recurso `usuario` (backend `usuarios`).


use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use crate::api::domain::{ApiError, BackendName};
use crate::api::logic::ApiRegistry;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rol {
    Estudiante,
    PersonalAdministrativo,
    Autoridad,
}


impl Rol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rol::Estudiante => "estudiante",
            Rol::PersonalAdministrativo => "personal_administrativo",
            Rol::Autoridad => "autoridad",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Rol::Estudiante => "Estudiante",
            Rol::PersonalAdministrativo => "Personal Administrativo",
            Rol::Autoridad => "Autoridad",
        }
    }

    /// Personal administrativo y autoridad pueden cambiar el estado de incidentes.
    pub fn gestiona_incidentes(&self) -> bool {
        matches!(self, Rol::PersonalAdministrativo | Rol::Autoridad)
    }
}


impl fmt::Display for Rol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}


impl FromStr for Rol {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "estudiante" => Ok(Rol::Estudiante),
            "personal_administrativo" => Ok(Rol::PersonalAdministrativo),
            "autoridad" => Ok(Rol::Autoridad),
            other => Err(format!(
                "rol desconocido '{other}' (estudiante, personal_administrativo, autoridad)"
            )),
        }
    }
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Usuario {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub nombre: String,
    pub correo: String,
    pub rol: Rol,
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UsuarioResponse {
    pub usuario: Usuario,
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateMyUserRequest {
    pub correo: String,
    pub nombre: String,
    pub contrasena: String,
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateUserAsAutoridadRequest {
    pub nombre: String,
    pub correo: String,
    pub contrasena: String,
    pub rol: Rol,
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangePasswordRequest {
    pub contrasena_actual: String,
    pub nueva_contrasena: String,
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangePasswordResponse {
    pub ok: bool,
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListUsuariosRequest {
    pub limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_key: Option<String>,
}


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListUsuariosResponse {
    #[serde(default)]
    pub contents: Vec<Usuario>,
    #[serde(default)]
    pub last_key: Option<String>,
}


#[derive(Serialize)]
struct CorreoBody<'a> {
    correo: &'a str,
}


/// GET /usuario/mi
#[instrument(skip(api))]
pub async fn get_my_user(api: &ApiRegistry) -> Result<UsuarioResponse, ApiError> {
    api.get_instance(BackendName::Usuarios)
        .get("/usuario/mi", &[])
        .await
}


/// PUT /usuario/modificar
#[instrument(skip(api, payload), fields(correo = %payload.correo))]
pub async fn update_my_user(
    api: &ApiRegistry,
    payload: &UpdateMyUserRequest,
) -> Result<UsuarioResponse, ApiError> {
    api.get_instance(BackendName::Usuarios)
        .put("/usuario/modificar", payload)
        .await
}


/// DELETE /usuario/eliminar
///
/// Lo usa el estudiante sobre sí mismo y la autoridad sobre terceros.
#[instrument(skip(api))]
pub async fn delete_user_by_correo(
    api: &ApiRegistry,
    correo: &str,
) -> Result<serde_json::Value, ApiError> {
    api.get_instance(BackendName::Usuarios)
        .delete("/usuario/eliminar", &CorreoBody { correo })
        .await
}


/// POST /usuario/crear
///
/// Mismo contrato que el registro, pero crea un tercero con rol explícito.
#[instrument(skip(api, payload), fields(correo = %payload.correo, rol = %payload.rol))]
pub async fn create_user_as_autoridad(
    api: &ApiRegistry,
    payload: &CreateUserAsAutoridadRequest,
) -> Result<UsuarioResponse, ApiError> {
    api.get_instance(BackendName::Usuarios)
        .post("/usuario/crear", payload)
        .await
}


/// GET /usuario/obtener?correo=
#[instrument(skip(api))]
pub async fn get_user_by_correo(api: &ApiRegistry, correo: &str) -> Result<UsuarioResponse, ApiError> {
    api.get_instance(BackendName::Usuarios)
        .get("/usuario/obtener", &[("correo", correo)])
        .await
}


/// POST /usuario/cambiar-contrasena
#[instrument(skip(api, payload))]
pub async fn change_my_password(
    api: &ApiRegistry,
    payload: &ChangePasswordRequest,
) -> Result<ChangePasswordResponse, ApiError> {
    api.get_instance(BackendName::Usuarios)
        .post("/usuario/cambiar-contrasena", payload)
        .await
}


/// POST /usuario/listar
#[instrument(skip(api))]
pub async fn list_usuarios(
    api: &ApiRegistry,
    payload: &ListUsuariosRequest,
) -> Result<ListUsuariosResponse, ApiError> {
    api.get_instance(BackendName::Usuarios)
        .post("/usuario/listar", payload)
        .await
}
