use tracing::instrument;
use crate::api::domain::{ApiError, BackendName};
use crate::api::logic::ApiRegistry;
use crate::session::domain::{AuthResponse, LoginRequest, RegisterRequest};


/// POST /auth/login
#[instrument(name = "auth_login", skip(api, payload), fields(correo = %payload.correo))]
pub async fn login(api: &ApiRegistry, payload: &LoginRequest) -> Result<AuthResponse, ApiError> {
    api.get_instance(BackendName::Usuarios)
        .post("/auth/login", payload)
        .await
}


/// POST /auth/register
#[instrument(name = "auth_register", skip(api, payload), fields(correo = %payload.correo))]
pub async fn register(api: &ApiRegistry, payload: &RegisterRequest) -> Result<AuthResponse, ApiError> {
    api.get_instance(BackendName::Usuarios)
        .post("/auth/register", payload)
        .await
}
