//! Backend falso en proceso para las pruebas.
//!
//! Levanta dos servidores axum (usuarios y reportes) sobre puertos efímeros que
//! comparten el mismo estado en memoria, y registra el encabezado `Authorization`
//! recibido por cada ruta.


use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use axum::extract::{Query, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::watch;
use crate::api::logic::ApiRegistry;
use crate::context::domain::AppContext;
use crate::services::empleados::{CrearEmpleadoRequest, Empleado, ListarEmpleadosRequest};
use crate::services::incidentes::{
    ActualizarEstadoIncidenteRequest, ActualizarIncidenteRequest, BuscarIncidenteRequest,
    CrearIncidenteRequest, EstadoIncidente, Incidente, ListarIncidentesRequest, NivelUrgencia,
    TipoIncidente, Ubicacion,
};
use crate::services::usuario::{
    ChangePasswordRequest, CreateUserAsAutoridadRequest, ListUsuariosRequest, Rol,
    UpdateMyUserRequest, Usuario,
};
use crate::session::domain::{LoginRequest, RegisterRequest, SessionState};
use crate::storage::domain::Storage;
use crate::system::domain::System;


pub const PASSWORD: &str = "secreto";


#[derive(Clone)]
struct Cuenta {
    usuario: Usuario,
    contrasena: String,
    token: String,
}


#[derive(Default)]
struct FakeState {
    cuentas: Vec<Cuenta>,
    empleados: Vec<Empleado>,
    incidentes: Vec<Incidente>,
    autorizaciones: HashMap<String, Option<String>>,
    hits: HashMap<String, usize>,
    fallar_listar: bool,
    fallar_estado: bool,
    siguiente_id: u64,
}


impl FakeState {
    fn seeded() -> Self {
        let mut state = FakeState::default();
        for (nombre, correo, rol, token) in [
            ("Estudiante", "estudiante@utec.edu.pe", Rol::Estudiante, "tok-estudiante"),
            ("Personal", "personal@utec.edu.pe", Rol::PersonalAdministrativo, "tok-personal"),
            ("Autoridad", "autoridad@utec.edu.pe", Rol::Autoridad, "tok-autoridad"),
        ] {
            state.cuentas.push(Cuenta {
                usuario: Usuario {
                    id: Some(format!("u-{token}")),
                    nombre: nombre.into(),
                    correo: correo.into(),
                    rol,
                },
                contrasena: PASSWORD.into(),
                token: token.into(),
            });
        }
        state
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.siguiente_id += 1;
        format!("{prefix}-{}", self.siguiente_id)
    }

    fn cuenta_actual(&self, headers: &HeaderMap) -> Option<Cuenta> {
        let token = headers
            .get(AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")?;
        self.cuentas.iter().find(|c| c.token == token).cloned()
    }
}


type Shared = Arc<Mutex<FakeState>>;


pub struct FakeBackend {
    state: Shared,
    usuarios_url: String,
    reportes_url: String,
}


impl FakeBackend {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(FakeState::seeded()));
        let usuarios_url = serve(router(state.clone())).await;
        let reportes_url = serve(router(state.clone())).await;
        Self { state, usuarios_url, reportes_url }
    }

    pub fn system(&self) -> System {
        test_system(&self.usuarios_url, &self.reportes_url)
    }

    /// `None` si la ruta nunca se llamó; `Some(None)` si se llamó sin encabezado.
    pub fn last_authorization(&self, path: &str) -> Option<Option<String>> {
        self.state.lock().unwrap().autorizaciones.get(path).cloned()
    }

    pub fn hits(&self, path: &str) -> usize {
        self.state.lock().unwrap().hits.get(path).copied().unwrap_or(0)
    }

    pub fn set_fallar_listar(&self, fallar: bool) {
        self.state.lock().unwrap().fallar_listar = fallar;
    }

    pub fn set_fallar_estado(&self, fallar: bool) {
        self.state.lock().unwrap().fallar_estado = fallar;
    }

    pub fn estado_de(&self, incidente_id: &str) -> Option<EstadoIncidente> {
        self.state
            .lock()
            .unwrap()
            .incidentes
            .iter()
            .find(|i| i.incidente_id == incidente_id)
            .and_then(|i| i.estado.clone())
    }

    /// Carga incidentes reportados por el estudiante sembrado.
    pub fn seed(&self, incidentes: Vec<Incidente>) {
        let mut state = self.state.lock().unwrap();
        for mut incidente in incidentes {
            incidente.usuario_correo = Some("estudiante@utec.edu.pe".into());
            state.incidentes.push(incidente);
        }
    }

    pub fn seed_incidentes(&self, n: usize) {
        let incidentes = (0..n)
            .map(|i| incidente(&format!("seed-{i}"), EstadoIncidente::Pendiente, TipoIncidente::Limpieza, NivelUrgencia::Bajo, 1))
            .collect();
        self.seed(incidentes);
    }
}


pub fn test_system(usuarios_url: &str, reportes_url: &str) -> System {
    System {
        usuarios_url: usuarios_url.to_string(),
        reportes_url: reportes_url.to_string(),
        storage_path: PathBuf::from("storage.json"),
        http_timeout_secs: 5,
        environment: "test".to_string(),
        rust_log: "debug".to_string(),
    }
}


/// Registro de clientes con una sesión fija para `token`.
pub fn logged_in_registry(backend: &FakeBackend, token: &str) -> (ApiRegistry, watch::Sender<SessionState>) {
    let (tx, rx) = watch::channel(SessionState::Authenticated(token.to_string()));
    let api = ApiRegistry::new(&backend.system(), rx).unwrap();
    (api, tx)
}


/// Contexto completo con sesión iniciada como `correo`.
pub async fn logged_in_context(backend: &FakeBackend, correo: &str) -> AppContext {
    let ctx = AppContext::with_storage(backend.system(), Storage::memory()).unwrap();
    ctx.session.start().await.unwrap();
    ctx.session
        .login(&ctx.api, &LoginRequest { correo: correo.into(), contrasena: PASSWORD.into() })
        .await
        .unwrap();
    ctx
}


pub async fn anonymous_context(backend: &FakeBackend) -> AppContext {
    let ctx = AppContext::with_storage(backend.system(), Storage::memory()).unwrap();
    ctx.session.start().await.unwrap();
    ctx
}


pub fn incidente(
    id: &str,
    estado: EstadoIncidente,
    tipo: TipoIncidente,
    urgencia: NivelUrgencia,
    piso: i64,
) -> Incidente {
    Incidente {
        incidente_id: id.to_string(),
        titulo: format!("Incidente {id}"),
        descripcion: "Descripción".into(),
        piso,
        ubicacion: Ubicacion { x: 1.0, y: 2.0 },
        tipo,
        nivel_urgencia: urgencia,
        estado: Some(estado),
        usuario_correo: None,
    }
}


/// 10 incidentes: 3 pendientes, 4 en progreso, 3 resueltos.
///
/// Tipos: mantenimiento 4, seguridad 3, limpieza 3.
/// Urgencias: bajo 3, medio 3, alto 4.
/// Pisos: 1 → 2, 2 → 3, 3 → 4, 4 → 1.
pub fn fixture_incidentes() -> Vec<Incidente> {
    use EstadoIncidente::*;
    let estados = [Pendiente, Pendiente, Pendiente, EnProgreso, EnProgreso, EnProgreso, EnProgreso, Resuelto, Resuelto, Resuelto];
    let tipos = [TipoIncidente::Mantenimiento, TipoIncidente::Seguridad, TipoIncidente::Limpieza];
    let urgencias = [NivelUrgencia::Bajo, NivelUrgencia::Medio, NivelUrgencia::Alto, NivelUrgencia::Alto];
    let pisos = [1, 1, 2, 2, 2, 3, 3, 3, 3, 4];

    estados
        .into_iter()
        .enumerate()
        .map(|(i, estado)| {
            incidente(
                &format!("inc-{i}"),
                estado,
                tipos[i % 3].clone(),
                urgencias[i % 4].clone(),
                pisos[i],
            )
        })
        .collect()
}


async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}


fn router(state: Shared) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/usuario/mi", get(mi))
        .route("/usuario/modificar", put(modificar))
        .route("/usuario/eliminar", delete(eliminar))
        .route("/usuario/crear", post(crear_usuario))
        .route("/usuario/obtener", get(obtener))
        .route("/usuario/cambiar-contrasena", post(cambiar_contrasena))
        .route("/usuario/listar", post(listar_usuarios))
        .route("/empleados/crear", post(crear_empleado))
        .route("/empleados/listar", post(listar_empleados))
        .route("/incidentes/crear", post(crear_incidente))
        .route("/incidentes/update", put(actualizar_incidente))
        .route("/incidentes/update_estado", put(actualizar_estado))
        .route("/incidentes/buscar", post(buscar_incidente))
        .route("/incidentes/listar", post(listar_incidentes))
        .layer(middleware::from_fn_with_state(state.clone(), registrar))
        .with_state(state)
}


async fn registrar(State(state): State<Shared>, req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let auth = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    {
        let mut state = state.lock().unwrap();
        state.autorizaciones.insert(path.clone(), auth);
        *state.hits.entry(path).or_default() += 1;
    }
    next.run(req).await
}


fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}


fn paginar<T: Clone>(items: &[T], size: u32, last_key: Option<&str>) -> (Vec<T>, Option<String>) {
    let start = last_key
        .and_then(|k| k.parse::<usize>().ok())
        .unwrap_or(0)
        .min(items.len());
    let end = (start + size as usize).min(items.len());
    let next = (end < items.len()).then(|| end.to_string());
    (items[start..end].to_vec(), next)
}


macro_rules! autenticado {
    ($state:expr, $headers:expr) => {
        match $state.cuenta_actual(&$headers) {
            Some(cuenta) => cuenta,
            None => return error(StatusCode::UNAUTHORIZED, "Token inválido"),
        }
    };
}

macro_rules! gestor {
    ($state:expr, $headers:expr) => {{
        let cuenta = autenticado!($state, $headers);
        if !cuenta.usuario.rol.gestiona_incidentes() {
            return error(StatusCode::FORBIDDEN, "No autorizado");
        }
        cuenta
    }};
}


async fn login(State(state): State<Shared>, Json(body): Json<LoginRequest>) -> Response {
    let state = state.lock().unwrap();
    match state
        .cuentas
        .iter()
        .find(|c| c.usuario.correo == body.correo && c.contrasena == body.contrasena)
    {
        Some(cuenta) => Json(json!({ "token": cuenta.token })).into_response(),
        None => error(StatusCode::UNAUTHORIZED, "Credenciales inválidas"),
    }
}


async fn register(State(state): State<Shared>, Json(body): Json<RegisterRequest>) -> Response {
    let mut state = state.lock().unwrap();
    if state.cuentas.iter().any(|c| c.usuario.correo == body.correo) {
        return error(StatusCode::CONFLICT, "Correo ya registrado");
    }
    let id = state.next_id("u");
    let token = format!("tok-{id}");
    state.cuentas.push(Cuenta {
        usuario: Usuario { id: Some(id), nombre: body.nombre, correo: body.correo, rol: body.rol },
        contrasena: body.contrasena,
        token: token.clone(),
    });
    Json(json!({ "token": token })).into_response()
}


async fn mi(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = state.lock().unwrap();
    let cuenta = autenticado!(state, headers);
    Json(json!({ "usuario": cuenta.usuario })).into_response()
}


async fn modificar(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<UpdateMyUserRequest>,
) -> Response {
    let mut state = state.lock().unwrap();
    let cuenta = autenticado!(state, headers);
    let Some(actual) = state.cuentas.iter_mut().find(|c| c.token == cuenta.token) else {
        return error(StatusCode::NOT_FOUND, "Usuario no encontrado");
    };
    actual.usuario.nombre = body.nombre;
    actual.usuario.correo = body.correo;
    actual.contrasena = body.contrasena;
    Json(json!({ "usuario": actual.usuario })).into_response()
}


#[derive(Deserialize)]
struct CorreoBody {
    correo: String,
}


async fn eliminar(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<CorreoBody>) -> Response {
    let mut state = state.lock().unwrap();
    let cuenta = autenticado!(state, headers);
    if cuenta.usuario.correo != body.correo && cuenta.usuario.rol != Rol::Autoridad {
        return error(StatusCode::FORBIDDEN, "No autorizado");
    }
    let before = state.cuentas.len();
    state.cuentas.retain(|c| c.usuario.correo != body.correo);
    if state.cuentas.len() == before {
        return error(StatusCode::NOT_FOUND, "Usuario no encontrado");
    }
    Json(json!({ "ok": true })).into_response()
}


async fn crear_usuario(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<CreateUserAsAutoridadRequest>,
) -> Response {
    let mut state = state.lock().unwrap();
    let cuenta = autenticado!(state, headers);
    if cuenta.usuario.rol != Rol::Autoridad {
        return error(StatusCode::FORBIDDEN, "No autorizado");
    }
    let id = state.next_id("u");
    let usuario = Usuario { id: Some(id.clone()), nombre: body.nombre, correo: body.correo, rol: body.rol };
    state.cuentas.push(Cuenta {
        usuario: usuario.clone(),
        contrasena: body.contrasena,
        token: format!("tok-{id}"),
    });
    Json(json!({ "usuario": usuario })).into_response()
}


async fn obtener(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let state = state.lock().unwrap();
    gestor!(state, headers);
    let correo = query.get("correo").cloned().unwrap_or_default();
    match state.cuentas.iter().find(|c| c.usuario.correo == correo) {
        Some(c) => Json(json!({ "usuario": c.usuario })).into_response(),
        None => error(StatusCode::NOT_FOUND, "Usuario no encontrado"),
    }
}


async fn cambiar_contrasena(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<ChangePasswordRequest>,
) -> Response {
    let mut state = state.lock().unwrap();
    let cuenta = autenticado!(state, headers);
    if cuenta.contrasena != body.contrasena_actual {
        return error(StatusCode::BAD_REQUEST, "Contraseña actual incorrecta");
    }
    if let Some(actual) = state.cuentas.iter_mut().find(|c| c.token == cuenta.token) {
        actual.contrasena = body.nueva_contrasena;
    }
    Json(json!({ "ok": true })).into_response()
}


async fn listar_usuarios(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<ListUsuariosRequest>,
) -> Response {
    let state = state.lock().unwrap();
    gestor!(state, headers);
    let usuarios: Vec<Usuario> = state.cuentas.iter().map(|c| c.usuario.clone()).collect();
    let (contents, last_key) = paginar(&usuarios, body.limit, body.last_key.as_deref());
    Json(json!({ "contents": contents, "last_key": last_key })).into_response()
}


async fn crear_empleado(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<CrearEmpleadoRequest>,
) -> Response {
    let mut state = state.lock().unwrap();
    gestor!(state, headers);
    let empleado = Empleado {
        empleado_id: Some(state.next_id("emp")),
        nombre: body.nombre,
        tipo_area: body.tipo_area,
        estado: body.estado,
        contacto: body.contacto,
    };
    state.empleados.push(empleado.clone());
    Json(json!({ "empleado": empleado })).into_response()
}


async fn listar_empleados(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<ListarEmpleadosRequest>,
) -> Response {
    let state = state.lock().unwrap();
    gestor!(state, headers);
    let empleados: Vec<Empleado> = state
        .empleados
        .iter()
        .filter(|e| body.estado.as_ref().is_none_or(|estado| &e.estado == estado))
        .cloned()
        .collect();
    let (contents, last_key) = paginar(&empleados, body.limit, body.last_key.as_deref());
    Json(json!({ "contents": contents, "last_key": last_key })).into_response()
}


async fn crear_incidente(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<CrearIncidenteRequest>,
) -> Response {
    let mut state = state.lock().unwrap();
    let cuenta = autenticado!(state, headers);
    let incidente_id = state.next_id("inc");
    state.incidentes.push(Incidente {
        incidente_id: incidente_id.clone(),
        titulo: body.titulo,
        descripcion: body.descripcion,
        piso: body.piso,
        ubicacion: body.ubicacion,
        tipo: body.tipo,
        nivel_urgencia: body.nivel_urgencia,
        estado: Some(EstadoIncidente::Pendiente),
        usuario_correo: Some(cuenta.usuario.correo),
    });
    Json(json!({ "incidente_id": incidente_id })).into_response()
}


async fn actualizar_incidente(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<ActualizarIncidenteRequest>,
) -> Response {
    let mut state = state.lock().unwrap();
    let cuenta = autenticado!(state, headers);
    let Some(incidente) = state.incidentes.iter_mut().find(|i| i.incidente_id == body.incidente_id) else {
        return error(StatusCode::NOT_FOUND, "Incidente no encontrado");
    };
    if incidente.usuario_correo.as_deref() != Some(cuenta.usuario.correo.as_str()) {
        return error(StatusCode::FORBIDDEN, "No autorizado");
    }
    incidente.titulo = body.titulo;
    incidente.descripcion = body.descripcion;
    incidente.piso = body.piso;
    incidente.ubicacion = body.ubicacion;
    incidente.tipo = body.tipo;
    incidente.nivel_urgencia = body.nivel_urgencia;
    Json(json!({ "incidente": incidente })).into_response()
}


async fn actualizar_estado(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<ActualizarEstadoIncidenteRequest>,
) -> Response {
    let mut state = state.lock().unwrap();
    gestor!(state, headers);
    if state.fallar_estado {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Error interno");
    }
    let Some(incidente) = state.incidentes.iter_mut().find(|i| i.incidente_id == body.incidente_id) else {
        return error(StatusCode::NOT_FOUND, "Incidente no encontrado");
    };
    incidente.estado = Some(body.estado);
    Json(json!({ "incidente": incidente })).into_response()
}


async fn buscar_incidente(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<BuscarIncidenteRequest>,
) -> Response {
    let state = state.lock().unwrap();
    gestor!(state, headers);
    match state.incidentes.iter().find(|i| i.incidente_id == body.incidente_id) {
        Some(incidente) => Json(json!({ "incidente": incidente })).into_response(),
        None => error(StatusCode::NOT_FOUND, "Incidente no encontrado"),
    }
}


async fn listar_incidentes(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<ListarIncidentesRequest>,
) -> Response {
    let state = state.lock().unwrap();
    let cuenta = autenticado!(state, headers);
    if state.fallar_listar {
        return error(StatusCode::SERVICE_UNAVAILABLE, "Servicio no disponible");
    }
    let visibles: Vec<Incidente> = if cuenta.usuario.rol.gestiona_incidentes() {
        state.incidentes.clone()
    } else {
        state
            .incidentes
            .iter()
            .filter(|i| i.usuario_correo.as_deref() == Some(cuenta.usuario.correo.as_str()))
            .cloned()
            .map(|mut i| {
                i.usuario_correo = None;
                i
            })
            .collect()
    };
    let (contents, last_key) = paginar(&visibles, body.size, body.last_key.as_deref());
    Json(json!({ "contents": contents, "last_key": last_key })).into_response()
}
