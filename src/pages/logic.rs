//! Páginas: estado local, carga de datos y acciones por rol.
//!
//! Ninguna acción modifica la lista local de forma optimista. Tras cada cambio de
//! estado se vuelve a leer la lista completa del servidor; si algo falla, la
//! lista anterior queda intacta.


use chrono::{DateTime, Utc};
use tracing::{debug, error, info, instrument, warn};
use crate::config::pages::{MIN_PASSWORD_LEN, PANEL_SIZE, REPORTES_SIZE};
use crate::context::domain::AppContext;
use crate::services::incidentes::{
    actualizar_estado_incidente, actualizar_incidente, crear_incidente, listar_incidentes,
    ActualizarEstadoIncidenteRequest, ActualizarIncidenteRequest, CrearIncidenteRequest,
    CrearIncidenteResponse, Evidencias, Incidente, ListarIncidentesRequest,
    NivelUrgencia, TipoIncidente, Ubicacion,
};
use crate::services::usuario::{change_my_password, get_my_user, ChangePasswordRequest, Rol, Usuario};
use crate::session::domain::RegisterRequest;
use super::domain::{Accion, Analitica, Estadisticas, PageError, ValidationError};


/// Panel de gestión de incidentes (personal administrativo y autoridad).
#[derive(Debug)]
pub struct Panel {
    ctx: AppContext,
    pub usuario: Option<Usuario>,
    pub incidentes: Vec<Incidente>,
    pub cargando: bool,
    pub actualizado_en: Option<DateTime<Utc>>,
}


impl Panel {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            usuario: None,
            incidentes: Vec::new(),
            cargando: true,
            actualizado_en: None,
        }
    }

    /// Obtiene el usuario actual y una página de incidentes.
    #[instrument(name = "panel_cargar", skip(self))]
    pub async fn cargar(&mut self) -> Result<(), PageError> {
        let result = self.cargar_inner().await;
        self.cargando = false;
        if let Err(e) = &result {
            error!("Error: al obtener datos del panel: {}", e);
        }
        result
    }

    async fn cargar_inner(&mut self) -> Result<(), PageError> {
        if self.ctx.session.session().is_none() {
            return Err(ValidationError::SinSesion.into());
        }
        let response = get_my_user(&self.ctx.api).await?;
        self.usuario = Some(response.usuario);
        self.refrescar().await
    }

    pub fn rol(&self) -> Option<Rol> {
        self.usuario.as_ref().map(|u| u.rol)
    }

    pub fn estadisticas(&self) -> Estadisticas {
        Estadisticas::de(&self.incidentes)
    }

    pub fn analitica(&self) -> Analitica {
        Analitica::de(&self.incidentes)
    }

    /// `pendiente -> en_progreso`.
    #[instrument(name = "panel_iniciar_atencion", skip(self))]
    pub async fn iniciar_atencion(&mut self, incidente_id: &str) -> Result<(), PageError> {
        self.exigir_gestor()?;
        self.exigir_accion(incidente_id, Accion::IniciarAtencion)?;
        self.transicionar(incidente_id, Accion::IniciarAtencion).await
    }

    /// `en_progreso -> resuelto`. Los detalles se registran sólo en el cliente.
    #[instrument(name = "panel_completar", skip(self, detalles))]
    pub async fn completar(&mut self, incidente_id: &str, detalles: &str) -> Result<(), PageError> {
        if detalles.trim().is_empty() {
            return Err(ValidationError::DetallesVacios.into());
        }
        self.exigir_gestor()?;
        self.exigir_accion(incidente_id, Accion::Completar)?;
        self.transicionar(incidente_id, Accion::Completar).await?;
        // TODO: enviar los detalles cuando el backend exponga un endpoint de resolución.
        info!(incidente_id, detalles = detalles.trim(), "Info: detalles de solución");
        Ok(())
    }

    async fn transicionar(&mut self, incidente_id: &str, accion: Accion) -> Result<(), PageError> {
        actualizar_estado_incidente(&self.ctx.api, &ActualizarEstadoIncidenteRequest {
            incidente_id: incidente_id.to_string(),
            estado: accion.destino(),
        })
        .await
        .inspect_err(|e| warn!("Warning: no se pudo actualizar el estado: {}", e))?;

        self.refrescar().await
    }

    async fn refrescar(&mut self) -> Result<(), PageError> {
        let response = listar_incidentes(&self.ctx.api, &ListarIncidentesRequest {
            size: PANEL_SIZE,
            last_key: None,
        })
        .await?;
        debug!(total = response.contents.len(), "Debug: incidentes recibidos");
        self.incidentes = response.contents;
        self.actualizado_en = Some(Utc::now());
        Ok(())
    }

    fn exigir_gestor(&self) -> Result<(), ValidationError> {
        match self.rol() {
            Some(rol) if rol.gestiona_incidentes() => Ok(()),
            Some(rol) => Err(ValidationError::RolNoAutorizado(rol)),
            None => Err(ValidationError::SinSesion),
        }
    }

    fn exigir_accion(&self, incidente_id: &str, accion: Accion) -> Result<(), ValidationError> {
        let incidente = self
            .incidentes
            .iter()
            .find(|i| i.incidente_id == incidente_id)
            .ok_or_else(|| ValidationError::IncidenteNoEncontrado(incidente_id.to_string()))?;

        if Accion::para(incidente.estado.as_ref()) == Some(accion) {
            Ok(())
        } else {
            Err(ValidationError::TransicionInvalida {
                incidente_id: incidente_id.to_string(),
                actual: incidente
                    .estado
                    .as_ref()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "sin estado".to_string()),
                destino: accion.destino().to_string(),
            })
        }
    }
}


/// Listado simple de reportes.
#[derive(Debug, Default)]
pub struct PaginaReportes {
    pub incidentes: Vec<Incidente>,
    pub cargando: bool,
    pub error: Option<String>,
}


impl PaginaReportes {
    pub const ERROR_CARGA: &'static str = "No se pudieron cargar los reportes. Intenta nuevamente.";

    pub async fn cargar(&mut self, ctx: &AppContext) {
        self.cargando = true;
        match listar_incidentes(&ctx.api, &ListarIncidentesRequest { size: REPORTES_SIZE, last_key: None }).await {
            Ok(response) => {
                self.incidentes = response.contents;
                self.error = None;
            }
            Err(e) => {
                error!("Error: al cargar reportes: {}", e);
                self.error = Some(Self::ERROR_CARGA.to_string());
            }
        }
        self.cargando = false;
    }
}


fn validar_contrasena(contrasena: &str, confirmacion: &str) -> Result<(), ValidationError> {
    if contrasena != confirmacion {
        return Err(ValidationError::PasswordMismatch);
    }
    // Cuenta caracteres Unicode; difiere de un conteo UTF-16 sólo fuera del plano básico.
    if contrasena.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort { min: MIN_PASSWORD_LEN });
    }
    Ok(())
}


#[derive(Debug, Clone)]
pub struct FormularioRegistro {
    pub nombre: String,
    pub correo: String,
    pub contrasena: String,
    pub confirmar: String,
    pub rol: Rol,
}


impl FormularioRegistro {
    pub const ERROR_GENERICO: &'static str = "Error al registrarse. Intenta nuevamente.";

    pub fn validar(&self) -> Result<RegisterRequest, ValidationError> {
        validar_contrasena(&self.contrasena, &self.confirmar)?;
        Ok(RegisterRequest {
            nombre: self.nombre.clone(),
            correo: self.correo.clone(),
            contrasena: self.contrasena.clone(),
            rol: self.rol,
        })
    }

    /// Valida y registra. Ante un error de validación no se hace ninguna petición.
    pub async fn enviar(&self, ctx: &AppContext) -> Result<(), PageError> {
        let request = self.validar()?;
        ctx.session.register(&ctx.api, &request).await?;
        Ok(())
    }
}


#[derive(Debug, Clone)]
pub struct FormularioContrasena {
    pub actual: String,
    pub nueva: String,
    pub confirmar: String,
}


impl FormularioContrasena {
    pub async fn enviar(&self, ctx: &AppContext) -> Result<bool, PageError> {
        validar_contrasena(&self.nueva, &self.confirmar)?;
        let response = change_my_password(&ctx.api, &ChangePasswordRequest {
            contrasena_actual: self.actual.clone(),
            nueva_contrasena: self.nueva.clone(),
        })
        .await?;
        Ok(response.ok)
    }
}


/// Alta y edición de incidentes por parte del estudiante.
#[derive(Debug, Clone)]
pub struct FormularioIncidente {
    pub titulo: String,
    pub descripcion: String,
    pub piso: i64,
    pub ubicacion: Ubicacion,
    pub tipo: TipoIncidente,
    pub nivel_urgencia: NivelUrgencia,
    /// Evidencia ya codificada en base64.
    pub evidencia: Option<String>,
}


impl FormularioIncidente {
    fn validar(&self) -> Result<(), ValidationError> {
        if self.titulo.trim().is_empty() {
            return Err(ValidationError::CampoVacio("titulo"));
        }
        if self.descripcion.trim().is_empty() {
            return Err(ValidationError::CampoVacio("descripcion"));
        }
        Ok(())
    }

    pub async fn crear(&self, ctx: &AppContext) -> Result<CrearIncidenteResponse, PageError> {
        self.validar()?;
        let response = crear_incidente(&ctx.api, &CrearIncidenteRequest {
            titulo: self.titulo.clone(),
            descripcion: self.descripcion.clone(),
            piso: self.piso,
            ubicacion: self.ubicacion,
            tipo: self.tipo.clone(),
            nivel_urgencia: self.nivel_urgencia.clone(),
            evidencias: self.evidencia.clone().map(|file_base64| Evidencias { file_base64 }),
        })
        .await?;
        info!(incidente_id = %response.incidente_id, "Info: incidente creado");
        Ok(response)
    }

    pub async fn editar(&self, ctx: &AppContext, incidente_id: &str) -> Result<Incidente, PageError> {
        self.validar()?;
        let response = actualizar_incidente(&ctx.api, &ActualizarIncidenteRequest {
            incidente_id: incidente_id.to_string(),
            titulo: self.titulo.clone(),
            descripcion: self.descripcion.clone(),
            piso: self.piso,
            ubicacion: self.ubicacion,
            tipo: self.tipo.clone(),
            nivel_urgencia: self.nivel_urgencia.clone(),
        })
        .await?;
        Ok(response.incidente)
    }
}
