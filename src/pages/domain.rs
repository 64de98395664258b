//! Agregados derivados, etiquetas y errores de las páginas.
//!
//! Todo lo de este módulo es puro: se calcula a partir de la lista de incidentes
//! ya obtenida, sin llamadas de red.


use std::collections::BTreeMap;
use thiserror::Error;
use crate::api::domain::ApiError;
use crate::services::incidentes::{EstadoIncidente, Incidente, NivelUrgencia};
use crate::services::usuario::Rol;
use crate::session::domain::SessionError;
use crate::storage::domain::StorageError;


/// Errores de validación del lado del cliente. Nunca llegan a la red.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Las contraseñas no coinciden")]
    PasswordMismatch,

    #[error("La contraseña debe tener al menos {min} caracteres")]
    PasswordTooShort { min: usize },

    #[error("El campo {0} es obligatorio")]
    CampoVacio(&'static str),

    #[error("Por favor ingresa los detalles de la solución")]
    DetallesVacios,

    #[error("No hay una sesión activa")]
    SinSesion,

    #[error("El rol {0} no puede realizar esta acción")]
    RolNoAutorizado(Rol),

    #[error("El incidente {0} no está en la lista cargada")]
    IncidenteNoEncontrado(String),

    #[error("El incidente {incidente_id} está {actual} y no puede pasar a {destino}")]
    TransicionInvalida {
        incidente_id: String,
        actual: String,
        destino: String,
    },
}


#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}


impl From<SessionError> for PageError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Api(e) => PageError::Api(e),
            SessionError::Storage(e) => PageError::Storage(e),
        }
    }
}


impl PageError {
    /// Mensaje para mostrar: la validación tal cual, el mensaje del servidor si
    /// lo hay, o `fallback`. Los fallos de almacenamiento ocurren después de que
    /// el servidor aceptó la petición, así que nunca usan `fallback`.
    pub fn mensaje(&self, fallback: &str) -> String {
        match self {
            PageError::Validation(e) => e.to_string(),
            PageError::Api(e) => e.user_message(fallback),
            PageError::Storage(e) => format!("No se pudo guardar la sesión: {e}"),
        }
    }
}


pub fn estado_label(estado: Option<&EstadoIncidente>) -> &'static str {
    match estado {
        Some(EstadoIncidente::Pendiente) => "Pendiente",
        Some(EstadoIncidente::EnProgreso) => "En Progreso",
        Some(EstadoIncidente::Resuelto) => "Resuelto",
        _ => "Sin estado",
    }
}


pub fn urgencia_label(urgencia: &NivelUrgencia) -> &str {
    match urgencia {
        NivelUrgencia::Alto => "Alta",
        NivelUrgencia::Medio => "Media",
        NivelUrgencia::Bajo => "Baja",
        NivelUrgencia::Otro(value) => value.as_str(),
    }
}


/// `parte / total × 100` con un decimal, redondeando los empates hacia arriba;
/// `"0"` si `total` es cero.
pub fn porcentaje(parte: usize, total: usize) -> String {
    if total == 0 {
        return "0".to_string();
    }
    // Décimas de punto porcentual en enteros: evita el redondeo a par de `{:.1}`.
    let decimas = (parte as u128 * 2000 / total as u128 + 1) / 2;
    format!("{}.{}", decimas / 10, decimas % 10)
}


/// Conteo por estado. Los incidentes sin estado o con un estado desconocido sólo
/// cuentan en `total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Estadisticas {
    pub pendientes: usize,
    pub en_progreso: usize,
    pub resueltos: usize,
    pub total: usize,
}


impl Estadisticas {
    pub fn de(incidentes: &[Incidente]) -> Self {
        let mut stats = Estadisticas { total: incidentes.len(), ..Default::default() };
        for incidente in incidentes {
            match incidente.estado {
                Some(EstadoIncidente::Pendiente) => stats.pendientes += 1,
                Some(EstadoIncidente::EnProgreso) => stats.en_progreso += 1,
                Some(EstadoIncidente::Resuelto) => stats.resueltos += 1,
                _ => {}
            }
        }
        stats
    }
}


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analitica {
    pub total: usize,
    pub por_estado: Estadisticas,
    pub por_tipo: BTreeMap<String, usize>,
    pub por_urgencia: BTreeMap<String, usize>,
    pub por_piso: BTreeMap<i64, usize>,
    pub tasa_resolucion: String,
}


impl Analitica {
    pub fn de(incidentes: &[Incidente]) -> Self {
        let por_estado = Estadisticas::de(incidentes);
        let mut por_tipo = BTreeMap::new();
        let mut por_urgencia = BTreeMap::new();
        let mut por_piso = BTreeMap::new();

        for incidente in incidentes {
            *por_tipo.entry(incidente.tipo.to_string()).or_insert(0) += 1;
            *por_urgencia.entry(incidente.nivel_urgencia.to_string()).or_insert(0) += 1;
            *por_piso.entry(incidente.piso).or_insert(0) += 1;
        }

        Analitica {
            total: incidentes.len(),
            tasa_resolucion: porcentaje(por_estado.resueltos, incidentes.len()),
            por_estado,
            por_tipo,
            por_urgencia,
            por_piso,
        }
    }

    pub fn porcentaje_pendientes(&self) -> String {
        porcentaje(self.por_estado.pendientes, self.total)
    }

    pub fn porcentaje_en_progreso(&self) -> String {
        porcentaje(self.por_estado.en_progreso, self.total)
    }

    pub fn porcentaje_resueltos(&self) -> String {
        porcentaje(self.por_estado.resueltos, self.total)
    }
}


/// Acciones de cambio de estado disponibles para personal y autoridad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accion {
    /// `pendiente -> en_progreso`
    IniciarAtencion,
    /// `en_progreso -> resuelto`, exige detalles de la solución.
    Completar,
}


impl Accion {
    /// Acción ofrecida para un incidente en `estado`. No hay vuelta atrás.
    ///
    /// Un estado ausente o desconocido se trata como pendiente.
    pub fn para(estado: Option<&EstadoIncidente>) -> Option<Accion> {
        match estado {
            Some(EstadoIncidente::Resuelto) => None,
            Some(EstadoIncidente::EnProgreso) => Some(Accion::Completar),
            Some(EstadoIncidente::Pendiente) | Some(EstadoIncidente::Otro(_)) | None => {
                Some(Accion::IniciarAtencion)
            }
        }
    }

    pub fn destino(&self) -> EstadoIncidente {
        match self {
            Accion::IniciarAtencion => EstadoIncidente::EnProgreso,
            Accion::Completar => EstadoIncidente::Resuelto,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Accion::IniciarAtencion => "Marcar en Progreso",
            Accion::Completar => "Completar",
        }
    }
}
