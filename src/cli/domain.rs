//! Argumentos de la línea de comandos.
//!
//! Cada subcomando corresponde a una página o a una operación de servicio:
//! - `login`, `registro`, `logout`, `sesion` - manejo de sesión
//! - `panel` - panel de gestión según el rol del usuario
//! - `reportes` - listado de reportes
//! - `incidentes ...`, `usuarios ...`, `empleados ...` - operaciones por recurso


use std::path::PathBuf;
use clap::{Args, Parser, Subcommand};
use crate::services::empleados::{EstadoEmpleado, TipoArea};
use crate::services::incidentes::{NivelUrgencia, TipoIncidente};
use crate::services::usuario::Rol;


#[derive(Parser, Debug)]
#[command(name = "alerta")]
#[command(author, version, about = "Cliente de AlertaUTEC para reportar y gestionar incidentes del campus", long_about = None)]
pub struct Cli {
    /// Sobrescribe el nivel de log (RUST_LOG)
    #[arg(short, long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}


#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inicia sesión y guarda el token
    Login {
        #[arg(long)]
        correo: String,
        #[arg(long, env = "ALERTA_CONTRASENA", hide_env_values = true)]
        contrasena: String,
    },

    /// Crea una cuenta e inicia sesión
    Registro {
        #[arg(long)]
        nombre: String,
        #[arg(long)]
        correo: String,
        #[arg(long)]
        contrasena: String,
        /// Confirmación de la contraseña
        #[arg(long)]
        confirmar: String,
        #[arg(long, default_value = "estudiante")]
        rol: Rol,
    },

    /// Cierra la sesión y borra el token guardado
    Logout,

    /// Muestra el estado de la sesión
    Sesion,

    /// Panel de incidentes según el rol
    Panel,

    /// Lista los reportes de incidentes
    Reportes,

    #[command(subcommand)]
    Incidentes(IncidentesCommands),

    #[command(subcommand)]
    Usuarios(UsuariosCommands),

    #[command(subcommand)]
    Empleados(EmpleadosCommands),
}


#[derive(Args, Debug, Clone)]
pub struct IncidenteArgs {
    #[arg(long)]
    pub titulo: String,
    #[arg(long)]
    pub descripcion: String,
    #[arg(long)]
    pub piso: i64,
    #[arg(long, allow_negative_numbers = true)]
    pub x: f64,
    #[arg(long, allow_negative_numbers = true)]
    pub y: f64,
    /// mantenimiento, seguridad, infraestructura, servicios, emergencia, limpieza...
    #[arg(long)]
    pub tipo: TipoIncidente,
    /// bajo, medio, alto
    #[arg(long)]
    pub urgencia: NivelUrgencia,
    /// Archivo de evidencia; se envía codificado en base64
    #[arg(long)]
    pub evidencia: Option<PathBuf>,
}


#[derive(Subcommand, Debug)]
pub enum IncidentesCommands {
    /// Reporta un incidente (estudiante)
    Crear(IncidenteArgs),

    /// Edita un incidente propio (estudiante)
    Editar {
        id: String,
        #[command(flatten)]
        datos: IncidenteArgs,
    },

    /// Muestra un incidente
    Buscar { id: String },

    /// Pasa un incidente pendiente a en progreso
    Atender { id: String },

    /// Marca un incidente en progreso como resuelto
    Completar {
        id: String,
        /// Detalles de la solución
        #[arg(long)]
        detalles: String,
    },
}


#[derive(Subcommand, Debug)]
pub enum UsuariosCommands {
    /// Muestra el usuario de la sesión
    Mi,

    /// Modifica el usuario de la sesión
    Modificar {
        #[arg(long)]
        nombre: String,
        #[arg(long)]
        correo: String,
        #[arg(long)]
        contrasena: String,
    },

    /// Elimina un usuario por correo
    Eliminar { correo: String },

    /// Crea un usuario con rol explícito (autoridad)
    Crear {
        #[arg(long)]
        nombre: String,
        #[arg(long)]
        correo: String,
        #[arg(long)]
        contrasena: String,
        #[arg(long)]
        rol: Rol,
    },

    /// Busca un usuario por correo
    Obtener { correo: String },

    /// Cambia la contraseña propia
    CambiarContrasena {
        #[arg(long)]
        actual: String,
        #[arg(long)]
        nueva: String,
        #[arg(long)]
        confirmar: String,
    },

    /// Lista usuarios
    Listar {
        #[arg(long, default_value_t = crate::config::pages::LISTADO_LIMIT)]
        limit: u32,
        #[arg(long)]
        last_key: Option<String>,
    },
}


#[derive(Subcommand, Debug)]
pub enum EmpleadosCommands {
    /// Registra un empleado
    Crear {
        #[arg(long)]
        nombre: String,
        /// ti, mantenimiento, seguridad
        #[arg(long)]
        area: TipoArea,
        #[arg(long, default_value = "activo")]
        estado: EstadoEmpleado,
        #[arg(long)]
        telefono: String,
        #[arg(long)]
        correo: String,
    },

    /// Lista empleados
    Listar {
        #[arg(long, default_value_t = crate::config::pages::LISTADO_LIMIT)]
        limit: u32,
        #[arg(long)]
        last_key: Option<String>,
        #[arg(long)]
        estado: Option<EstadoEmpleado>,
    },
}
