use std::fmt::Write as _;
use anyhow::{anyhow, Context, Result};
use base64::Engine as _;
use tracing::warn;
use crate::context::domain::AppContext;
use crate::pages::domain::{estado_label, urgencia_label, Accion, Analitica, Estadisticas, PageError};
use crate::pages::logic::{FormularioContrasena, FormularioIncidente, FormularioRegistro, PaginaReportes, Panel};
use crate::services::empleados::{
    crear_empleado, listar_empleados, CrearEmpleadoRequest, Empleado, EmpleadoContacto,
    ListarEmpleadosRequest,
};
use crate::services::incidentes::{buscar_incidente, BuscarIncidenteRequest, Incidente, Ubicacion};
use crate::services::usuario::{
    create_user_as_autoridad, delete_user_by_correo, get_my_user, get_user_by_correo,
    list_usuarios, update_my_user, CreateUserAsAutoridadRequest, ListUsuariosRequest, Rol,
    UpdateMyUserRequest, Usuario,
};
use crate::session::domain::{LoginRequest, SessionState};
use super::domain::{Cli, Commands, EmpleadosCommands, IncidenteArgs, IncidentesCommands, UsuariosCommands};


const ERROR_GENERICO: &str = "Ocurrió un error. Intenta nuevamente.";


/// Ejecuta un comando y devuelve el texto a mostrar.
pub async fn run(cli: Cli, ctx: &AppContext) -> Result<String> {
    if let Err(e) = ctx.session.start().await {
        warn!("Warning: se continúa sin sesión: {}", e);
    }

    match cli.command {
        Commands::Login { correo, contrasena } => {
            ctx.session
                .login(&ctx.api, &LoginRequest { correo, contrasena })
                .await
                .map_err(|e| fallo(PageError::from(e), "Credenciales inválidas"))?;
            Ok("Sesión iniciada".to_string())
        }

        Commands::Registro { nombre, correo, contrasena, confirmar, rol } => {
            FormularioRegistro { nombre, correo, contrasena, confirmar, rol }
                .enviar(ctx)
                .await
                .map_err(|e| fallo(e, FormularioRegistro::ERROR_GENERICO))?;
            Ok("Cuenta creada, sesión iniciada".to_string())
        }

        Commands::Logout => {
            ctx.session.logout().await.context("no se pudo borrar el token guardado")?;
            Ok("Sesión cerrada".to_string())
        }

        Commands::Sesion => Ok(render_sesion(&ctx.session.state())),

        Commands::Panel => {
            let mut panel = Panel::new(ctx.clone());
            panel.cargar().await.map_err(|e| fallo(e, ERROR_GENERICO))?;
            Ok(render_panel(&panel))
        }

        Commands::Reportes => {
            let mut pagina = PaginaReportes::default();
            pagina.cargar(ctx).await;
            match pagina.error {
                Some(mensaje) => Err(anyhow!(mensaje)),
                None => Ok(render_lista(&pagina.incidentes)),
            }
        }

        Commands::Incidentes(command) => run_incidentes(command, ctx).await,
        Commands::Usuarios(command) => run_usuarios(command, ctx).await,
        Commands::Empleados(command) => run_empleados(command, ctx).await,
    }
}


async fn run_incidentes(command: IncidentesCommands, ctx: &AppContext) -> Result<String> {
    match command {
        IncidentesCommands::Crear(args) => {
            let response = formulario(args)
                .await?
                .crear(ctx)
                .await
                .map_err(|e| fallo(e, "No se pudo reportar el incidente"))?;
            Ok(format!("Incidente reportado: {}", response.incidente_id))
        }

        IncidentesCommands::Editar { id, datos } => {
            let incidente = formulario(datos)
                .await?
                .editar(ctx, &id)
                .await
                .map_err(|e| fallo(e, "No se pudo actualizar el incidente"))?;
            Ok(render_incidente(&incidente))
        }

        IncidentesCommands::Buscar { id } => {
            let response = buscar_incidente(&ctx.api, &BuscarIncidenteRequest { incidente_id: id })
                .await
                .map_err(|e| fallo(e.into(), "No se encontró el incidente"))?;
            Ok(render_incidente(&response.incidente))
        }

        IncidentesCommands::Atender { id } => {
            let mut panel = Panel::new(ctx.clone());
            panel.cargar().await.map_err(|e| fallo(e, ERROR_GENERICO))?;
            panel
                .iniciar_atencion(&id)
                .await
                .map_err(|e| fallo(e, "No se pudo actualizar el estado del incidente"))?;
            Ok(render_panel(&panel))
        }

        IncidentesCommands::Completar { id, detalles } => {
            let mut panel = Panel::new(ctx.clone());
            panel.cargar().await.map_err(|e| fallo(e, ERROR_GENERICO))?;
            panel
                .completar(&id, &detalles)
                .await
                .map_err(|e| fallo(e, "No se pudo completar el incidente"))?;
            Ok(render_panel(&panel))
        }
    }
}


async fn run_usuarios(command: UsuariosCommands, ctx: &AppContext) -> Result<String> {
    match command {
        UsuariosCommands::Mi => {
            let response = get_my_user(&ctx.api).await.map_err(|e| fallo(e.into(), ERROR_GENERICO))?;
            Ok(render_usuario(&response.usuario))
        }

        UsuariosCommands::Modificar { nombre, correo, contrasena } => {
            let response = update_my_user(&ctx.api, &UpdateMyUserRequest { correo, nombre, contrasena })
                .await
                .map_err(|e| fallo(e.into(), ERROR_GENERICO))?;
            Ok(render_usuario(&response.usuario))
        }

        UsuariosCommands::Eliminar { correo } => {
            delete_user_by_correo(&ctx.api, &correo)
                .await
                .map_err(|e| fallo(e.into(), ERROR_GENERICO))?;
            Ok(format!("Usuario {correo} eliminado"))
        }

        UsuariosCommands::Crear { nombre, correo, contrasena, rol } => {
            let response = create_user_as_autoridad(&ctx.api, &CreateUserAsAutoridadRequest {
                nombre,
                correo,
                contrasena,
                rol,
            })
            .await
            .map_err(|e| fallo(e.into(), ERROR_GENERICO))?;
            Ok(render_usuario(&response.usuario))
        }

        UsuariosCommands::Obtener { correo } => {
            let response = get_user_by_correo(&ctx.api, &correo)
                .await
                .map_err(|e| fallo(e.into(), ERROR_GENERICO))?;
            Ok(render_usuario(&response.usuario))
        }

        UsuariosCommands::CambiarContrasena { actual, nueva, confirmar } => {
            let ok = FormularioContrasena { actual, nueva, confirmar }
                .enviar(ctx)
                .await
                .map_err(|e| fallo(e, "No se pudo cambiar la contraseña"))?;
            if ok {
                Ok("Contraseña actualizada".to_string())
            } else {
                Err(anyhow!("El servidor rechazó el cambio de contraseña"))
            }
        }

        UsuariosCommands::Listar { limit, last_key } => {
            let response = list_usuarios(&ctx.api, &ListUsuariosRequest { limit, last_key })
                .await
                .map_err(|e| fallo(e.into(), ERROR_GENERICO))?;
            let mut out = String::new();
            for usuario in &response.contents {
                let _ = writeln!(out, "{}", render_usuario(usuario));
            }
            push_cursor(&mut out, response.last_key.as_deref());
            Ok(out)
        }
    }
}


async fn run_empleados(command: EmpleadosCommands, ctx: &AppContext) -> Result<String> {
    match command {
        EmpleadosCommands::Crear { nombre, area, estado, telefono, correo } => {
            let response = crear_empleado(&ctx.api, &CrearEmpleadoRequest {
                nombre,
                tipo_area: area,
                estado,
                contacto: EmpleadoContacto { telefono, correo },
            })
            .await
            .map_err(|e| fallo(e.into(), ERROR_GENERICO))?;
            Ok(render_empleado(&response.empleado))
        }

        EmpleadosCommands::Listar { limit, last_key, estado } => {
            let response = listar_empleados(&ctx.api, &ListarEmpleadosRequest { limit, last_key, estado })
                .await
                .map_err(|e| fallo(e.into(), ERROR_GENERICO))?;
            let mut out = String::new();
            for empleado in &response.contents {
                let _ = writeln!(out, "{}", render_empleado(empleado));
            }
            push_cursor(&mut out, response.last_key.as_deref());
            Ok(out)
        }
    }
}


fn fallo(err: PageError, fallback: &str) -> anyhow::Error {
    anyhow!(err.mensaje(fallback))
}


async fn formulario(args: IncidenteArgs) -> Result<FormularioIncidente> {
    let evidencia = match &args.evidencia {
        Some(path) => {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("no se pudo leer la evidencia {}", path.display()))?;
            Some(base64::engine::general_purpose::STANDARD.encode(bytes))
        }
        None => None,
    };

    Ok(FormularioIncidente {
        titulo: args.titulo,
        descripcion: args.descripcion,
        piso: args.piso,
        ubicacion: Ubicacion { x: args.x, y: args.y },
        tipo: args.tipo,
        nivel_urgencia: args.urgencia,
        evidencia,
    })
}


fn push_cursor(out: &mut String, last_key: Option<&str>) {
    if let Some(key) = last_key {
        let _ = writeln!(out, "Siguiente página: --last-key {key}");
    }
}


pub fn render_sesion(state: &SessionState) -> String {
    match state {
        SessionState::Authenticated(_) => "Sesión activa".to_string(),
        SessionState::Loading | SessionState::Uninitialized => "Cargando...".to_string(),
        SessionState::Anonymous => "Sin sesión".to_string(),
    }
}


pub fn render_usuario(usuario: &Usuario) -> String {
    format!("{} <{}> - {}", usuario.nombre, usuario.correo, usuario.rol.label())
}


pub fn render_empleado(empleado: &Empleado) -> String {
    format!(
        "{} [{}] {} - {} / {}",
        empleado.nombre,
        empleado.tipo_area,
        empleado.estado,
        empleado.contacto.telefono,
        empleado.contacto.correo,
    )
}


pub fn render_incidente(incidente: &Incidente) -> String {
    let mut out = format!(
        "[{}] {} - {} | {} | urgencia {} | piso {} ({}, {})",
        incidente.incidente_id,
        incidente.titulo,
        estado_label(incidente.estado.as_ref()),
        incidente.tipo,
        urgencia_label(&incidente.nivel_urgencia),
        incidente.piso,
        incidente.ubicacion.x,
        incidente.ubicacion.y,
    );
    if let Some(correo) = &incidente.usuario_correo {
        let _ = write!(out, " | reportado por {correo}");
    }
    out
}


pub fn render_lista(incidentes: &[Incidente]) -> String {
    if incidentes.is_empty() {
        return "No hay incidentes reportados".to_string();
    }
    let mut out = String::new();
    for incidente in incidentes {
        let _ = writeln!(out, "{}", render_incidente(incidente));
    }
    out
}


fn render_estadisticas(out: &mut String, stats: &Estadisticas) {
    let _ = writeln!(
        out,
        "Pendientes: {} | En Progreso: {} | Resueltos: {} | Total: {}",
        stats.pendientes, stats.en_progreso, stats.resueltos, stats.total
    );
}


fn render_analitica(out: &mut String, analitica: &Analitica) {
    let _ = writeln!(out, "Total de incidentes: {}", analitica.total);
    let _ = writeln!(out, "Tasa de resolución: {}%", analitica.tasa_resolucion);
    let _ = writeln!(out, "Pendientes: {} ({}% del total)", analitica.por_estado.pendientes, analitica.porcentaje_pendientes());
    let _ = writeln!(out, "En Progreso: {} ({}% del total)", analitica.por_estado.en_progreso, analitica.porcentaje_en_progreso());
    let _ = writeln!(out, "Resueltos: {} ({}% del total)", analitica.por_estado.resueltos, analitica.porcentaje_resueltos());

    let _ = writeln!(out, "Por tipo:");
    for (tipo, cantidad) in &analitica.por_tipo {
        let _ = writeln!(out, "  {tipo}: {cantidad}");
    }
    let _ = writeln!(out, "Por urgencia:");
    for (urgencia, cantidad) in &analitica.por_urgencia {
        let _ = writeln!(out, "  {urgencia}: {cantidad}");
    }
    let _ = writeln!(out, "Por piso:");
    for (piso, cantidad) in &analitica.por_piso {
        let _ = writeln!(out, "  Piso {piso}: {cantidad}");
    }
}


/// Panel según rol: analítica para autoridad, resumen y acciones para personal,
/// listado propio para estudiantes.
pub fn render_panel(panel: &Panel) -> String {
    let mut out = String::new();
    if let Some(usuario) = &panel.usuario {
        let _ = writeln!(out, "AlertaUTEC - {}", render_usuario(usuario));
    }
    if let Some(hora) = panel.actualizado_en {
        let _ = writeln!(out, "Actualizado: {}", hora.format("%Y-%m-%d %H:%M:%S UTC"));
    }

    let rol = panel.rol();
    match rol {
        Some(Rol::Autoridad) => render_analitica(&mut out, &panel.analitica()),
        Some(Rol::PersonalAdministrativo) => render_estadisticas(&mut out, &panel.estadisticas()),
        _ => {}
    }

    if panel.incidentes.is_empty() {
        let _ = writeln!(out, "No hay incidentes reportados");
        return out;
    }

    let gestiona = rol.is_some_and(|r| r.gestiona_incidentes());
    for incidente in &panel.incidentes {
        let _ = write!(out, "{}", render_incidente(incidente));
        match Accion::para(incidente.estado.as_ref()) {
            Some(accion) if gestiona => {
                let _ = writeln!(out, " -> {}", accion.label());
            }
            _ => {
                let _ = writeln!(out);
            }
        }
    }
    out
}
