pub mod api {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
    pub const USER_AGENT: &str = concat!("alerta-utec/", env!("CARGO_PKG_VERSION"));
}

pub mod pages {
    /// Tamaño de página usado por los paneles de personal y autoridad.
    pub const PANEL_SIZE: u32 = 100;
    /// Tamaño de página de la vista de reportes.
    pub const REPORTES_SIZE: u32 = 50;
    pub const LISTADO_LIMIT: u32 = 20;
    pub const MIN_PASSWORD_LEN: usize = 6;
}

pub mod storage {
    pub const TOKEN_KEY: &str = "token";
    pub const DEFAULT_DIR: &str = ".alerta_utec";
    pub const DEFAULT_FILE: &str = "storage.json";
}
