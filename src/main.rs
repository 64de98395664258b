use clap::Parser;
use tracing::{error, info};
use crate::cli::domain::Cli;
use crate::cli::logic::run;
use crate::context::domain::AppContext;
use crate::system::domain::{init_tracing, System};

mod api;
mod cli;
mod config;
mod context;
mod pages;
mod services;
mod session;
mod storage;
mod system;

#[cfg(test)]
mod test_support;


#[tokio::main]
async fn main() -> anyhow::Result<()> {

    let cli = Cli::parse();

    let mut system = System::new()?;
    if let Some(level) = &cli.log_level {
        system.rust_log = level.clone();
    }
    init_tracing(&system);
    info!("Info: AlertaUTEC iniciado en entorno {}", system.environment);

    let app_context = AppContext::new(system)?;

    match run(cli, &app_context).await {
        Ok(salida) => {
            println!("{}", salida.trim_end());
            Ok(())
        }
        Err(e) => {
            error!("Error: {:#}", e);
            Err(e)
        }
    }
}
