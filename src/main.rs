mod cli;

use actix_web::{web, App, HttpServer};
use annvec::{Config, QueryEngine};
use tracing_subscriber::EnvFilter;

fn to_io_error(err: annvec::VecError) -> std::io::Error {
    std::io::Error::other(err.to_string())
}

#[actix_web::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let raw_args: Vec<String> = std::env::args().collect();
    let (config_path, args) = match cli::split_config_flag(&raw_args) {
        Ok(split) => split,
        Err(error) => {
            eprintln!("Error: {}", error);
            std::process::exit(1);
        }
    };

    if args.len() == 1 {
        let engine_config = cli::engine_config(config_path.as_deref()).map_err(to_io_error)?;
        let mut engine = QueryEngine::new(engine_config).map_err(to_io_error)?;
        cli::run_repl(&mut engine);
    } else if args[1] == "serve" {
        let config = match args.get(2).or(config_path.as_ref()) {
            Some(path) => Config::load(path).map_err(to_io_error)?,
            None => Config::default(),
        };
        let engine = web::Data::new(QueryEngine::new(config.engine).map_err(to_io_error)?);

        tracing::info!(bind = %config.server.bind, "starting annvec server");
        HttpServer::new(move || App::new().app_data(engine.clone()).configure(annvec::server::config))
            .bind(config.server.bind.as_str())?
            .run()
            .await?;
    } else {
        cli::run_single_command(&args, config_path.as_deref());
    }

    Ok(())
}
