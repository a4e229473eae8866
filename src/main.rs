//! # Stats Server - Entry Point
//! src/main.rs
//!
//! Carga la configuración y el dataset, arranca el pool de workers y atiende
//! HTTP hasta que el proceso termina.

use stats_server::config::Config;
use stats_server::context::ServiceContext;
use stats_server::dataset::Dataset;
use stats_server::logging::init_logging;
use stats_server::server::Server;
use std::process;
use std::sync::Arc;

fn main() {
    let config = Config::new();
    init_logging(&config.log_level);

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "invalid configuration");
        process::exit(1);
    }
    config.print_summary();

    let dataset = match Dataset::from_csv_path(&config.dataset_path) {
        Ok(dataset) => dataset,
        Err(e) => {
            tracing::error!(path = %config.dataset_path, error = %e, "failed to load dataset");
            process::exit(1);
        }
    };

    let ctx = match ServiceContext::from_config(config, dataset) {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!(error = %e, "failed to open results dir");
            process::exit(1);
        }
    };

    if let Err(e) = ctx.pool.start() {
        tracing::error!(error = %e, "failed to start worker pool");
        process::exit(1);
    }

    let server = Server::new(Arc::new(ctx));
    if let Err(e) = server.run() {
        tracing::error!(error = %e, "server error");
        process::exit(1);
    }
}
