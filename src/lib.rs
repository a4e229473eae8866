//! # Stats Server
//! src/lib.rs
//!
//! Servidor HTTP/1.0 que calcula agregados estadísticos (medias, rankings,
//! diferencias contra la media global) sobre un dataset de salud pública
//! indexado por región, pregunta y estratificación demográfica.
//!
//! El cliente envía una pregunta (y opcionalmente una región), recibe un id
//! de job de inmediato, y consulta el resultado más tarde.
//!
//! ## Arquitectura
//!
//! - `dataset`: carga del CSV y estructura de consulta inmutable
//! - `operations`: catálogo de agregaciones y extracción de datos por petición
//! - `jobs`: job, cola FIFO, pool de workers, result store y handlers de la API
//! - `http`, `router`, `server`: HTTP/1.0 sobre TCP
//! - `config`, `logging`, `error`, `context`: soporte
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use stats_server::config::Config;
//! use stats_server::context::ServiceContext;
//! use stats_server::dataset::Dataset;
//! use stats_server::server::Server;
//! use std::sync::Arc;
//!
//! let config = Config::default();
//! let dataset = Dataset::from_csv_path(&config.dataset_path).unwrap();
//! let ctx = ServiceContext::from_config(config, dataset).unwrap();
//! ctx.pool.start().unwrap();
//! Server::new(Arc::new(ctx)).run().unwrap();
//! ```

pub mod config;
pub mod context;
pub mod dataset;
pub mod error;
pub mod http;
pub mod jobs;
pub mod logging;
pub mod operations;
pub mod router;
pub mod server;
