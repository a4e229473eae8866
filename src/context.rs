//! # Contexto del Servicio
//! src/context.rs
//!
//! Todo lo que un handler necesita: la configuración, el dataset (inmutable,
//! compartido) y el pool de workers. Se construye una vez en `main`.

use crate::config::Config;
use crate::dataset::Dataset;
use crate::error::StoreError;
use crate::jobs::{ResultStore, WorkerPool};
use std::sync::Arc;

pub struct ServiceContext {
    pub config: Config,
    pub dataset: Arc<Dataset>,
    pub pool: WorkerPool,
}

impl ServiceContext {
    pub fn new(config: Config, dataset: Arc<Dataset>, pool: WorkerPool) -> Self {
        Self {
            config,
            dataset,
            pool,
        }
    }

    /// Arma el contexto a partir de la configuración: abre el directorio de
    /// resultados y crea el pool (sin arrancarlo).
    pub fn from_config(config: Config, dataset: Dataset) -> Result<Self, StoreError> {
        let results = ResultStore::new(&config.results_dir)?;
        let pool = WorkerPool::new(config.worker_count(), results);
        Ok(Self::new(config, Arc::new(dataset), pool))
    }
}
