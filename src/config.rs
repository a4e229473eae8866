//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración por argumentos CLI y variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./stats_server --port 5000 \
//!   --workers 8 \
//!   --dataset ./nutrition_activity_obesity_usa_subset.csv \
//!   --results-dir ./results
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=5000 TP_NUM_OF_THREADS=4 LOG_LEVEL=debug ./stats_server
//! ```

use crate::error::ConfigError;
use clap::Parser;

/// Configuración del servidor de estadísticas
#[derive(Debug, Clone, Parser)]
#[command(name = "stats_server")]
#[command(about = "Servidor de agregaciones estadísticas sobre un dataset de salud pública")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "5000", env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    /// Número de workers del pool (por defecto, el paralelismo del host)
    #[arg(short, long, env = "TP_NUM_OF_THREADS")]
    pub workers: Option<usize>,

    /// CSV de entrada
    #[arg(
        long = "dataset",
        default_value = "./nutrition_activity_obesity_usa_subset.csv",
        env = "DATASET_PATH"
    )]
    pub dataset_path: String,

    /// Directorio de resultados (un archivo por job)
    #[arg(long = "results-dir", default_value = "./results", env = "RESULTS_DIR")]
    pub results_dir: String,

    /// Nivel de log (RUST_LOG tiene prioridad)
    #[arg(long = "log-level", default_value = "info", env = "LOG_LEVEL")]
    pub log_level: String,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Cantidad efectiva de workers
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Obtiene la dirección completa para bind (host:port)
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Valida la configuración
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == Some(0) {
            return Err(ConfigError("Workers must be >= 1".to_string()));
        }
        if self.results_dir.trim().is_empty() {
            return Err(ConfigError("Results dir must not be empty".to_string()));
        }
        if self.dataset_path.trim().is_empty() {
            return Err(ConfigError("Dataset path must not be empty".to_string()));
        }
        Ok(())
    }

    /// Registra un resumen de la configuración efectiva
    pub fn print_summary(&self) {
        tracing::info!(
            address = %self.address(),
            workers = self.worker_count(),
            dataset = %self.dataset_path,
            results_dir = %self.results_dir,
            log_level = %self.log_level,
            "configuration"
        );
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            host: "127.0.0.1".to_string(),
            workers: None,
            dataset_path: "./nutrition_activity_obesity_usa_subset.csv".to_string(),
            results_dir: "./results".to_string(),
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.workers, None);
        assert_eq!(config.results_dir, "./results");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_address() {
        let config = Config::default();
        assert_eq!(config.address(), "127.0.0.1:5000");
    }

    #[test]
    fn test_address_custom() {
        let mut config = Config::default();
        config.host = "0.0.0.0".to_string();
        config.port = 3000;
        assert_eq!(config.address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_validate_success() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    // ==================== Workers ====================

    #[test]
    fn test_worker_count_defaults_to_parallelism() {
        let config = Config::default();
        assert!(config.worker_count() >= 1);
    }

    #[test]
    fn test_worker_count_explicit() {
        let mut config = Config::default();
        config.workers = Some(3);
        assert_eq!(config.worker_count(), 3);
    }

    #[test]
    fn test_validate_invalid_workers() {
        let mut config = Config::default();
        config.workers = Some(0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Workers"));
    }

    // ==================== Paths ====================

    #[test]
    fn test_validate_empty_results_dir() {
        let mut config = Config::default();
        config.results_dir = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Results dir"));
    }

    #[test]
    fn test_validate_empty_dataset_path() {
        let mut config = Config::default();
        config.dataset_path = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Dataset path"));
    }

    // ==================== CLI ====================

    #[test]
    fn test_parse_cli_flags() {
        let config = Config::try_parse_from([
            "stats_server",
            "--port",
            "8081",
            "--workers",
            "2",
            "--results-dir",
            "/tmp/out",
            "--dataset",
            "data.csv",
        ])
        .unwrap();

        assert_eq!(config.port, 8081);
        assert_eq!(config.worker_count(), 2);
        assert_eq!(config.results_dir, "/tmp/out");
        assert_eq!(config.dataset_path, "data.csv");
    }

    #[test]
    fn test_parse_rejects_non_numeric_workers() {
        let result = Config::try_parse_from(["stats_server", "--workers", "many"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_print_summary() {
        let config = Config::default();
        // No debe hacer panic sin subscriber instalado
        config.print_summary();
    }
}
