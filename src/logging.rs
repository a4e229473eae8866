//! # Logging
//! src/logging.rs
//!
//! Subscriber `fmt` de `tracing` con un `EnvFilter`. Si `RUST_LOG` está
//! definida gana sobre el nivel de la configuración.

use tracing_subscriber::EnvFilter;

/// Instala el subscriber global. Llamadas repetidas no hacen nada.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init();
}
