//! # Errores del Servidor
//! src/error.rs
//!
//! Taxonomía de errores tipados. Cada capa tiene su propio enum:
//!
//! - `ExtractError`: petición inválida, se detecta antes de crear el job
//! - `OperationError`: falla dentro de un worker, se convierte en un
//!   resultado de error para ese job
//! - `StoreError`: no se pudo persistir un resultado
//! - `DatasetError`: el CSV de entrada no se pudo cargar
//! - `SubmitError`: el pool ya no acepta trabajos
//!
//! Los mensajes de `ExtractError` y `SubmitError` son los `reason` que ve el
//! cliente HTTP, por eso no llevan prefijos.

use thiserror::Error;

/// Error al extraer del dataset los datos de un job
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("Invalid question")]
    InvalidQuestion,

    #[error("Invalid state")]
    InvalidState,

    /// La clave de estratificación no se pudo decodificar
    #[error("Invalid syntax for categories key")]
    MalformedKey(String),
}

/// Error al ejecutar una operación de agregación
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    #[error("no samples for key '{0}'")]
    EmptySamples(String),

    /// La media (o la diferencia) no es representable en JSON
    #[error("non-finite result for key '{0}'")]
    NonFinite(String),

    #[error("operation '{0}' requires a global mean")]
    MissingContext(&'static str),

    #[error("operation '{0}' received data of the wrong shape")]
    UnexpectedInput(&'static str),
}

/// Error al escribir en el Result Store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error al construir el dataset
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing column: {0}")]
    MissingColumn(&'static str),

    #[error("line {line}: invalid Data_Value '{value}'")]
    InvalidValue { line: u64, value: String },
}

/// Rechazo de una sumisión
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("Shutting down")]
    ShuttingDown,
}

/// Configuración inválida
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ConfigError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reasons_match_wire_format() {
        assert_eq!(ExtractError::InvalidQuestion.to_string(), "Invalid question");
        assert_eq!(ExtractError::InvalidState.to_string(), "Invalid state");
        assert_eq!(
            ExtractError::MalformedKey("x".into()).to_string(),
            "Invalid syntax for categories key"
        );
        assert_eq!(SubmitError::ShuttingDown.to_string(), "Shutting down");
    }

    #[test]
    fn test_store_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: StoreError = io.into();
        assert!(err.to_string().starts_with("IO error"));
    }
}
