//! # Estructura de Job
//! src/jobs/job.rs
//!
//! Un job es un valor inmutable: la operación a ejecutar, sus datos y,
//! opcionalmente, una etapa secundaria cuyo resultado escalar se pasa como
//! contexto a la primaria (p. ej. la media global para
//! `DifferenceFromGlobalMean`).

use crate::error::OperationError;
use crate::operations::{JobData, Operation, Output};
use serde::{Deserialize, Serialize};

/// ID de job: denso, creciente desde 1, nunca reutilizado
pub type JobId = u64;

/// Una operación junto con los datos sobre los que corre
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub operation: Operation,
    pub data: JobData,
}

/// Lo que el request layer entrega al pool; el id se asigna al encolar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    pub primary: Stage,
    pub secondary: Option<Stage>,
}

impl JobSpec {
    pub fn single(operation: Operation, data: JobData) -> Self {
        Self {
            primary: Stage { operation, data },
            secondary: None,
        }
    }

    pub fn two_stage(
        operation: Operation,
        data: JobData,
        secondary_operation: Operation,
        secondary_data: JobData,
    ) -> Self {
        Self {
            primary: Stage { operation, data },
            secondary: Some(Stage {
                operation: secondary_operation,
                data: secondary_data,
            }),
        }
    }
}

/// Job encolado
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    id: JobId,
    spec: JobSpec,
    /// Timestamp de creación (ms desde epoch)
    created_at: u64,
}

impl Job {
    pub fn new(id: JobId, spec: JobSpec) -> Self {
        let created_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        Self {
            id,
            spec,
            created_at,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// Ejecuta el job: primero la etapa secundaria (si existe), luego la
    /// primaria con su escalar como contexto.
    pub fn execute(&self) -> Result<Output, OperationError> {
        let context = match &self.spec.secondary {
            Some(stage) => {
                let output = stage.operation.apply(&stage.data, None)?;
                let scalar = output
                    .scalar()
                    .ok_or(OperationError::UnexpectedInput(stage.operation.name()))?;
                Some(scalar)
            }
            None => None,
        };

        self.spec.primary.operation.apply(&self.spec.primary.data, context)
    }
}

/// Estado de un job visto desde afuera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Encolado o ejecutándose (todavía sin resultado legible)
    Running,

    /// Resultado persistido
    Done,

    /// Falló; el motivo quedó registrado
    Error,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Running => "running",
            JobState::Done => "done",
            JobState::Error => "error",
        }
    }
}

/// Respuesta a una consulta de estado por id
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    /// Id nunca asignado
    Invalid,
    Running,
    Done(Output),
    Error(String),
}

impl JobStatus {
    pub fn state(&self) -> Option<JobState> {
        match self {
            JobStatus::Invalid => None,
            JobStatus::Running => Some(JobState::Running),
            JobStatus::Done(_) => Some(JobState::Done),
            JobStatus::Error(_) => Some(JobState::Error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::GLOBAL_KEY;

    fn keyed(entries: Vec<(&str, Vec<f64>)>) -> JobData {
        JobData::Keyed(entries.into_iter().collect())
    }

    #[test]
    fn test_single_stage_execution() {
        let job = Job::new(
            1,
            JobSpec::single(Operation::MeanPerKey, keyed(vec![("A", vec![1.0, 3.0])])),
        );
        let out = job.execute().unwrap();
        assert_eq!(out.as_means().unwrap().get("A"), Some(&2.0));
        assert!(job.created_at() > 0);
    }

    #[test]
    fn test_two_stage_execution() {
        let job = Job::new(
            2,
            JobSpec::two_stage(
                Operation::DifferenceFromGlobalMean,
                keyed(vec![("A", vec![1.0]), ("B", vec![5.0])]),
                Operation::GlobalMean,
                keyed(vec![(GLOBAL_KEY, vec![1.0, 5.0])]),
            ),
        );
        let out = job.execute().unwrap();
        let means = out.as_means().unwrap();
        assert_eq!(means.0, vec![("A".to_string(), 2.0), ("B".to_string(), -2.0)]);
    }

    #[test]
    fn test_secondary_must_be_scalar() {
        let job = Job::new(
            3,
            JobSpec::two_stage(
                Operation::DifferenceFromGlobalMean,
                keyed(vec![("A", vec![1.0])]),
                Operation::MeanPerKey,
                keyed(vec![("A", vec![1.0]), ("B", vec![2.0])]),
            ),
        );
        assert!(matches!(job.execute(), Err(OperationError::UnexpectedInput(_))));
    }

    #[test]
    fn test_job_serialization() {
        let job = Job::new(
            7,
            JobSpec::single(Operation::GlobalMean, keyed(vec![(GLOBAL_KEY, vec![1.0])])),
        );
        let json = serde_json::to_string(&job).unwrap();
        assert!(json.contains("\"global_mean\""));
        let back: Job = serde_json::from_str(&json).unwrap();
        assert_eq!(back, job);
    }

    #[test]
    fn test_job_state_serialization() {
        let json = serde_json::to_string(&JobState::Running).unwrap();
        assert_eq!(json, "\"running\"");
        assert_eq!(JobStatus::Invalid.state(), None);
        assert_eq!(JobStatus::Error("x".into()).state(), Some(JobState::Error));
    }
}
