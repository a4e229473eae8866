//! # Catálogo de Operaciones de Agregación
//! src/operations/mod.rs
//!
//! Cada operación es una función pura sobre un mapa clave → muestras. Los
//! jobs guardan el `Operation` (no una closure), de modo que son
//! serializables y el despacho en `Operation::apply` es exhaustivo.
//!
//! | Operación | Salida | Orden |
//! |---|---|---|
//! | `MeanPerKey` | clave → media | inserción |
//! | `SortedMeansAscending` | clave → media | por valor, ascendente |
//! | `SortedMeansByKey` | clave → media | por clave |
//! | `NestedMeansByKey` | región → (clave → media) | externo por inserción, interno por clave |
//! | `Top5Ascending` / `Top5Descending` | 5 primeros | por valor |
//! | `GlobalMean` | una entrada | ninguno |
//! | `DifferenceFromGlobalMean` | clave → global − media | por valor, descendente |

pub mod extract;
pub mod ordered;

pub use ordered::OrderedMap;

use crate::error::OperationError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Clave del único valor que producen `GlobalMean` y la extracción global
pub const GLOBAL_KEY: &str = "global_mean";

/// Cantidad de entradas que devuelven los rankings
pub const TOP_N: usize = 5;

/// Muestras por clave
pub type Samples = OrderedMap<Vec<f64>>;

/// Medias por clave
pub type Means = OrderedMap<f64>;

/// Datos de entrada de un job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobData {
    /// clave → muestras
    Keyed(Samples),
    /// región → (clave → muestras)
    Grouped(OrderedMap<Samples>),
}

/// Resultado de una operación
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Means(Means),
    Grouped(OrderedMap<Means>),
}

impl Output {
    /// El valor de una salida de una sola entrada (p. ej. `GlobalMean`)
    pub fn scalar(&self) -> Option<f64> {
        match self {
            Output::Means(means) if means.len() == 1 => means.values().next().copied(),
            _ => None,
        }
    }

    pub fn as_means(&self) -> Option<&Means> {
        match self {
            Output::Means(means) => Some(means),
            Output::Grouped(_) => None,
        }
    }
}

impl Serialize for Output {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Output::Means(means) => means.serialize(serializer),
            Output::Grouped(groups) => groups.serialize(serializer),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Entry {
    Value(f64),
    Nested(Means),
}

impl<'de> Deserialize<'de> for Output {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = OrderedMap::<Entry>::deserialize(deserializer)?;

        if entries.values().all(|e| matches!(e, Entry::Value(_))) {
            let means = entries
                .0
                .into_iter()
                .filter_map(|(k, e)| match e {
                    Entry::Value(v) => Some((k, v)),
                    Entry::Nested(_) => None,
                })
                .collect();
            return Ok(Output::Means(means));
        }

        if entries.values().all(|e| matches!(e, Entry::Nested(_))) {
            let groups = entries
                .0
                .into_iter()
                .filter_map(|(k, e)| match e {
                    Entry::Nested(m) => Some((k, m)),
                    Entry::Value(_) => None,
                })
                .collect();
            return Ok(Output::Grouped(groups));
        }

        Err(serde::de::Error::custom("mixed scalar and nested entries"))
    }
}

/// Operaciones disponibles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    MeanPerKey,
    SortedMeansAscending,
    SortedMeansByKey,
    NestedMeansByKey,
    Top5Ascending,
    Top5Descending,
    GlobalMean,
    DifferenceFromGlobalMean,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::MeanPerKey => "mean_per_key",
            Operation::SortedMeansAscending => "sorted_means_ascending",
            Operation::SortedMeansByKey => "sorted_means_by_key",
            Operation::NestedMeansByKey => "nested_means_by_key",
            Operation::Top5Ascending => "top5_ascending",
            Operation::Top5Descending => "top5_descending",
            Operation::GlobalMean => "global_mean",
            Operation::DifferenceFromGlobalMean => "difference_from_global_mean",
        }
    }

    /// Ejecuta la operación.
    ///
    /// `context` es el escalar de la etapa secundaria; sólo lo usa
    /// `DifferenceFromGlobalMean`.
    pub fn apply(self, data: &JobData, context: Option<f64>) -> Result<Output, OperationError> {
        match (self, data) {
            (Operation::NestedMeansByKey, JobData::Grouped(groups)) => {
                let mut out = OrderedMap::new();
                for (region, samples) in groups.iter() {
                    let mut means = means(samples)?;
                    sort_by_key(&mut means);
                    out.push(region, means);
                }
                Ok(Output::Grouped(out))
            }
            (_, JobData::Grouped(_)) => Err(OperationError::UnexpectedInput(self.name())),
            (_, JobData::Keyed(samples)) => {
                let mut means = means(samples)?;
                match self {
                    Operation::MeanPerKey | Operation::GlobalMean => {}
                    Operation::SortedMeansAscending => sort_ascending(&mut means),
                    Operation::SortedMeansByKey => sort_by_key(&mut means),
                    Operation::Top5Ascending => {
                        sort_ascending(&mut means);
                        means.0.truncate(TOP_N);
                    }
                    Operation::Top5Descending => {
                        sort_descending(&mut means);
                        means.0.truncate(TOP_N);
                    }
                    Operation::DifferenceFromGlobalMean => {
                        let global = context.ok_or(OperationError::MissingContext(self.name()))?;
                        for (key, value) in means.0.iter_mut() {
                            *value = finite(key, global - *value)?;
                        }
                        sort_descending(&mut means);
                    }
                    Operation::NestedMeansByKey => {
                        return Err(OperationError::UnexpectedInput(self.name()));
                    }
                }
                Ok(Output::Means(means))
            }
        }
    }
}

/// Media aritmética. Una lista vacía es un error, no un NaN; una suma que
/// desborda también.
pub fn mean(key: &str, samples: &[f64]) -> Result<f64, OperationError> {
    if samples.is_empty() {
        return Err(OperationError::EmptySamples(key.to_string()));
    }
    finite(key, samples.iter().sum::<f64>() / samples.len() as f64)
}

// serde_json escribe NaN e infinito como `null`, que no se puede releer
fn finite(key: &str, value: f64) -> Result<f64, OperationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(OperationError::NonFinite(key.to_string()))
    }
}

fn means(samples: &Samples) -> Result<Means, OperationError> {
    samples
        .iter()
        .map(|(key, values)| mean(key, values).map(|m| (key.to_string(), m)))
        .collect::<Result<Vec<_>, _>>()
        .map(OrderedMap)
}

// Los sorts de slice son estables: empates conservan el orden de inserción
fn sort_ascending(means: &mut Means) {
    means
        .0
        .sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
}

fn sort_descending(means: &mut Means) {
    means
        .0
        .sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
}

fn sort_by_key(means: &mut Means) {
    means.0.sort_by(|a, b| a.0.cmp(&b.0));
}
