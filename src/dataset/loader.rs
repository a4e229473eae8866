//! # Carga del Dataset desde CSV
//! src/dataset/loader.rs
//!
//! Lee el CSV fila por fila (sin cargar el archivo completo en memoria) y
//! construye el `Dataset`. Columnas requeridas:
//!
//! ```text
//! LocationDesc, Question, Data_Value, StratificationCategory1, Stratification1
//! ```

use super::{Dataset, StratKey};
use crate::error::DatasetError;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const STATE: &str = "LocationDesc";
const QUESTION: &str = "Question";
const DATA_VALUE: &str = "Data_Value";
const STRATIFCAT1: &str = "StratificationCategory1";
const STRATIF1: &str = "Stratification1";

/// Índices de las columnas usadas
struct Columns {
    state: usize,
    question: usize,
    value: usize,
    category: usize,
    stratification: usize,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> Result<Self, DatasetError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or(DatasetError::MissingColumn(name))
        };

        Ok(Self {
            state: find(STATE)?,
            question: find(QUESTION)?,
            value: find(DATA_VALUE)?,
            category: find(STRATIFCAT1)?,
            stratification: find(STRATIF1)?,
        })
    }
}

impl Dataset {
    /// Carga el dataset desde un archivo CSV
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let file = File::open(path.as_ref())?;
        Self::from_csv_reader(file)
    }

    /// Carga el dataset desde cualquier lector CSV con encabezados
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut reader = csv::Reader::from_reader(reader);
        let columns = Columns::locate(reader.headers()?)?;

        let mut dataset = Dataset::new();
        let mut rows = 0usize;

        for record in reader.records() {
            let record = record?;
            let field = |idx: usize| record.get(idx).unwrap_or("");

            let raw_value = field(columns.value);
            // "NaN" e "inf" parsean como f64 pero no sobreviven a un resultado JSON
            let value = raw_value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| DatasetError::InvalidValue {
                    line: record.position().map(|p| p.line()).unwrap_or(0),
                    value: raw_value.to_string(),
                })?;

            let key = StratKey::new(field(columns.category), field(columns.stratification));
            dataset.insert(field(columns.state), field(columns.question), &key.encode(), value);
            rows += 1;
        }

        tracing::info!(rows, regions = dataset.region_count(), "dataset loaded");
        Ok(dataset)
    }
}
