//! # Result Store
//! src/jobs/storage.rs
//!
//! Un archivo JSON por job (`job_id_<id>.json`) dentro del directorio de
//! resultados. La presencia de un archivo completo y parseable es la única
//! señal de que el job terminó.
//!
//! La escritura es atómica para los lectores: se escribe a un `.tmp` y luego
//! se renombra. Un lector nunca ve un resultado a medias como válido; si lo
//! viera (p. ej. alguien editó el archivo), `read` devuelve `Malformed`, que
//! el request layer reporta como "running".
//!
//! Los fallos (al persistir o al ejecutar) se guardan en memoria por id: no
//! hay garantía de poder escribirlos a disco si el disco es el problema.

use crate::error::StoreError;
use crate::jobs::job::JobId;
use crate::operations::Output;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Contenido del store para un id
#[derive(Debug, Clone, PartialEq)]
pub enum ResultEntry {
    /// Sin archivo: el job no existe o sigue corriendo
    NotFound,

    /// Archivo presente pero ilegible
    Malformed,

    Ready(Output),

    /// El job terminó con error
    Failed(String),
}

/// Persistencia de resultados por id de job
pub struct ResultStore {
    dir: PathBuf,
    failures: Arc<Mutex<HashMap<JobId, String>>>,
}

impl ResultStore {
    /// Abre (o crea) el directorio de resultados.
    ///
    /// Los ids viven lo que vive el proceso, así que se borran los
    /// `job_id_*.json` que hayan quedado de una ejecución anterior.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let mut stale = 0usize;
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            let is_result = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("job_id_"));
            if is_result && path.is_file() {
                fs::remove_file(&path)?;
                stale += 1;
            }
        }
        if stale > 0 {
            tracing::info!(dir = %dir.display(), stale, "removed stale results");
        }

        Ok(Self {
            dir,
            failures: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Ruta determinística del resultado de un id
    pub fn path_for(&self, id: JobId) -> PathBuf {
        self.dir.join(format!("job_id_{}.json", id))
    }

    /// Persiste el resultado de un job. Cada id se escribe una sola vez.
    pub fn write(&self, id: JobId, output: &Output) -> Result<(), StoreError> {
        let path = self.path_for(id);
        if path.is_file() {
            tracing::warn!(job_id = id, "result already written, keeping the first one");
            return Ok(());
        }

        let temp_path = self.dir.join(format!("job_id_{}.json.tmp", id));
        let written = Self::write_temp(&temp_path, output)
            // Renombrar (atómico en sistemas Unix)
            .and_then(|()| fs::rename(&temp_path, &path).map_err(StoreError::from));

        if written.is_err() && temp_path.exists() {
            if let Err(e) = fs::remove_file(&temp_path) {
                tracing::warn!(job_id = id, error = %e, "could not remove temp result file");
            }
        }
        written
    }

    fn write_temp(temp_path: &Path, output: &Output) -> Result<(), StoreError> {
        let mut writer = BufWriter::new(File::create(temp_path)?);
        serde_json::to_writer(&mut writer, output)?;
        writer.flush()?;
        Ok(())
    }

    /// Registra un fallo para el id
    pub fn record_failure(&self, id: JobId, reason: impl Into<String>) {
        let mut failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
        failures.entry(id).or_insert_with(|| reason.into());
    }

    /// Lee la entrada de un id
    pub fn read(&self, id: JobId) -> ResultEntry {
        {
            let failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(reason) = failures.get(&id) {
                return ResultEntry::Failed(reason.clone());
            }
        }

        let path = self.path_for(id);
        if !path.exists() {
            return ResultEntry::NotFound;
        }

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                tracing::error!(job_id = id, error = %e, "error opening result file");
                return ResultEntry::Malformed;
            }
        };

        match serde_json::from_str(&content) {
            Ok(output) => ResultEntry::Ready(output),
            Err(e) => {
                tracing::error!(job_id = id, error = %e, "error parsing result file");
                ResultEntry::Malformed
            }
        }
    }
}

impl Clone for ResultStore {
    fn clone(&self) -> Self {
        Self {
            dir: self.dir.clone(),
            failures: Arc::clone(&self.failures),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::OrderedMap;

    fn output() -> Output {
        Output::Means(OrderedMap::from_iter([("Ohio", 2.5), ("Alabama", 1.0)]))
    }

    #[test]
    fn test_write_and_read() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ResultStore::new(tmp.path()).unwrap();

        assert_eq!(store.read(1), ResultEntry::NotFound);
        store.write(1, &output()).unwrap();
        assert_eq!(store.read(1), ResultEntry::Ready(output()));
        assert!(!store.path_for(1).with_extension("json.tmp").exists());
    }

    #[test]
    fn test_file_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ResultStore::new(tmp.path()).unwrap();
        store.write(3, &output()).unwrap();

        let content = fs::read_to_string(tmp.path().join("job_id_3.json")).unwrap();
        assert_eq!(content, r#"{"Ohio":2.5,"Alabama":1.0}"#);
    }

    #[test]
    fn test_malformed_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ResultStore::new(tmp.path()).unwrap();

        fs::write(store.path_for(2), r#"{"Ohio": 2."#).unwrap();
        assert_eq!(store.read(2), ResultEntry::Malformed);
    }

    #[test]
    fn test_write_once() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ResultStore::new(tmp.path()).unwrap();

        store.write(1, &output()).unwrap();
        let other = Output::Means(OrderedMap::from_iter([("Texas", 9.0)]));
        store.write(1, &other).unwrap();

        assert_eq!(store.read(1), ResultEntry::Ready(output()));
        assert_eq!(store.read(1), store.read(1));
    }

    #[test]
    fn test_failures_are_recorded_in_memory() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ResultStore::new(tmp.path()).unwrap();
        let clone = store.clone();

        clone.record_failure(5, "disk full");
        clone.record_failure(5, "ignored");
        assert_eq!(store.read(5), ResultEntry::Failed("disk full".to_string()));
    }

    #[test]
    fn test_stale_results_removed() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("job_id_1.json"), "{}").unwrap();
        fs::write(tmp.path().join("notes.txt"), "keep").unwrap();

        let store = ResultStore::new(tmp.path()).unwrap();
        assert_eq!(store.read(1), ResultEntry::NotFound);
        assert!(tmp.path().join("notes.txt").exists());
    }

    #[test]
    fn test_failed_rename_removes_temp_file() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ResultStore::new(tmp.path()).unwrap();

        // Un directorio en la ruta destino hace fallar el rename
        fs::create_dir(store.path_for(4)).unwrap();
        fs::create_dir(store.path_for(4).join("child")).unwrap();
        store.write(4, &output()).unwrap_err();

        assert!(!tmp.path().join("job_id_4.json.tmp").exists());
    }

    #[test]
    fn test_write_fails_when_dir_removed() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("results");
        let store = ResultStore::new(&dir).unwrap();

        fs::remove_dir_all(&dir).unwrap();
        assert!(matches!(store.write(1, &output()), Err(StoreError::Io(_))));
    }
}
