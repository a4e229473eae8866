//! # Pool de Workers
//! src/jobs/pool.rs
//!
//! N threads de larga vida que drenan una única `JobQueue` y persisten cada
//! resultado en el `ResultStore`.
//!
//! ## Ciclo de vida
//!
//! ```text
//! Created --start()--> Running --shutdown()--> Draining --> Terminated
//! ```
//!
//! - `submit` acepta en `Created` y `Running`; en `Draining`/`Terminated`
//!   devuelve `SubmitError::ShuttingDown` sin consumir id.
//! - `shutdown` espera a que todo lo encolado sea reclamado, termina la cola
//!   y hace `join` de cada worker. Un job reclamado siempre corre hasta el
//!   final, así que al volver no queda trabajo en vuelo. Quien llama durante
//!   `Draining` espera a que el primero llegue a `Terminated`.
//!
//! Un fallo dentro de un job (error de la operación, panic, o no poder
//! escribir el resultado) queda registrado como resultado de error para ese
//! id; el worker sigue atendiendo la cola.

use crate::error::SubmitError;
use crate::jobs::job::{Job, JobId, JobSpec, JobState, JobStatus};
use crate::jobs::queue::JobQueue;
use crate::jobs::storage::{ResultEntry, ResultStore};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

/// Estado del pool (sólo avanza)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    Created,
    Running,
    Draining,
    Terminated,
}

impl PoolState {
    pub fn accepts_jobs(&self) -> bool {
        matches!(self, PoolState::Created | PoolState::Running)
    }
}

struct Lifecycle {
    state: PoolState,
    /// Próximo id a asignar
    next_id: JobId,
}

/// Pool de workers
pub struct WorkerPool {
    size: usize,
    queue: JobQueue,
    results: ResultStore,

    /// Estado y contador de ids bajo el mismo lock: asignar id y encolar es
    /// atómico respecto de `shutdown`.
    lifecycle: Mutex<Lifecycle>,

    /// Se notifica al pasar a `Terminated`
    terminated: Condvar,

    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Crea el pool sin lanzar workers
    pub fn new(size: usize, results: ResultStore) -> Self {
        Self {
            size: size.max(1),
            queue: JobQueue::new(),
            results,
            lifecycle: Mutex::new(Lifecycle {
                state: PoolState::Created,
                next_id: 1,
            }),
            terminated: Condvar::new(),
            workers: Mutex::new(Vec::new()),
        }
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lanza los N workers. Sólo tiene efecto desde `Created`.
    pub fn start(&self) -> std::io::Result<()> {
        let mut lifecycle = self.lifecycle();
        if lifecycle.state != PoolState::Created {
            return Ok(());
        }

        let mut workers = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
        for i in 0..self.size {
            let name = format!("worker-{}", i);
            let queue = self.queue.clone();
            let results = self.results.clone();

            let handle = thread::Builder::new()
                .name(name.clone())
                .spawn(move || Self::worker_loop(name, queue, results))?;
            workers.push(handle);
        }

        lifecycle.state = PoolState::Running;
        tracing::info!(workers = self.size, "worker pool started");
        Ok(())
    }

    /// Loop principal del worker
    fn worker_loop(name: String, queue: JobQueue, results: ResultStore) {
        tracing::debug!(worker = %name, "worker started");

        while let Some(job) = queue.dequeue() {
            tracing::debug!(
                worker = %name,
                job_id = job.id(),
                created_at = job.created_at(),
                "picked up job"
            );
            Self::run_job(&name, &job, &results);
        }

        tracing::debug!(worker = %name, "worker exiting");
    }

    /// Ejecuta un job y persiste su resultado (o su fallo)
    fn run_job(name: &str, job: &Job, results: &ResultStore) {
        let id = job.id();

        match panic::catch_unwind(AssertUnwindSafe(|| job.execute())) {
            Ok(Ok(output)) => match results.write(id, &output) {
                Ok(()) => tracing::info!(worker = %name, job_id = id, "job completed"),
                Err(e) => {
                    tracing::error!(worker = %name, job_id = id, error = %e, "failed to write result");
                    results.record_failure(id, format!("Failed to write result: {}", e));
                }
            },
            Ok(Err(e)) => {
                tracing::warn!(worker = %name, job_id = id, error = %e, "job failed");
                results.record_failure(id, e.to_string());
            }
            Err(_) => {
                tracing::error!(worker = %name, job_id = id, "job panicked");
                results.record_failure(id, "Job panicked");
            }
        }
    }

    /// Encola un job nuevo y devuelve su id
    pub fn submit(&self, spec: JobSpec) -> Result<JobId, SubmitError> {
        let mut lifecycle = self.lifecycle();
        if !lifecycle.state.accepts_jobs() {
            return Err(SubmitError::ShuttingDown);
        }

        let id = lifecycle.next_id;
        lifecycle.next_id += 1;
        self.queue.enqueue(Job::new(id, spec));

        tracing::debug!(job_id = id, "job submitted");
        Ok(id)
    }

    /// Apagado ordenado: deja de aceptar, drena la cola y espera a los workers.
    ///
    /// Si el pool nunca arrancó, arranca primero para no dejar jobs aceptados
    /// sin ejecutar. Una llamada concurrente espera a que el drenado termine;
    /// sobre un pool ya terminado vuelve de inmediato.
    pub fn shutdown(&self) -> std::io::Result<()> {
        if self.state() == PoolState::Created {
            self.start()?;
        }

        {
            let mut lifecycle = self.lifecycle();
            let current = lifecycle.state;
            match current {
                PoolState::Created | PoolState::Running => lifecycle.state = PoolState::Draining,
                PoolState::Draining => {
                    while lifecycle.state != PoolState::Terminated {
                        lifecycle = self
                            .terminated
                            .wait(lifecycle)
                            .unwrap_or_else(PoisonError::into_inner);
                    }
                    return Ok(());
                }
                PoolState::Terminated => return Ok(()),
            }
        }
        tracing::info!(pending = self.queue.len(), "draining job queue");

        self.queue.wait_until_claimed();
        self.queue.terminate();

        let handles: Vec<JoinHandle<()>> = {
            let mut workers = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
            workers.drain(..).collect()
        };
        for handle in handles {
            if handle.join().is_err() {
                tracing::error!("worker thread panicked");
            }
        }

        self.lifecycle().state = PoolState::Terminated;
        self.terminated.notify_all();
        tracing::info!("worker pool terminated");
        Ok(())
    }

    pub fn state(&self) -> PoolState {
        self.lifecycle().state
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Próximo id a asignar (todo id menor ya fue asignado)
    pub fn next_id(&self) -> JobId {
        self.lifecycle().next_id
    }

    pub fn results(&self) -> &ResultStore {
        &self.results
    }

    /// Estado de un job por id
    pub fn status(&self, id: JobId) -> JobStatus {
        if id == 0 || id >= self.next_id() {
            return JobStatus::Invalid;
        }

        match self.results.read(id) {
            ResultEntry::Ready(output) => JobStatus::Done(output),
            ResultEntry::Failed(reason) => JobStatus::Error(reason),
            ResultEntry::NotFound | ResultEntry::Malformed => JobStatus::Running,
        }
    }

    /// Estado de todos los ids asignados, en orden
    pub fn jobs(&self) -> Vec<(JobId, JobState)> {
        (1..self.next_id())
            .map(|id| (id, self.entry_state(id)))
            .collect()
    }

    /// Cantidad exacta de jobs asignados que todavía no terminaron
    pub fn pending_count(&self) -> usize {
        (1..self.next_id())
            .filter(|&id| self.entry_state(id) == JobState::Running)
            .count()
    }

    fn entry_state(&self, id: JobId) -> JobState {
        match self.results.read(id) {
            ResultEntry::Ready(_) => JobState::Done,
            ResultEntry::Failed(_) => JobState::Error,
            ResultEntry::NotFound | ResultEntry::Malformed => JobState::Running,
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Sin shutdown explícito los workers quedarían bloqueados en dequeue
        if self.state() == PoolState::Running {
            if let Err(e) = self.shutdown() {
                tracing::error!(error = %e, "shutdown on drop failed");
            }
        }
    }
}
