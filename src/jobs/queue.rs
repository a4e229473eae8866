//! # Cola FIFO de Jobs
//! src/jobs/queue.rs
//!
//! Cola thread-safe sin límite de capacidad. Los workers se bloquean en
//! `dequeue` hasta que haya un job o se levante la señal de terminación.
//!
//! Dos condvars sobre el mismo mutex:
//! - `available`: hay jobs nuevos o se terminó la cola
//! - `drained`: la cola quedó vacía (todo lo encolado fue reclamado)
//!
//! Toda espera vuelve a evaluar su predicado al despertar.

use crate::jobs::job::Job;
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

struct QueueState {
    jobs: VecDeque<Job>,
    terminated: bool,
}

/// Cola FIFO compartida entre el pool y sus workers
pub struct JobQueue {
    state: Arc<Mutex<QueueState>>,

    /// Notifica a workers esperando trabajo
    available: Arc<Condvar>,

    /// Notifica a quien espera que la cola se vacíe
    drained: Arc<Condvar>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState {
                jobs: VecDeque::new(),
                terminated: false,
            })),
            available: Arc::new(Condvar::new()),
            drained: Arc::new(Condvar::new()),
        }
    }

    // Un worker que hizo panic no invalida la cola: el estado es un VecDeque
    // y un bool, siempre consistentes entre operaciones.
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Encola un job y despierta a un worker. Nunca bloquea.
    pub fn enqueue(&self, job: Job) {
        let mut state = self.lock();
        state.jobs.push_back(job);
        self.available.notify_one();
    }

    /// Reclama el siguiente job en orden FIFO.
    ///
    /// Bloquea hasta que haya un job. Retorna `None` sólo si la cola fue
    /// terminada y está vacía.
    pub fn dequeue(&self) -> Option<Job> {
        let mut state = self.lock();

        loop {
            if let Some(job) = state.jobs.pop_front() {
                if state.jobs.is_empty() {
                    self.drained.notify_all();
                }
                return Some(job);
            }

            if state.terminated {
                return None;
            }

            state = self
                .available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Intenta reclamar sin bloquear
    #[cfg(test)]
    pub fn try_dequeue(&self) -> Option<Job> {
        let mut state = self.lock();
        let job = state.jobs.pop_front();
        if job.is_some() && state.jobs.is_empty() {
            self.drained.notify_all();
        }
        job
    }

    /// Bloquea hasta que todo job encolado hasta ahora haya sido reclamado.
    ///
    /// Reclamado no implica terminado: el worker puede seguir ejecutándolo.
    pub fn wait_until_claimed(&self) {
        let mut state = self.lock();
        while !state.jobs.is_empty() {
            state = self
                .drained
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Levanta la señal de terminación y despierta a todos los workers
    pub fn terminate(&self) {
        let mut state = self.lock();
        state.terminated = true;
        self.available.notify_all();
    }

    #[cfg(test)]
    pub fn is_terminated(&self) -> bool {
        self.lock().terminated
    }

    /// Jobs pendientes de reclamar
    pub fn len(&self) -> usize {
        self.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for JobQueue {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            available: Arc::clone(&self.available),
            drained: Arc::clone(&self.drained),
        }
    }
}
