//! # Sistema de Jobs
//!
//! Ejecuta agregaciones en un pool fijo de workers sin bloquear las
//! conexiones HTTP. Cada job recibe un id al encolarse y su resultado queda
//! en un archivo por id.
//!
//! ## Endpoints
//!
//! - `POST /api/<operación>` - Encolar job, responde `{"job_id": N}`
//! - `GET /api/get_results/<id>` - Estado o resultado de un job
//! - `GET /api/jobs` - Estado de todos los jobs
//! - `GET /api/num_jobs` - Jobs todavía pendientes
//! - `GET /api/graceful_shutdown` - Drenar y apagar el pool

pub mod handlers;
pub mod job;
pub mod pool;
pub mod queue;
pub mod storage;

pub use job::{Job, JobId, JobSpec, JobState, JobStatus, Stage};
pub use pool::{PoolState, WorkerPool};
pub use queue::JobQueue;
pub use storage::{ResultEntry, ResultStore};
