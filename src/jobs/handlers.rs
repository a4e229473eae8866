//! # Handlers HTTP de la API
//! src/jobs/handlers.rs
//!
//! Cada endpoint POST sigue el mismo camino:
//!
//! 1. Si el pool está apagándose: `{"job_id": -1, "reason": "Shutting down"}`
//! 2. Parsear el body (`{"question": ...}` o `{"question": ..., "state": ...}`);
//!    body inválido → 400
//! 3. Extraer los datos del dataset; error → `{"status": "error", "reason": ...}`
//!    sin consumir id
//! 4. Encolar y responder `{"job_id": N}`
//!
//! Todas las respuestas de la API (salvo body inválido) son 200.

use crate::context::ServiceContext;
use crate::dataset::Polarity;
use crate::error::ExtractError;
use crate::http::{Method, Request, Response, StatusCode};
use crate::jobs::job::{JobSpec, JobStatus};
use crate::operations::{extract, JobData, Operation, Output};
use crate::router::Router;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

const RESULTS_PREFIX: &str = "/api/get_results/";

/// Respuesta de `get_results`. Se serializa directo (sin pasar por
/// `serde_json::Value`) para no perder el orden de las claves de `data`.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum ResultBody {
    Done { data: Output },
    Running,
    Error { reason: String },
}

/// Body de los endpoints sobre una pregunta
#[derive(Debug, Deserialize)]
struct QuestionRequest {
    question: String,
}

/// Body de los endpoints sobre una pregunta y una región
#[derive(Debug, Deserialize)]
struct StateRequest {
    question: String,
    state: String,
}

/// Router con todas las rutas de la API
pub fn api_router() -> Router {
    let mut router = Router::new();

    router.register(Method::POST, "/api/states_mean", states_mean_handler);
    router.register(Method::POST, "/api/state_mean", state_mean_handler);
    router.register(Method::POST, "/api/best5", best5_handler);
    router.register(Method::POST, "/api/worst5", worst5_handler);
    router.register(Method::POST, "/api/global_mean", global_mean_handler);
    router.register(Method::POST, "/api/diff_from_mean", diff_from_mean_handler);
    router.register(Method::POST, "/api/state_diff_from_mean", state_diff_from_mean_handler);
    router.register(Method::POST, "/api/mean_by_category", mean_by_category_handler);
    router.register(
        Method::POST,
        "/api/state_mean_by_category",
        state_mean_by_category_handler,
    );

    router.register(Method::GET, "/api/get_results/{id}", get_results_handler);
    router.register(Method::GET, "/api/jobs", jobs_handler);
    router.register(Method::GET, "/api/num_jobs", num_jobs_handler);
    router.register(Method::GET, "/api/graceful_shutdown", graceful_shutdown_handler);
    router.register(Method::GET, "/", index_handler);
    router.register(Method::GET, "/index", index_handler);

    router
}

// ==================== Helpers ====================

fn shutting_down() -> Response {
    Response::json(&json!({ "job_id": -1, "reason": "Shutting down" }))
}

fn parse_body<T: DeserializeOwned>(req: &Request) -> Result<T, Response> {
    req.json().map_err(|e| {
        tracing::warn!(path = req.path(), error = %e, "invalid request body");
        Response::error(StatusCode::BadRequest, &format!("Invalid body: {}", e))
    })
}

/// Pasos 1 a 4 comunes a todos los POST
fn submit_with<T, F>(req: &Request, ctx: &ServiceContext, build: F) -> Response
where
    T: DeserializeOwned,
    F: FnOnce(&T, &ServiceContext) -> Result<JobSpec, ExtractError>,
{
    if !ctx.pool.state().accepts_jobs() {
        return shutting_down();
    }

    let body: T = match parse_body(req) {
        Ok(body) => body,
        Err(response) => return response,
    };

    let spec = match build(&body, ctx) {
        Ok(spec) => spec,
        Err(e) => {
            tracing::warn!(path = req.path(), reason = %e, "rejected request");
            return Response::json(&json!({ "status": "error", "reason": e.to_string() }));
        }
    };

    match ctx.pool.submit(spec) {
        Ok(job_id) => {
            tracing::info!(path = req.path(), job_id, "job accepted");
            Response::json(&json!({ "job_id": job_id }))
        }
        Err(_) => shutting_down(),
    }
}

fn top5(question: &str, best: bool) -> Operation {
    match (Polarity::of(question), best) {
        (Polarity::LowerIsBetter, true) | (Polarity::HigherIsBetter, false) => {
            Operation::Top5Ascending
        }
        (Polarity::LowerIsBetter, false) | (Polarity::HigherIsBetter, true) => {
            Operation::Top5Descending
        }
    }
}

/// Job de diferencia contra la media global de la pregunta
fn diff_spec(
    ctx: &ServiceContext,
    question: &str,
    data: JobData,
) -> Result<JobSpec, ExtractError> {
    let global = extract::global_for_question(&ctx.dataset, question)?;
    Ok(JobSpec::two_stage(
        Operation::DifferenceFromGlobalMean,
        data,
        Operation::GlobalMean,
        global,
    ))
}

// ==================== Submissions ====================

/// POST /api/states_mean: media por región, ascendente
pub fn states_mean_handler(req: &Request, ctx: &ServiceContext) -> Response {
    submit_with(req, ctx, |body: &QuestionRequest, ctx| {
        let data = extract::by_question(&ctx.dataset, &body.question)?;
        Ok(JobSpec::single(Operation::SortedMeansAscending, data))
    })
}

/// POST /api/state_mean
pub fn state_mean_handler(req: &Request, ctx: &ServiceContext) -> Response {
    submit_with(req, ctx, |body: &StateRequest, ctx| {
        let data = extract::for_state(&ctx.dataset, &body.question, &body.state)?;
        Ok(JobSpec::single(Operation::MeanPerKey, data))
    })
}

/// POST /api/best5: las 5 mejores regiones según la polaridad de la pregunta
pub fn best5_handler(req: &Request, ctx: &ServiceContext) -> Response {
    submit_with(req, ctx, |body: &QuestionRequest, ctx| {
        let data = extract::by_question(&ctx.dataset, &body.question)?;
        Ok(JobSpec::single(top5(&body.question, true), data))
    })
}

/// POST /api/worst5
pub fn worst5_handler(req: &Request, ctx: &ServiceContext) -> Response {
    submit_with(req, ctx, |body: &QuestionRequest, ctx| {
        let data = extract::by_question(&ctx.dataset, &body.question)?;
        Ok(JobSpec::single(top5(&body.question, false), data))
    })
}

/// POST /api/global_mean
pub fn global_mean_handler(req: &Request, ctx: &ServiceContext) -> Response {
    submit_with(req, ctx, |body: &QuestionRequest, ctx| {
        let data = extract::global_for_question(&ctx.dataset, &body.question)?;
        Ok(JobSpec::single(Operation::GlobalMean, data))
    })
}

/// POST /api/diff_from_mean
pub fn diff_from_mean_handler(req: &Request, ctx: &ServiceContext) -> Response {
    submit_with(req, ctx, |body: &QuestionRequest, ctx| {
        let data = extract::by_question(&ctx.dataset, &body.question)?;
        diff_spec(ctx, &body.question, data)
    })
}

/// POST /api/state_diff_from_mean
pub fn state_diff_from_mean_handler(req: &Request, ctx: &ServiceContext) -> Response {
    submit_with(req, ctx, |body: &StateRequest, ctx| {
        let data = extract::for_state(&ctx.dataset, &body.question, &body.state)?;
        diff_spec(ctx, &body.question, data)
    })
}

/// POST /api/mean_by_category
pub fn mean_by_category_handler(req: &Request, ctx: &ServiceContext) -> Response {
    submit_with(req, ctx, |body: &QuestionRequest, ctx| {
        let data = extract::by_category(&ctx.dataset, &body.question)?;
        Ok(JobSpec::single(Operation::SortedMeansByKey, data))
    })
}

/// POST /api/state_mean_by_category
pub fn state_mean_by_category_handler(req: &Request, ctx: &ServiceContext) -> Response {
    submit_with(req, ctx, |body: &StateRequest, ctx| {
        let data = extract::state_by_category(&ctx.dataset, &body.question, &body.state)?;
        Ok(JobSpec::single(Operation::NestedMeansByKey, data))
    })
}

// ==================== Consultas ====================

/// GET /api/get_results/{id}
///
/// ```json
/// {"status": "done", "data": {...}}
/// {"status": "running"}
/// {"status": "error", "reason": "Invalid job_id"}
/// ```
pub fn get_results_handler(req: &Request, ctx: &ServiceContext) -> Response {
    let status = req
        .path()
        .strip_prefix(RESULTS_PREFIX)
        .and_then(|id| id.parse().ok())
        .map(|id| ctx.pool.status(id))
        .unwrap_or(JobStatus::Invalid);

    let body = match status {
        JobStatus::Invalid => {
            tracing::error!(path = req.path(), "invalid job_id");
            ResultBody::Error {
                reason: "Invalid job_id".to_string(),
            }
        }
        JobStatus::Running => ResultBody::Running,
        JobStatus::Done(data) => ResultBody::Done { data },
        JobStatus::Error(reason) => ResultBody::Error { reason },
    };
    Response::json(&body)
}

/// GET /api/jobs: `{"status": "done", "data": [{"job_id_1": "done"}, ...]}`
pub fn jobs_handler(_req: &Request, ctx: &ServiceContext) -> Response {
    let data: Vec<serde_json::Value> = ctx
        .pool
        .jobs()
        .into_iter()
        .map(|(id, state)| {
            let mut entry = serde_json::Map::new();
            entry.insert(format!("job_id_{}", id), state.as_str().into());
            serde_json::Value::Object(entry)
        })
        .collect();

    Response::json(&json!({ "status": "done", "data": data }))
}

/// GET /api/num_jobs
pub fn num_jobs_handler(_req: &Request, ctx: &ServiceContext) -> Response {
    Response::json(&json!({ "num_jobs": ctx.pool.pending_count() }))
}

/// GET /api/graceful_shutdown: bloquea hasta que el pool termina
pub fn graceful_shutdown_handler(_req: &Request, ctx: &ServiceContext) -> Response {
    tracing::info!("graceful shutdown requested");
    match ctx.pool.shutdown() {
        Ok(()) => Response::json(&json!({ "status": "success" })),
        Err(e) => {
            tracing::error!(error = %e, "shutdown failed");
            Response::error(StatusCode::InternalServerError, "Shutdown failed")
        }
    }
}

/// GET / y /index: lista de rutas
pub fn index_handler(_req: &Request, _ctx: &ServiceContext) -> Response {
    Response::json(&json!({
        "message": "Interact with the webserver using one of the defined routes",
        "routes": api_router().routes(),
    }))
}
