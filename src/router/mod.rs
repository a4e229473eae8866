//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Mapea (método, path) a un handler.
//!
//! ```text
//! Request → Router → Handler(&Request, &ServiceContext) → Response
//! ```
//!
//! Un patrón puede terminar en `{id}`: coincide con cualquier segmento final
//! no vacío y el handler lo lee de `Request::path`. Si el path existe pero con
//! otro método se responde 405; si no existe, 404.

use crate::context::ServiceContext;
use crate::http::{Method, Request, Response, StatusCode};
use serde::Serialize;

/// Un handler recibe el request y el contexto del servicio
pub type Handler = fn(&Request, &ServiceContext) -> Response;

const PARAM: &str = "{id}";

/// Ruta registrada
#[derive(Clone)]
pub struct Route {
    pub method: Method,
    pub pattern: String,
    handler: Handler,
}

impl Route {
    fn matches(&self, path: &str) -> bool {
        match self.pattern.strip_suffix(PARAM) {
            Some(prefix) => path
                .strip_prefix(prefix)
                .is_some_and(|rest| !rest.is_empty() && !rest.contains('/')),
            None => self.pattern == path,
        }
    }
}

/// Descripción pública de una ruta (para el índice)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteInfo {
    pub method: &'static str,
    pub path: String,
}

/// Router que mapea rutas a handlers
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Registra una ruta. Si dos rutas coinciden gana la primera registrada.
    pub fn register(&mut self, method: Method, pattern: &str, handler: Handler) {
        self.routes.push(Route {
            method,
            pattern: pattern.to_string(),
            handler,
        });
    }

    /// Rutas registradas, en orden de registro
    pub fn routes(&self) -> Vec<RouteInfo> {
        self.routes
            .iter()
            .map(|r| RouteInfo {
                method: r.method.as_str(),
                path: r.pattern.clone(),
            })
            .collect()
    }

    /// Despacha el request al handler que corresponda
    pub fn route(&self, request: &Request, ctx: &ServiceContext) -> Response {
        let path = request.path();
        let mut path_known = false;

        for route in self.routes.iter().filter(|r| r.matches(path)) {
            path_known = true;
            if route.method == request.method() {
                let mut response = (route.handler)(request, ctx);
                Self::add_common_headers(&mut response);
                return response;
            }
        }

        let mut response = if path_known {
            Response::error(
                StatusCode::MethodNotAllowed,
                &format!("Method not allowed: {} {}", request.method().as_str(), path),
            )
        } else {
            Response::error(StatusCode::NotFound, &format!("Route not found: {}", path))
        };
        Self::add_common_headers(&mut response);
        response
    }

    fn add_common_headers(response: &mut Response) {
        response.add_header("Server", "stats_server/0.1");
        response.add_header("Connection", "close");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::dataset::Dataset;
    use serde_json::json;

    fn ctx() -> (tempfile::TempDir, ServiceContext) {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.workers = Some(1);
        config.results_dir = tmp.path().to_string_lossy().into_owned();
        let ctx = ServiceContext::from_config(config, Dataset::new()).unwrap();
        (tmp, ctx)
    }

    fn ok_handler(_req: &Request, _ctx: &ServiceContext) -> Response {
        Response::json(&json!({"test": "ok"}))
    }

    fn echo_path(req: &Request, _ctx: &ServiceContext) -> Response {
        Response::json(&json!({"path": req.path()}))
    }

    fn request(raw: &[u8]) -> Request {
        Request::parse(raw).unwrap()
    }

    #[test]
    fn test_route_found() {
        let (_tmp, ctx) = ctx();
        let mut router = Router::new();
        router.register(Method::GET, "/test", ok_handler);

        let response = router.route(&request(b"GET /test HTTP/1.0\r\n\r\n"), &ctx);
        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.headers().get("Connection"), Some(&"close".to_string()));
    }

    #[test]
    fn test_route_not_found() {
        let (_tmp, ctx) = ctx();
        let router = Router::new();

        let response = router.route(&request(b"GET /nonexistent HTTP/1.0\r\n\r\n"), &ctx);
        assert_eq!(response.status(), StatusCode::NotFound);
    }

    #[test]
    fn test_wrong_method() {
        let (_tmp, ctx) = ctx();
        let mut router = Router::new();
        router.register(Method::POST, "/api/best5", ok_handler);

        let response = router.route(&request(b"GET /api/best5 HTTP/1.0\r\n\r\n"), &ctx);
        assert_eq!(response.status(), StatusCode::MethodNotAllowed);
    }

    #[test]
    fn test_same_path_two_methods() {
        let (_tmp, ctx) = ctx();
        let mut router = Router::new();
        router.register(Method::GET, "/x", ok_handler);
        router.register(Method::POST, "/x", echo_path);

        let response = router.route(&request(b"POST /x HTTP/1.0\r\n\r\n"), &ctx);
        assert_eq!(response.body_json().unwrap(), json!({"path": "/x"}));
    }

    #[test]
    fn test_param_pattern() {
        let (_tmp, ctx) = ctx();
        let mut router = Router::new();
        router.register(Method::GET, "/api/get_results/{id}", echo_path);

        let ok = router.route(&request(b"GET /api/get_results/12 HTTP/1.0\r\n\r\n"), &ctx);
        assert_eq!(ok.body_json().unwrap(), json!({"path": "/api/get_results/12"}));

        let empty = router.route(&request(b"GET /api/get_results/ HTTP/1.0\r\n\r\n"), &ctx);
        assert_eq!(empty.status(), StatusCode::NotFound);

        let nested = router.route(&request(b"GET /api/get_results/1/2 HTTP/1.0\r\n\r\n"), &ctx);
        assert_eq!(nested.status(), StatusCode::NotFound);
    }

    #[test]
    fn test_routes_listing() {
        let mut router = Router::new();
        router.register(Method::GET, "/", ok_handler);
        router.register(Method::POST, "/api/best5", ok_handler);

        assert_eq!(
            router.routes(),
            vec![
                RouteInfo { method: "GET", path: "/".to_string() },
                RouteInfo { method: "POST", path: "/api/best5".to_string() },
            ]
        );
    }
}
