//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Un thread por conexión. Cada conexión lleva un solo request (HTTP/1.0):
//! se lee hasta completar headers y body, se despacha al router y se cierra.

use crate::context::ServiceContext;
use crate::http::request::{content_length, header_end};
use crate::http::{Request, Response, StatusCode};
use crate::jobs::handlers;
use crate::router::Router;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Tamaño máximo aceptado para un request (headers + body)
const MAX_REQUEST_BYTES: usize = 1024 * 1024;

const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Servidor HTTP/1.0 de la API
pub struct Server {
    ctx: Arc<ServiceContext>,
    router: Arc<Router>,
}

impl Server {
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self {
            ctx,
            router: Arc::new(handlers::api_router()),
        }
    }

    /// Bind a la dirección configurada y atiende conexiones indefinidamente
    pub fn run(&self) -> std::io::Result<()> {
        let address = self.ctx.config.address();
        let listener = TcpListener::bind(&address)?;
        tracing::info!(%address, "server listening");
        self.serve(listener)
    }

    /// Atiende conexiones sobre un listener ya creado
    pub fn serve(&self, listener: TcpListener) -> std::io::Result<()> {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let ctx = Arc::clone(&self.ctx);
                    let router = Arc::clone(&self.router);

                    let spawned = thread::Builder::new()
                        .name("conn".to_string())
                        .spawn(move || {
                            if let Err(e) = Self::handle_connection(stream, &router, &ctx) {
                                tracing::warn!(error = %e, "connection error");
                            }
                        });
                    if let Err(e) = spawned {
                        tracing::error!(error = %e, "failed to spawn connection thread");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "failed to accept connection"),
            }
        }
        Ok(())
    }

    /// Lee un request completo, lo despacha y escribe la respuesta
    pub fn handle_connection(
        mut stream: TcpStream,
        router: &Router,
        ctx: &ServiceContext,
    ) -> std::io::Result<()> {
        let start = Instant::now();
        stream.set_read_timeout(Some(READ_TIMEOUT))?;

        let buffer = match Self::read_request(&mut stream)? {
            Some(buffer) => buffer,
            None => {
                tracing::debug!("connection closed before sending data");
                return Ok(());
            }
        };

        let response = match Request::parse(&buffer) {
            Ok(request) => {
                let response = router.route(&request, ctx);
                tracing::info!(
                    method = request.method().as_str(),
                    path = request.path(),
                    status = response.status().as_u16(),
                    elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "request handled"
                );
                response
            }
            Err(e) => {
                tracing::warn!(error = %e, "parse error");
                Response::error(StatusCode::BadRequest, &format!("Invalid request: {}", e))
            }
        };

        stream.write_all(&response.to_bytes())?;
        stream.flush()
    }

    /// Acumula bytes hasta tener headers completos y `Content-Length` bytes de
    /// body. `None` si el peer cerró sin mandar nada.
    fn read_request(stream: &mut TcpStream) -> std::io::Result<Option<Vec<u8>>> {
        let mut buffer = Vec::new();
        let mut chunk = [0u8; 8192];

        loop {
            let n = stream.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            buffer.extend_from_slice(&chunk[..n]);

            if let Some(end) = header_end(&buffer) {
                let expected = content_length(&buffer[..end]).saturating_add(end + 4);
                if buffer.len() >= expected {
                    break;
                }
            }
            if buffer.len() >= MAX_REQUEST_BYTES {
                break;
            }
        }

        Ok((!buffer.is_empty()).then_some(buffer))
    }
}
