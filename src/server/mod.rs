//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Servidor TCP que:
//! 1. Escucha en `host:port`
//! 2. Acepta conexiones (un thread cada una)
//! 3. Lee y parsea el request HTTP
//! 4. Lo despacha al router de la API y envía la respuesta

pub mod tcp;

pub use tcp::Server;
