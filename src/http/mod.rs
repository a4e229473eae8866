//! # Módulo HTTP
//!
//! HTTP/1.0 mínimo sobre sockets TCP: parsing de requests (con body JSON
//! para los POST de la API), construcción de responses y códigos de estado.
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.0 200 OK\r\n
//! Content-Type: application/json\r\n
//! Content-Length: 12\r\n
//! \r\n
//! {"job_id":1}
//! ```

pub mod request;
pub mod response;
pub mod status;

pub use request::{Method, ParseError, Request};
pub use response::Response;
pub use status::StatusCode;
