//! # Códigos de Estado HTTP
//!
//! Los códigos que usa la API:
//!
//! - **2xx**: 200 para toda respuesta de la API, incluso `{"status": "error"}`
//! - **4xx**: body malformado, ruta inexistente, método equivocado
//! - **5xx**: fallo inesperado al armar la respuesta

/// Códigos de estado que devuelve el servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Ok = 200,

    /// Body que no es JSON válido o le falta un campo
    BadRequest = 400,

    NotFound = 404,

    /// La ruta existe pero con otro método
    MethodNotAllowed = 405,

    InternalServerError = 500,
}

impl StatusCode {
    /// ```
    /// use stats_server::http::StatusCode;
    /// assert_eq!(StatusCode::MethodNotAllowed.as_u16(), 405);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}
