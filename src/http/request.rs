//! # Parsing de Requests HTTP/1.0
//! src/http/request.rs
//!
//! ## Formato de un Request
//!
//! ```text
//! POST /api/states_mean HTTP/1.0\r\n
//! Content-Type: application/json\r\n
//! Content-Length: 44\r\n
//! \r\n
//! {"question": "Percent of adults aged 18..."}
//! ```
//!
//! El cuerpo se toma tal cual (bytes) después de la línea vacía; los handlers
//! lo interpretan como JSON con `Request::json`.

use serde::de::DeserializeOwned;
use std::collections::HashMap;
use thiserror::Error;

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Métodos HTTP soportados
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    GET,
    POST,
}

impl Method {
    fn parse(s: &str) -> Result<Self, ParseError> {
        match s {
            "GET" => Ok(Method::GET),
            "POST" => Ok(Method::POST),
            _ => Err(ParseError::UnsupportedMethod(s.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
        }
    }
}

/// Errores de parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Empty request")]
    EmptyRequest,

    #[error("Invalid request line format")]
    InvalidRequestLine,

    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("Invalid HTTP version: {0}")]
    InvalidHttpVersion(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

/// Request HTTP/1.0 parseado
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,

    /// Path sin query string (ej: "/api/get_results/3")
    path: String,

    /// Headers con el nombre en minúsculas
    headers: HashMap<String, String>,

    version: String,
    body: Vec<u8>,
}

impl Request {
    /// Parsea un request completo desde bytes
    ///
    /// ```
    /// use stats_server::http::Request;
    ///
    /// let raw = b"POST /api/best5 HTTP/1.0\r\nContent-Length: 2\r\n\r\n{}";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.path(), "/api/best5");
    /// assert_eq!(request.body(), b"{}");
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        let (head, body) = match header_end(buffer) {
            Some(end) => (&buffer[..end], &buffer[end + HEADER_TERMINATOR.len()..]),
            None => (buffer, &[][..]),
        };

        let head = std::str::from_utf8(head).map_err(|_| ParseError::InvalidRequestLine)?;
        if head.trim().is_empty() {
            return Err(ParseError::EmptyRequest);
        }

        let mut lines = head.split("\r\n");
        let request_line = lines.next().ok_or(ParseError::EmptyRequest)?;
        let (method, path, version) = Self::parse_request_line(request_line)?;
        let headers = Self::parse_headers(lines)?;

        Ok(Request {
            method,
            path,
            headers,
            version,
            body: body.to_vec(),
        })
    }

    /// `METHOD /path[?query] HTTP/1.x`
    fn parse_request_line(line: &str) -> Result<(Method, String, String), ParseError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 3 {
            return Err(ParseError::InvalidRequestLine);
        }

        let method = Method::parse(parts[0])?;

        // La API no usa query strings
        let path = parts[1].split('?').next().unwrap_or_default().to_string();

        let version = parts[2].to_string();
        if version != "HTTP/1.0" && version != "HTTP/1.1" {
            return Err(ParseError::InvalidHttpVersion(version));
        }

        Ok((method, path, version))
    }

    fn parse_headers<'a>(
        lines: impl Iterator<Item = &'a str>,
    ) -> Result<HashMap<String, String>, ParseError> {
        let mut headers = HashMap::new();

        for line in lines {
            if line.trim().is_empty() {
                break;
            }
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| ParseError::InvalidHeader(line.to_string()))?;
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }

        Ok(headers)
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Header por nombre, sin distinguir mayúsculas
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|s| s.as_str())
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Deserializa el body como JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Posición del `\r\n\r\n` que cierra los headers
pub fn header_end(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(HEADER_TERMINATOR.len())
        .position(|w| w == HEADER_TERMINATOR)
}

/// `Content-Length` declarado en los headers crudos (0 si no hay)
pub fn content_length(head: &[u8]) -> usize {
    let Ok(head) = std::str::from_utf8(head) else {
        return 0;
    };

    head.split("\r\n")
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_parse_simple_get() {
        let raw = b"GET / HTTP/1.0\r\n\r\n";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.path(), "/");
        assert_eq!(request.version(), "HTTP/1.0");
        assert!(request.body().is_empty());
    }

    #[test]
    fn test_parse_without_terminator() {
        let request = Request::parse(b"GET /api/jobs HTTP/1.1").unwrap();
        assert_eq!(request.path(), "/api/jobs");
    }

    #[test]
    fn test_query_string_is_dropped() {
        let request = Request::parse(b"GET /api/num_jobs?x=1 HTTP/1.0\r\n\r\n").unwrap();
        assert_eq!(request.path(), "/api/num_jobs");
    }

    #[test]
    fn test_headers_case_insensitive() {
        let raw = b"GET / HTTP/1.0\r\nContent-Type: application/json\r\nX-Test:  a b \r\n\r\n";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.header("X-TEST"), Some("a b"));
        assert_eq!(request.header("missing"), None);
    }

    #[test]
    fn test_post_body_json() {
        #[derive(Deserialize)]
        struct Body {
            question: String,
        }

        let raw = b"POST /api/states_mean HTTP/1.0\r\nContent-Length: 16\r\n\r\n{\"question\":\"Q\"}";
        let request = Request::parse(raw).unwrap();
        assert_eq!(request.method(), Method::POST);

        let body: Body = request.json().unwrap();
        assert_eq!(body.question, "Q");
    }

    #[test]
    fn test_body_may_contain_crlf() {
        let raw = b"POST /x HTTP/1.0\r\n\r\n{\r\n\"a\": 1\r\n}";
        let request = Request::parse(raw).unwrap();
        assert_eq!(request.body(), b"{\r\n\"a\": 1\r\n}");
    }

    #[test]
    fn test_errors() {
        assert_eq!(Request::parse(b"").unwrap_err(), ParseError::EmptyRequest);
        assert_eq!(
            Request::parse(b"GET /\r\n\r\n").unwrap_err(),
            ParseError::InvalidRequestLine
        );
        assert_eq!(
            Request::parse(b"DELETE / HTTP/1.0\r\n\r\n").unwrap_err(),
            ParseError::UnsupportedMethod("DELETE".to_string())
        );
        assert_eq!(
            Request::parse(b"GET / HTTP/2.0\r\n\r\n").unwrap_err(),
            ParseError::InvalidHttpVersion("HTTP/2.0".to_string())
        );
        assert!(matches!(
            Request::parse(b"GET / HTTP/1.0\r\nBroken\r\n\r\n"),
            Err(ParseError::InvalidHeader(_))
        ));
        assert_eq!(
            Request::parse(b"\x00\xff\xfe garbage").unwrap_err(),
            ParseError::InvalidRequestLine
        );
    }

    #[test]
    fn test_header_end_and_content_length() {
        let raw = b"POST / HTTP/1.0\r\ncontent-length: 12\r\n\r\nbody";
        let end = header_end(raw).unwrap();
        assert_eq!(&raw[end..end + 4], b"\r\n\r\n");
        assert_eq!(content_length(&raw[..end]), 12);

        assert_eq!(header_end(b"GET / HTTP/1.0\r\n"), None);
        assert_eq!(content_length(b"GET / HTTP/1.0\r\nHost: x"), 0);
    }
}
