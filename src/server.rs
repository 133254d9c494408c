//! Minimal HTTP/1.1 front end.
//!
//! Accepts `POST /` with a JSON body and answers with the JSON envelope from
//! `service::respond`. One request per connection (`Connection: close`); each
//! connection is served on its own thread. Handlers share nothing but the
//! static state registry and a copy of the parse options.

use std::fmt;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use crate::ingest::record::ParseOptions;
use crate::logging::{self, Component};
use crate::model::ResponseEnvelope;
use crate::service::{self, STATUS_BAD_REQUEST, STATUS_NOT_FOUND};

/// Bodies larger than this are refused before reading.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Cap on the request line plus all header lines.
pub const MAX_HEADER_BYTES: usize = 16 * 1024;

/// How long a connection may sit idle mid-request before it is dropped.
pub const READ_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Framing errors
// ---------------------------------------------------------------------------

/// Reasons a request could not be framed off the socket.
#[derive(Debug)]
pub enum RequestError {
    /// Socket read failed or timed out.
    Io(io::Error),
    /// Request line or headers are not valid HTTP.
    Malformed(String),
    /// Request line plus headers exceed `MAX_HEADER_BYTES`.
    HeadersTooLarge,
    /// Declared `Content-Length` exceeds `MAX_BODY_BYTES`.
    BodyTooLarge(usize),
    /// A `Transfer-Encoding` (e.g. chunked) the server does not decode.
    UnsupportedTransferEncoding(String),
}

impl RequestError {
    pub fn status_code(&self) -> u16 {
        match self {
            RequestError::Io(e) if is_timeout(e) => 408,
            RequestError::Io(_) | RequestError::Malformed(_) => STATUS_BAD_REQUEST,
            RequestError::HeadersTooLarge => 431,
            RequestError::BodyTooLarge(_) => 413,
            RequestError::UnsupportedTransferEncoding(_) => 501,
        }
    }
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Io(e) if is_timeout(e) => write!(f, "read timed out: {}", e),
            RequestError::Io(e) => write!(f, "read failed: {}", e),
            RequestError::Malformed(msg) => write!(f, "malformed request: {}", msg),
            RequestError::HeadersTooLarge => {
                write!(f, "headers exceed limit of {} bytes", MAX_HEADER_BYTES)
            }
            RequestError::BodyTooLarge(len) => {
                write!(f, "body of {} bytes exceeds limit of {}", len, MAX_BODY_BYTES)
            }
            RequestError::UnsupportedTransferEncoding(te) => {
                write!(f, "unsupported Transfer-Encoding: {}", te)
            }
        }
    }
}

impl std::error::Error for RequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RequestError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for RequestError {
    fn from(e: io::Error) -> Self {
        RequestError::Io(e)
    }
}

// ---------------------------------------------------------------------------
// Request framing
// ---------------------------------------------------------------------------

/// The parts of an HTTP request the service looks at.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub body: Vec<u8>,
}

/// Reads one line of the request head, failing once the header budget in
/// `head` is spent without reaching a newline.
fn read_head_line<B: BufRead>(head: &mut io::Take<B>, line: &mut String) -> Result<usize, RequestError> {
    let n = head.read_line(line)?;
    if n > 0 && !line.ends_with('\n') && head.limit() == 0 {
        return Err(RequestError::HeadersTooLarge);
    }
    Ok(n)
}

/// Reads one request: request line, headers up to the blank line, then
/// `Content-Length` bytes of body. Only identity bodies are accepted.
pub fn read_request<R: Read>(reader: R) -> Result<HttpRequest, RequestError> {
    let mut reader = BufReader::new(reader);
    let mut head = reader.by_ref().take(MAX_HEADER_BYTES as u64);

    let mut request_line = String::new();
    read_head_line(&mut head, &mut request_line)?;
    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(path)) = (parts.next(), parts.next()) else {
        return Err(RequestError::Malformed(format!(
            "bad request line: {:?}",
            request_line.trim_end()
        )));
    };
    let method = method.to_string();
    let path = path.to_string();

    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        if read_head_line(&mut head, &mut line)? == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let (name, value) = (name.trim(), value.trim());
        if name.eq_ignore_ascii_case("content-length") {
            content_length = value
                .parse()
                .map_err(|_| RequestError::Malformed(format!("bad Content-Length: {}", value)))?;
        } else if name.eq_ignore_ascii_case("transfer-encoding") && !value.eq_ignore_ascii_case("identity") {
            return Err(RequestError::UnsupportedTransferEncoding(value.to_string()));
        }
    }

    if content_length > MAX_BODY_BYTES {
        return Err(RequestError::BodyTooLarge(content_length));
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body)?;

    Ok(HttpRequest { method, path, body })
}

/// Applies the per-connection socket timeouts.
pub fn configure_stream(stream: &TcpStream, timeout: Duration) -> io::Result<()> {
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))
}

/// Serialises a status line, JSON headers and the envelope body.
pub fn write_response<W: Write>(mut writer: W, status: u16, envelope: &ResponseEnvelope) -> io::Result<()> {
    let body = serde_json::to_vec(envelope).map_err(io::Error::other)?;
    write!(
        writer,
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        reason_phrase(status),
        body.len()
    )?;
    writer.write_all(&body)?;
    writer.flush()
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        413 => "Payload Too Large",
        431 => "Request Header Fields Too Large",
        501 => "Not Implemented",
        _ => "Internal Server Error",
    }
}

/// Routes a framed request to the service.
pub fn route(request: &HttpRequest, options: ParseOptions) -> (u16, ResponseEnvelope) {
    if request.path != "/" {
        return (STATUS_NOT_FOUND, ResponseEnvelope::fail("not found"));
    }
    service::respond(&request.method, &request.body, options)
}

// ---------------------------------------------------------------------------
// Connection handling
// ---------------------------------------------------------------------------

fn handle_connection(mut stream: TcpStream, options: ParseOptions) {
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    if let Err(e) = configure_stream(&stream, READ_TIMEOUT) {
        logging::log_transport_failure(&peer, "set socket timeouts", &e);
        return;
    }

    let (status, envelope) = match read_request(&mut stream) {
        Ok(request) => {
            logging::debug(
                Component::Server,
                Some(&peer),
                &format!("{} {} ({} bytes)", request.method, request.path, request.body.len()),
            );
            route(&request, options)
        }
        Err(e) => {
            logging::log_transport_failure(&peer, "read request", &e);
            (e.status_code(), ResponseEnvelope::fail(format!("can't read the body: {}", e)))
        }
    };

    if let Err(e) = write_response(&mut stream, status, &envelope) {
        logging::log_transport_failure(&peer, "write response", &e);
        return;
    }
    logging::info(Component::Server, Some(&peer), &format!("{} {}", status, envelope.result));
}

/// Serves connections from an already bound listener until it fails.
pub fn serve_on(listener: TcpListener, options: ParseOptions) -> io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        logging::info(Component::Server, None, &format!("listening on {}", addr));
    }
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                thread::spawn(move || handle_connection(stream, options));
            }
            Err(e) => logging::log_transport_failure("listener", "accept", &e),
        }
    }
    Ok(())
}

/// Binds `0.0.0.0:<port>` and serves forever.
pub fn serve(port: u16, options: ParseOptions) -> io::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port))?;
    serve_on(listener, options)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_request_with_body() {
        let raw = b"POST / HTTP/1.1\r\nHost: localhost\r\ncontent-length: 4\r\n\r\nabcdEXTRA";
        let request = read_request(&raw[..]).unwrap();
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/");
        assert_eq!(request.body, b"abcd");
    }

    #[test]
    fn test_read_request_without_body() {
        let request = read_request(&b"GET / HTTP/1.1\r\n\r\n"[..]).unwrap();
        assert_eq!(request.method, "GET");
        assert!(request.body.is_empty());
    }

    #[test]
    fn test_read_request_rejects_garbage() {
        assert!(read_request(&b"\r\n"[..]).is_err());
        assert!(read_request(&b"POST / HTTP/1.1\r\nContent-Length: x\r\n\r\n"[..]).is_err());
    }

    #[test]
    fn test_oversized_headers_are_rejected() {
        let mut raw = b"POST / HTTP/1.1\r\nX-Pad: ".to_vec();
        raw.extend(std::iter::repeat_n(b'a', 8 * 1024 * 1024));
        raw.extend_from_slice(b"\r\nContent-Length: 2\r\n\r\n{}");

        let err = read_request(&raw[..]).unwrap_err();
        assert!(matches!(err, RequestError::HeadersTooLarge), "got: {:?}", err);
        assert_eq!(err.status_code(), 431);
    }

    #[test]
    fn test_headers_within_cap_are_accepted() {
        let pad = "a".repeat(MAX_HEADER_BYTES / 2);
        let raw = format!("POST / HTTP/1.1\r\nX-Pad: {}\r\nContent-Length: 2\r\n\r\n{{}}", pad);
        let request = read_request(raw.as_bytes()).unwrap();
        assert_eq!(request.body, b"{}");
    }

    #[test]
    fn test_chunked_body_is_rejected_not_misread() {
        let json = r#"{"req_type":"parseAddress","data":[{"item":"John Daggett, 341 King Road, Plymouth MA"}]}"#;
        let raw = format!(
            "POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n{:x}\r\n{}\r\n0\r\n\r\n",
            json.len(),
            json
        );

        let err = read_request(raw.as_bytes()).unwrap_err();
        assert!(
            matches!(err, RequestError::UnsupportedTransferEncoding(ref te) if te == "chunked"),
            "got: {:?}",
            err
        );
        assert_eq!(err.status_code(), 501);
    }

    #[test]
    fn test_idle_connection_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let _client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (mut stream, _) = listener.accept().unwrap();

        configure_stream(&stream, READ_TIMEOUT).unwrap();
        assert_eq!(stream.read_timeout().unwrap(), Some(READ_TIMEOUT));

        configure_stream(&stream, Duration::from_millis(50)).unwrap();
        let err = read_request(&mut stream).unwrap_err();
        assert!(matches!(err, RequestError::Io(_)), "got: {:?}", err);
        assert_eq!(err.status_code(), 408);
    }

    #[test]
    fn test_truncated_body_is_error() {
        let raw = b"POST / HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc";
        assert!(read_request(&raw[..]).is_err());
    }

    #[test]
    fn test_unknown_path_is_not_found() {
        let request = HttpRequest {
            method: "POST".into(),
            path: "/parse".into(),
            body: Vec::new(),
        };
        let (status, envelope) = route(&request, ParseOptions::default());
        assert_eq!(status, 404);
        assert!(!envelope.is_success());
    }

    #[test]
    fn test_write_response_frames_json() {
        let mut out = Vec::new();
        write_response(&mut out, 405, &ResponseEnvelope::fail("only POST method allowed")).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 405 Method Not Allowed\r\n"));
        let (_, body) = text.split_once("\r\n\r\n").unwrap();
        let envelope: ResponseEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.result, "fail");
        assert!(text.contains(&format!("Content-Length: {}\r\n", body.len())));
    }
}
