//! HTTP conversion endpoint.
//!
//! Routes:
//! - `POST /h5p-to-scorm`: JSON body (see [`ConvertRequest`]); the query
//!   parameter `restrictWidthAndCenter` overrides the body field. Responds
//!   with the archive as `application/octet-stream`.
//! - `GET /health`: liveness probe.
//!
//! The accept loop runs on a background thread and hands each request to
//! its own worker thread, so slow conversions never block each other.

use std::io::Read;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::error::{ConvertError, ErrorResponse, Result};
use crate::pipeline::Converter;
use crate::request::{process, ConvertRequest};

pub const CONVERT_ROUTE: &str = "/h5p-to-scorm";
pub const HEALTH_ROUTE: &str = "/health";

/// Largest accepted request body. Requests carry a path, not the package.
const MAX_BODY_BYTES: u64 = 1024 * 1024;

/// Handle to the running conversion server.
pub struct ConvertServer {
    shutdown: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
    addr: SocketAddr,
}

impl ConvertServer {
    /// Bind `bind` and start serving on a background thread.
    pub fn start(bind: &str, converter: Arc<Converter>) -> Result<Self> {
        let requested: SocketAddr = bind
            .parse()
            .map_err(|e| ConvertError::Config(format!("invalid bind address '{bind}': {e}")))?;

        let server = tiny_http::Server::http(requested).map_err(|e| {
            ConvertError::Io(std::io::Error::other(format!(
                "failed to start server on {requested}: {e}"
            )))
        })?;
        let addr = server.server_addr().to_ip().unwrap_or(requested);

        info!(addr = %addr, route = CONVERT_ROUTE, "conversion server started");

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let thread = thread::Builder::new()
            .name("scormify-http".to_string())
            .spawn(move || {
                serve_loop(server, converter, &shutdown_clone);
            })?;

        Ok(Self {
            shutdown,
            thread: Some(thread),
            addr,
        })
    }

    /// The bound address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Block until the accept loop exits.
    pub fn wait(mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }

    /// Stop accepting requests. In-flight conversions run to completion on
    /// their worker threads.
    pub fn shutdown(mut self) {
        self.stop();
        info!("conversion server stopped");
    }

    fn stop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        // Unblock the accept loop
        let _ = std::net::TcpStream::connect(self.addr);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for ConvertServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn serve_loop(server: tiny_http::Server, converter: Arc<Converter>, shutdown: &AtomicBool) {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        let request = match server.recv_timeout(Duration::from_secs(1)) {
            Ok(Some(req)) => req,
            Ok(None) => continue,
            Err(e) => {
                if !shutdown.load(Ordering::SeqCst) {
                    error!(error = %e, "server accept error");
                }
                break;
            }
        };

        if shutdown.load(Ordering::SeqCst) {
            let _ = request
                .respond(tiny_http::Response::from_string("shutting down").with_status_code(503));
            break;
        }

        let converter = Arc::clone(&converter);
        let spawned = thread::Builder::new()
            .name("scormify-worker".to_string())
            .spawn(move || handle(request, &converter));
        if let Err(e) = spawned {
            error!(error = %e, "failed to spawn request worker");
        }
    }
}

fn handle(mut request: tiny_http::Request, converter: &Converter) {
    let url = request.url().to_string();
    let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));
    let method = request.method().clone();
    debug!(method = %method, url = %url, "request");

    match (&method, path) {
        (tiny_http::Method::Post, CONVERT_ROUTE) => {
            let mut body = String::new();
            let read = request
                .as_reader()
                .take(MAX_BODY_BYTES)
                .read_to_string(&mut body);
            if let Err(e) = read {
                respond_error(request, &ErrorResponse::bad_request(format!("unreadable body: {e}")));
                return;
            }
            let outcome = ConvertRequest::from_json(&body)
                .map(|req| req.with_query(query))
                .and_then(|req| process(converter, &req));
            match outcome {
                Ok(converted) => {
                    let mut response = tiny_http::Response::from_data(converted.bytes);
                    for header in [
                        header("Content-Type", "application/octet-stream"),
                        header(
                            "Content-disposition",
                            &format!("attachment;filename={}", converted.file_name),
                        ),
                    ]
                    .into_iter()
                    .flatten()
                    {
                        response.add_header(header);
                    }
                    if let Err(e) = request.respond(response) {
                        warn!(error = %e, "failed to send archive");
                    }
                }
                Err(e) => respond_error(request, &e.to_response()),
            }
        }
        (tiny_http::Method::Get, HEALTH_ROUTE) => {
            let _ = request.respond(tiny_http::Response::from_string("ok"));
        }
        _ => {
            let _ = request
                .respond(tiny_http::Response::from_string("not found").with_status_code(404));
        }
    }
}

fn respond_error(request: tiny_http::Request, body: &ErrorResponse) {
    let mut response =
        tiny_http::Response::from_string(body.to_json()).with_status_code(body.status);
    if let Some(header) = header("Content-Type", "application/json") {
        response.add_header(header);
    }
    if let Err(e) = request.respond(response) {
        warn!(error = %e, "failed to send error response");
    }
}

fn header(name: &str, value: &str) -> Option<tiny_http::Header> {
    tiny_http::Header::from_bytes(name.as_bytes(), value.as_bytes()).ok()
}
