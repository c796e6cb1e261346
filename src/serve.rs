//! Gate preview server.
//!
//! Serves the build output directory with every request first passing
//! through the edge route gate, so redirects, admin auth and not-found
//! deferral can be tried locally. Built on `tiny_http`:
//!
//! - Gate decision per request, reported in an `X-Gate-Rule` header
//! - Static file serving from the output directory for passed requests
//! - Manifest hot reload (via `watch` module)
//! - Graceful shutdown on Ctrl+C
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐
//! │   Main Thread   │     │  Watcher Thread  │
//! │  (HTTP Server)  │     │  (File Monitor)  │
//! └────────┬────────┘     └────────┬─────────┘
//!          │                       │
//!          ▼                       ▼
//!    Gate::evaluate()        rebuild / reload
//!    Serve files             Gate::reload()
//! ```

use crate::{
    build::open_gate,
    config::SiteConfig,
    gate::{Decision, Gate, GateRequest, Verdict, clear_cookie, extract_credential},
    log,
    watch::watch_for_changes_blocking,
};
use anyhow::{Context, Result, anyhow};
use std::{
    fs,
    io::Cursor,
    net::{IpAddr, SocketAddr},
    path::{Path, PathBuf},
    sync::Arc,
};
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

// ============================================================================
// Server Entry Point
// ============================================================================

/// Start the preview server with optional manifest watching.
///
/// Blocks until Ctrl+C is received.
pub fn serve_site(config: &'static SiteConfig) -> Result<()> {
    let interface = config.serve.interface_addr()?;

    let gate = Arc::new(open_gate(config)?);
    let (server, addr) = try_bind_port(interface, config.serve.port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);

    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        server_for_signal.unblock();
    })
    .context("Failed to set Ctrl+C handler")?;

    log!("serve"; "http://{}", addr);
    log!("gate"; "{}", gate.rule_names().join(" > "));

    if config.serve.watch {
        let gate = Arc::clone(&gate);
        std::thread::spawn(move || {
            if let Err(err) = watch_for_changes_blocking(config, &gate) {
                log!("watch"; "{err}");
            }
        });
    }

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, &gate, config) {
            log!("serve"; "request error: {e}");
        }
    }

    Ok(())
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(
    interface: IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(Server, SocketAddr)> {
    let mut last_err = None;
    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_err = Some(e),
        }
    }
    Err(anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        max_retries,
        base_port,
        base_port.saturating_add(max_retries.saturating_sub(1)),
        last_err.map(|e| e.to_string()).unwrap_or_default()
    ))
}

// ============================================================================
// Request Handling
// ============================================================================

/// Handle a single HTTP request: gate first, then the output directory.
fn handle_request(request: Request, gate: &Gate, config: &SiteConfig) -> Result<()> {
    let url_path = urlencoding::decode(request.url())
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_else(|_| request.url().to_owned());

    let credential = extract_credential(
        header_value(&request, "Cookie"),
        header_value(&request, "Authorization"),
        &config.gate.auth.cookie,
    );
    let gate_request = GateRequest::new(&url_path, credential);
    let verdict = gate.evaluate(&gate_request);

    let mut headers = vec![header("X-Gate-Rule", verdict.rule)?];
    if verdict.clear_credential {
        headers.push(header("Set-Cookie", &clear_cookie(&config.gate.auth.cookie))?);
    }

    match &verdict.decision {
        Decision::Pass => match resolve_file(&config.build.output, &gate_request.path) {
            Some(path) => serve_file(request, &path, headers),
            None => {
                let body = describe(&gate_request, &verdict);
                respond(request, 200, headers, TEXT_PLAIN, body)
            }
        },
        Decision::Redirect { location, .. } => {
            headers.push(header("Location", location)?);
            let status = verdict.decision.status().unwrap_or(302);
            respond(request, status, headers, TEXT_PLAIN, String::new())
        }
        Decision::Deny { status, body } => {
            respond(request, *status, headers, "application/json", body.clone())
        }
        Decision::NotFound => respond(request, 404, headers, TEXT_PLAIN, "404 Not Found".into()),
    }
}

/// Body for passed routes that have no file in the output directory.
fn describe(request: &GateRequest, verdict: &Verdict) -> String {
    format!("{} passed the gate ({})\n", request.path, verdict.rule)
}

/// Map a request path onto the output directory.
///
/// Tries the exact file, then `index.html` inside a directory, then
/// `<path>.html`. Paths escaping the output directory never resolve.
fn resolve_file(root: &Path, path: &str) -> Option<PathBuf> {
    let relative = path.trim_matches('/');
    if relative.split('/').any(|seg| seg == "..") {
        return None;
    }
    let local = root.join(relative);

    [
        local.clone(),
        local.join("index.html"),
        local.with_extension("html"),
    ]
    .into_iter()
    .find(|candidate| candidate.is_file())
}

// ============================================================================
// Response Helpers
// ============================================================================

fn header_value<'a>(request: &'a Request, name: &'static str) -> Option<&'a str> {
    request
        .headers()
        .iter()
        .find(|h| h.field.equiv(name))
        .map(|h| h.value.as_str())
}

fn header(name: &str, value: &str) -> Result<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes())
        .map_err(|()| anyhow!("Invalid header {name}: {value}"))
}

/// Serve a file with appropriate content type.
fn serve_file(request: Request, path: &Path, headers: Vec<Header>) -> Result<()> {
    let content = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let mut response =
        Response::from_data(content).with_header(header("Content-Type", guess_content_type(path))?);
    for h in headers {
        response.add_header(h);
    }
    request.respond(response)?;
    Ok(())
}

fn respond(
    request: Request,
    status: u16,
    mut headers: Vec<Header>,
    content_type: &str,
    body: String,
) -> Result<()> {
    headers.push(header("Content-Type", content_type)?);
    let len = body.len();
    let response = Response::new(StatusCode(status), headers, Cursor::new(body), Some(len), None);
    request.respond(response)?;
    Ok(())
}

// ============================================================================
// Content Type Detection
// ============================================================================

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",
        Some("txt") => "text/plain; charset=utf-8",

        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",

        Some("woff2") => "font/woff2",

        _ => "application/octet-stream",
    }
}
