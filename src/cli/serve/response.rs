//! HTTP responses the dev server writes itself.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::utils::mime::types::{HTML, JAVASCRIPT, PLAIN};

/// Respond with a static file. HTML gets `snippet` before `</body>`.
pub fn respond_file(request: Request, path: &Path, snippet: Option<&str>) -> Result<()> {
    let content_type = crate::utils::mime::from_path(path);
    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }

    let body = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let body = match snippet {
        Some(snippet) if content_type == HTML => {
            crate::render::append_to_body(&String::from_utf8_lossy(&body), snippet).into_bytes()
        }
        _ => body,
    };
    send_body(request, 200, content_type, body)
}

/// Respond with `<output>/404.html` if present, plain text otherwise.
pub fn respond_not_found(request: Request, output_dir: &Path, snippet: Option<&str>) -> Result<()> {
    let custom = output_dir.join("404.html");
    if custom.is_file() && !is_head_request(&request) {
        let body = fs::read_to_string(&custom)
            .with_context(|| format!("failed to read {}", custom.display()))?;
        let body = match snippet {
            Some(snippet) => crate::render::append_to_body(&body, snippet),
            None => body,
        };
        return send_body(request, 404, HTML, body.into_bytes());
    }
    send_body(request, 404, PLAIN, b"404 Not Found".to_vec())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_body(request, 503, PLAIN, b"503 Service Unavailable".to_vec())
}

/// Respond with the reload client.
pub fn respond_reload_js(request: Request, ws_port: u16) -> Result<()> {
    use crate::embed::serve::{RELOAD_JS, ReloadVars};

    let body = RELOAD_JS.render(&ReloadVars { ws_port });
    send_body(request, 200, JAVASCRIPT, body.into_bytes())
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &'static str) -> Result<()> {
    let response = Response::empty(StatusCode(status)).with_header(header("Content-Type", content_type)?);
    request.respond(response)?;
    Ok(())
}

fn send_body(request: Request, status: u16, content_type: &'static str, body: Vec<u8>) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(header("Content-Type", content_type)?)
        .with_header(header("Cache-Control", "no-cache")?);
    request.respond(response)?;
    Ok(())
}

fn header(key: &'static str, value: &'static str) -> Result<Header> {
    Header::from_bytes(key, value).map_err(|()| anyhow!("invalid header {key}: {value}"))
}
