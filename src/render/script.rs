//! Default server-entry loader: run the entry with a JS runtime.
//!
//! Every render spawns `<runtime...> <entry>`, writes one JSON render request
//! to stdin and reads one JSON render response from stdout:
//!
//! ```text
//! → {"kind":"request","request":{"method":"GET","url":"/a?x=1","path":"/a","headers":{..},"body":".."},
//!    "options":{"renderMode":"server-rendered","documentOnly":false}}
//! → {"kind":"document","routePath":"/a","options":{..}}
//! ← {"status":200,"headers":{"content-type":"text/html"},"body":"<!doctype html>.."}
//! ```

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tiny_http::{Header, Request, Response, StatusCode};

use super::{
    LoadError, ModuleLoader, RenderError, RenderOptions, RenderResponse, RequestContext,
    ServerModule,
};
use crate::debug;
use crate::utils::exec::Cmd;
use crate::utils::hash;
use crate::utils::mime;
use crate::utils::path::route::request_path;

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum RenderRequest<'a> {
    Request {
        request: RequestInfo,
        options: &'a RenderOptions,
    },
    #[serde(rename_all = "camelCase")]
    Document {
        route_path: &'a str,
        options: &'a RenderOptions,
    },
}

#[derive(Serialize)]
struct RequestInfo {
    method: String,
    url: String,
    path: String,
    headers: BTreeMap<String, String>,
    /// Request payload as text; omitted when empty.
    #[serde(skip_serializing_if = "String::is_empty")]
    body: String,
}

impl RequestInfo {
    /// Snapshot of `request`, consuming its body.
    fn read(request: &mut Request) -> Result<Self, RenderError> {
        let headers = request
            .headers()
            .iter()
            .map(|h| {
                (
                    h.field.as_str().as_str().to_ascii_lowercase(),
                    h.value.as_str().to_owned(),
                )
            })
            .collect();

        let mut raw = Vec::new();
        request
            .as_reader()
            .read_to_end(&mut raw)
            .map_err(RenderError::Body)?;

        Ok(Self {
            method: request.method().to_string(),
            url: request.url().to_owned(),
            path: request_path(request.url()),
            headers,
            body: String::from_utf8_lossy(&raw).into_owned(),
        })
    }
}

/// Loads server entries as [`ScriptModule`]s.
#[derive(Debug, Clone)]
pub struct ScriptLoader {
    runtime: Vec<String>,
    root: PathBuf,
    html_snippet: Option<String>,
}

impl ScriptLoader {
    pub fn new(runtime: Vec<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            runtime,
            root: root.into(),
            html_snippet: None,
        }
    }

    /// Markup appended to every served HTML body (the dev reload client).
    pub fn with_html_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.html_snippet = Some(snippet.into());
        self
    }
}

impl ModuleLoader for ScriptLoader {
    fn load(&self, entry: &Path) -> Result<Arc<dyn ServerModule>, LoadError> {
        let source = std::fs::read(entry).map_err(|e| LoadError::Io(entry.to_path_buf(), e))?;
        if source.iter().all(u8::is_ascii_whitespace) {
            return Err(LoadError::Truncated(entry.to_path_buf()));
        }

        let revision = hash::fingerprint(&source);
        debug!("render"; "loaded {} ({})", entry.display(), revision);

        Ok(Arc::new(ScriptModule {
            runtime: self.runtime.clone(),
            root: self.root.clone(),
            entry: entry.to_path_buf(),
            revision,
            html_snippet: self.html_snippet.clone(),
        }))
    }
}

/// One loaded revision of the server entry.
#[derive(Debug)]
pub struct ScriptModule {
    runtime: Vec<String>,
    root: PathBuf,
    entry: PathBuf,
    revision: String,
    html_snippet: Option<String>,
}

impl ScriptModule {
    pub fn revision(&self) -> &str {
        &self.revision
    }

    fn run(&self, request: &RenderRequest<'_>) -> Result<RenderResponse, RenderError> {
        let payload = serde_json::to_vec(request).map_err(RenderError::Protocol)?;
        let cmd = Cmd::from_slice(&self.runtime)
            .arg(&self.entry)
            .cwd(&self.root)
            .stdin(payload);
        let program = cmd.program_name();

        let output = cmd.output().map_err(|e| RenderError::Spawn(program, e))?;
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(RenderError::Exit {
                status: output.status.code(),
                stderr: stderr.trim().to_owned(),
            });
        }
        if !stderr.trim().is_empty() {
            debug!("render"; "{}", stderr.trim());
        }

        parse_response(&String::from_utf8_lossy(&output.stdout))
    }

    fn finish_body(&self, response: &mut RenderResponse) {
        let Some(snippet) = &self.html_snippet else {
            return;
        };
        let is_html = response
            .headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .is_none_or(|(_, v)| v.starts_with("text/html"));
        if is_html {
            response.body = append_to_body(&response.body, snippet);
        }
    }
}

impl ServerModule for ScriptModule {
    fn render_to_response(
        &self,
        ctx: RequestContext,
        options: &RenderOptions,
    ) -> Result<(), RenderError> {
        let mut request = ctx.request;
        let info = RequestInfo::read(&mut request)?;

        let mut response = self.run(&RenderRequest::Request {
            request: info,
            options,
        })?;
        self.finish_body(&mut response);

        request
            .respond(into_http(response))
            .map_err(RenderError::Respond)
    }

    fn render_document(
        &self,
        route_path: &str,
        options: &RenderOptions,
    ) -> Result<RenderResponse, RenderError> {
        self.run(&RenderRequest::Document {
            route_path,
            options,
        })
    }
}

/// Parse stdout, tolerating log lines printed before the JSON response.
fn parse_response(stdout: &str) -> Result<RenderResponse, RenderError> {
    serde_json::from_str(stdout.trim()).or_else(|err| {
        stdout
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .and_then(|line| serde_json::from_str(line).ok())
            .ok_or(RenderError::Protocol(err))
    })
}

/// Insert `snippet` before the last `</body>`, or append it.
pub(crate) fn append_to_body(html: &str, snippet: &str) -> String {
    match html.rfind("</body>") {
        Some(pos) => format!("{}{snippet}{}", &html[..pos], &html[pos..]),
        None => format!("{html}{snippet}"),
    }
}

fn into_http(response: RenderResponse) -> Response<std::io::Cursor<Vec<u8>>> {
    let has_content_type = response
        .headers
        .keys()
        .any(|k| k.eq_ignore_ascii_case("content-type"));

    let mut http = Response::from_data(response.body.into_bytes())
        .with_status_code(StatusCode(response.status));
    if !has_content_type && let Ok(header) = Header::from_bytes("Content-Type", mime::types::HTML) {
        http.add_header(header);
    }
    for (name, value) in &response.headers {
        match Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(header) => http.add_header(header),
            Err(()) => debug!("render"; "dropped invalid header `{}`", name),
        }
    }
    http
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RenderMode;
    use tempfile::TempDir;

    fn options() -> RenderOptions {
        RenderOptions {
            render_mode: RenderMode::StaticallyGenerated,
            document_only: false,
        }
    }

    #[test]
    fn test_request_wire_format() {
        let options = options();
        let json = serde_json::to_value(RenderRequest::Document {
            route_path: "/about",
            options: &options,
        })
        .unwrap();
        assert_eq!(json["kind"], "document");
        assert_eq!(json["routePath"], "/about");
        assert_eq!(json["options"]["renderMode"], "statically-generated");
        assert_eq!(json["options"]["documentOnly"], false);
    }

    #[test]
    fn test_request_info_carries_body() {
        let mut request: Request = tiny_http::TestRequest::new()
            .with_method(tiny_http::Method::Post)
            .with_path("/login?next=%2F")
            .with_header(Header::from_bytes("Content-Type", "application/json").unwrap())
            .with_body("{\"user\":\"ada\"}")
            .into();

        let json = serde_json::to_value(RequestInfo::read(&mut request).unwrap()).unwrap();
        assert_eq!(json["method"], "POST");
        assert_eq!(json["path"], "/login");
        assert_eq!(json["headers"]["content-type"], "application/json");
        assert_eq!(json["body"], "{\"user\":\"ada\"}");
    }

    #[test]
    fn test_request_info_omits_empty_body() {
        let mut request: Request = tiny_http::TestRequest::new().with_path("/").into();
        let json = serde_json::to_value(RequestInfo::read(&mut request).unwrap()).unwrap();
        assert_eq!(json["method"], "GET");
        assert!(json.get("body").is_none());
    }

    #[test]
    fn test_parse_response_with_logs() {
        let stdout = "[app] booting\n{\"status\":201,\"body\":\"ok\"}\n";
        let response = parse_response(stdout).unwrap();
        assert_eq!(response.status, 201);
        assert_eq!(response.body, "ok");

        assert!(matches!(
            parse_response("not json"),
            Err(RenderError::Protocol(_))
        ));
    }

    #[test]
    fn test_append_to_body() {
        assert_eq!(
            append_to_body("<html><body><p>x</p></body></html>", "<script></script>"),
            "<html><body><p>x</p><script></script></body></html>"
        );
        assert_eq!(append_to_body("<p>x</p>", "<s/>"), "<p>x</p><s/>");
    }

    #[test]
    fn test_load_errors() {
        let dir = TempDir::new().unwrap();
        let loader = ScriptLoader::new(vec!["node".into()], dir.path());

        let missing = dir.path().join("missing.mjs");
        assert!(matches!(loader.load(&missing), Err(LoadError::Io(..))));

        let empty = dir.path().join("empty.mjs");
        std::fs::write(&empty, "  \n").unwrap();
        assert!(matches!(loader.load(&empty), Err(LoadError::Truncated(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_render_document_through_runtime() {
        let dir = TempDir::new().unwrap();
        let entry = dir.path().join("entry.sh");
        // Echo the request kind back inside the body.
        std::fs::write(
            &entry,
            "read req\ncase \"$req\" in *document*) k=document;; *) k=request;; esac\n\
             printf '{\"status\":200,\"body\":\"<p>%s</p>\"}' \"$k\"\n",
        )
        .unwrap();

        let loader = ScriptLoader::new(vec!["sh".into()], dir.path());
        let module = loader.load(&entry).unwrap();
        let response = module.render_document("/", &options()).unwrap();
        assert_eq!(response.body, "<p>document</p>");
    }

    #[cfg(unix)]
    #[test]
    fn test_render_failure_exit() {
        let dir = TempDir::new().unwrap();
        let entry = dir.path().join("entry.sh");
        std::fs::write(&entry, "echo 'ReferenceError: window is not defined' >&2\nexit 1\n")
            .unwrap();

        let loader = ScriptLoader::new(vec!["sh".into()], dir.path());
        let module = loader.load(&entry).unwrap();
        let Err(RenderError::Exit { status, stderr }) = module.render_document("/", &options())
        else {
            panic!("expected exit error");
        };
        assert_eq!(status, Some(1));
        assert!(stderr.contains("window is not defined"));
    }
}
