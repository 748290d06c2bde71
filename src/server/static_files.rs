//! Static asset and SPA shell serving
//!
//! Raw files are served byte-for-byte under the static prefix with a native
//! 404 on miss; every unmatched route instead receives the SPA entry file
//! with headers that force revalidation on each request. Hashed assets under
//! the prefix can be cached for a long time since their names change with
//! their content.

use std::path::Path;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use tokio::fs;
use tracing::{error, warn};

use crate::http::{mime, response};

/// SPA entry file, relative to the static root.
const SHELL_FILE: &str = "index.html";

/// Fixed past date for the `Expires` header on shell responses.
const SHELL_EXPIRES: &str = "Tue, 03 Jul 2001 06:00:00 GMT";

const SHELL_CACHE_CONTROL: &str = "max-age=0, no-cache, must-revalidate, proxy-revalidate";

const ASSET_CACHE_CONTROL: &str = "public, max-age=31536000";

/// Serve the file at `rel` (the captured wildcard) below `root`.
pub async fn serve_asset(root: &Path, rel: &str) -> Response<Full<Bytes>> {
    match load_asset(root, rel).await {
        Some((content, content_type)) => build_asset_response(content, content_type),
        None => response::not_found(),
    }
}

/// Serve the SPA shell with no-cache headers.
pub async fn serve_shell(root: &Path) -> Response<Full<Bytes>> {
    let shell = root.join(SHELL_FILE);
    match fs::read(&shell).await {
        Ok(content) => build_shell_response(content),
        Err(e) => {
            warn!("SPA shell '{}' unreadable: {e}", shell.display());
            response::not_found()
        }
    }
}

/// Resolve and read an asset, refusing paths that escape the static root.
async fn load_asset(root: &Path, rel: &str) -> Option<(Vec<u8>, &'static str)> {
    let clean = rel.trim_start_matches('/');
    if clean.is_empty() {
        return None;
    }

    let root_canonical = match root.canonicalize() {
        Ok(path) => path,
        Err(e) => {
            warn!("static root '{}' not accessible: {e}", root.display());
            return None;
        }
    };

    // Missing files are the common 404 case, no need to log.
    let Ok(file_canonical) = root.join(clean).canonicalize() else {
        return None;
    };
    if !file_canonical.starts_with(&root_canonical) {
        warn!(
            "path traversal attempt blocked: {rel} -> {}",
            file_canonical.display()
        );
        return None;
    }
    if !file_canonical.is_file() {
        return None;
    }

    let content = match fs::read(&file_canonical).await {
        Ok(content) => content,
        Err(e) => {
            error!("failed to read file '{}': {e}", file_canonical.display());
            return None;
        }
    };

    let content_type = mime::get_content_type(file_canonical.extension().and_then(|e| e.to_str()));

    Some((content, content_type))
}

fn build_asset_response(content: Vec<u8>, content_type: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(200)
        .header("Content-Type", content_type)
        .header("Content-Length", content.len())
        .header("Cache-Control", ASSET_CACHE_CONTROL)
        .body(Full::new(Bytes::from(content)))
        .unwrap_or_else(|e| {
            response::log_build_error("asset", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

fn build_shell_response(content: Vec<u8>) -> Response<Full<Bytes>> {
    Response::builder()
        .status(200)
        .header("Content-Type", "text/html; charset=utf-8")
        .header("Content-Length", content.len())
        .header("Expires", SHELL_EXPIRES)
        .header("Cache-Control", SHELL_CACHE_CONTROL)
        .body(Full::new(Bytes::from(content)))
        .unwrap_or_else(|e| {
            response::log_build_error("shell", &e);
            Response::new(Full::new(Bytes::new()))
        })
}
