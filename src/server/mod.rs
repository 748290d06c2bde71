//! Gateway server module
//!
//! Owns route-table assembly, request dispatch, and the accept loop. The
//! route table and static root are built once here and shared read-only with
//! every connection task; nothing mutates them at request time.

pub mod connection;
pub mod listener;
pub mod signal;
pub mod static_files;

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response};
use thiserror::Error;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use crate::api::{self, Handler};
use crate::http::response;
use crate::id::{IdGenerator, NanoId};
use crate::router::{Matched, NoMatch, RouteError, Router};

/// Wildcard route under which raw files are served from the static root.
const STATIC_PREFIX_PATTERN: &str = "/static/*filepath";

/// How long shutdown waits for in-flight connections before giving up.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Fatal construction/startup failures; the process must not start accepting
/// connections after any of these.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("bind address is required")]
    MissingBindAddress,
    #[error("invalid bind address '{addr}': {source}")]
    InvalidBindAddress {
        addr: String,
        source: std::net::AddrParseError,
    },
    #[error("static root '{path}' is not a readable directory")]
    StaticRootUnreadable { path: PathBuf },
    #[error(transparent)]
    Route(#[from] RouteError),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("database dsn is required")]
    MissingDatabaseDsn,
}

/// What a matched route dispatches to.
pub enum Endpoint {
    /// Resource handler producing an envelope or a typed failure.
    Api(Handler),
    /// Raw asset serving under the static prefix.
    StaticAssets,
}

pub struct ServerOptions {
    pub addr: String,
    pub static_root: Option<PathBuf>,
}

/// Shared, read-only request-dispatch state.
pub struct Gateway {
    router: Router<Endpoint>,
    static_root: Option<PathBuf>,
}

pub struct Server {
    addr: SocketAddr,
    gateway: Arc<Gateway>,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server").field("addr", &self.addr).finish()
    }
}

impl Server {
    /// Validate options and assemble the route table.
    pub fn new(options: ServerOptions) -> Result<Self, StartupError> {
        if options.addr.is_empty() {
            return Err(StartupError::MissingBindAddress);
        }
        let addr = options
            .addr
            .parse()
            .map_err(|source| StartupError::InvalidBindAddress {
                addr: options.addr.clone(),
                source,
            })?;

        if let Some(root) = &options.static_root {
            if !root.is_dir() {
                return Err(StartupError::StaticRootUnreadable { path: root.clone() });
            }
        }

        let gateway = build_gateway(options.static_root, Arc::new(NanoId))?;

        Ok(Self {
            addr,
            gateway: Arc::new(gateway),
        })
    }

    /// Bind the address and run the accept loop until `shutdown` fires, then
    /// drain in-flight connections.
    pub async fn run(&self, shutdown: Arc<Notify>) -> Result<(), StartupError> {
        let listener = listener::bind_listener(self.addr).map_err(|source| StartupError::Bind {
            addr: self.addr,
            source,
        })?;
        info!("gateway listening on http://{}", self.addr);

        let active = Arc::new(AtomicUsize::new(0));

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer_addr)) => {
                            debug!("connection accepted from {peer_addr}");
                            connection::handle_connection(
                                stream,
                                Arc::clone(&self.gateway),
                                Arc::clone(&active),
                            );
                        }
                        Err(e) => error!("failed to accept connection: {e}"),
                    }
                }
                () = shutdown.notified() => {
                    info!("shutdown requested, draining in-flight requests");
                    break;
                }
            }
        }

        drop(listener);
        drain(&active).await;
        Ok(())
    }
}

/// Build the immutable route table: resource routes first, then the static
/// prefix when a static root is configured.
fn build_gateway(
    static_root: Option<PathBuf>,
    ids: Arc<dyn IdGenerator>,
) -> Result<Gateway, RouteError> {
    let mut router = Router::new();

    for (method, pattern, handler) in api::groups::routes(ids) {
        router.insert(method, pattern, Endpoint::Api(handler))?;
    }

    if static_root.is_some() {
        router.insert(Method::GET, STATIC_PREFIX_PATTERN, Endpoint::StaticAssets)?;
    }

    Ok(Gateway {
        router,
        static_root,
    })
}

/// Feed one request through the route table.
///
/// A match goes to its endpoint; `NoMatch` falls back to the SPA shell when a
/// static root is configured and to a native 404 otherwise.
pub async fn dispatch(
    req: Request<api::Body>,
    gateway: Arc<Gateway>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let path = parts.uri.path();
    debug!("{} {path}", parts.method);

    match gateway.router.at(&parts.method, path) {
        Ok(Matched { value, params }) => match value {
            Endpoint::Api(handler) => {
                let handler = Arc::clone(handler);
                Ok(api::run(&handler, params, body).await)
            }
            Endpoint::StaticAssets => match &gateway.static_root {
                Some(root) => {
                    let rel = params.get("filepath").unwrap_or("");
                    Ok(static_files::serve_asset(root, rel).await)
                }
                // The static route is only registered with a root configured.
                None => Ok(response::not_found()),
            },
        },
        Err(NoMatch) => match &gateway.static_root {
            Some(root) => Ok(static_files::serve_shell(root).await),
            None => Ok(response::not_found()),
        },
    }
}

/// Wait for in-flight connections to finish, bounded by `SHUTDOWN_GRACE`.
async fn drain(active: &Arc<AtomicUsize>) {
    let deadline = tokio::time::Instant::now() + SHUTDOWN_GRACE;

    while active.load(Ordering::SeqCst) > 0 {
        if tokio::time::Instant::now() >= deadline {
            warn!(
                "shutdown grace period elapsed with {} connections still active",
                active.load(Ordering::SeqCst)
            );
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    info!("all connections drained");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_body;
    use http_body_util::BodyExt;
    use hyper::StatusCode;
    use serde_json::Value;
    use std::fs;

    fn gateway(static_root: Option<PathBuf>) -> Arc<Gateway> {
        Arc::new(build_gateway(static_root, Arc::new(NanoId)).unwrap())
    }

    fn request(method: Method, path: &str) -> Request<api::Body> {
        Request::builder()
            .method(method)
            .uri(path)
            .body(test_body(b""))
            .unwrap()
    }

    fn static_root() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<html>shell</html>").unwrap();
        fs::write(dir.path().join("app.js"), "console.log(1)").unwrap();
        dir
    }

    async fn body_bytes(response: Response<Full<Bytes>>) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[test]
    fn test_empty_bind_address_is_fatal() {
        let err = Server::new(ServerOptions {
            addr: String::new(),
            static_root: None,
        })
        .unwrap_err();
        assert!(matches!(err, StartupError::MissingBindAddress));
    }

    #[test]
    fn test_invalid_bind_address_is_fatal() {
        let err = Server::new(ServerOptions {
            addr: "not-an-address".to_string(),
            static_root: None,
        })
        .unwrap_err();
        assert!(matches!(err, StartupError::InvalidBindAddress { .. }));
    }

    #[test]
    fn test_missing_static_root_is_fatal() {
        let err = Server::new(ServerOptions {
            addr: "127.0.0.1:8080".to_string(),
            static_root: Some(PathBuf::from("/does/not/exist")),
        })
        .unwrap_err();
        assert!(matches!(err, StartupError::StaticRootUnreadable { .. }));
    }

    #[test]
    fn test_server_builds_with_valid_options() {
        let root = static_root();
        let server = Server::new(ServerOptions {
            addr: "127.0.0.1:8080".to_string(),
            static_root: Some(root.path().to_path_buf()),
        });
        assert!(server.is_ok());
    }

    #[tokio::test]
    async fn test_get_all_groups_scenario() {
        let gateway = gateway(None);

        let response = dispatch(request(Method::GET, "/api/group/get-all"), gateway)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            "application/json; charset=UTF-8"
        );

        let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert!(json["meta"].is_null());
        assert_eq!(json["data"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_create_group_scenario() {
        let gateway = gateway(None);

        let response = dispatch(request(Method::POST, "/api/group/create"), gateway)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert!(json["meta"].is_null());
        assert_eq!(json["data"]["id"].as_str().unwrap().len(), 21);
    }

    #[tokio::test]
    async fn test_unmatched_path_serves_shell_when_root_set() {
        let root = static_root();
        let gateway = gateway(Some(root.path().to_path_buf()));

        let response = dispatch(request(Method::GET, "/unknown/path"), gateway)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("Cache-Control").unwrap(),
            "max-age=0, no-cache, must-revalidate, proxy-revalidate"
        );
        assert!(response.headers().contains_key("Expires"));
        assert_eq!(&body_bytes(response).await[..], b"<html>shell</html>");
    }

    #[tokio::test]
    async fn test_unmatched_method_also_falls_back_to_shell() {
        let root = static_root();
        let gateway = gateway(Some(root.path().to_path_buf()));

        // Registered path, unregistered method: still no route match.
        let response = dispatch(request(Method::POST, "/api/group/get-all"), gateway)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(&body_bytes(response).await[..], b"<html>shell</html>");
    }

    #[tokio::test]
    async fn test_unmatched_path_is_404_without_root() {
        let gateway = gateway(None);

        let response = dispatch(request(Method::GET, "/unknown/path"), gateway)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_static_route_only_exists_with_root() {
        let gateway = gateway(None);

        // Without a static root this path is unmatched, hence native 404.
        let response = dispatch(request(Method::GET, "/static/app.js"), gateway)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_static_asset_served_by_exact_bytes() {
        let root = static_root();
        let gateway = gateway(Some(root.path().to_path_buf()));

        let response = dispatch(request(Method::GET, "/static/app.js"), gateway)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            "application/javascript"
        );
        assert_eq!(&body_bytes(response).await[..], b"console.log(1)");
    }

    #[tokio::test]
    async fn test_missing_static_asset_is_404_not_shell() {
        let root = static_root();
        let gateway = gateway(Some(root.path().to_path_buf()));

        let response = dispatch(request(Method::GET, "/static/missing.js"), gateway)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_ne!(&body_bytes(response).await[..], b"<html>shell</html>");
    }
}
