// Connection handling
// One spawned task per accepted connection; requests on it are fed through
// the gateway dispatch.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use http_body_util::BodyExt;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tracing::{debug, warn};

use super::{dispatch, Gateway};
use crate::api::BodyError;

/// Per-connection read/write budget. Bounds how long a slow peer can hold a
/// handling task; not part of the observed upstream contract.
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Serve a single connection in a spawned task.
///
/// The active-connection counter is incremented before the task starts and
/// decremented when it finishes, so shutdown can drain in-flight work.
pub fn handle_connection(
    stream: tokio::net::TcpStream,
    gateway: Arc<Gateway>,
    active: Arc<AtomicUsize>,
) {
    active.fetch_add(1, Ordering::SeqCst);

    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let service = service_fn(move |req| {
            let gateway = Arc::clone(&gateway);
            let req = req.map(|body: hyper::body::Incoming| {
                body.map_err(|e| Box::new(e) as BodyError).boxed_unsync()
            });
            async move { dispatch(req, gateway).await }
        });

        let conn = http1::Builder::new().serve_connection(io, service);

        match tokio::time::timeout(CONNECTION_TIMEOUT, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => debug!("connection ended with error: {err}"),
            Err(_) => warn!(
                "connection timed out after {} seconds",
                CONNECTION_TIMEOUT.as_secs()
            ),
        }

        active.fetch_sub(1, Ordering::SeqCst);
    });
}
