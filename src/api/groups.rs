// Group resource handlers
// Placeholder data until the projection store lands; the routing and envelope
// contract is the part exercised here.

use std::sync::Arc;

use http_body_util::BodyExt;
use hyper::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Body, Failure, Handler, Reply};
use crate::id::IdGenerator;
use crate::router::Params;

const PLACEHOLDER_USER_ID: &str = "253c1f34-3fe1-4684-9118-c74ea1973bea";

#[derive(Debug, Serialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub user_id: String,
}

/// Command acknowledgment carrying the minted resource identifier.
#[derive(Debug, Serialize)]
pub struct CommandAck {
    pub id: String,
}

#[derive(Debug, Deserialize)]
struct CreateCommand {
    #[serde(default)]
    name: Option<String>,
}

/// Route definitions for the group resource.
pub fn routes(ids: Arc<dyn IdGenerator>) -> Vec<(Method, &'static str, Handler)> {
    let get_all_ids = Arc::clone(&ids);
    let get_all: Handler = Arc::new(move |params, body| {
        let ids = Arc::clone(&get_all_ids);
        Box::pin(async move { group_get_all(params, body, ids).await })
    });

    let create: Handler = Arc::new(move |params, body| {
        let ids = Arc::clone(&ids);
        Box::pin(async move { group_create(params, body, ids).await })
    });

    vec![
        (Method::GET, "/api/group/get-all", get_all),
        (Method::POST, "/api/group/create", create),
    ]
}

async fn group_get_all(
    _params: Params,
    _body: Body,
    ids: Arc<dyn IdGenerator>,
) -> Result<Reply, Failure> {
    let mut groups = Vec::with_capacity(3);
    for n in 1..=3 {
        groups.push(Group {
            id: ids.generate()?,
            name: format!("My group {n}"),
            user_id: PLACEHOLDER_USER_ID.to_string(),
        });
    }

    Reply::with(groups)
}

async fn group_create(
    _params: Params,
    body: Body,
    ids: Arc<dyn IdGenerator>,
) -> Result<Reply, Failure> {
    let body = body
        .collect()
        .await
        .map_err(|e| Failure::InvalidBody(format!("failed to read request body: {e}")))?
        .to_bytes();

    // The command body is optional for now, but when present it has to parse.
    if !body.is_empty() {
        let command: CreateCommand =
            serde_json::from_slice(&body).map_err(|e| Failure::InvalidBody(e.to_string()))?;
        debug!(name = ?command.name, "create group command received");
    }

    let id = ids.generate()?;
    Reply::with(CommandAck { id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_body;
    use crate::id::{IdError, NanoId};
    use crate::router::Params;
    use hyper::StatusCode;

    struct FailingGenerator;

    impl IdGenerator for FailingGenerator {
        fn generate(&self) -> Result<String, IdError> {
            Err(IdError {
                reason: "entropy source unavailable".to_string(),
            })
        }
    }

    async fn get_all(ids: Arc<dyn IdGenerator>) -> Result<Reply, Failure> {
        group_get_all(Params::default(), test_body(b""), ids).await
    }

    async fn create(body: &[u8], ids: Arc<dyn IdGenerator>) -> Result<Reply, Failure> {
        group_create(Params::default(), test_body(body), ids).await
    }

    #[tokio::test]
    async fn test_get_all_returns_three_groups() {
        let reply = get_all(Arc::new(NanoId)).await.unwrap();
        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.meta.is_none());

        let groups = reply.data.as_array().unwrap();
        assert_eq!(groups.len(), 3);
        for (index, group) in groups.iter().enumerate() {
            assert_eq!(group["name"], format!("My group {}", index + 1));
            assert_eq!(group["user_id"], PLACEHOLDER_USER_ID);
            assert_eq!(group["id"].as_str().unwrap().len(), 21);
        }
    }

    #[tokio::test]
    async fn test_create_acknowledges_with_id() {
        let reply = create(b"", Arc::new(NanoId)).await.unwrap();

        let id = reply.data["id"].as_str().unwrap();
        assert_eq!(id.len(), 21);
        assert_eq!(reply.data.as_object().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_accepts_command_body() {
        let reply = create(br#"{"name":"ops"}"#, Arc::new(NanoId)).await.unwrap();
        assert!(reply.data["id"].is_string());
    }

    #[tokio::test]
    async fn test_create_rejects_malformed_body() {
        let failure = create(b"{not json", Arc::new(NanoId)).await.unwrap_err();
        assert!(matches!(failure, Failure::InvalidBody(_)));
        assert_eq!(failure.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_generation_failure_is_not_swallowed() {
        let failure = get_all(Arc::new(FailingGenerator)).await.unwrap_err();
        assert!(matches!(failure, Failure::IdGeneration(_)));
        assert_eq!(failure.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let failure = create(b"", Arc::new(FailingGenerator)).await.unwrap_err();
        assert!(matches!(failure, Failure::IdGeneration(_)));
    }
}
