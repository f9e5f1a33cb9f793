use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, State},
    http::{header::USER_AGENT, HeaderMap},
    Json,
};
use domain::{CastVote, ClientInfo, SubmitComment};
use engine::{AdmissionEngine, EngineError, VoteLedger};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use tracing::debug;

// Fields are optional so a missing one maps to MissingField instead of a 422.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNewRequest {
    pub commenter_token: Option<String>,
    pub domain: Option<String>,
    pub path: Option<String>,
    pub post_id: Option<String>,
    pub parent_hex: Option<String>,
    pub markdown: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentVoteRequest {
    pub commenter_token: Option<String>,
    pub comment_hex: Option<String>,
    pub direction: Option<i64>,
}

/// Failures are reported with HTTP 200 and `success: false`.
fn failure(message: impl std::fmt::Display) -> Json<Value> {
    Json(json!({ "success": false, "message": message.to_string() }))
}

fn client_info(peer: SocketAddr, headers: &HeaderMap) -> ClientInfo {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty());
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default()
        .to_string();

    ClientInfo {
        ip: forwarded.unwrap_or_else(|| peer.ip().to_string()),
        user_agent,
    }
}

pub async fn comment_new(
    State(engine): State<AdmissionEngine>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    payload: Result<Json<CommentNewRequest>, JsonRejection>,
) -> Json<Value> {
    let Json(x) = match payload {
        Ok(p) => p,
        Err(e) => {
            debug!("Rejected comment body: {}", e);
            return failure(e.body_text());
        }
    };

    let (Some(commenter_token), Some(domain), Some(post_id), Some(parent_hex), Some(markdown)) =
        (x.commenter_token, x.domain, x.post_id, x.parent_hex, x.markdown)
    else {
        return failure(EngineError::MissingField);
    };

    let req = SubmitComment {
        commenter_token,
        domain,
        path: x.path.unwrap_or_default(),
        post_id,
        parent_hex,
        markdown,
    };

    match engine.submit(req, client_info(peer, &headers)).await {
        Ok(admitted) => Json(json!({
            "success": true,
            "commentHex": admitted.comment_hex,
            "state": admitted.state,
            "html": admitted.html,
        })),
        Err(e) => failure(e),
    }
}

pub async fn comment_vote(
    State(ledger): State<VoteLedger>,
    payload: Result<Json<CommentVoteRequest>, JsonRejection>,
) -> Json<Value> {
    let Json(x) = match payload {
        Ok(p) => p,
        Err(e) => return failure(e.body_text()),
    };

    let (Some(commenter_token), Some(comment_hex), Some(direction)) =
        (x.commenter_token, x.comment_hex, x.direction)
    else {
        return failure(EngineError::MissingField);
    };

    let req = CastVote {
        commenter_token,
        comment_hex,
        direction,
    };
    match ledger.cast(req).await {
        Ok(()) => Json(json!({ "success": true })),
        Err(e) => failure(e),
    }
}
