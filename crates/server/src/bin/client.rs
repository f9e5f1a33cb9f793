use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommentNewRequest {
    commenter_token: String,
    domain: String,
    path: String,
    post_id: String,
    parent_hex: String,
    markdown: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommentVoteRequest {
    commenter_token: String,
    comment_hex: String,
    direction: i64,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Posts a comment and, if a second token is given, votes on it.
///
/// TWOCENTS_CLIENT_AUTHOR defaults to "anonymous"; TWOCENTS_CLIENT_VOTER is optional.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let base_url = env_or("TWOCENTS_CLIENT_URL", DEFAULT_BASE_URL);
    let domain = env_or("TWOCENTS_CLIENT_DOMAIN", "demo.example");
    let author = env_or("TWOCENTS_CLIENT_AUTHOR", "anonymous");
    let voter = std::env::var("TWOCENTS_CLIENT_VOTER").ok();

    let client = reqwest::Client::new();
    println!("Starting smoke test against {}...", base_url);

    println!("\n[1/2] Submitting comment as {}...", author);
    let payload = CommentNewRequest {
        commenter_token: author,
        domain,
        path: "/hello".to_string(),
        post_id: "hello-post".to_string(),
        parent_hex: "root".to_string(),
        markdown: "This is a message from the **smoke test** client!".to_string(),
    };

    let start = Instant::now();
    let resp: Value = client
        .post(format!("{}/api/comment/new", base_url))
        .json(&payload)
        .send()
        .await?
        .json()
        .await?;
    println!("   -> {} ({:.2?})", resp, start.elapsed());

    if resp["success"] != true {
        println!("   -> Comment was not admitted, stopping.");
        return Ok(());
    }
    let comment_hex = resp["commentHex"].as_str().unwrap_or_default().to_string();

    let Some(voter) = voter else {
        println!("\n[2/2] No TWOCENTS_CLIENT_VOTER set, skipping vote.");
        return Ok(());
    };

    println!("\n[2/2] Voting on {}...", comment_hex);
    let vote = CommentVoteRequest {
        commenter_token: voter,
        comment_hex,
        direction: 1,
    };
    let resp: Value = client
        .post(format!("{}/api/comment/vote", base_url))
        .json(&vote)
        .send()
        .await?
        .json()
        .await?;
    println!("   -> {}", resp);

    Ok(())
}
