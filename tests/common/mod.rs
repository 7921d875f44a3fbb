#![allow(dead_code)]

use mockito::{Matcher, Mock, ServerGuard};
use serde_json::{Value, json};

use app::config::{Config, ConfigInner};
use app::state::AppState;

pub fn test_state(oracle_base_url: &str) -> AppState {
    let config = Config::new(ConfigInner {
        host: "127.0.0.1".to_owned(),
        port: 0,
        allowed_origin: "http://localhost:3000".to_owned(),
        oracle_base_url: oracle_base_url.to_owned(),
    });
    AppState::new(config)
}

/// Judge answers `user.info` for this handle with a plain profile.
pub async fn mock_profile(server: &mut ServerGuard, handle: &str, rating: i32) -> Mock {
    server
        .mock("GET", "/user.info")
        .match_query(Matcher::UrlEncoded("handles".into(), handle.into()))
        .with_body(
            json!({
                "status": "OK",
                "result": [{
                    "handle": handle,
                    "rating": rating,
                    "maxRating": rating + 100,
                    "rank": "specialist"
                }]
            })
            .to_string(),
        )
        .create_async()
        .await
}

/// Judge answers `user.status` for this handle with the given submissions.
pub async fn mock_submissions(server: &mut ServerGuard, handle: &str, submissions: Value) -> Mock {
    server
        .mock("GET", "/user.status")
        .match_query(Matcher::UrlEncoded("handle".into(), handle.into()))
        .with_body(json!({ "status": "OK", "result": submissions }).to_string())
        .create_async()
        .await
}

pub fn submission(id: u64, contest: u32, index: &str, secs: i64, verdict: Option<&str>) -> Value {
    let mut value = json!({
        "id": id,
        "creationTimeSeconds": secs,
        "problem": { "contestId": contest, "index": index },
        "programmingLanguage": "GNU C++20",
        "passedTestCount": 5
    });
    if let Some(verdict) = verdict {
        value["verdict"] = json!(verdict);
    }
    value
}
