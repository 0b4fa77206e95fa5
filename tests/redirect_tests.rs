//! Redirect following against the local server.

use std::sync::Arc;

use zenfetch::{
    Agent, Error, Format, HeaderValue, Method, RequestOptions, StatusCode,
    header::{AUTHORIZATION, LOCATION},
    request,
};

mod common;
use common::{LocalAgent, server_url};

#[async_std::test]
async fn redirects_are_not_followed_by_default() {
    let response = request(
        RequestOptions::new(server_url("/redirect/1")).validate(|status| status == StatusCode::FOUND),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.text(), Some("redirect"));
    assert_eq!(response.headers().get(LOCATION).unwrap(), "/redirect/0");
}

#[async_std::test]
async fn unfollowed_redirect_fails_default_validation() {
    let err = request(RequestOptions::new(server_url("/redirect/1")))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::FOUND));
}

#[async_std::test]
async fn chain_within_budget_resolves() {
    let response = request(RequestOptions::new(server_url("/redirect/3")).follow(3))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text(), Some("redirect complete"));
}

#[async_std::test]
async fn chain_over_budget_is_too_many_redirects() {
    let err = request(RequestOptions::new(server_url("/redirect/4")).follow(3))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TooManyRedirects { max: 3 }));
}

#[async_std::test]
async fn zero_budget_rejects_any_redirect() {
    let err = request(RequestOptions::new(server_url("/redirect/1")).follow(0))
        .await
        .unwrap_err();
    assert!(err.is_redirect_error());
}

#[async_std::test]
async fn see_other_switches_to_get() {
    let response = request(
        RequestOptions::new(server_url("/see-other"))
            .method(Method::POST)
            .body("payload")
            .follow(1),
    )
    .await
    .unwrap();
    assert_eq!(response.text(), Some("GET"));
}

#[async_std::test]
async fn temporary_redirect_keeps_the_method() {
    let response = request(
        RequestOptions::new(server_url("/redirect-to/307?url=/method"))
            .method(Method::POST)
            .follow(1),
    )
    .await
    .unwrap();
    assert_eq!(response.text(), Some("POST"));
}

#[async_std::test]
async fn absolute_location_is_followed() {
    let target = server_url("/text");
    let response = request(
        RequestOptions::new(server_url(&format!("/redirect-to/301?url={target}"))).follow(1),
    )
    .await
    .unwrap();
    assert_eq!(response.text(), Some("hello"));
}

// Relative locations are joined onto the URL of the redirecting attempt.
#[async_std::test]
async fn relative_location_is_resolved_against_the_current_url() {
    let response = request(
        RequestOptions::new(server_url("/redirect-to/302?url=../text")).follow(1),
    )
    .await
    .unwrap();
    assert_eq!(response.text(), Some("hello"));
}

#[async_std::test]
async fn redirect_bodies_are_decoded_too() {
    let err = request(
        RequestOptions::new(server_url("/redirect-to/302?url=/json"))
            .follow(1)
            .format(Format::Json),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::Parse(_)), "{err:?}");
}

fn authorized(url: &str, agent: Agent) -> RequestOptions {
    RequestOptions::new(url)
        .header(AUTHORIZATION, HeaderValue::from_static("Bearer secret"))
        .follow(1)
        .agent(agent)
}

#[async_std::test]
async fn authorization_is_kept_on_the_same_host() {
    let agent: Agent = Arc::new(LocalAgent::default());
    let response = request(authorized(
        "http://service.internal/redirect-to/302?url=/echo",
        agent,
    ))
    .await
    .unwrap();

    let echo: serde_json::Value = response.json().unwrap();
    assert_eq!(echo["authorization"], "Bearer secret");
}

#[async_std::test]
async fn authorization_is_dropped_when_the_host_changes() {
    let agent = Arc::new(LocalAgent::default());
    let shared: Agent = agent.clone();
    let response = request(authorized(
        "http://service.internal/redirect-to/302?url=http://other.internal/echo",
        shared,
    ))
    .await
    .unwrap();

    let echo: serde_json::Value = response.json().unwrap();
    assert!(echo["authorization"].is_null());
    assert_eq!(agent.seen.lock().unwrap()[1].0, "other.internal");
}

// A redirect without a Location header continues with an empty URL, which
// fails to parse on the next attempt.
#[async_std::test]
async fn missing_location_fails_as_an_invalid_url() {
    let err = request(RequestOptions::new(server_url("/no-location")).follow(2))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidUrl { ref url, .. } if url.is_empty()));
}

#[async_std::test]
async fn final_status_is_still_validated() {
    let err = request(
        RequestOptions::new(server_url("/redirect-to/302?url=/status/500")).follow(1),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
}
