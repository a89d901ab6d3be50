//! End-to-end tests: the full router, an in-memory database and the session
//! cookie carried between requests by hand.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use chrono::NaiveDate;
use serde_json::Value;
use tower::ServiceExt;

use corkboard_api::board::LOGIN_ERROR;
use corkboard_api::countdown::Countdown;
use corkboard_api::middleware::{SESSION_COOKIE, SessionKeys};
use corkboard_api::{AppState, AppStateInner, router};
use corkboard_db::Database;

const SECRET: &[u8] = b"integration-test-secret-0123456789";

fn test_state(countdown: Option<Countdown>) -> AppState {
    Arc::new(AppStateInner {
        db: Database::open_in_memory().expect("in-memory database"),
        sessions: SessionKeys::new(SECRET, chrono::Duration::hours(1)),
        countdown,
    })
}

fn test_app() -> (Router, AppState) {
    let state = test_state(None);
    (router::build(state.clone()), state)
}

fn get(uri: &str, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = session {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = session {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.unwrap()
}

async fn json_body(resp: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// All `Set-Cookie` values for the session cookie.
fn session_set_cookies(resp: &Response<Body>) -> Vec<String> {
    resp.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter(|v| v.starts_with(&format!("{SESSION_COOKIE}=")))
        .map(str::to_string)
        .collect()
}

/// The `name=value` pair to send back as a `Cookie` header.
fn session_pair(resp: &Response<Body>) -> Option<String> {
    session_set_cookies(resp)
        .into_iter()
        .next()
        .and_then(|v| v.split(';').next().map(str::to_string))
}

fn location(resp: &Response<Body>) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

async fn signup(app: &Router, username: &str, password: &str) -> Response<Body> {
    send(
        app,
        post_form("/signup", &format!("username={username}&password={password}"), None),
    )
    .await
}

async fn login(app: &Router, username: &str, password: &str) -> Response<Body> {
    send(
        app,
        post_form("/login", &format!("username={username}&password={password}"), None),
    )
    .await
}

/// Sign up and log in; returns the session cookie pair.
async fn signed_in(app: &Router, username: &str) -> String {
    signup(app, username, "password").await;
    let resp = login(app, username, "password").await;
    session_pair(&resp).expect("login sets a session cookie")
}

async fn post_message(app: &Router, content: &str, session: Option<&str>) -> Response<Body> {
    send(app, post_form("/new_comment", &format!("content={content}"), session)).await
}

// -- Signup --

#[tokio::test]
async fn signup_redirects_without_logging_in() {
    let (app, _) = test_app();
    let resp = signup(&app, "alice", "pw").await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");
    assert!(session_set_cookies(&resp).is_empty());
}

#[tokio::test]
async fn duplicate_signup_conflicts() {
    let (app, _) = test_app();
    assert_eq!(signup(&app, "alice", "pw").await.status(), StatusCode::SEE_OTHER);

    let resp = signup(&app, "alice", "other").await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(resp).await["error"], "username already taken");
}

#[tokio::test]
async fn empty_username_rejected() {
    let (app, _) = test_app();
    let resp = signup(&app, "", "pw").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// -- Login / session --

#[tokio::test]
async fn login_authenticates_following_requests() {
    let (app, state) = test_app();
    signup(&app, "alice", "pw").await;
    let user_id = state.db.get_user_by_username("alice").unwrap().unwrap().id;

    let resp = login(&app, "alice", "pw").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");
    let set_cookie = &session_set_cookies(&resp)[0];
    assert!(set_cookie.contains("HttpOnly"));

    let cookie = session_pair(&resp).unwrap();
    let feed = json_body(send(&app, get("/", Some(&cookie))).await).await;
    assert_eq!(feed["viewer"]["id"], user_id);
    assert_eq!(feed["viewer"]["username"], "alice");
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let (app, _) = test_app();
    signup(&app, "alice", "right").await;

    let wrong_password = login(&app, "alice", "wrong").await;
    let unknown_user = login(&app, "mallory", "right").await;

    assert_eq!(wrong_password.status(), StatusCode::OK);
    assert_eq!(unknown_user.status(), StatusCode::OK);
    assert!(session_set_cookies(&wrong_password).is_empty());
    assert!(session_set_cookies(&unknown_user).is_empty());

    let a = json_body(wrong_password).await;
    let b = json_body(unknown_user).await;
    assert_eq!(a, b);
    assert_eq!(a["error"], LOGIN_ERROR);
    assert_eq!(a["action"], "/login");
}

#[tokio::test]
async fn anonymous_feed_has_no_viewer() {
    let (app, _) = test_app();
    let resp = send(&app, get("/", None)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let feed = json_body(resp).await;
    assert!(feed["viewer"].is_null());
    assert!(feed.get("countdown").is_none());
    assert_eq!(feed["messages"], serde_json::json!([]));
}

#[tokio::test]
async fn forged_cookie_is_anonymous() {
    let (app, _) = test_app();
    signup(&app, "alice", "pw").await;

    let forged = SessionKeys::new(b"not-the-server-secret-not-the-server", chrono::Duration::hours(1))
        .issue(1)
        .unwrap();
    let cookie = format!("{SESSION_COOKIE}={forged}");

    let feed = json_body(send(&app, get("/", Some(&cookie))).await).await;
    assert!(feed["viewer"].is_null());
    assert_eq!(
        post_message(&app, "sneaky", Some(&cookie)).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn stale_session_degrades_and_is_cleared() {
    let (app, state) = test_app();
    let token = state.sessions.issue(4242).unwrap();
    let cookie = format!("{SESSION_COOKIE}={token}");

    let resp = send(&app, get("/", Some(&cookie))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cleared = session_set_cookies(&resp);
    assert_eq!(cleared.len(), 1);
    assert!(cleared[0].contains("Max-Age=0"));

    let feed = json_body(resp).await;
    assert!(feed["viewer"].is_null());
}

#[tokio::test]
async fn logout_clears_session() {
    let (app, _) = test_app();
    let cookie = signed_in(&app, "alice").await;

    let resp = send(&app, get("/logout", Some(&cookie))).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");
    let cleared = session_set_cookies(&resp);
    assert_eq!(cleared.len(), 1);
    assert!(cleared[0].contains("Max-Age=0"));
}

#[tokio::test]
async fn logout_without_session_still_redirects() {
    let (app, _) = test_app();
    let resp = send(&app, get("/logout", None)).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
}

// -- Posting --

#[tokio::test]
async fn anonymous_post_is_unauthorized() {
    let (app, state) = test_app();
    let resp = post_message(&app, "hello", None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(state.db.count_messages().unwrap(), 0);

    // no body at all still answers 401, not a form rejection
    let resp = send(&app, post_form("/new_comment", "", None)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn posted_message_round_trips_through_feed() {
    let (app, state) = test_app();
    let cookie = signed_in(&app, "alice").await;
    let alice = state.db.get_user_by_username("alice").unwrap().unwrap();

    let resp = post_message(&app, "hello", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");

    let feed = json_body(send(&app, get("/", None)).await).await;
    let messages = feed["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["content"], "hello");
    assert_eq!(messages[0]["writer_id"], alice.id);
    assert_eq!(messages[0]["writer_username"], "alice");
}

#[tokio::test]
async fn blank_message_rejected() {
    let (app, state) = test_app();
    let cookie = signed_in(&app, "alice").await;

    let resp = post_message(&app, "+++", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(state.db.count_messages().unwrap(), 0);
}

// -- Listing --

#[tokio::test]
async fn feed_shows_first_ten_oldest_first() {
    let (app, _) = test_app();
    let cookie = signed_in(&app, "alice").await;
    for i in 0..12 {
        post_message(&app, &format!("m{i}"), Some(&cookie)).await;
    }

    let feed = json_body(send(&app, get("/", None)).await).await;
    let contents: Vec<_> = feed["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap().to_string())
        .collect();
    let expected: Vec<_> = (0..10).map(|i| format!("m{i}")).collect();
    assert_eq!(contents, expected);
}

#[tokio::test]
async fn comment_pages() {
    let (app, _) = test_app();
    let cookie = signed_in(&app, "alice").await;
    for i in 0..12 {
        post_message(&app, &format!("m{i}"), Some(&cookie)).await;
    }

    let page = json_body(send(&app, get("/comments/1", None)).await).await;
    assert_eq!(page["page"], 1);
    assert_eq!(page["page_size"], 5);
    assert_eq!(page["messages"].as_array().unwrap().len(), 5);
    assert_eq!(page["messages"][0]["content"], "m0");

    let page = json_body(send(&app, get("/comments/3", None)).await).await;
    let contents: Vec<_> = page["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, ["m10", "m11"]);

    let resp = send(&app, get("/comments/9", None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["messages"], serde_json::json!([]));
}

// -- Profiles --

#[tokio::test]
async fn profile_lookup() {
    let (app, state) = test_app();
    signup(&app, "alice", "pw").await;
    let id = state.db.get_user_by_username("alice").unwrap().unwrap().id;

    let resp = send(&app, get(&format!("/users/{id}"), None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let profile = json_body(resp).await;
    assert_eq!(profile["id"], id);
    assert_eq!(profile["username"], "alice");
    assert!(profile.get("password").is_none());

    let resp = send(&app, get(&format!("/users/{}", id + 1), None)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// -- Forms and extras --

#[tokio::test]
async fn form_pages() {
    let (app, _) = test_app();
    for (uri, fields) in [
        ("/signup", serde_json::json!(["username", "password"])),
        ("/login", serde_json::json!(["username", "password"])),
        ("/new_comment", serde_json::json!(["content"])),
    ] {
        let resp = send(&app, get(uri, None)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let form = json_body(resp).await;
        assert_eq!(form["action"], uri);
        assert_eq!(form["fields"], fields);
        assert!(form.get("error").is_none());
    }
}

#[tokio::test]
async fn every_page_shows_the_viewer() {
    let (app, _) = test_app();
    let cookie = signed_in(&app, "alice").await;
    signup(&app, "bob", "pw").await;

    for uri in ["/", "/signup", "/login", "/new_comment", "/users/2"] {
        let resp = send(&app, get(uri, Some(&cookie))).await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
        let page = json_body(resp).await;
        assert_eq!(page["viewer"]["username"], "alice", "{uri}");
    }

    // the profile itself is still bob's
    let profile = json_body(send(&app, get("/users/2", Some(&cookie))).await).await;
    assert_eq!(profile["username"], "bob");
}

#[tokio::test]
async fn failed_login_form_keeps_viewer_context() {
    let (app, _) = test_app();
    let cookie = signed_in(&app, "alice").await;

    let resp = send(
        &app,
        post_form("/login", "username=alice&password=nope", Some(&cookie)),
    )
    .await;
    let form = json_body(resp).await;
    assert_eq!(form["error"], LOGIN_ERROR);
    assert_eq!(form["viewer"]["username"], "alice");
}

#[tokio::test]
async fn countdown_on_every_page_when_configured() {
    let target = NaiveDate::from_ymd_opt(2017, 11, 16).unwrap();
    let state = test_state(Some(Countdown::new(target)));
    let app = router::build(state.clone());
    signup(&app, "alice", "pw").await;

    for uri in ["/signup", "/login", "/new_comment", "/users/1"] {
        let page = json_body(send(&app, get(uri, None)).await).await;
        assert_eq!(page["countdown"]["target"], "2017-11-16", "{uri}");
        assert!(page["viewer"].is_null(), "{uri}");
    }
}

#[tokio::test]
async fn countdown_on_feed_when_configured() {
    let target = NaiveDate::from_ymd_opt(2017, 11, 16).unwrap();
    let app = router::build(test_state(Some(Countdown::new(target))));

    let feed = json_body(send(&app, get("/", None)).await).await;
    assert_eq!(feed["countdown"]["target"], "2017-11-16");
    // long past
    assert!(feed["countdown"]["days"].as_i64().unwrap() < 0);
}
