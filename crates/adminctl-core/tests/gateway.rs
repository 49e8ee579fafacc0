//! Integration tests for the request gateway: bearer handling, proactive
//! refresh, 401 recovery, error mapping and refresh coalescing.

mod fixtures;

use std::sync::Arc;
use std::time::Duration;

use adminctl_core::GatewayError;
use adminctl_core::api::{PageQuery, UserFilter};
use adminctl_core::session::{AuthPhase, SessionEvent};
use fixtures::{
    admin_user, bearer, can_bind_localhost, client_for, expired_token, fresh_token, hits,
    seed_tokens, token_pair,
};
use reqwest::{Method, StatusCode};
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DASHBOARD: &str = "/api/v1/admin/dashboard";
const REFRESH: &str = "/api/v1/auth/refresh";

fn dashboard_body() -> Value {
    json!({ "total_users": 42, "active_jobs": 7 })
}

#[tokio::test]
async fn test_valid_token_is_sent_as_bearer() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    let client = client_for(&server);
    let access = fresh_token("a");
    seed_tokens(&client, &access, Some("r1"));

    Mock::given(method("GET"))
        .and(path(DASHBOARD))
        .and(header("authorization", bearer(&access)))
        .respond_with(ResponseTemplate::new(200).set_body_json(dashboard_body()))
        .expect(1)
        .mount(&server)
        .await;

    let stats = client.api().dashboard_stats().await.unwrap();
    assert_eq!(stats.total_users, 42);
    assert_eq!(stats.active_jobs, 7);
    assert_eq!(hits(&server, REFRESH).await, 0);
}

#[tokio::test]
async fn test_anonymous_request_has_no_authorization_header() {
    if !can_bind_localhost() {
        return;
    }
    let server = MockServer::start().await;
    let client = client_for(&server);

    Mock::given(method("GET"))
        .and(path(DASHBOARD))
        .respond_with(ResponseTemplate::new(200).set_body_json(dashboard_body()))
        .expect(1)
        .mount(&server)
        .await;

    client.api().dashboard_stats().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
    let agent = requests[0].headers.get("user-agent").unwrap().to_str().unwrap();
    assert!(agent.starts_with("adminctl/"));
}

#[tokio::test]
async fn test_expired_token_is_refreshed_before_send() {
    if !can_bind_localhost() {
        return;
    }
    let server = MockServer::start().await;
    let client = client_for(&server);
    let old = expired_token("old");
    let new = fresh_token("new");
    seed_tokens(&client, &old, Some("r1"));
    let mut events = client.state().events();

    Mock::given(method("POST"))
        .and(path(REFRESH))
        .and(body_json(json!({ "refreshToken": "r1" })))
        .respond_with(token_pair(&new, "r2"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(DASHBOARD))
        .and(header("authorization", bearer(&new)))
        .respond_with(ResponseTemplate::new(200).set_body_json(dashboard_body()))
        .expect(1)
        .mount(&server)
        .await;

    client.api().dashboard_stats().await.unwrap();

    assert_eq!(client.store().token().unwrap(), Some(new.clone()));
    assert_eq!(client.store().refresh_token().unwrap().as_deref(), Some("r2"));
    assert_eq!(client.state().snapshot().token, Some(new));
    assert_eq!(events.try_recv().unwrap(), SessionEvent::Refreshed);
}

#[tokio::test]
async fn test_unauthorized_response_refreshes_once_and_retries() {
    if !can_bind_localhost() {
        return;
    }
    let server = MockServer::start().await;
    let client = client_for(&server);
    let revoked = fresh_token("revoked");
    let new = fresh_token("new");
    seed_tokens(&client, &revoked, Some("r1"));

    Mock::given(method("GET"))
        .and(path(DASHBOARD))
        .and(header("authorization", bearer(&revoked)))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(token_pair(&new, "r2"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(DASHBOARD))
        .and(header("authorization", bearer(&new)))
        .respond_with(ResponseTemplate::new(200).set_body_json(dashboard_body()))
        .expect(1)
        .mount(&server)
        .await;

    let stats = client.api().dashboard_stats().await.unwrap();
    assert_eq!(stats.total_users, 42);
    assert_eq!(client.store().token().unwrap(), Some(new));
}

#[tokio::test]
async fn test_failed_refresh_after_401_expires_session() {
    if !can_bind_localhost() {
        return;
    }
    let server = MockServer::start().await;
    let client = client_for(&server);
    seed_tokens(&client, &fresh_token("a"), Some("r1"));
    client
        .store()
        .set_user(&serde_json::from_value(admin_user()).unwrap())
        .unwrap();
    let mut events = client.state().events();

    Mock::given(method("GET"))
        .and(path(DASHBOARD))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(401).set_body_string("refresh token revoked"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.api().dashboard_stats().await.unwrap_err();
    assert!(matches!(err, GatewayError::SessionExpired));
    assert_eq!(err.to_string(), "Session expired. Please log in again.");

    assert!(!client.store().has_session().unwrap());
    let snapshot = client.state().snapshot();
    assert_eq!(snapshot.phase, AuthPhase::Anonymous);
    assert_eq!(snapshot.token, None);
    assert_eq!(events.try_recv().unwrap(), SessionEvent::Expired);
}

#[tokio::test]
async fn test_failed_retry_expires_session_without_second_refresh() {
    if !can_bind_localhost() {
        return;
    }
    let server = MockServer::start().await;
    let client = client_for(&server);
    seed_tokens(&client, &fresh_token("a"), Some("r1"));

    Mock::given(method("GET"))
        .and(path(DASHBOARD))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(token_pair(&fresh_token("b"), "r2"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.api().dashboard_stats().await.unwrap_err();
    assert!(err.is_session_expired());
    assert_eq!(client.store().token().unwrap(), None);
}

#[tokio::test]
async fn test_unauthorized_after_proactive_refresh_is_reported() {
    if !can_bind_localhost() {
        return;
    }
    let server = MockServer::start().await;
    let client = client_for(&server);
    let new = fresh_token("new");
    seed_tokens(&client, &expired_token("old"), Some("r1"));

    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(token_pair(&new, "r2"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(DASHBOARD))
        .respond_with(ResponseTemplate::new(401).set_body_string("Not authenticated"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.api().dashboard_stats().await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    assert_eq!(err.to_string(), "401: Not authenticated");
    assert_eq!(client.store().token().unwrap(), Some(new));
}

#[tokio::test]
async fn test_missing_refresh_token_expires_without_sending() {
    if !can_bind_localhost() {
        return;
    }
    let server = MockServer::start().await;
    let client = client_for(&server);
    seed_tokens(&client, &expired_token("old"), None);

    Mock::given(method("GET"))
        .and(path(DASHBOARD))
        .respond_with(ResponseTemplate::new(200).set_body_json(dashboard_body()))
        .expect(0)
        .mount(&server)
        .await;

    let err = client.api().dashboard_stats().await.unwrap_err();
    assert!(err.is_session_expired());
    assert_eq!(hits(&server, REFRESH).await, 0);
}

#[tokio::test]
async fn test_error_status_carries_body_or_reason() {
    if !can_bind_localhost() {
        return;
    }
    let server = MockServer::start().await;
    let client = client_for(&server);
    seed_tokens(&client, &fresh_token("a"), Some("r1"));

    Mock::given(method("GET"))
        .and(path("/api/v1/users/99"))
        .respond_with(ResponseTemplate::new(404).set_body_string("User not found"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/jobs/5"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client.api().get_user(99).await.unwrap_err();
    match err {
        GatewayError::Http { status, message } => {
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(message, "User not found");
        }
        other => panic!("expected Http error, got {other:?}"),
    }

    let err = client.api().get_job(5).await.unwrap_err();
    assert_eq!(err.to_string(), "500: Internal Server Error");
    assert_eq!(hits(&server, REFRESH).await, 0);
    assert!(client.store().has_session().unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_expired_requests_share_one_refresh() {
    if !can_bind_localhost() {
        return;
    }
    let server = MockServer::start().await;
    let client = client_for(&server);
    let new = fresh_token("new");
    seed_tokens(&client, &expired_token("old"), Some("r1"));

    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(token_pair(&new, "r2").set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(DASHBOARD))
        .and(header("authorization", bearer(&new)))
        .respond_with(ResponseTemplate::new(200).set_body_json(dashboard_body()))
        .expect(5)
        .mount(&server)
        .await;

    let gateway = Arc::clone(client.gateway());
    let tasks: Vec<_> = (0..5)
        .map(|_| {
            let gateway = Arc::clone(&gateway);
            tokio::spawn(async move { gateway.get_json::<Value>("/admin/dashboard").await })
        })
        .collect();

    for task in tasks {
        task.await.unwrap().unwrap();
    }
    assert_eq!(hits(&server, REFRESH).await, 1);
}

#[tokio::test]
async fn test_list_users_sends_skip_limit_and_filters() {
    if !can_bind_localhost() {
        return;
    }
    let server = MockServer::start().await;
    let client = client_for(&server);
    seed_tokens(&client, &fresh_token("a"), Some("r1"));

    Mock::given(method("GET"))
        .and(path("/api/v1/admin/users"))
        .and(query_param("skip", "20"))
        .and(query_param("limit", "20"))
        .and(query_param("role", "worker"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [{ "id": 3, "email": "w@market.io", "role": "worker", "is_active": true }],
            "total": 21,
            "page": 2,
            "total_pages": 2,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let filter = UserFilter {
        role: Some("worker".to_string()),
        status: Some(String::new()),
    };
    let page = client
        .api()
        .list_users(PageQuery::new(2, 20), &filter)
        .await
        .unwrap();

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].email, "w@market.io");
    assert_eq!(page.summary(), "page 2/2 (21 total)");

    let requests = server.received_requests().await.unwrap();
    assert!(!requests[0].url.query().unwrap_or("").contains("status"));
}

#[tokio::test]
async fn test_mutation_sends_json_body() {
    if !can_bind_localhost() {
        return;
    }
    let server = MockServer::start().await;
    let client = client_for(&server);
    seed_tokens(&client, &fresh_token("a"), Some("r1"));

    Mock::given(method("POST"))
        .and(path("/api/v1/admin/users/12/suspend"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "duration_days": 7, "reason": "spam" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client.api().suspend_user(12, 7, "spam").await.unwrap();
    assert_eq!(reply["ok"], true);
}

#[tokio::test]
async fn test_empty_success_body_is_accepted() {
    if !can_bind_localhost() {
        return;
    }
    let server = MockServer::start().await;
    let client = client_for(&server);
    seed_tokens(&client, &fresh_token("a"), Some("r1"));

    Mock::given(method("PUT"))
        .and(path("/api/v1/users/4/verify"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client.api().verify_user(4).await.unwrap();
    assert_eq!(reply, Value::Null);
}

#[tokio::test]
async fn test_public_request_ignores_stored_token() {
    if !can_bind_localhost() {
        return;
    }
    let server = MockServer::start().await;
    let client = client_for(&server);
    seed_tokens(&client, &expired_token("stale"), Some("r1"));

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(token_pair(&fresh_token("n"), "r2"))
        .expect(1)
        .mount(&server)
        .await;

    client
        .gateway()
        .public_request(
            Method::POST,
            "/auth/login",
            Some(&json!({ "identifier": "ops", "password": "pw" })),
        )
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}
