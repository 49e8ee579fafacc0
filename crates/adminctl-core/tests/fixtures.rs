//! Helpers shared by the session and gateway tests.

#![allow(dead_code)]

use adminctl_core::Client;
use adminctl_core::config::Config;
use adminctl_core::session::MemoryStorage;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Value, json};
use wiremock::{MockServer, ResponseTemplate};

pub fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

/// Unsigned JWT-shaped token with the given `exp`. `tag` keeps tokens distinct.
pub fn jwt_with_exp(exp: i64, tag: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(json!({ "sub": tag, "exp": exp }).to_string());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

pub fn fresh_token(tag: &str) -> String {
    jwt_with_exp(chrono::Utc::now().timestamp() + 3600, tag)
}

pub fn expired_token(tag: &str) -> String {
    jwt_with_exp(chrono::Utc::now().timestamp() - 3600, tag)
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

pub fn token_pair(access: &str, refresh: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": access,
        "refresh_token": refresh,
        "token_type": "bearer",
    }))
}

pub fn admin_user() -> Value {
    json!({
        "id": 1,
        "identifier": "ops-admin",
        "email": "ops@market.io",
        "role": "admin",
        "full_name": "Ops Admin",
    })
}

/// Client pointed at the mock server with an in-memory session.
pub fn client_for(server: &MockServer) -> Client {
    let config = Config {
        base_url: server.uri(),
        ..Config::default()
    };
    Client::new(&config, MemoryStorage::new()).unwrap()
}

/// Seeds the store with an access token and optional refresh token.
pub fn seed_tokens(client: &Client, access: &str, refresh: Option<&str>) {
    client.store().set_token(access).unwrap();
    if let Some(refresh) = refresh {
        client.store().set_refresh_token(refresh).unwrap();
    }
}

/// Number of requests the server saw for `path`.
pub async fn hits(server: &MockServer, path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|req| req.url.path() == path)
        .count()
}
