use std::net::TcpListener;
use std::time::Duration;

use pretty_assertions::assert_eq;
use research_engine::{
    parse_base_url, AuthClient, AuthError, AuthSession, LoginCredentials, SignupCredentials,
};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> AuthClient {
    AuthClient::new(parse_base_url(&server.uri()).unwrap(), Duration::from_secs(5)).unwrap()
}

fn login() -> LoginCredentials {
    LoginCredentials {
        email: "ada@example.com".into(),
        password: "hunter2".into(),
    }
}

#[tokio::test]
async fn login_returns_token_and_placeholder_identity() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"email": "ada@example.com", "password": "hunter2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "abc"})))
        .expect(1)
        .mount(&server)
        .await;

    let session = client(&server).login(&login()).await.unwrap();
    assert_eq!(
        session,
        AuthSession {
            token: "abc".into(),
            email: "ada@example.com".into(),
            first_name: "User".into(),
            last_name: "Name".into(),
        }
    );
}

#[tokio::test]
async fn rejected_login_surfaces_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid credentials"})),
        )
        .mount(&server)
        .await;

    let err = client(&server).login(&login()).await.unwrap_err();
    assert_eq!(err, AuthError::Rejected("Invalid credentials".into()));
}

#[tokio::test]
async fn success_status_without_token_is_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client(&server).login(&login()).await.unwrap_err();
    assert_eq!(err, AuthError::Rejected("Login failed".into()));
}

#[tokio::test]
async fn signup_sends_camel_case_names_and_keeps_them() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/signup"))
        .and(body_json(json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com",
            "password": "hunter2",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"token": "new"})))
        .mount(&server)
        .await;

    let session = client(&server)
        .signup(&SignupCredentials {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            password: "hunter2".into(),
        })
        .await
        .unwrap();
    assert_eq!(session.token, "new");
    assert_eq!(session.first_name, "Ada");
    assert_eq!(session.last_name, "Lovelace");
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    // Bind then release a port so nothing is listening on it.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let base = parse_base_url(&format!("http://127.0.0.1:{port}")).unwrap();

    let client = AuthClient::new(base, Duration::from_secs(2)).unwrap();
    let err = client.login(&login()).await.unwrap_err();
    assert!(
        matches!(err, AuthError::Network { action: "login", .. }),
        "unexpected error: {err:?}"
    );
}
