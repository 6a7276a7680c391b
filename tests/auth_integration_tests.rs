mod common;

use axum::{
    extract::FromRequestParts,
    http::{HeaderValue, Method, Request, StatusCode, Uri, header, request::Parts},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::{sync::Arc, time::SystemTime};
use user_service::{
    ApiError, AppConfig, AppState, InMemoryRepository,
    auth::{Claims, DEV_USER_HEADER, Requester},
    config::Env,
    models::{Role, UserId},
};

use common::{ADMIN_ID, USER_ID, seeded_repo};

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

fn now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn create_token(sub: &str, secret: &str, exp: u64) -> String {
    let claims = Claims {
        sub: sub.to_string(),
        iat: now() as usize,
        exp: exp as usize,
    };
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

fn valid_token(user_id: UserId) -> String {
    create_token(&user_id.to_string(), TEST_JWT_SECRET, now() + 3600)
}

fn create_app_state(env: Env, repo: InMemoryRepository) -> AppState {
    let config = AppConfig {
        env,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    };

    AppState {
        repo: Arc::new(repo),
        config,
    }
}

fn request_parts() -> Parts {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/users".parse::<Uri>().unwrap())
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

fn with_bearer(token: &str) -> Parts {
    let mut parts = request_parts();
    parts.headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
    parts
}

fn assert_unauthorized(result: Result<Requester, ApiError>) {
    match result {
        Err(err) => {
            assert!(matches!(err, ApiError::Unauthorized));
            assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        }
        Ok(r) => panic!("expected rejection, got {r:?}"),
    }
}

// --- Tests ---

#[tokio::test]
async fn test_auth_success_with_valid_jwt() {
    let state = create_app_state(Env::Production, seeded_repo());
    let mut parts = with_bearer(&valid_token(ADMIN_ID));

    let requester = Requester::from_request_parts(&mut parts, &state).await.unwrap();

    assert_eq!(requester.id, ADMIN_ID);
    assert_eq!(requester.role, Role::Admin);
}

#[tokio::test]
async fn test_auth_failure_with_missing_header() {
    let state = create_app_state(Env::Production, seeded_repo());
    let mut parts = request_parts();

    assert_unauthorized(Requester::from_request_parts(&mut parts, &state).await);
}

#[tokio::test]
async fn test_auth_failure_without_bearer_prefix() {
    let state = create_app_state(Env::Production, seeded_repo());
    let mut parts = request_parts();
    parts.headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&valid_token(USER_ID)).unwrap(),
    );

    assert_unauthorized(Requester::from_request_parts(&mut parts, &state).await);
}

#[tokio::test]
async fn test_auth_failure_with_expired_jwt() {
    let state = create_app_state(Env::Production, seeded_repo());
    // Well past the default 60s leeway.
    let token = create_token(&USER_ID.to_string(), TEST_JWT_SECRET, now() - 3600);
    let mut parts = with_bearer(&token);

    assert_unauthorized(Requester::from_request_parts(&mut parts, &state).await);
}

#[tokio::test]
async fn test_auth_failure_with_wrong_secret() {
    let state = create_app_state(Env::Production, seeded_repo());
    let token = create_token(&USER_ID.to_string(), "some-other-secret", now() + 3600);
    let mut parts = with_bearer(&token);

    assert_unauthorized(Requester::from_request_parts(&mut parts, &state).await);
}

#[tokio::test]
async fn test_auth_failure_with_non_numeric_subject() {
    let state = create_app_state(Env::Production, seeded_repo());
    let token = create_token("not-a-number", TEST_JWT_SECRET, now() + 3600);
    let mut parts = with_bearer(&token);

    assert_unauthorized(Requester::from_request_parts(&mut parts, &state).await);
}

#[tokio::test]
async fn test_auth_failure_for_deleted_user() {
    let state = create_app_state(Env::Production, seeded_repo());
    let mut parts = with_bearer(&valid_token(77));

    assert_unauthorized(Requester::from_request_parts(&mut parts, &state).await);
}

#[tokio::test]
async fn test_role_is_read_from_store_not_token() {
    let repo = seeded_repo();
    let state = create_app_state(Env::Production, repo);

    // Promote the user after the token was issued.
    let token = valid_token(USER_ID);
    state
        .repo
        .update_user(
            USER_ID,
            user_service::models::UpdateUserRequest {
                role: Some(Role::Admin),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let mut parts = with_bearer(&token);
    let requester = Requester::from_request_parts(&mut parts, &state).await.unwrap();
    assert_eq!(requester.role, Role::Admin);
}

#[tokio::test]
async fn test_local_bypass_success() {
    let state = create_app_state(Env::Local, seeded_repo());
    let mut parts = request_parts();
    parts.headers.insert(
        DEV_USER_HEADER,
        HeaderValue::from_str(&ADMIN_ID.to_string()).unwrap(),
    );

    let requester = Requester::from_request_parts(&mut parts, &state).await.unwrap();

    assert_eq!(requester.id, ADMIN_ID);
    assert_eq!(requester.role, Role::Admin);
}

#[tokio::test]
async fn test_local_bypass_unknown_user_falls_through_to_token() {
    let state = create_app_state(Env::Local, seeded_repo());
    let mut parts = with_bearer(&valid_token(USER_ID));
    parts
        .headers
        .insert(DEV_USER_HEADER, HeaderValue::from_static("999"));

    let requester = Requester::from_request_parts(&mut parts, &state).await.unwrap();
    assert_eq!(requester.id, USER_ID);
}

#[tokio::test]
async fn test_local_bypass_disabled_in_prod() {
    let state = create_app_state(Env::Production, seeded_repo());
    let mut parts = request_parts();
    parts.headers.insert(
        DEV_USER_HEADER,
        HeaderValue::from_str(&USER_ID.to_string()).unwrap(),
    );

    assert_unauthorized(Requester::from_request_parts(&mut parts, &state).await);
}
