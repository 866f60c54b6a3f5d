//! End-to-end flow tests against the full router: signup, authorize,
//! code exchange, userinfo, refresh, and discovery.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;
use url::Url;

use keygate_server::{AppState, ServerConfig, StoreBackend, build_router, server::build_state};

const SECRET: &str = "integration-test-secret-0123456789abcdef";
const VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
const CHALLENGE: &str = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";

fn test_config() -> ServerConfig {
    ServerConfig {
        address: "127.0.0.1:0".to_string(),
        issuer: "keygate-test".to_string(),
        domain: "localhost:8080".to_string(),
        token_secret: SECRET.to_string(),
        store: StoreBackend::Memory,
        database_url: None,
        database_max_connections: 10,
        access_token_ttl_secs: 86_400,
        refresh_token_ttl_secs: 604_800,
        code_ttl_secs: 600,
        password_hash_cost: 4,
    }
}

async fn app() -> Router {
    let (state, _registry): (AppState, _) = build_state(&test_config()).await.unwrap();
    build_router(state)
}

fn token_service() -> keygate_auth::TokenService {
    keygate_auth::TokenService::new(
        SECRET,
        "keygate-test",
        vec!["keygate-test".to_string()],
        time::Duration::seconds(86_400),
        time::Duration::seconds(604_800),
    )
    .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse JSON body")
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn form_request(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

async fn signup(app: &Router, email: &str, password: &str, name: &str) -> axum::response::Response {
    app.clone()
        .oneshot(json_request(
            "/dbconnections/signup",
            serde_json::json!({"email": email, "password": password, "name": name}),
        ))
        .await
        .unwrap()
}

/// Runs the login POST and returns the authorization code from the
/// redirect.
async fn obtain_code(app: &Router, email: &str, password: &str, state_param: &str) -> String {
    let body = format!(
        "email={email}&password={password}&response_type=code&client_id=c1\
         &redirect_uri=https%3A%2F%2Fx%2Fcb&scope=openid&state={state_param}\
         &code_challenge={CHALLENGE}&code_challenge_method=S256"
    );

    let response = app.clone().oneshot(form_request("/authorize", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);

    let location = response
        .headers()
        .get(header::LOCATION)
        .expect("redirect location")
        .to_str()
        .unwrap()
        .to_string();
    assert!(location.starts_with("https://x/cb?"), "unexpected redirect: {location}");

    let url = Url::parse(&location).unwrap();
    let code = url
        .query_pairs()
        .find(|(k, _)| k == "code")
        .map(|(_, v)| v.to_string())
        .expect("code in redirect");
    if !state_param.is_empty() {
        let state = url
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.to_string());
        assert_eq!(state.as_deref(), Some(state_param));
    }
    code
}

async fn exchange(app: &Router, code: &str, verifier: &str) -> axum::response::Response {
    let body = format!(
        "grant_type=authorization_code&code={code}&client_id=c1\
         &code_verifier={verifier}&redirect_uri=https%3A%2F%2Fx%2Fcb"
    );
    app.clone().oneshot(form_request("/oauth/token", body)).await.unwrap()
}

#[tokio::test]
async fn signup_then_duplicate_conflicts() {
    let app = app().await;

    let response = signup(&app, "a@x", "Passw0rd!", "A").await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["email"], "a@x");
    assert_eq!(body["name"], "A");
    assert_eq!(body["email_verified"], true);
    assert!(body["account_id"].as_str().unwrap().len() == 32);
    assert!(body.get("created_at").is_some());
    assert!(body.get("password").is_none());

    let response = signup(&app, "a@x", "Passw0rd!", "A").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error"], "account_exists");
}

#[tokio::test]
async fn signup_rejects_short_password() {
    let app = app().await;

    let response = signup(&app, "a@x", "short", "A").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn authorize_get_renders_form_preserving_parameters() {
    let app = app().await;

    let uri = format!(
        "/authorize?response_type=code&client_id=c1&redirect_uri=https%3A%2F%2Fx%2Fcb\
         &scope=openid&state=s1&code_challenge={CHALLENGE}&code_challenge_method=S256"
    );
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();

    assert!(html.contains(r#"name="code_challenge" value=""#));
    assert!(html.contains(CHALLENGE));
    assert!(html.contains(r#"name="state" value="s1""#));
}

#[tokio::test]
async fn authorize_rejections_redirect_with_oauth_errors() {
    let app = app().await;

    // Implicit flow is not supported.
    let uri = format!(
        "/authorize?response_type=token&client_id=c1&redirect_uri=https%3A%2F%2Fx%2Fcb\
         &state=s1&code_challenge={CHALLENGE}&code_challenge_method=S256"
    );
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.contains("error=unsupported_response_type"));
    assert!(location.contains("state=s1"));

    // Plain PKCE is forbidden.
    let uri = format!(
        "/authorize?response_type=code&client_id=c1&redirect_uri=https%3A%2F%2Fx%2Fcb\
         &code_challenge={CHALLENGE}&code_challenge_method=plain"
    );
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.contains("error=invalid_request"));
}

#[tokio::test]
async fn authorize_without_redirect_uri_returns_400_body() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/authorize?response_type=code&client_id=c1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn bad_credentials_re_render_the_form() {
    let app = app().await;
    signup(&app, "a@x", "Passw0rd!", "A").await;

    let body = format!(
        "email=a%40x&password=wrong&response_type=code&client_id=c1\
         &redirect_uri=https%3A%2F%2Fx%2Fcb&scope=openid&state=s1\
         &code_challenge={CHALLENGE}&code_challenge_method=S256"
    );
    let response = app.clone().oneshot(form_request("/authorize", body)).await.unwrap();

    // No redirect, no hint about which credential failed.
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("Invalid email or password."));
    assert!(html.contains("<form"));
}

#[tokio::test]
async fn full_authorization_code_flow() {
    let app = app().await;
    signup(&app, "a@x", "Passw0rd!", "A").await;

    let code = obtain_code(&app, "a%40x", "Passw0rd!", "s1").await;

    // Exchange the code.
    let response = exchange(&app, &code, VERIFIER).await;
    assert_eq!(response.status(), StatusCode::OK);
    let tokens = body_json(response).await;
    assert_eq!(tokens["token_type"], "Bearer");
    assert_eq!(tokens["expires_in"], 86_400);
    assert_eq!(tokens["scope"], "openid profile email");
    assert!(tokens["access_token"].as_str().unwrap().contains('.'));
    assert!(tokens.get("refresh_token").is_some());

    // Second exchange of the same code fails.
    let response = exchange(&app, &code, VERIFIER).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "invalid_grant");
}

#[tokio::test]
async fn wrong_verifier_burns_the_code() {
    let app = app().await;
    signup(&app, "a@x", "Passw0rd!", "A").await;

    let code = obtain_code(&app, "a%40x", "Passw0rd!", "").await;

    let response = exchange(&app, &code, "wrong").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_grant");

    // The correct verifier can no longer redeem it.
    let response = exchange(&app, &code, VERIFIER).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_grant");
}

#[tokio::test]
async fn userinfo_returns_profile_for_bearer_token() {
    let app = app().await;
    let created = body_json(signup(&app, "a@x", "Passw0rd!", "A").await).await;
    let account_id = created["account_id"].as_str().unwrap().to_string();

    let code = obtain_code(&app, "a%40x", "Passw0rd!", "").await;
    let tokens = body_json(exchange(&app, &code, VERIFIER).await).await;
    let access_token = tokens["access_token"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/userinfo")
                .header(header::AUTHORIZATION, format!("Bearer {access_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let profile = body_json(response).await;
    assert_eq!(profile["sub"], account_id);
    assert_eq!(profile["email"], "a@x");
    assert_eq!(profile["email_verified"], true);
    assert_eq!(profile["name"], "A");

    // Same token without the Bearer prefix: rejected.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/userinfo")
                .header(header::AUTHORIZATION, access_token)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "unauthorized");
}

#[tokio::test]
async fn userinfo_rejects_query_string_tokens() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/userinfo?access_token=whatever")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_extends_the_session() {
    let app = app().await;
    signup(&app, "a@x", "Passw0rd!", "A").await;
    let code = obtain_code(&app, "a%40x", "Passw0rd!", "").await;
    let tokens = body_json(exchange(&app, &code, VERIFIER).await).await;

    let service = token_service();
    let original_exp = service
        .validate(tokens["access_token"].as_str().unwrap())
        .unwrap()
        .exp;

    // Land in the next second so the new expiry strictly advances.
    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    let body = format!(
        "grant_type=refresh_token&refresh_token={}",
        tokens["refresh_token"].as_str().unwrap()
    );
    let response = app.clone().oneshot(form_request("/oauth/token", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let renewed = body_json(response).await;
    let renewed_exp = service
        .validate(renewed["access_token"].as_str().unwrap())
        .unwrap()
        .exp;
    assert!(renewed_exp > original_exp);
}

#[tokio::test]
async fn unsupported_grant_types_rejected() {
    let app = app().await;

    for grant in ["password", "client_credentials", "implicit", ""] {
        let response = app
            .clone()
            .oneshot(form_request(
                "/oauth/token",
                format!("grant_type={grant}&username=a&password=b"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "grant {grant:?}");
        let body = body_json(response).await;
        assert_eq!(body["error"], "unsupported_grant_type");
    }
}

#[tokio::test]
async fn token_endpoint_requires_code_parameters() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(form_request(
            "/oauth/token",
            "grant_type=authorization_code&code=abc".to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_request");
}

#[tokio::test]
async fn discovery_document_advertises_exact_capabilities() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/.well-known/openid_configuration")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let doc = body_json(response).await;
    assert_eq!(doc["issuer"], "keygate-test");
    assert_eq!(doc["response_types_supported"], serde_json::json!(["code"]));
    assert_eq!(
        doc["grant_types_supported"],
        serde_json::json!(["authorization_code", "refresh_token"])
    );
    assert_eq!(
        doc["code_challenge_methods_supported"],
        serde_json::json!(["S256"])
    );
    assert_eq!(
        doc["authorization_endpoint"],
        "http://localhost:8080/authorize"
    );
    assert_eq!(doc["token_endpoint"], "http://localhost:8080/oauth/token");
    assert_eq!(doc["userinfo_endpoint"], "http://localhost:8080/userinfo");
}

#[tokio::test]
async fn account_listing_excludes_password_material() {
    let app = app().await;
    signup(&app, "a@x", "Passw0rd!", "A").await;
    signup(&app, "b@x", "Passw0rd!", "B").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v2/users?limit=10&offset=0")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let rows = body_json(response).await;
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    for row in rows {
        assert!(row.get("password").is_none());
        assert!(row.get("password_hash").is_none());
        assert!(row.get("email").is_some());
        assert_eq!(row["user_id"], row["account_id"]);
    }
}

#[tokio::test]
async fn health_reports_component_status() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["components"]["account_store"], "ok");
}

#[tokio::test]
async fn wrong_method_yields_method_not_allowed_envelope() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/oauth/token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body_json(response).await["error"], "method_not_allowed");
}
