mod common;

use anyhow::{Context, Result};
use reqwest::{header, StatusCode};
use serde_json::{json, Value};

#[tokio::test]
async fn health_and_root_respond() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/health")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "memory");

    let body: Value = client.get(server.url("/")).send().await?.json().await?;
    assert!(body["endpoints"]["cars"].as_array().is_some_and(|a| !a.is_empty()));
    Ok(())
}

#[tokio::test]
async fn register_login_and_me() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();

    let payload = common::registration("alice");
    let res = client.post(server.url("/register")).json(&payload).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let user: Value = res.json().await?;
    assert_eq!(user["email"], payload["email"]);
    assert!(user.get("password_hash").is_none(), "hash leaked: {}", user);
    assert!(user.get("password").is_none());

    let credentials = json!({ "email": payload["email"], "password": "password123" });
    let tokens: Value = client
        .post(server.url("/login"))
        .json(&credentials)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(tokens["token_type"], "bearer");
    let access = tokens["access_token"].as_str().unwrap_or_default();

    let me: Value = client
        .get(server.url("/me"))
        .bearer_auth(access)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(me["id"], user["id"]);
    assert_eq!(me["username"], payload["username"]);

    // /access-token is the same exchange
    let res = client.post(server.url("/access-token")).json(&credentials).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn registration_errors() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();

    let mut mismatched = common::registration("bob");
    mismatched["confirmed_password"] = json!("something-else");
    let res = client.post(server.url("/register")).json(&mismatched).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["message"], "This confirmed password does not match");

    // The failed attempt created nobody, so the same email registers fine
    mismatched["confirmed_password"] = json!("password123");
    let res = client.post(server.url("/register")).json(&mismatched).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let mut same_email = common::registration("carol");
    same_email["email"] = mismatched["email"].clone();
    let res = client.post(server.url("/register")).json(&same_email).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["message"], "This email has already registered");
    assert_eq!(body["code"], "CONFLICT");
    assert_eq!(body["error"], true);
    Ok(())
}

#[tokio::test]
async fn malformed_auth_bodies_are_validation_errors() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();

    let mut incomplete = common::registration("erin");
    incomplete
        .as_object_mut()
        .context("registration object")?
        .remove("confirmed_password");
    let res = client.post(server.url("/register")).json(&incomplete).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(res.headers()[header::CONTENT_TYPE]
        .to_str()?
        .starts_with("application/json"));
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"], true);
    assert!(body["message"].as_str().unwrap_or_default().contains("confirmed_password"));

    let res = client
        .post(server.url("/login"))
        .header(header::CONTENT_TYPE, "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let res = client.post(server.url("/refresh-token")).body("refresh").send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    Ok(())
}

#[tokio::test]
async fn bad_login_is_unauthorized() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let (email, _, _) = common::register_and_login(&server, &client, "dave").await?;

    for (email, password) in [(email.as_str(), "wrong"), ("nobody@example.com", "password123")] {
        let res = client
            .post(server.url("/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(res.headers()[header::WWW_AUTHENTICATE], "Bearer");
        let body: Value = res.json().await?;
        assert_eq!(body["message"], "Incorrect Email or password");
    }
    Ok(())
}

#[tokio::test]
async fn refresh_flow_and_token_kinds() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let (_, access, refresh) = common::register_and_login(&server, &client, "erin").await?;

    // Access token cannot refresh
    let res = client
        .post(server.url("/refresh-token"))
        .json(&json!({ "refresh_token": access }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await?;
    assert_eq!(body["message"], "Invalid token type");

    // Refresh token cannot authenticate
    let res = client.get(server.url("/me")).bearer_auth(&refresh).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(server.url("/refresh-token"))
        .json(&json!({ "refresh_token": refresh }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let pair: Value = res.json().await?;
    let new_access = pair["access_token"].as_str().unwrap_or_default();

    let res = client.get(server.url("/me")).bearer_auth(new_access).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_bearer() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/me")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.headers()[header::WWW_AUTHENTICATE], "Bearer");

    let res = client.get(server.url("/my-cars")).bearer_auth("garbage").send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "UNAUTHORIZED");

    let res = client
        .post(server.url("/cars"))
        .json(&common::camry())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
