mod support;

use axum::http::{Method, StatusCode};
use serde_json::json;

use support::spawn;

#[tokio::test]
async fn login_and_read_own_account() {
    let app = spawn().await;
    let (id, token) = app.register("maria").await;

    let (status, me) = app.get("/users/me", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], id);
    assert_eq!(me["role"], "user");
    assert!(me["parent_id"].is_null());
    assert!(me.get("password_hash").is_none());

    let (status, body) = app.login("maria", "wrong").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let app = spawn().await;
    app.register("joao").await;

    let (status, _) = app
        .call(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "username": "joao", "password": "pass1234" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_or_bad_token_is_unauthorized() {
    let app = spawn().await;

    let (status, _) = app.call(Method::GET, "/users/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/users/me", "not-a-jwt").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invite_token_is_not_an_access_token() {
    let app = spawn().await;
    let (_, token) = app.register("parent").await;

    let (_, invite) = app.call(Method::POST, "/invite", Some(&token), None).await;
    let invite_token = invite["invite_token"].as_str().unwrap();

    let (status, _) = app.get("/users/me", invite_token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invite_flow_caps_dependents_at_four() {
    let app = spawn().await;
    let (parent_id, parent) = app.register("parent").await;

    let (_, invite) = app.call(Method::POST, "/invite", Some(&parent), None).await;
    let spare = invite["invite_token"].as_str().unwrap().to_string();
    assert!(invite["invite_link"].as_str().unwrap().contains(&spare));

    let (status, info) = app
        .call(Method::GET, &format!("/invite/info?token={spare}"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["parent_username"], "parent");
    assert_eq!(info["remaining_slots"], 4);

    for i in 0..4 {
        let (_, kid) = app.add_dependent(&parent, &format!("kid{i}")).await;
        let (_, me) = app.get("/users/me", &kid).await;
        assert_eq!(me["parent_id"], parent_id);
    }

    let (status, _) = app.call(Method::POST, "/invite", Some(&parent), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(Method::GET, &format!("/invite/info?token={spare}"), None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // a token issued before the family filled up is re-checked on redemption
    let (status, _) = app
        .call(
            Method::POST,
            "/register-dependent",
            None,
            Some(json!({ "token": spare, "username": "kid5", "password": "pass1234" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // and the admin surface enforces the same cap
    let admin = app.admin_token().await;
    let (status, _) = app
        .post(
            "/users/",
            &admin,
            json!({ "username": "kid6", "password": "pass1234", "parent_id": parent_id }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, dependents) = app.get("/users/dependents", &parent).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dependents.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn dependents_cannot_invite() {
    let app = spawn().await;
    let (_, parent) = app.register("parent").await;
    let (_, kid) = app.add_dependent(&parent, "kid").await;

    let (status, _) = app.call(Method::POST, "/invite", Some(&kid), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_surface() {
    let app = spawn().await;
    let admin = app.admin_token().await;
    let (user_id, user) = app.register("plain").await;

    let (status, _) = app.get("/users/", &user).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, users) = app.get("/users/", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 2);

    let (status, _) = app
        .call(Method::PATCH, "/users/1/toggle", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.call(Method::DELETE, "/users/1", Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, toggled) = app
        .call(
            Method::PATCH,
            &format!("/users/{user_id}/toggle"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["is_active"], false);

    // the outstanding token stops working, and so does logging in
    let (status, _) = app.get("/users/me", &user).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.login("plain", "pass1234").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .call(
            Method::DELETE,
            &format!("/users/{user_id}"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get(&format!("/users/{user_id}"), &admin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admins_cannot_lock_themselves_out() {
    let app = spawn().await;
    let admin = app.admin_token().await;

    let (status, _) = app
        .call(
            Method::PUT,
            "/users/1",
            Some(&admin),
            Some(json!({ "is_active": false })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(Method::PUT, "/users/1", Some(&admin), Some(json!({ "role": "user" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, me) = app.get("/users/me", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["role"], "admin");
    assert_eq!(me["is_active"], true);

    // harmless self-edits still go through
    let (status, me) = app
        .call(
            Method::PUT,
            "/users/1",
            Some(&admin),
            Some(json!({ "full_name": "Root", "is_active": true, "role": "admin" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["full_name"], "Root");
}

#[tokio::test]
async fn moving_a_parent_under_another_family_is_rejected() {
    let app = spawn().await;
    let admin = app.admin_token().await;
    let (first_id, first) = app.register("first").await;
    let (second_id, _) = app.register("second").await;
    let (kid_id, _) = app.add_dependent(&first, "kid").await;

    let (status, _) = app
        .call(
            Method::PUT,
            &format!("/users/{first_id}"),
            Some(&admin),
            Some(json!({ "parent_id": second_id })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, moved) = app.get(&format!("/users/{first_id}"), &admin).await;
    assert!(moved["parent_id"].is_null());
    let (_, kid) = app.get(&format!("/users/{kid_id}"), &admin).await;
    assert_eq!(kid["parent_id"], first_id);
}

#[tokio::test]
async fn update_own_display_fields() {
    let app = spawn().await;
    let (_, token) = app.register("ana").await;

    let (status, me) = app
        .call(
            Method::PUT,
            "/users/me",
            Some(&token),
            Some(json!({ "full_name": "Ana Souza", "currency": "BRL", "role": "admin" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["full_name"], "Ana Souza");
    assert_eq!(me["currency"], "BRL");
    assert_eq!(me["role"], "user");
}

#[tokio::test]
async fn legacy_profile_login() {
    let app = spawn().await;

    let (status, profile) = app.call(Method::GET, "/profile", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["name"], "admin");
    assert!(profile.get("password").is_none());

    // account store first
    let (status, body) = app
        .call(
            Method::POST,
            "/login",
            None,
            Some(json!({ "name": "admin", "password": support::ADMIN_PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());

    // then the legacy profile
    let (status, body) = app
        .call(
            Method::POST,
            "/login",
            None,
            Some(json!({ "name": "ADMIN", "password": "1234" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");
    assert!(body.get("access_token").is_none());

    let (status, _) = app
        .call(
            Method::POST,
            "/login",
            None,
            Some(json!({ "name": "admin", "password": "nope" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn only_admins_update_the_legacy_profile() {
    let app = spawn().await;
    let (_, user) = app.register("plain").await;
    let body = json!({ "name": "casa", "password": "9876" });

    let (status, _) = app
        .call(Method::PUT, "/profile", None, Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .call(Method::PUT, "/profile", Some(&user), Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = app.admin_token().await;
    let (status, profile) = app
        .call(Method::PUT, "/profile", Some(&admin), Some(body))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["name"], "casa");
}

#[tokio::test]
async fn health_reports_database() {
    let app = spawn().await;
    let (status, body) = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], true);
}
