//! Integration tests per gli endpoints di autenticazione
//!
//! Test per:
//! - POST /api/auth/signup
//! - POST /api/auth/login
//! - POST /api/auth/logout
//! - GET /api/auth/me, POST /api/auth/onboarding
//! - rate limiting su /api/auth/*
//!
//! Questi test usano `#[sqlx::test]` che:
//! - Crea automaticamente un database SQLite di test isolato
//! - Applica le migrations da `migrations/`
//! - Elimina il database al termine

mod common;

#[cfg(test)]
mod auth_tests {
    use super::common::*;
    use axum_test::http::{HeaderName, StatusCode, header};
    use serde_json::{Value, json};
    use server::entities::UserRole;
    use sqlx::SqlitePool;

    // ============================================================
    // Test per POST /api/auth/signup - signup
    // ============================================================

    #[sqlx::test]
    async fn test_signup_student_success(pool: SqlitePool) -> sqlx::Result<()> {
        let app = create_test_app(pool);

        let response = app
            .server
            .post("/api/auth/signup")
            .json(&json!({
                "fullName": "Alice Rossi",
                "email": "alice@school.test",
                "password": "secret123",
                "role": "student"
            }))
            .await;

        response.assert_status(StatusCode::CREATED);

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("session cookie should be set")
            .to_str()
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("jwt="));
        assert!(cookie.contains("HttpOnly"));

        let body: Value = response.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["user"]["fullName"], "Alice Rossi");
        assert_eq!(body["user"]["role"], "student");
        assert!(body["user"].get("password").is_none(), "la password non deve essere esposta");
        assert!(body["token"].is_string());

        Ok(())
    }

    #[sqlx::test]
    async fn test_signup_rejects_unknown_role(pool: SqlitePool) -> sqlx::Result<()> {
        let app = create_test_app(pool);

        let response = app
            .server
            .post("/api/auth/signup")
            .json(&json!({
                "fullName": "Mallory",
                "email": "mallory@school.test",
                "password": "secret123",
                "role": "admin"
            }))
            .await;

        response.assert_status_bad_request();
        Ok(())
    }

    #[sqlx::test]
    async fn test_signup_validation_errors(pool: SqlitePool) -> sqlx::Result<()> {
        let app = create_test_app(pool);

        let short_password = app
            .server
            .post("/api/auth/signup")
            .json(&json!({
                "fullName": "Bob",
                "email": "bob@school.test",
                "password": "123",
                "role": "student"
            }))
            .await;
        short_password.assert_status_bad_request();

        let bad_email = app
            .server
            .post("/api/auth/signup")
            .json(&json!({
                "fullName": "Bob",
                "email": "not-an-email",
                "password": "secret123",
                "role": "student"
            }))
            .await;
        bad_email.assert_status_bad_request();

        let blank_name = app
            .server
            .post("/api/auth/signup")
            .json(&json!({
                "fullName": "   ",
                "email": "bob@school.test",
                "password": "secret123",
                "role": "student"
            }))
            .await;
        blank_name.assert_status_bad_request();

        Ok(())
    }

    #[sqlx::test]
    async fn test_signup_duplicate_email_conflict(pool: SqlitePool) -> sqlx::Result<()> {
        let app = create_test_app(pool);
        seed_user(&app.state, "Alice", "alice@school.test", UserRole::Student).await;

        let response = app
            .server
            .post("/api/auth/signup")
            .json(&json!({
                "fullName": "Another Alice",
                "email": "alice@school.test",
                "password": "secret123",
                "role": "faculty"
            }))
            .await;

        response.assert_status(StatusCode::CONFLICT);
        Ok(())
    }

    #[sqlx::test]
    async fn test_parent_signup_requires_existing_student(pool: SqlitePool) -> sqlx::Result<()> {
        let app = create_test_app(pool);
        seed_user(&app.state, "Prof", "prof@school.test", UserRole::Faculty).await;

        // Nessuna email del figlio
        let missing = app
            .server
            .post("/api/auth/signup")
            .json(&json!({
                "fullName": "Parent",
                "email": "parent@home.test",
                "password": "secret123",
                "role": "parent"
            }))
            .await;
        missing.assert_status_bad_request();

        // L'email indica un docente, non uno studente
        let not_student = app
            .server
            .post("/api/auth/signup")
            .json(&json!({
                "fullName": "Parent",
                "email": "parent@home.test",
                "password": "secret123",
                "role": "parent",
                "childEmail": "prof@school.test"
            }))
            .await;
        not_student.assert_status_bad_request();

        Ok(())
    }

    #[sqlx::test]
    async fn test_parent_signup_links_child(pool: SqlitePool) -> sqlx::Result<()> {
        let app = create_test_app(pool);
        let child = seed_user(&app.state, "Kid", "kid@school.test", UserRole::Student).await;

        let response = app
            .server
            .post("/api/auth/signup")
            .json(&json!({
                "fullName": "Parent",
                "email": "parent@home.test",
                "password": "secret123",
                "role": "parent",
                "childEmail": "kid@school.test"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);

        let body: Value = response.json();
        let token = body["token"].as_str().unwrap().to_string();

        let children = app
            .server
            .get("/api/users/children")
            .add_header(HeaderName::from_static("authorization"), format!("Bearer {}", token))
            .await;
        children.assert_status_ok();
        let children: Vec<Value> = children.json();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0]["id"], child.user_id);

        Ok(())
    }

    // ============================================================
    // Test per POST /api/auth/login - login
    // ============================================================

    #[sqlx::test]
    async fn test_login_success_sets_session(pool: SqlitePool) -> sqlx::Result<()> {
        let app = create_test_app(pool);
        seed_user(&app.state, "Alice", "alice@school.test", UserRole::Student).await;

        let response = app
            .server
            .post("/api/auth/login")
            .json(&json!({
                "email": "alice@school.test",
                "password": TEST_PASSWORD,
                "role": "student"
            }))
            .await;

        response.assert_status_ok();

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("session cookie should be set")
            .to_str()
            .unwrap()
            .to_string();
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains(&format!("Max-Age={}", 7 * 24 * 60 * 60)));

        let authorization = response
            .headers()
            .get(header::AUTHORIZATION)
            .expect("authorization header should be set");
        assert!(authorization.to_str().unwrap().starts_with("Bearer "));

        let body: Value = response.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["user"]["email"], "alice@school.test");

        Ok(())
    }

    #[sqlx::test]
    async fn test_login_wrong_password(pool: SqlitePool) -> sqlx::Result<()> {
        let app = create_test_app(pool);
        seed_user(&app.state, "Alice", "alice@school.test", UserRole::Student).await;

        let response = app
            .server
            .post("/api/auth/login")
            .json(&json!({ "email": "alice@school.test", "password": "wrong-password" }))
            .await;

        response.assert_status_unauthorized();
        Ok(())
    }

    #[sqlx::test]
    async fn test_login_unknown_user(pool: SqlitePool) -> sqlx::Result<()> {
        let app = create_test_app(pool);

        let response = app
            .server
            .post("/api/auth/login")
            .json(&json!({ "email": "ghost@school.test", "password": TEST_PASSWORD }))
            .await;

        response.assert_status_unauthorized();
        Ok(())
    }

    #[sqlx::test]
    async fn test_login_role_outside_enum(pool: SqlitePool) -> sqlx::Result<()> {
        let app = create_test_app(pool);
        seed_user(&app.state, "Alice", "alice@school.test", UserRole::Student).await;

        let response = app
            .server
            .post("/api/auth/login")
            .json(&json!({
                "email": "alice@school.test",
                "password": TEST_PASSWORD,
                "role": "superuser"
            }))
            .await;

        response.assert_status_bad_request();
        Ok(())
    }

    #[sqlx::test]
    async fn test_login_role_mismatch_forbidden(pool: SqlitePool) -> sqlx::Result<()> {
        let app = create_test_app(pool);
        seed_user(&app.state, "Alice", "alice@school.test", UserRole::Student).await;

        let response = app
            .server
            .post("/api/auth/login")
            .json(&json!({
                "email": "alice@school.test",
                "password": TEST_PASSWORD,
                "role": "faculty"
            }))
            .await;

        response.assert_status_forbidden();
        Ok(())
    }

    // ============================================================
    // Test per sessione: me, logout, onboarding
    // ============================================================

    #[sqlx::test]
    async fn test_me_requires_authentication(pool: SqlitePool) -> sqlx::Result<()> {
        let app = create_test_app(pool);

        let response = app.server.get("/api/auth/me").await;
        response.assert_status_unauthorized();

        let invalid = app
            .server
            .get("/api/auth/me")
            .add_header(HeaderName::from_static("authorization"), "Bearer invalid_token_here")
            .await;
        invalid.assert_status_unauthorized();

        Ok(())
    }

    #[sqlx::test]
    async fn test_me_accepts_session_cookie(pool: SqlitePool) -> sqlx::Result<()> {
        let app = create_test_app(pool);
        let alice = seed_user(&app.state, "Alice", "alice@school.test", UserRole::Student).await;

        let response = app
            .server
            .get("/api/auth/me")
            .add_header(header::COOKIE, format!("theme=dark; jwt={}", token_for(&alice)))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["user"]["id"], alice.user_id);
        Ok(())
    }

    #[sqlx::test]
    async fn test_logout_revokes_token(pool: SqlitePool) -> sqlx::Result<()> {
        let app = create_test_app(pool);
        let alice = seed_user(&app.state, "Alice", "alice@school.test", UserRole::Student).await;
        let auth = bearer_for(&alice);

        app.server
            .get("/api/auth/me")
            .add_header(HeaderName::from_static("authorization"), auth.clone())
            .await
            .assert_status_ok();

        let logout = app
            .server
            .post("/api/auth/logout")
            .add_header(HeaderName::from_static("authorization"), auth.clone())
            .await;
        logout.assert_status_ok();

        let cookie = logout
            .headers()
            .get(header::SET_COOKIE)
            .expect("logout should clear the cookie")
            .to_str()
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("jwt=;"));
        assert!(cookie.contains("Max-Age=0"));

        // Lo stesso token non è più valido
        app.server
            .get("/api/auth/me")
            .add_header(HeaderName::from_static("authorization"), auth)
            .await
            .assert_status_unauthorized();

        Ok(())
    }

    #[sqlx::test]
    async fn test_logout_without_session_is_ok(pool: SqlitePool) -> sqlx::Result<()> {
        let app = create_test_app(pool);
        app.server.post("/api/auth/logout").await.assert_status_ok();
        Ok(())
    }

    #[sqlx::test]
    async fn test_onboarding_updates_profile(pool: SqlitePool) -> sqlx::Result<()> {
        let app = create_test_app(pool);
        let alice = seed_user(&app.state, "Alice", "alice@school.test", UserRole::Student).await;

        let response = app
            .server
            .post("/api/auth/onboarding")
            .add_header(HeaderName::from_static("authorization"), bearer_for(&alice))
            .json(&json!({
                "fullName": "Alice Rossi",
                "bio": "Loves chemistry",
                "profilePic": "https://cdn.school.test/alice.png"
            }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["user"]["fullName"], "Alice Rossi");
        assert_eq!(body["user"]["bio"], "Loves chemistry");
        assert_eq!(body["user"]["isOnboarded"], true);

        let invalid = app
            .server
            .post("/api/auth/onboarding")
            .add_header(HeaderName::from_static("authorization"), bearer_for(&alice))
            .json(&json!({ "fullName": "Alice Rossi", "profilePic": "not a url" }))
            .await;
        invalid.assert_status_bad_request();

        // Il nome è obbligatorio e non può essere fatto di soli spazi
        app.server
            .post("/api/auth/onboarding")
            .add_header(HeaderName::from_static("authorization"), bearer_for(&alice))
            .json(&json!({ "bio": "No name" }))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        app.server
            .post("/api/auth/onboarding")
            .add_header(HeaderName::from_static("authorization"), bearer_for(&alice))
            .json(&json!({ "fullName": "   " }))
            .await
            .assert_status_bad_request();

        Ok(())
    }

    #[sqlx::test]
    async fn test_token_for_deleted_user_is_rejected(pool: SqlitePool) -> sqlx::Result<()> {
        let app = create_test_app(pool.clone());
        let alice = seed_user(&app.state, "Alice", "alice@school.test", UserRole::Student).await;
        let auth = bearer_for(&alice);

        sqlx::query("DELETE FROM users WHERE user_id = ?")
            .bind(alice.user_id)
            .execute(&pool)
            .await?;

        app.server
            .get("/api/auth/me")
            .add_header(HeaderName::from_static("authorization"), auth)
            .await
            .assert_status_unauthorized();

        Ok(())
    }

    // ============================================================
    // Test per il rate limiting su /api/auth/*
    // ============================================================

    #[sqlx::test]
    async fn test_auth_routes_are_rate_limited(pool: SqlitePool) -> sqlx::Result<()> {
        let app = create_test_app_with(pool, |config| config.rate_limit_max_requests = 3);
        let body = json!({ "email": "ghost@school.test", "password": TEST_PASSWORD });

        for _ in 0..3 {
            app.server
                .post("/api/auth/login")
                .add_header(HeaderName::from_static("x-forwarded-for"), "10.0.0.1")
                .json(&body)
                .await
                .assert_status_unauthorized();
        }

        let limited = app
            .server
            .post("/api/auth/login")
            .add_header(HeaderName::from_static("x-forwarded-for"), "10.0.0.1")
            .json(&body)
            .await;
        limited.assert_status(StatusCode::TOO_MANY_REQUESTS);
        assert!(limited.headers().get(header::RETRY_AFTER).is_some());

        // Un altro client non è limitato
        app.server
            .post("/api/auth/login")
            .add_header(HeaderName::from_static("x-forwarded-for"), "10.0.0.2")
            .json(&body)
            .await
            .assert_status_unauthorized();

        Ok(())
    }
}
