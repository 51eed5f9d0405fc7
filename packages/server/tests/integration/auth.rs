use serde_json::json;

use crate::common::{COOKIE_NAME, PASSWORD, TestApp, routes};

mod sign_up {
    use super::*;

    #[tokio::test]
    async fn student_is_the_default_role() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({
                    "name": "Ana Lima",
                    "email": "Ana@Uni.edu",
                    "password": PASSWORD,
                    "confirm_password": PASSWORD,
                }),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["email"], "ana@uni.edu");
        assert_eq!(res.body["role"], "student");
    }

    #[tokio::test]
    async fn email_is_unique_regardless_of_case() {
        let app = TestApp::spawn().await;
        app.register("Ana Lima", "ana@uni.edu", "student").await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({
                    "name": "Other Ana",
                    "email": "ANA@uni.edu",
                    "password": PASSWORD,
                    "confirm_password": PASSWORD,
                }),
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "EMAIL_TAKEN");
    }

    #[tokio::test]
    async fn weak_password_reports_the_missing_class() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({
                    "name": "Ana Lima",
                    "email": "ana@uni.edu",
                    "password": "lowercase1",
                    "confirm_password": "lowercase1",
                }),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(
            res.body["message"],
            "Password must contain at least one uppercase letter"
        );
    }

    #[tokio::test]
    async fn mismatched_confirmation_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({
                    "name": "Ana Lima",
                    "email": "ana@uni.edu",
                    "password": PASSWORD,
                    "confirm_password": "Different1",
                }),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "Passwords do not match");
    }

    #[tokio::test]
    async fn admin_role_cannot_be_self_assigned() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({
                    "name": "Mallory",
                    "email": "mallory@uni.edu",
                    "password": PASSWORD,
                    "confirm_password": PASSWORD,
                    "role": "admin",
                }),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "Role must be student or organizer");
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .client
            .post(app.url(routes::REGISTER))
            .header("Content-Type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();

        assert_eq!(res.status().as_u16(), 400);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}

mod sessions {
    use super::*;

    #[tokio::test]
    async fn login_returns_token_and_sets_http_only_cookie() {
        let app = TestApp::spawn().await;
        app.register("Ana Lima", "ana@uni.edu", "student").await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "ana@uni.edu", "password": PASSWORD}),
            )
            .await;

        assert_eq!(res.status, 200);
        assert!(res.body["token"].is_string());
        assert_eq!(res.body["role"], "student");
        assert_eq!(res.body["has_profile"], false);
        let cookie = res
            .set_cookies
            .iter()
            .find(|c| c.starts_with(&format!("{COOKIE_NAME}=")))
            .expect("session cookie should be set");
        assert!(cookie.contains("HttpOnly"));
    }

    #[tokio::test]
    async fn wrong_password_is_indistinguishable_from_unknown_email() {
        let app = TestApp::spawn().await;
        app.register("Ana Lima", "ana@uni.edu", "student").await;

        let wrong = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "ana@uni.edu", "password": "Wrong1234"}),
            )
            .await;
        let unknown = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "nobody@uni.edu", "password": PASSWORD}),
            )
            .await;

        for res in [wrong, unknown] {
            assert_eq!(res.status, 401);
            assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
            assert_eq!(res.body["message"], "Invalid email or password");
        }
    }

    #[tokio::test]
    async fn cookie_authenticates_like_a_bearer_token() {
        let app = TestApp::spawn().await;
        let token = app.create_student("ana@uni.edu").await;

        let res = app
            .client
            .get(app.url(routes::ME))
            .header("Cookie", format!("{COOKIE_NAME}={token}"))
            .send()
            .await
            .unwrap();

        assert_eq!(res.status().as_u16(), 200);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["email"], "ana@uni.edu");
    }

    #[tokio::test]
    async fn missing_session_redirects_to_entry() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
        assert_eq!(res.body["redirect_to"], "/");
    }

    #[tokio::test]
    async fn garbage_token_is_invalid() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::ME, "not-a-jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn logout_expires_the_cookie() {
        let app = TestApp::spawn().await;

        let res = app.post_without_token(routes::LOGOUT, &json!({})).await;

        assert_eq!(res.status, 204);
        assert!(
            res.set_cookies
                .iter()
                .any(|c| c.starts_with(&format!("{COOKIE_NAME}=")))
        );
    }

    #[tokio::test]
    async fn has_profile_flips_after_completing_the_profile() {
        let app = TestApp::spawn().await;
        let token = app.create_student("ana@uni.edu").await;

        let res = app
            .put_with_token(
                routes::PROFILE,
                &json!({
                    "full_name": "Ana Lima",
                    "college_name": "State Institute of Technology",
                    "degree": "B.Tech",
                    "passout_year": 2027,
                    "heard_from": "A friend",
                }),
                &token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let me = app.get_with_token(routes::ME, &token).await;
        assert_eq!(me.body["has_profile"], true);
    }
}

mod role_gate {
    use super::*;

    #[tokio::test]
    async fn matching_role_is_authorized() {
        let app = TestApp::spawn().await;
        let token = app.create_student("ana@uni.edu").await;

        let res = app.get_with_token(&routes::access("student"), &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["authorized"], true);
    }

    #[tokio::test]
    async fn other_role_gets_notice_and_home_redirect() {
        let app = TestApp::spawn().await;
        let token = app.create_student("ana@uni.edu").await;

        let res = app
            .get_with_token(&routes::access("organizer"), &token)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["authorized"], false);
        assert_eq!(
            res.body["notice"],
            "This page is only accessible to organizers"
        );
        assert_eq!(res.body["redirect_to"], "/home");
    }

    #[tokio::test]
    async fn missing_role_record_cannot_be_verified() {
        let app = TestApp::spawn().await;
        let token = app.create_student("ana@uni.edu").await;
        let user_id = app.user_id("ana@uni.edu").await;
        app.remove_role(user_id).await;

        let res = app.get_with_token(&routes::access("student"), &token).await;

        assert_eq!(res.body["authorized"], false);
        assert_eq!(res.body["notice"], "Unable to verify your role");
    }

    #[tokio::test]
    async fn guarded_endpoint_denies_with_403() {
        let app = TestApp::spawn().await;
        let token = app.create_student("ana@uni.edu").await;

        let res = app.get_with_token(routes::ADMIN_STATS, &token).await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "ACCESS_DENIED");
        assert_eq!(res.body["redirect_to"], "/home");
    }
}
