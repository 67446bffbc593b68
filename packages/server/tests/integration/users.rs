use reqwest::Method;
use reqwest::multipart::Form;
use sea_orm::ConnectionTrait;
use serde_json::json;

use crate::common::{PASSWORD, TestApp, TestResponse, file_part, routes};

mod registration {
    use super::*;

    #[tokio::test]
    async fn new_user_can_register_with_an_avatar() {
        let app = TestApp::spawn().await;

        let res = app
            .multipart(
                Method::POST,
                routes::REGISTER,
                TestApp::registration_form("Alice_1"),
                None,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["success"], true);
        assert_eq!(res.data()["username"], "alice_1");
        assert_eq!(res.data()["email"], "alice_1@example.com");
        assert!(
            res.data()["avatar"]
                .as_str()
                .unwrap()
                .starts_with("http://127.0.0.1/media/images/")
        );
        assert!(res.data()["coverImage"].is_null());
        assert!(res.data().get("password").is_none());
    }

    #[tokio::test]
    async fn cannot_register_a_taken_username() {
        let app = TestApp::spawn().await;
        app.create_user("alice").await;

        let res = app
            .multipart(
                Method::POST,
                routes::REGISTER,
                TestApp::registration_form("alice"),
                None,
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
        assert_eq!(res.body["success"], false);
        assert!(res.data().is_null());
    }

    #[tokio::test]
    async fn avatar_is_required() {
        let app = TestApp::spawn().await;
        let form = Form::new()
            .text("username", "alice")
            .text("email", "alice@example.com")
            .text("fullName", "Alice")
            .text("password", PASSWORD);

        let res = app
            .multipart(Method::POST, routes::REGISTER, form, None)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(res.body["message"], "avatar file is required");
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let app = TestApp::spawn().await;
        let form = Form::new()
            .text("username", "alice")
            .text("email", "alice@example.com")
            .text("fullName", "Alice")
            .text("password", "short")
            .part("avatar", file_part(b"avatar", "a.png"));

        let res = app
            .multipart(Method::POST, routes::REGISTER, form, None)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn login_by_email_returns_a_token() {
        let app = TestApp::spawn().await;
        app.create_user("alice").await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "ALICE@example.com", "password": PASSWORD}),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.data()["accessToken"].is_string());
        assert_eq!(res.data()["user"]["username"], "alice");
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;
        app.create_user("alice").await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "alice", "password": "not-the-password"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn missing_identity_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::LOGIN, &json!({"password": PASSWORD}))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod authentication {
    use super::*;

    #[tokio::test]
    async fn request_without_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::CURRENT_USER).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::CURRENT_USER, "not.a.jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn access_token_cookie_authenticates() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;

        let res = app
            .client
            .get(app.url(routes::CURRENT_USER))
            .header("Cookie", format!("accessToken={}", alice.token))
            .send()
            .await
            .unwrap();
        let res = TestResponse::from_response(res).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data()["id"], alice.id.as_str());
    }

    #[tokio::test]
    async fn login_sets_and_logout_clears_the_cookie() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;

        let login = app
            .client
            .post(app.url(routes::LOGIN))
            .json(&json!({"username": "alice", "password": PASSWORD}))
            .send()
            .await
            .unwrap();
        let set_cookie = login.headers()["set-cookie"].to_str().unwrap().to_string();
        assert!(set_cookie.starts_with("accessToken="));
        assert!(set_cookie.contains("HttpOnly"));

        let logout = app
            .client
            .post(app.url(routes::LOGOUT))
            .header("Authorization", format!("Bearer {}", alice.token))
            .send()
            .await
            .unwrap();
        assert_eq!(logout.status().as_u16(), 200);
        let cleared = logout.headers()["set-cookie"].to_str().unwrap().to_string();
        assert!(cleared.starts_with("accessToken="));
        assert!(cleared.contains("Max-Age=0"));
    }
}

mod account {
    use super::*;

    #[tokio::test]
    async fn password_change_requires_the_old_password() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;

        let res = app
            .post_with_token(
                routes::CHANGE_PASSWORD,
                &json!({"oldPassword": "wrong-password", "newPassword": "brand-new-pass"}),
                &alice.token,
            )
            .await;
        assert_eq!(res.status, 400);

        let res = app
            .post_with_token(
                routes::CHANGE_PASSWORD,
                &json!({"oldPassword": PASSWORD, "newPassword": "brand-new-pass"}),
                &alice.token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "alice", "password": "brand-new-pass"}),
            )
            .await;
        assert_eq!(res.status, 200);
    }

    #[tokio::test]
    async fn account_update_needs_a_field_and_a_free_email() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        app.create_user("bob").await;

        let res = app
            .patch_with_token(routes::UPDATE_ACCOUNT, &json!({}), &alice.token)
            .await;
        assert_eq!(res.status, 400);

        let res = app
            .patch_with_token(
                routes::UPDATE_ACCOUNT,
                &json!({"email": "bob@example.com"}),
                &alice.token,
            )
            .await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");

        let res = app
            .patch_with_token(
                routes::UPDATE_ACCOUNT,
                &json!({"fullName": "Alice Liddell"}),
                &alice.token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data()["fullName"], "Alice Liddell");
        assert_eq!(res.data()["email"], "alice@example.com");
    }

    #[tokio::test]
    async fn new_avatar_is_served_from_the_media_route() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;

        let form = Form::new().part("avatar", file_part(b"fresh avatar", "new.png"));
        let res = app
            .multipart(Method::PATCH, routes::AVATAR, form, Some(&alice.token))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let url = res.data()["avatar"].as_str().unwrap();
        let path = url.strip_prefix("http://127.0.0.1").unwrap();
        let media = app.get_without_token(path).await;
        assert_eq!(media.status, 200);
        assert_eq!(media.text, "fresh avatar");
    }

    #[tokio::test]
    async fn replacing_an_avatar_leaves_identical_uploads_alone() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;

        let bob_avatar = app.get_with_token(routes::CURRENT_USER, &bob.token).await;
        let bob_avatar = bob_avatar.data()["avatar"].as_str().unwrap().to_string();

        let form = Form::new().part("avatar", file_part(b"fresh avatar", "new.png"));
        let res = app
            .multipart(Method::PATCH, routes::AVATAR, form, Some(&alice.token))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let media = app
            .get_without_token(bob_avatar.strip_prefix("http://127.0.0.1").unwrap())
            .await;
        assert_eq!(media.status, 200);
        assert_eq!(media.text, "avatar image");
        assert_eq!(app.stored_media_count("images"), 2);
    }

    #[tokio::test]
    async fn failed_avatar_update_discards_the_new_upload() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        assert_eq!(app.stored_media_count("images"), 1);

        app.db
            .execute_unprepared(
                "CREATE TRIGGER freeze_users BEFORE UPDATE ON user \
                 BEGIN SELECT RAISE(ABORT, 'frozen'); END;",
            )
            .await
            .unwrap();

        let form = Form::new().part("avatar", file_part(b"fresh avatar", "new.png"));
        let res = app
            .multipart(Method::PATCH, routes::AVATAR, form, Some(&alice.token))
            .await;
        assert_eq!(res.status, 500);

        let form = Form::new().part("coverImage", file_part(b"cover", "cover.png"));
        let res = app
            .multipart(Method::PATCH, routes::COVER_IMAGE, form, Some(&alice.token))
            .await;
        assert_eq!(res.status, 500);

        assert_eq!(app.stored_media_count("images"), 1);
    }
}

mod channel {
    use super::*;

    #[tokio::test]
    async fn profile_reports_subscription_counts() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;

        let res = app
            .post_with_token(
                &routes::channel_subscriptions(&alice.id),
                &json!({}),
                &bob.token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = app
            .get_with_token(&routes::channel("ALICE"), &bob.token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data()["username"], "alice");
        assert_eq!(res.data()["subscribersCount"], 1);
        assert_eq!(res.data()["channelsSubscribedToCount"], 0);
        assert_eq!(res.data()["isSubscribed"], true);

        let res = app
            .get_with_token(&routes::channel(&bob.username), &alice.token)
            .await;
        assert_eq!(res.data()["channelsSubscribedToCount"], 1);
        assert_eq!(res.data()["isSubscribed"], false);
    }

    #[tokio::test]
    async fn unknown_channel_is_not_found() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;

        let res = app
            .get_with_token(&routes::channel("nobody"), &alice.token)
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["message"], "Channel does not exist");
    }
}
