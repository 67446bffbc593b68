use std::net::SocketAddr;
use std::sync::Arc;

use common::storage::filesystem::FilesystemMediaStore;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tempfile::TempDir;

use server::config::{
    AppConfig, AuthConfig, CorsConfig, DatabaseConfig, ServerConfig, StorageConfig,
};
use server::state::AppState;

pub const PASSWORD: &str = "correct-horse";

pub mod routes {
    pub const REGISTER: &str = "/api/v1/users/register";
    pub const LOGIN: &str = "/api/v1/users/login";
    pub const LOGOUT: &str = "/api/v1/users/logout";
    pub const CURRENT_USER: &str = "/api/v1/users/current-user";
    pub const CHANGE_PASSWORD: &str = "/api/v1/users/change-password";
    pub const UPDATE_ACCOUNT: &str = "/api/v1/users/update-account";
    pub const AVATAR: &str = "/api/v1/users/avatar";
    pub const COVER_IMAGE: &str = "/api/v1/users/cover-image";
    pub const HISTORY: &str = "/api/v1/users/history";
    pub const VIDEOS: &str = "/api/v1/videos";
    pub const PLAYLISTS: &str = "/api/v1/playlists";
    pub const LIKED_VIDEOS: &str = "/api/v1/likes/videos";

    pub fn channel(username: &str) -> String {
        format!("/api/v1/users/c/{username}")
    }

    pub fn video(id: &str) -> String {
        format!("/api/v1/videos/{id}")
    }

    pub fn toggle_publish(id: &str) -> String {
        format!("/api/v1/videos/toggle/publish/{id}")
    }

    pub fn comments(video_id: &str) -> String {
        format!("/api/v1/comments/{video_id}")
    }

    pub fn comment(id: &str) -> String {
        format!("/api/v1/comments/c/{id}")
    }

    pub fn like_video(id: &str) -> String {
        format!("/api/v1/likes/toggle/v/{id}")
    }

    pub fn like_comment(id: &str) -> String {
        format!("/api/v1/likes/toggle/c/{id}")
    }

    pub fn like_tweet(id: &str) -> String {
        format!("/api/v1/likes/toggle/t/{id}")
    }

    pub fn channel_subscriptions(channel_id: &str) -> String {
        format!("/api/v1/subscriptions/c/{channel_id}")
    }

    pub fn subscribed_channels(subscriber_id: &str) -> String {
        format!("/api/v1/subscriptions/u/{subscriber_id}")
    }

    pub fn playlist(id: &str) -> String {
        format!("/api/v1/playlists/{id}")
    }

    pub fn playlist_add(video_id: &str, playlist_id: &str) -> String {
        format!("/api/v1/playlists/add/{video_id}/{playlist_id}")
    }

    pub fn playlist_remove(video_id: &str, playlist_id: &str) -> String {
        format!("/api/v1/playlists/remove/{video_id}/{playlist_id}")
    }

    pub fn user_playlists(user_id: &str) -> String {
        format!("/api/v1/playlists/user/{user_id}")
    }
}

/// A running test server backed by its own SQLite file and media directory.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    _dir: TempDir,
}

/// A registered, logged-in user.
pub struct TestUser {
    pub id: String,
    pub username: String,
    pub token: String,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());

        let db = server::database::init_db(&db_url, 5)
            .await
            .expect("Failed to initialize test database");
        server::database::ensure_indexes(&db)
            .await
            .expect("Failed to create indexes");

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig {
                url: db_url,
                max_connections: 5,
            },
            auth: AuthConfig {
                jwt_secret: "test-secret-for-integration-tests".to_string(),
                token_ttl_hours: 1,
            },
            storage: StorageConfig {
                media_dir: dir.path().join("media"),
                upload_dir: dir.path().join("uploads"),
                public_url: "http://127.0.0.1/media".to_string(),
                max_upload_size: 1024 * 1024,
            },
        };

        let media = FilesystemMediaStore::new(
            app_config.storage.media_dir.clone(),
            app_config.storage.public_url.clone(),
            app_config.storage.max_upload_size,
        )
        .await
        .expect("Failed to create media store");

        let state = AppState {
            db: db.clone(),
            config: app_config,
            media: Arc::new(media),
        };

        let app = server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            db,
            _dir: dir,
        }
    }

    /// Number of stored assets of one kind (`"images"` or `"videos"`).
    pub fn stored_media_count(&self, kind_dir: &str) -> usize {
        std::fs::read_dir(self._dir.path().join("media").join(kind_dir))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_without_token(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn post_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_without_token(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn patch_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .patch(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send PATCH request");

        TestResponse::from_response(res).await
    }

    pub async fn delete_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    pub async fn multipart(
        &self,
        method: reqwest::Method,
        path: &str,
        form: Form,
        token: Option<&str>,
    ) -> TestResponse {
        let mut req = self.client.request(method, self.url(path)).multipart(form);
        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        let res = req.send().await.expect("Failed to send multipart request");

        TestResponse::from_response(res).await
    }

    pub fn registration_form(username: &str) -> Form {
        Form::new()
            .text("username", username.to_string())
            .text("email", format!("{username}@example.com"))
            .text("fullName", format!("{username} tester"))
            .text("password", PASSWORD)
            .part("avatar", file_part(b"avatar image", "avatar.png"))
    }

    /// Register a user and log in.
    pub async fn create_user(&self, username: &str) -> TestUser {
        let reg = self
            .multipart(
                reqwest::Method::POST,
                routes::REGISTER,
                Self::registration_form(username),
                None,
            )
            .await;
        assert_eq!(reg.status, 201, "Registration failed: {}", reg.text);

        let res = self
            .post_without_token(
                routes::LOGIN,
                &serde_json::json!({"username": username, "password": PASSWORD}),
            )
            .await;
        assert_eq!(res.status, 200, "Login failed: {}", res.text);

        TestUser {
            id: res.data()["user"]["id"].as_str().unwrap().to_string(),
            username: username.to_string(),
            token: res.data()["accessToken"].as_str().unwrap().to_string(),
        }
    }

    /// Publish a video via the API and return its `id`.
    pub async fn publish_video(&self, token: &str, title: &str) -> String {
        let form = Form::new()
            .text("title", title.to_string())
            .text("description", format!("About {title}"))
            .text("duration", "42")
            .part("videoFile", file_part(title.as_bytes(), "clip.mp4"))
            .part("thumbnail", file_part(b"thumbnail", "thumb.png"));

        let res = self
            .multipart(reqwest::Method::POST, routes::VIDEOS, form, Some(token))
            .await;
        assert_eq!(res.status, 201, "publish_video failed: {}", res.text);
        res.id()
    }

    /// Comment on a video via the API and return the comment `id`.
    pub async fn add_comment(&self, token: &str, video_id: &str, content: &str) -> String {
        let res = self
            .post_with_token(
                &routes::comments(video_id),
                &serde_json::json!({"content": content}),
                token,
            )
            .await;
        assert_eq!(res.status, 201, "add_comment failed: {}", res.text);
        res.id()
    }

    /// Create a playlist via the API and return its `id`.
    pub async fn create_playlist(&self, token: &str, name: &str) -> String {
        let res = self
            .post_with_token(
                routes::PLAYLISTS,
                &serde_json::json!({"name": name, "description": "test playlist"}),
                token,
            )
            .await;
        assert_eq!(res.status, 201, "create_playlist failed: {}", res.text);
        res.id()
    }
}

pub fn file_part(bytes: &[u8], file_name: &str) -> Part {
    Part::bytes(bytes.to_vec()).file_name(file_name.to_string())
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    /// The `data` member of the response envelope.
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    pub fn id(&self) -> String {
        self.data()["id"]
            .as_str()
            .expect("response data should contain 'id'")
            .to_string()
    }
}
