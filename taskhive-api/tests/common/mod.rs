/// Common test utilities for integration tests
///
/// Shared infrastructure for the API tests:
/// - Test database setup (DATABASE_URL) and migrations
/// - Router construction with a disabled mailer
/// - Registration/login helpers that drive the real endpoints
/// - Request/response helpers

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use serde_json::Value;
use sqlx::PgPool;
use taskhive_api::app::{build_router, AppState};
use taskhive_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig, MailConfig};
use taskhive_api::mail::Mailer;
use tower::Service as _;
use uuid::Uuid;

/// Test context containing the database pool and a ready router
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
}

impl TestContext {
    /// Creates a new test context against DATABASE_URL
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set for integration tests"))?;

        let db = PgPool::connect(&database_url).await?;
        taskhive_shared::db::migrations::run_migrations(&db).await?;

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: 5,
            },
            jwt: JwtConfig {
                secret: std::env::var("JWT_SECRET")
                    .unwrap_or_else(|_| "integration-test-secret-0123456789abcdef".to_string()),
            },
            // No relay configured: every send is a logged no-op
            mail: MailConfig {
                relay_url: None,
                api_token: None,
                from_address: "taskhive@allmight.today".to_string(),
            },
        };

        let mailer = Mailer::new(config.mail.clone());
        let state = AppState::new(db.clone(), config, mailer);
        let app = build_router(state);

        Ok(TestContext { db, app })
    }

    /// Sends a request through the router and returns the response
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.app
            .clone()
            .call(request)
            .await
            .expect("Router call should not fail")
    }

    /// Registers a user through the API and returns (user, token)
    pub async fn register_user(&self, name: &str, email: &str, password: &str) -> (Value, String) {
        let response = self
            .request(post_json(
                "/users",
                None,
                serde_json::json!({
                    "name": name,
                    "age": 30,
                    "email": email,
                    "password": password,
                }),
            ))
            .await;

        assert_eq!(response.status(), StatusCode::CREATED, "registration failed");

        let body = read_json(response).await;
        let token = body["token"].as_str().expect("token missing").to_string();
        (body["user"].clone(), token)
    }

    /// Deletes the test users created under the given emails
    pub async fn cleanup(&self, emails: &[&str]) -> anyhow::Result<()> {
        for email in emails {
            sqlx::query(
                "DELETE FROM tasks WHERE owner_id IN (SELECT id FROM users WHERE email = $1)",
            )
            .bind(email)
            .execute(&self.db)
            .await?;
            sqlx::query("DELETE FROM users WHERE email = $1")
                .bind(email)
                .execute(&self.db)
                .await?;
        }
        Ok(())
    }
}

/// Generates a unique test email
pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, Uuid::new_v4())
}

/// Builds a JSON request with an optional bearer token
pub fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    json_request("POST", uri, token, body)
}

pub fn patch_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    json_request("PATCH", uri, token, body)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");

    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    builder
        .body(Body::from(body.to_string()))
        .expect("Request should build")
}

/// Builds a bodyless request with an optional bearer token
pub fn bare_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    builder.body(Body::empty()).expect("Request should build")
}

/// Reads a response body as JSON
pub async fn read_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Body should read");
    serde_json::from_slice(&bytes).expect("Body should be JSON")
}

/// Reads a response body as raw bytes
pub async fn read_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Body should read")
        .to_vec()
}

/// Builds a multipart avatar upload request
pub fn avatar_upload(uri: &str, token: &str, filename: &str, bytes: &[u8]) -> Request<Body> {
    let boundary = "taskhive-test-boundary";

    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"avatar\"; \
             filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .expect("Request should build")
}
