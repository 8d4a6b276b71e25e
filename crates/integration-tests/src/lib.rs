//! Integration tests for Dental-Com.
//!
//! Each test boots the full storefront application on an ephemeral port and
//! drives it over HTTP, so routing, middleware and the database schema are
//! all exercised together.
//!
//! # Running Tests
//!
//! ```bash
//! export STOREFRONT_TEST_DATABASE_URL=postgres://localhost/dental_com_test
//! cargo test -p dental-com-integration-tests -- --ignored
//! ```
//!
//! Every test is `#[ignore]`d so a plain `cargo test` does not report them
//! as passing without a database. Migrations are applied on first connect.

#![allow(
    clippy::missing_panics_doc,
    clippy::unwrap_used,
    clippy::indexing_slicing
)]

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use chrono::Duration;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::SecretString;
use serde_json::{Value, json};
use sqlx::PgPool;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use uuid::Uuid;

use dental_com_storefront::config::{GoogleConfig, JwtConfig, StorefrontConfig};
use dental_com_storefront::db::UserRepository;
use dental_com_storefront::state::AppState;

/// Environment variable naming the disposable test database.
pub const DATABASE_ENV: &str = "STOREFRONT_TEST_DATABASE_URL";

/// A running storefront plus a client and pool pointed at it.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    pub pool: PgPool,
    _shutdown: oneshot::Sender<()>,
}

/// A signed-in guest.
pub struct Guest {
    pub username: String,
    pub access: String,
    pub refresh: String,
}

impl TestContext {
    /// Start the storefront against the test database.
    ///
    /// # Panics
    ///
    /// Panics when `STOREFRONT_TEST_DATABASE_URL` is not set.
    pub async fn start() -> Self {
        let url = std::env::var(DATABASE_ENV)
            .unwrap_or_else(|_| panic!("{DATABASE_ENV} must point at a disposable database"));
        let database_url = SecretString::from(url);
        let pool = dental_com_storefront::db::create_pool(&database_url)
            .await
            .unwrap();
        sqlx::migrate!("../storefront/migrations")
            .run(&pool)
            .await
            .unwrap();

        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{addr}");

        let config = StorefrontConfig {
            database_url,
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: addr.port(),
            base_url: base_url.clone(),
            api_base_url: format!("{base_url}/api/"),
            media_url: "/media/".to_string(),
            media_root: PathBuf::from("media"),
            static_root: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../storefront/static")),
            jwt: JwtConfig {
                secret: SecretString::from(format!("test-{}-{}", Uuid::new_v4(), Uuid::new_v4())),
                access_ttl: Duration::minutes(60),
                refresh_ttl: Duration::days(7),
            },
            google: GoogleConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
        };

        let app = dental_com_storefront::app(AppState::new(config, pool.clone()));
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            dental_com_storefront::serve(listener, app, async {
                rx.await.ok();
            })
            .await
            .unwrap();
        });

        Self {
            client: Client::new(),
            base_url,
            pool,
            _shutdown: tx,
        }
    }

    /// Absolute URL for a path on the test server.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    /// Sign in as a brand new guest.
    pub async fn guest(&self) -> Guest {
        let session_id = format!("it-{}", Uuid::new_v4().simple());
        let resp = self
            .post("/api/auth/guest-login/")
            .json(&json!({ "session_id": session_id }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = resp.json().await.unwrap();
        let data = &body["data"];
        Guest {
            username: data["user"]["username"].as_str().unwrap().to_string(),
            access: data["access"].as_str().unwrap().to_string(),
            refresh: data["refresh"].as_str().unwrap().to_string(),
        }
    }

    /// Sign in as a guest with staff rights.
    pub async fn staff(&self) -> Guest {
        let guest = self.guest().await;
        UserRepository::new(&self.pool)
            .set_staff(&guest.username, true)
            .await
            .unwrap();
        guest
    }
}

/// Unique suffix for slugs and names created by a test.
#[must_use]
pub fn unique(prefix: &str) -> String {
    format!("{prefix} {}", &Uuid::new_v4().simple().to_string()[..8])
}

/// Read a JSON body, asserting the status first.
pub async fn json_with(resp: Response, status: StatusCode) -> Value {
    let actual = resp.status();
    let body = resp.text().await.unwrap();
    assert_eq!(actual, status, "unexpected status, body: {body}");
    serde_json::from_str(&body).unwrap()
}
