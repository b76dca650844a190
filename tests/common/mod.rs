#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use futures::FutureExt;
use futures::future::BoxFuture;
use http_body_util::BodyExt;
use sales_api::db::HealthCheck;
use sales_api::metrics::Metrics;
use sales_api::state::AppState;
use sales_auth::{
    Algorithm, Auth, Claims, DecodingKey, KeyStore, private_key_from_pem, public_key_from_pem,
};
use serde_json::Value;
use tracing_subscriber::fmt::MakeWriter;

pub const KID_1: &str = "54bb2165-71e1-41a6-af3e-7da4a0e1e2c1";
pub const KID_2: &str = "7f0c1a9e-2b4d-4c3e-9a51-0d6e8f7b3c22";

pub const PRIVATE_1: &str = include_str!("../../crates/sales-auth/testdata/private_1.pem");
pub const PUBLIC_1: &str = include_str!("../../crates/sales-auth/testdata/public_1.pem");
pub const PRIVATE_2: &str = include_str!("../../crates/sales-auth/testdata/private_2.pem");
pub const PUBLIC_2: &str = include_str!("../../crates/sales-auth/testdata/public_2.pem");

pub const BUILD: &str = "test";

/// Auth signing under KID_1, able to verify both test key pairs.
pub fn test_auth() -> Arc<Auth> {
    let lookup = |kid: &str| -> anyhow::Result<DecodingKey> {
        let pem = match kid {
            KID_1 => PUBLIC_1,
            KID_2 => PUBLIC_2,
            _ => return Err(anyhow!("no public key found for the specified kid: {kid}")),
        };
        Ok(public_key_from_pem(pem.as_bytes())?)
    };

    let keys: KeyStore = [(KID_1, private_key_from_pem(PRIVATE_1.as_bytes()).unwrap())]
        .into_iter()
        .collect();

    Arc::new(Auth::new(Algorithm::RS256, lookup, keys))
}

pub fn claims_with_roles(roles: &[&str]) -> Claims {
    Claims::new(
        "service project",
        "5cf37266-3473-4006-984f-9325122678b7",
        vec!["students".to_string()],
        Duration::from_secs(3600),
        roles.iter().map(|r| r.to_string()).collect(),
    )
}

pub fn token_with_roles(auth: &Auth, roles: &[&str]) -> String {
    auth.generate_token(KID_1, &claims_with_roles(roles)).unwrap()
}

/// Database stand-in with a fixed answer.
pub struct FakeDb {
    pub ready: bool,
}

impl HealthCheck for FakeDb {
    fn ping(&self) -> BoxFuture<'_, anyhow::Result<()>> {
        let ready = self.ready;
        async move {
            if ready {
                Ok(())
            } else {
                Err(anyhow!("connection refused"))
            }
        }
        .boxed()
    }
}

pub fn test_state(db_ready: bool) -> AppState {
    AppState {
        build: BUILD.to_string(),
        auth: test_auth(),
        db: Arc::new(FakeDb { ready: db_ready }),
        metrics: Arc::new(Metrics::new()),
    }
}

pub fn get(path: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(path);
    if let Some(value) = authorization {
        builder = builder.header("Authorization", value);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// In-memory sink for `tracing` output.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Installs a subscriber writing into this sink for the current thread.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }
}

pub struct CapturedWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CapturedWriter(self.0.clone())
    }
}
