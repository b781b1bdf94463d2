//! HTTP remote ledger.
//!
//! This module provides an HTTP-based remote ledger for the sync engine.
//! The actual HTTP client is abstracted via a trait to allow different
//! implementations (reqwest, hyper, etc.).
//!
//! Endpoints:
//! - `POST {base}/ledger/upsert` with an [`UpsertRequest`] body
//! - `POST {base}/ledger/fetch` with a [`FetchRequest`] body

use crate::error::{SyncError, SyncResult};
use crate::remote::{MemoryRemoteLedger, RemoteLedger};
use async_trait::async_trait;
use finsync_model::{
    EntityKind, FetchRequest, FetchResponse, ModelResult, UpsertRequest, UpsertResponse,
    WireRecord,
};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const UPSERT_PATH: &str = "/ledger/upsert";
const FETCH_PATH: &str = "/ledger/fetch";

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual HTTP transport.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends a POST request and returns the response body.
    async fn post(&self, url: &str, body: Vec<u8>) -> Result<Vec<u8>, String>;

    /// Checks if the client is connected/healthy.
    fn is_healthy(&self) -> bool;
}

/// HTTP-based remote ledger.
///
/// Uses CBOR encoding for request/response bodies. A failed call does not
/// mark the ledger disconnected; only [`HttpRemoteLedger::close`] does.
pub struct HttpRemoteLedger<C: HttpClient> {
    /// Base URL of the ledger server (e.g., "https://ledger.example.com").
    base_url: String,
    client: C,
    connected: AtomicBool,
    last_error: RwLock<Option<String>>,
}

impl<C: HttpClient> HttpRemoteLedger<C> {
    /// Creates a new HTTP remote ledger.
    pub fn new(base_url: impl Into<String>, client: C) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            connected: AtomicBool::new(true),
            last_error: RwLock::new(None),
        }
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the last transport error message.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    /// Disconnects; subsequent calls fail with [`SyncError::NotConnected`].
    pub fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    async fn post(&self, path: &str, body: Vec<u8>) -> SyncResult<Vec<u8>> {
        if !self.is_connected() {
            return Err(SyncError::NotConnected);
        }

        let url = format!("{}{}", self.base_url, path);
        let response = self.client.post(&url, body).await.map_err(|e| {
            *self.last_error.write() = Some(e.clone());
            SyncError::transport_retryable(e)
        })?;

        *self.last_error.write() = None;
        Ok(response)
    }
}

#[async_trait]
impl<C: HttpClient> RemoteLedger for HttpRemoteLedger<C> {
    async fn upsert(
        &self,
        user_id: &str,
        kind: EntityKind,
        id: &str,
        record: WireRecord,
    ) -> SyncResult<()> {
        let body = UpsertRequest::new(user_id, kind, id, record).encode()?;
        let response = UpsertResponse::decode(&self.post(UPSERT_PATH, body).await?)?;

        if response.success {
            Ok(())
        } else {
            Err(SyncError::Rejected {
                kind,
                id: id.to_string(),
                reason: response.error.unwrap_or_else(|| "unknown error".into()),
            })
        }
    }

    async fn fetch_all(&self, user_id: &str, kind: EntityKind) -> SyncResult<Vec<WireRecord>> {
        let body = FetchRequest::new(user_id, kind).encode()?;
        let response = FetchResponse::decode(&self.post(FETCH_PATH, body).await?)?;

        if response.success {
            Ok(response.records)
        } else {
            Err(SyncError::Server(
                response.error.unwrap_or_else(|| "unknown error".into()),
            ))
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && self.client.is_healthy()
    }
}

/// Trait for servers that can handle loopback requests.
pub trait LoopbackServer {
    /// Handles a POST request and returns the response body.
    fn handle_post(&self, path: &str, body: &[u8]) -> Result<Vec<u8>, String>;
}

impl<S: LoopbackServer + ?Sized> LoopbackServer for Arc<S> {
    fn handle_post(&self, path: &str, body: &[u8]) -> Result<Vec<u8>, String> {
        (**self).handle_post(path, body)
    }
}

impl LoopbackServer for MemoryRemoteLedger {
    fn handle_post(&self, path: &str, body: &[u8]) -> Result<Vec<u8>, String> {
        let encoded: ModelResult<Vec<u8>> = match path {
            UPSERT_PATH => match UpsertRequest::decode(body) {
                Ok(request) => {
                    self.apply_upsert(&request);
                    UpsertResponse::success().encode()
                }
                Err(e) => UpsertResponse::rejected(e.to_string()).encode(),
            },
            FETCH_PATH => match FetchRequest::decode(body) {
                Ok(request) => self.apply_fetch(&request).encode(),
                Err(e) => FetchResponse::error(e.to_string()).encode(),
            },
            other => return Err(format!("404 not found: {other}")),
        };
        encoded.map_err(|e| e.to_string())
    }
}

/// A loopback HTTP client that routes requests directly to a ledger server.
///
/// Useful for testing without actual network overhead.
pub struct LoopbackClient<S: LoopbackServer> {
    server: S,
}

impl<S: LoopbackServer + Send + Sync> LoopbackClient<S> {
    /// Creates a new loopback client connected to the given server.
    pub fn new(server: S) -> Self {
        Self { server }
    }
}

#[async_trait]
impl<S: LoopbackServer + Send + Sync> HttpClient for LoopbackClient<S> {
    async fn post(&self, url: &str, body: Vec<u8>) -> Result<Vec<u8>, String> {
        // The route is the URL's last `/ledger/...` segment; the base may contain one too.
        let path = url.rfind("/ledger/").map(|i| &url[i..]).unwrap_or(url);
        self.server.handle_post(path, &body)
    }

    fn is_healthy(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestClient {
        response: RwLock<Option<Vec<u8>>>,
        healthy: AtomicBool,
    }

    impl TestClient {
        fn new() -> Self {
            Self {
                response: RwLock::new(None),
                healthy: AtomicBool::new(true),
            }
        }

        fn set_response(&self, resp: Vec<u8>) {
            *self.response.write() = Some(resp);
        }

        fn set_healthy(&self, healthy: bool) {
            self.healthy.store(healthy, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl HttpClient for TestClient {
        async fn post(&self, _url: &str, _body: Vec<u8>) -> Result<Vec<u8>, String> {
            self.response
                .read()
                .clone()
                .ok_or_else(|| "connection refused".into())
        }

        fn is_healthy(&self) -> bool {
            self.healthy.load(Ordering::SeqCst)
        }
    }

    fn loopback() -> (Arc<MemoryRemoteLedger>, HttpRemoteLedger<LoopbackClient<Arc<MemoryRemoteLedger>>>) {
        let server = Arc::new(MemoryRemoteLedger::new());
        let remote = HttpRemoteLedger::new(
            "https://ledger.example.com/",
            LoopbackClient::new(Arc::clone(&server)),
        );
        (server, remote)
    }

    #[test]
    fn ledger_creation() {
        let remote = HttpRemoteLedger::new("https://ledger.example.com/", TestClient::new());
        assert_eq!(remote.base_url(), "https://ledger.example.com");
        assert!(remote.is_connected());
    }

    #[test]
    fn unhealthy_client() {
        let client = TestClient::new();
        client.set_healthy(false);
        let remote = HttpRemoteLedger::new("https://ledger.example.com", client);
        assert!(!remote.is_connected());
    }

    #[tokio::test]
    async fn closed_ledger_refuses_calls() {
        let remote = HttpRemoteLedger::new("https://ledger.example.com", TestClient::new());
        remote.close();

        let result = remote.fetch_all("u1", EntityKind::Goal).await;
        assert_eq!(result.unwrap_err(), SyncError::NotConnected);
    }

    #[tokio::test]
    async fn call_failure_keeps_connection() {
        let remote = HttpRemoteLedger::new("https://ledger.example.com", TestClient::new());

        let err = remote.fetch_all("u1", EntityKind::Goal).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(remote.last_error().as_deref(), Some("connection refused"));
        assert!(remote.is_connected());
    }

    #[tokio::test]
    async fn rejected_upsert() {
        let client = TestClient::new();
        client.set_response(UpsertResponse::rejected("quota exceeded").encode().unwrap());
        let remote = HttpRemoteLedger::new("https://ledger.example.com", client);

        let err = remote
            .upsert("u1", EntityKind::Budget, "b1", WireRecord::new())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SyncError::Rejected {
                kind: EntityKind::Budget,
                id: "b1".into(),
                reason: "quota exceeded".into(),
            }
        );
    }

    #[tokio::test]
    async fn failed_fetch_is_server_error() {
        let client = TestClient::new();
        client.set_response(FetchResponse::error("unavailable").encode().unwrap());
        let remote = HttpRemoteLedger::new("https://ledger.example.com", client);

        let err = remote.fetch_all("u1", EntityKind::Goal).await.unwrap_err();
        assert_eq!(err, SyncError::Server("unavailable".into()));
    }

    #[tokio::test]
    async fn garbage_response_is_codec_error() {
        let client = TestClient::new();
        client.set_response(vec![0xff, 0xff]);
        let remote = HttpRemoteLedger::new("https://ledger.example.com", client);

        let err = remote.fetch_all("u1", EntityKind::Goal).await.unwrap_err();
        assert!(matches!(err, SyncError::Codec(_)));
    }

    #[tokio::test]
    async fn loopback_upsert_then_fetch() {
        let (server, remote) = loopback();
        let doc = WireRecord::new().with("id", "t1").with("amount", 1_250i64);

        remote
            .upsert("u1", EntityKind::LedgerEntry, "t1", doc.clone())
            .await
            .unwrap();

        assert_eq!(server.document("u1", EntityKind::LedgerEntry, "t1"), Some(doc.clone()));
        assert_eq!(
            remote.fetch_all("u1", EntityKind::LedgerEntry).await.unwrap(),
            vec![doc]
        );
    }

    #[tokio::test]
    async fn loopback_routes_past_ledger_in_base_url() {
        let server = Arc::new(MemoryRemoteLedger::new());
        let remote = HttpRemoteLedger::new(
            "https://example.com/ledger/v1",
            LoopbackClient::new(Arc::clone(&server)),
        );

        remote
            .upsert("u1", EntityKind::Goal, "g1", WireRecord::new().with("id", "g1"))
            .await
            .unwrap();

        assert_eq!(server.document_count("u1", EntityKind::Goal), 1);
        assert_eq!(remote.fetch_all("u1", EntityKind::Goal).await.unwrap().len(), 1);
    }

    #[test]
    fn loopback_unknown_path() {
        let server = MemoryRemoteLedger::new();
        let err = server.handle_post("/ledger/delete", &[]).unwrap_err();
        assert!(err.contains("404"));
    }
}
