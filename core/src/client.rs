//! `ApiClient` and the endpoint functions it produces.
//!
//! # Design
//! `ApiClient` holds the base URL, the timeout and a shared `Transport`; it
//! carries no mutable state, so one client (and every `Endpoint` bound to it)
//! can be cloned into any number of concurrent tasks.
//!
//! An `Endpoint` offers two delivery styles over one execution path:
//!
//! - `call` returns a `'static` future that resolves to the normalized
//!   result (promise style).
//! - `call_with` runs the same future on a spawned task and hands the result
//!   to a completion callback (callback style).
//!
//! Both build the request eagerly, when the call is made, then go through
//! `ApiClient::complete`: one transport round trip bounded by the configured
//! timeout, then `parse_response`. There are no retries.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::config::ClientConfig;
use crate::endpoint::EndpointSpec;
use crate::error::{ApiError, ConfigError, TransportError};
use crate::http::HttpRequest;
use crate::response::{parse_response, Response};
use crate::transport::{ReqwestTransport, Transport};

/// Result delivered to callers of an endpoint.
pub type ApiResult<R = Value> = Result<Response<R>, ApiError>;

#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

struct Inner {
    base_url: String,
    timeout: Duration,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .field("timeout", &self.inner.timeout)
            .field("transport", &self.inner.transport)
            .finish()
    }
}

impl ApiClient {
    /// Client backed by a pooled `reqwest` transport.
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Client backed by a caller-supplied transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(Inner {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                timeout: config.timeout,
                transport,
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Bind a spec to this client, producing its endpoint function.
    pub fn endpoint<B, P, R>(&self, spec: EndpointSpec<B, P, R>) -> Endpoint<B, P, R> {
        Endpoint {
            client: self.clone(),
            spec,
        }
    }

    /// Dispatch a built request and normalize the outcome.
    async fn complete<R: DeserializeOwned>(&self, request: HttpRequest) -> ApiResult<R> {
        let method = request.method;
        let url = request.url.clone();
        tracing::debug!(%method, %url, "dispatching request");

        let response = match tokio::time::timeout(self.inner.timeout, self.inner.transport.execute(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                tracing::warn!(%method, %url, "transport failed: {}", err);
                return Err(err.into());
            }
            Err(elapsed) => {
                tracing::warn!(%method, %url, timeout = ?self.inner.timeout, "request timed out");
                return Err(TransportError::timeout(elapsed).into());
            }
        };

        tracing::trace!(%method, %url, status = response.status, "response received");
        let result = parse_response(response);
        if let Err(err) = &result {
            tracing::warn!(%method, %url, "unsuccessful: {}", err);
        }
        result
    }
}

/// An endpoint function: a spec bound to a client.
///
/// Stateless and cheap to clone; every call is an independent invocation
/// issuing exactly one request.
pub struct Endpoint<B, P = (), R = Value> {
    client: ApiClient,
    spec: EndpointSpec<B, P, R>,
}

impl<B, P, R> Clone for Endpoint<B, P, R> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            spec: self.spec,
        }
    }
}

impl<B, P, R> fmt::Debug for Endpoint<B, P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("base_url", &self.client.base_url())
            .field("spec", &self.spec)
            .finish()
    }
}

impl<B, P, R> Endpoint<B, P, R>
where
    B: Serialize + Send + 'static,
    P: Send + 'static,
    R: DeserializeOwned + Send + 'static,
{
    pub fn spec(&self) -> &EndpointSpec<B, P, R> {
        &self.spec
    }

    /// Build the request for these arguments without sending it.
    pub fn request(&self, token: &str, body: &B, path: &P) -> Result<HttpRequest, ApiError> {
        self.spec.build_request(self.client.base_url(), token, body, path)
    }

    /// Invoke the endpoint, returning the result as a future.
    ///
    /// The request is built before this returns, so the template runs exactly
    /// once even if the future is never polled; a construction error resolves
    /// the future immediately without I/O.
    pub fn call(&self, token: &str, body: &B, path: &P) -> impl Future<Output = ApiResult<R>> + Send + 'static {
        let prepared = self.request(token, body, path);
        let client = self.client.clone();
        async move { client.complete(prepared?).await }
    }

    /// Invoke the endpoint and deliver the result to `callback`.
    ///
    /// `callback` runs exactly once, on a spawned task and never inside this
    /// call, with the same result `call` would have produced. Must be called
    /// from within a Tokio runtime.
    pub fn call_with<F>(&self, token: &str, body: &B, path: &P, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(ApiResult<R>) + Send + 'static,
    {
        let pending = self.call(token, body, path);
        tokio::spawn(async move { callback(pending.await) })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use tokio::sync::oneshot;

    use super::*;
    use crate::error::{ErrorBody, ErrorKind, NetworkErrorKind};
    use crate::http::{HttpMethod, HttpResponse};

    /// In-memory transport that records requests and replays scripted outcomes.
    #[derive(Debug)]
    struct Recording {
        requests: Mutex<Vec<HttpRequest>>,
        outcomes: Mutex<VecDeque<Outcome>>,
    }

    #[derive(Debug)]
    enum Outcome {
        Respond(u16, &'static str),
        Refuse,
        Hang,
    }

    impl Recording {
        fn scripted(outcomes: impl IntoIterator<Item = Outcome>) -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::default(),
                outcomes: Mutex::new(outcomes.into_iter().collect()),
            })
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for Recording {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.requests.lock().unwrap().push(request);
            let outcome = self.outcomes.lock().unwrap().pop_front().expect("unscripted request");
            match outcome {
                Outcome::Respond(status, body) => Ok(HttpResponse {
                    status,
                    headers: Vec::new(),
                    body: body.as_bytes().to_vec(),
                }),
                Outcome::Refuse => Err(TransportError::new(NetworkErrorKind::Connect, "connection refused")),
                Outcome::Hang => std::future::pending().await,
            }
        }
    }

    fn client(transport: Arc<Recording>) -> ApiClient {
        ApiClient::with_transport(ClientConfig::new("http://backend.test"), transport).unwrap()
    }

    #[derive(Serialize)]
    struct CreateProject {
        name: String,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Project {
        id: u64,
        name: String,
    }

    struct ProjectPath {
        id: u64,
    }

    const CREATE_PROJECT: EndpointSpec<CreateProject, (), Project> =
        EndpointSpec::new(HttpMethod::Post, "/api/projects");

    const GET_CLUSTERS: EndpointSpec<(), ProjectPath> =
        EndpointSpec::computed(HttpMethod::Get, |p: &ProjectPath| format!("/api/projects/{}/clusters", p.id));

    fn demo() -> CreateProject {
        CreateProject {
            name: "demo".to_string(),
        }
    }

    #[tokio::test]
    async fn promise_resolves_with_status_and_data() {
        let transport = Recording::scripted([Outcome::Respond(200, r#"[{"id":1,"name":"c1"}]"#)]);
        let result = client(transport.clone())
            .endpoint(GET_CLUSTERS)
            .call("", &(), &ProjectPath { id: 7 })
            .await
            .unwrap();

        assert_eq!(result.status, 200);
        assert_eq!(result.data, json!([{"id": 1, "name": "c1"}]));
        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "http://backend.test/api/projects/7/clusters");
        assert_eq!(requests[0].method, HttpMethod::Get);
    }

    #[tokio::test]
    async fn callback_receives_typed_response_once() {
        let transport = Recording::scripted([Outcome::Respond(201, r#"{"id":1,"name":"demo"}"#)]);
        let (tx, rx) = oneshot::channel();
        let handle = client(transport.clone())
            .endpoint(CREATE_PROJECT)
            .call_with("token", &demo(), &(), move |result| {
                tx.send(result).unwrap();
            });

        handle.await.unwrap();
        let response = rx.await.unwrap().unwrap();
        assert_eq!(response.status, 201);
        assert_eq!(
            response.data,
            Project {
                id: 1,
                name: "demo".to_string()
            }
        );
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn bearer_header_follows_token() {
        let transport = Recording::scripted([Outcome::Respond(200, "{}"), Outcome::Respond(200, "{}")]);
        let endpoint = client(transport.clone()).endpoint(GET_CLUSTERS);
        endpoint.call("abc123", &(), &ProjectPath { id: 1 }).await.unwrap();
        endpoint.call("", &(), &ProjectPath { id: 1 }).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].header("authorization"), Some("Bearer abc123"));
        assert_eq!(requests[1].header("authorization"), None);
    }

    #[tokio::test]
    async fn both_conventions_send_identical_requests() {
        let transport = Recording::scripted([
            Outcome::Respond(500, r#"{"error":"boom"}"#),
            Outcome::Respond(500, r#"{"error":"boom"}"#),
        ]);
        let endpoint = client(transport.clone()).endpoint(CREATE_PROJECT);

        let promised = endpoint.call("tok", &demo(), &()).await.unwrap_err();
        let (tx, rx) = oneshot::channel();
        endpoint.call_with("tok", &demo(), &(), move |result| {
            tx.send(result).unwrap();
        });
        let called_back = rx.await.unwrap().unwrap_err();

        for err in [promised, called_back] {
            match err {
                ApiError::RequestFailed { status, body } => {
                    assert_eq!(status, 500);
                    assert_eq!(body, ErrorBody::Json(json!({"error": "boom"})));
                }
                other => panic!("expected RequestFailed, got {other:?}"),
            }
        }
        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], requests[1]);
    }

    #[tokio::test]
    async fn construction_error_skips_transport() {
        let transport = Recording::scripted([]);
        let spec: EndpointSpec<(), ProjectPath> =
            EndpointSpec::fallible(HttpMethod::Delete, |p: &ProjectPath| match p.id {
                0 => Err("project id is required".to_string()),
                id => Ok(format!("/api/projects/{id}")),
            });
        let endpoint = client(transport.clone()).endpoint(spec);

        let err = endpoint.call("", &(), &ProjectPath { id: 0 }).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Construction);

        let (tx, rx) = oneshot::channel();
        endpoint.call_with("", &(), &ProjectPath { id: 0 }, move |result| {
            tx.send(result).unwrap();
        });
        let err = rx.await.unwrap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Construction);
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn refused_connection_is_network_error() {
        let transport = Recording::scripted([Outcome::Refuse]);
        let err = client(transport)
            .endpoint(GET_CLUSTERS)
            .call("", &(), &ProjectPath { id: 1 })
            .await
            .unwrap_err();
        match err {
            ApiError::Network(ref e) => assert_eq!(e.kind(), NetworkErrorKind::Connect),
            other => panic!("expected Network, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_backend_times_out_at_configured_bound() {
        let transport = Recording::scripted([Outcome::Hang]);
        let client = ApiClient::with_transport(ClientConfig::new("http://backend.test"), transport).unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(30));

        let started = tokio::time::Instant::now();
        let err = client
            .endpoint(GET_CLUSTERS)
            .call("", &(), &ProjectPath { id: 1 })
            .await
            .unwrap_err();

        assert!(err.is_timeout(), "expected timeout, got {err:?}");
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(30));
        assert!(waited < Duration::from_secs(31));
    }

    #[tokio::test]
    async fn template_runs_when_call_is_made() {
        let transport = Recording::scripted([]);
        let endpoint = client(transport.clone()).endpoint(GET_CLUSTERS);
        // Dropped without polling: no request is sent.
        let pending = endpoint.call("", &(), &ProjectPath { id: 3 });
        drop(pending);
        assert!(transport.requests().is_empty());

        let req = endpoint.request("t", &(), &ProjectPath { id: 3 }).unwrap();
        assert_eq!(req.url, "http://backend.test/api/projects/3/clusters");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_invocations_are_independent() {
        let transport = Recording::scripted((0..8).map(|_| Outcome::Respond(200, "[]")));
        let endpoint = client(transport.clone()).endpoint(GET_CLUSTERS);

        let calls: Vec<_> = (1..=8)
            .map(|id| tokio::spawn(endpoint.call("", &(), &ProjectPath { id })))
            .collect();
        for call in calls {
            assert_eq!(call.await.unwrap().unwrap().data, json!([]));
        }

        let mut urls: Vec<String> = transport.requests().into_iter().map(|r| r.url).collect();
        urls.sort();
        urls.dedup();
        assert_eq!(urls.len(), 8);
    }
}
