//! Declarative endpoint specs and synchronous request construction.
//!
//! # Design
//! An `EndpointSpec` is a method plus a URL strategy, with the body, path and
//! response types carried as type parameters so every call site is checked at
//! compile time. Specs only hold a `&'static str` or a plain `fn` pointer, so
//! they are `Copy` and can be declared as `const` items in the catalog.
//!
//! `build_request` turns a spec and concrete arguments into an `HttpRequest`
//! without touching the network. Template functions own the encoding of the
//! values they interpolate (see `encode_segment`); the produced path is never
//! re-encoded here.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::panic::{catch_unwind, AssertUnwindSafe};

use reqwest::header::HeaderValue;
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest};

/// How the request path is produced from the path parameters.
pub enum UrlTemplate<P> {
    /// Used verbatim; path parameters are ignored.
    Literal(&'static str),
    /// Pure function of the path parameters.
    Computed(fn(&P) -> String),
    /// Like `Computed`, but able to reject the parameters.
    Fallible(fn(&P) -> Result<String, String>),
}

impl<P> Clone for UrlTemplate<P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for UrlTemplate<P> {}

impl<P> fmt::Debug for UrlTemplate<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlTemplate::Literal(path) => f.debug_tuple("Literal").field(path).finish(),
            UrlTemplate::Computed(_) => f.write_str("Computed(..)"),
            UrlTemplate::Fallible(_) => f.write_str("Fallible(..)"),
        }
    }
}

/// Static description of one backend operation.
///
/// `B` is serialized as the JSON body (or the query string for GET), `P` feeds
/// the URL template and is never sent as a body, and `R` is what a successful
/// response is decoded into.
pub struct EndpointSpec<B, P = (), R = Value> {
    method: HttpMethod,
    template: UrlTemplate<P>,
    _types: PhantomData<fn(&B) -> R>,
}

impl<B, P, R> Clone for EndpointSpec<B, P, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B, P, R> Copy for EndpointSpec<B, P, R> {}

impl<B, P, R> fmt::Debug for EndpointSpec<B, P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointSpec")
            .field("method", &self.method)
            .field("template", &self.template)
            .finish()
    }
}

impl<B, P, R> EndpointSpec<B, P, R> {
    /// Endpoint with a fixed path.
    pub const fn new(method: HttpMethod, path: &'static str) -> Self {
        Self::from_template(method, UrlTemplate::Literal(path))
    }

    /// Endpoint whose path is computed from the path parameters.
    pub const fn computed(method: HttpMethod, template: fn(&P) -> String) -> Self {
        Self::from_template(method, UrlTemplate::Computed(template))
    }

    /// Endpoint whose path template may reject its parameters.
    pub const fn fallible(method: HttpMethod, template: fn(&P) -> Result<String, String>) -> Self {
        Self::from_template(method, UrlTemplate::Fallible(template))
    }

    pub const fn from_template(method: HttpMethod, template: UrlTemplate<P>) -> Self {
        Self {
            method,
            template,
            _types: PhantomData,
        }
    }

    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    pub const fn template(&self) -> &UrlTemplate<P> {
        &self.template
    }

    /// Resolve the request path for one invocation.
    ///
    /// The template function runs exactly once. A rejected or panicking
    /// template becomes `ApiError::Construction`.
    pub fn resolve_path(&self, path: &P) -> Result<String, ApiError> {
        let resolved = match self.template {
            UrlTemplate::Literal(literal) => literal.to_string(),
            UrlTemplate::Computed(template) => {
                catch_unwind(AssertUnwindSafe(|| template(path))).map_err(|panic| {
                    ApiError::Construction(format!("url template panicked: {}", panic_message(&*panic)))
                })?
            }
            UrlTemplate::Fallible(template) => catch_unwind(AssertUnwindSafe(|| template(path)))
                .map_err(|panic| {
                    ApiError::Construction(format!("url template panicked: {}", panic_message(&*panic)))
                })?
                .map_err(|reason| ApiError::Construction(format!("url template rejected parameters: {reason}")))?,
        };
        if !resolved.starts_with('/') {
            return Err(ApiError::Construction(format!(
                "url template must produce an absolute path, got {resolved:?}"
            )));
        }
        Ok(resolved)
    }
}

impl<B: Serialize, P, R> EndpointSpec<B, P, R> {
    /// Build the full request for one invocation without performing I/O.
    ///
    /// GET sends the body parameters as a query string; the other methods send
    /// them as JSON unless they serialize to `null`. A non-empty `token` is
    /// attached as a bearer credential.
    pub fn build_request(
        &self,
        base_url: &str,
        token: &str,
        body: &B,
        path: &P,
    ) -> Result<HttpRequest, ApiError> {
        let mut url = format!("{}{}", base_url.trim_end_matches('/'), self.resolve_path(path)?);
        let params = serde_json::to_value(body)
            .map_err(|e| ApiError::Construction(format!("failed to serialize body parameters: {e}")))?;

        let mut headers = vec![("accept".to_string(), "application/json".to_string())];
        if !token.is_empty() {
            headers.push(("authorization".to_string(), format!("Bearer {token}")));
        }

        let body = match self.method {
            HttpMethod::Get => {
                if let Some(query) = encode_query(&params)? {
                    url.push(if url.contains('?') { '&' } else { '?' });
                    url.push_str(&query);
                }
                None
            }
            HttpMethod::Post | HttpMethod::Put | HttpMethod::Delete => match params {
                Value::Null => None,
                params => {
                    headers.push(("content-type".to_string(), "application/json".to_string()));
                    Some(params.to_string())
                }
            },
        };

        validate(&url, &headers)?;
        Ok(HttpRequest {
            method: self.method,
            url,
            headers,
            body,
        })
    }
}

/// Reject what the transport could not send: an unparsable URL or a header
/// value with control or non-ASCII bytes. Values are never echoed since one
/// of them carries the token.
fn validate(url: &str, headers: &[(String, String)]) -> Result<(), ApiError> {
    url::Url::parse(url).map_err(|e| ApiError::Construction(format!("invalid request url: {e}")))?;
    for (name, value) in headers {
        HeaderValue::from_str(value)
            .map_err(|_| ApiError::Construction(format!("invalid value for header {name:?}")))?;
    }
    Ok(())
}

/// Percent-encode one path segment or query value.
pub fn encode_segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Render GET parameters as a query string, `None` when there is nothing to
/// send. Arrays repeat their key, `null` fields are dropped.
fn encode_query(params: &Value) -> Result<Option<String>, ApiError> {
    let fields = match params {
        Value::Null => return Ok(None),
        Value::Object(fields) => fields,
        other => {
            return Err(ApiError::Construction(format!(
                "query parameters must serialize to an object, got {other}"
            )))
        }
    };

    let mut query = url::form_urlencoded::Serializer::new(String::new());
    let mut any = false;
    for (key, value) in fields {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items.iter().filter(|item| !item.is_null()) {
                    query.append_pair(key, &query_value(item));
                    any = true;
                }
            }
            value => {
                query.append_pair(key, &query_value(value));
                any = true;
            }
        }
    }
    Ok(any.then(|| query.finish()))
}

fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde::Serialize;

    use super::*;
    use crate::error::ErrorKind;

    const BASE_URL: &str = "http://localhost:8080";

    #[derive(Serialize)]
    struct ListReleases {
        namespace: String,
        cluster_id: u64,
        limit: u32,
        #[serde(rename = "byDate")]
        by_date: bool,
        #[serde(rename = "statusFilter")]
        status_filter: Vec<String>,
        label: Option<String>,
    }

    #[derive(Serialize)]
    struct CreateProject {
        name: String,
    }

    struct ProjectPath {
        id: u64,
    }

    struct BranchPath {
        branch: String,
    }

    const CHECK_AUTH: EndpointSpec<()> = EndpointSpec::new(HttpMethod::Get, "/api/auth/check");

    const PROJECT_RELEASES: EndpointSpec<ListReleases, ProjectPath> =
        EndpointSpec::computed(HttpMethod::Get, |p: &ProjectPath| format!("/api/projects/{}/releases", p.id));

    const CREATE_PROJECT: EndpointSpec<CreateProject> = EndpointSpec::new(HttpMethod::Post, "/api/projects");

    #[test]
    fn literal_template_ignores_path_params() {
        let spec: EndpointSpec<(), ProjectPath> = EndpointSpec::new(HttpMethod::Get, "/api/templates");
        assert_eq!(spec.resolve_path(&ProjectPath { id: 1 }).unwrap(), "/api/templates");
        assert_eq!(spec.resolve_path(&ProjectPath { id: 99 }).unwrap(), "/api/templates");
    }

    static TEMPLATE_CALLS: AtomicUsize = AtomicUsize::new(0);

    fn counted_template(p: &ProjectPath) -> String {
        TEMPLATE_CALLS.fetch_add(1, Ordering::SeqCst);
        format!("/api/projects/{}/clusters", p.id)
    }

    #[test]
    fn computed_template_runs_once_per_build() {
        let spec: EndpointSpec<(), ProjectPath> = EndpointSpec::computed(HttpMethod::Get, counted_template);
        let before = TEMPLATE_CALLS.load(Ordering::SeqCst);
        let req = spec.build_request(BASE_URL, "", &(), &ProjectPath { id: 7 }).unwrap();
        assert_eq!(TEMPLATE_CALLS.load(Ordering::SeqCst) - before, 1);
        assert_eq!(req.url, "http://localhost:8080/api/projects/7/clusters");
    }

    #[test]
    fn get_without_params_has_no_body_or_query() {
        let req = CHECK_AUTH.build_request(BASE_URL, "", &(), &()).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:8080/api/auth/check");
        assert!(req.body.is_none());
        assert!(req.header("content-type").is_none());
    }

    #[test]
    fn get_params_become_query_string() {
        let params = ListReleases {
            namespace: "default".to_string(),
            cluster_id: 3,
            limit: 20,
            by_date: true,
            status_filter: vec!["deployed".to_string(), "failed".to_string()],
            label: None,
        };
        let req = PROJECT_RELEASES
            .build_request(BASE_URL, "tok", &params, &ProjectPath { id: 1 })
            .unwrap();
        let (path, query) = req.url.split_once('?').unwrap();
        assert_eq!(path, "http://localhost:8080/api/projects/1/releases");
        let mut pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        pairs.sort();
        let expected = [
            ("byDate", "true"),
            ("cluster_id", "3"),
            ("limit", "20"),
            ("namespace", "default"),
            ("statusFilter", "deployed"),
            ("statusFilter", "failed"),
        ];
        assert_eq!(
            pairs,
            expected.map(|(k, v)| (k.to_string(), v.to_string())).to_vec()
        );
        assert!(req.body.is_none());
    }

    #[test]
    fn get_query_extends_template_query() {
        let spec: EndpointSpec<ListReleases, ProjectPath> = EndpointSpec::computed(HttpMethod::Get, |p: &ProjectPath| {
            format!("/api/projects/{}/releases?cluster_id=9", p.id)
        });
        let params = ListReleases {
            namespace: "kube system".to_string(),
            cluster_id: 9,
            limit: 1,
            by_date: false,
            status_filter: Vec::new(),
            label: None,
        };
        let req = spec.build_request(BASE_URL, "", &params, &ProjectPath { id: 2 }).unwrap();
        assert!(req.url.starts_with("http://localhost:8080/api/projects/2/releases?cluster_id=9&"));
        assert!(req.url.contains("namespace=kube+system"));
        assert!(!req.url.contains("statusFilter"));
    }

    #[test]
    fn get_rejects_non_object_params() {
        let spec: EndpointSpec<Vec<u32>> = EndpointSpec::new(HttpMethod::Get, "/api/templates");
        let err = spec.build_request(BASE_URL, "", &vec![1, 2], &()).unwrap_err();
        assert!(matches!(err, ApiError::Construction(_)));
    }

    #[test]
    fn post_serializes_json_body() {
        let req = CREATE_PROJECT
            .build_request(BASE_URL, "", &CreateProject { name: "demo".to_string() }, &())
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:8080/api/projects");
        assert_eq!(req.header("content-type"), Some("application/json"));
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"name": "demo"}));
    }

    #[test]
    fn unit_body_is_omitted() {
        let spec: EndpointSpec<()> = EndpointSpec::new(HttpMethod::Post, "/api/logout");
        let req = spec.build_request(BASE_URL, "", &(), &()).unwrap();
        assert!(req.body.is_none());
        assert!(req.header("content-type").is_none());
    }

    #[test]
    fn bearer_header_only_with_token() {
        let with = CHECK_AUTH.build_request(BASE_URL, "secret", &(), &()).unwrap();
        assert_eq!(with.header("authorization"), Some("Bearer secret"));

        let without = CHECK_AUTH.build_request(BASE_URL, "", &(), &()).unwrap();
        assert!(without.header("authorization").is_none());
    }

    #[test]
    fn token_with_line_break_is_construction_error() {
        let err = CHECK_AUTH
            .build_request(BASE_URL, "abc\r\nX-Injected: 1", &(), &())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Construction);
        assert!(!err.is_retryable());
        assert!(!err.to_string().contains("X-Injected"));

        let err = CHECK_AUTH.build_request(BASE_URL, "tok\u{7f}", &(), &()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Construction);
    }

    #[test]
    fn unparsable_url_is_construction_error() {
        let err = CHECK_AUTH.build_request("not a url", "", &(), &()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Construction);
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let req = CHECK_AUTH.build_request("http://localhost:8080/", "", &(), &()).unwrap();
        assert_eq!(req.url, "http://localhost:8080/api/auth/check");
    }

    #[test]
    fn template_encodes_segments_it_interpolates() {
        let spec: EndpointSpec<(), BranchPath> = EndpointSpec::computed(HttpMethod::Get, |p: &BranchPath| {
            format!("/api/repos/github/porter/{}/contents", encode_segment(&p.branch))
        });
        let req = spec
            .build_request(BASE_URL, "", &(), &BranchPath { branch: "feature/login".to_string() })
            .unwrap();
        assert_eq!(req.url, "http://localhost:8080/api/repos/github/porter/feature%2Flogin/contents");
    }

    #[test]
    fn rejected_template_is_construction_error() {
        let spec: EndpointSpec<(), BranchPath> = EndpointSpec::fallible(HttpMethod::Get, |p: &BranchPath| {
            if p.branch.is_empty() {
                Err("branch is required".to_string())
            } else {
                Ok(format!("/api/branches/{}", p.branch))
            }
        });
        let err = spec
            .build_request(BASE_URL, "", &(), &BranchPath { branch: String::new() })
            .unwrap_err();
        assert!(matches!(err, ApiError::Construction(ref msg) if msg.contains("branch is required")));
    }

    #[test]
    fn panicking_template_is_construction_error() {
        let spec: EndpointSpec<(), ProjectPath> =
            EndpointSpec::computed(HttpMethod::Get, |_: &ProjectPath| panic!("no project selected"));
        let err = spec.build_request(BASE_URL, "", &(), &ProjectPath { id: 0 }).unwrap_err();
        assert!(matches!(err, ApiError::Construction(ref msg) if msg.contains("no project selected")));
    }

    #[test]
    fn relative_template_output_is_rejected() {
        let spec: EndpointSpec<()> = EndpointSpec::new(HttpMethod::Get, "api/templates");
        let err = spec.build_request(BASE_URL, "", &(), &()).unwrap_err();
        assert!(matches!(err, ApiError::Construction(_)));
    }

    #[test]
    fn encode_segment_escapes_reserved_characters() {
        assert_eq!(encode_segment("feature/x"), "feature%2Fx");
        assert_eq!(encode_segment("a b&c"), "a%20b%26c");
        assert_eq!(encode_segment("plain-name_1.0"), "plain-name_1.0");
    }
}
