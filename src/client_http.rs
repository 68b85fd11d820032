// client_http.rs

use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, error, warn};
use reqwest::{Client as ReqwestClient, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::constants::*;
use crate::error::ArkimeError;
use crate::models::*;
use crate::requester::{PreparedRequest, Requester};
use crate::response_ext::ResponseExt;
use crate::state::SharedState;
use crate::user_cache::UserCache;

type Result<T> = std::result::Result<T, ArkimeError>;

/// HTTP-based requester implementation
pub struct RequesterHttp {
    client: ReqwestClient,
}

impl RequesterHttp {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let user_agent = config.user_agent.clone().unwrap_or_else(|| HTTP_USER_AGENT.to_string());
        let mut client_builder = ReqwestClient::builder().user_agent(user_agent);

        if let Some(timeout) = config.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        // SSL setup
        if let Some(ssl_ca_cert) = &config.ssl_ca_cert {
            let cert_bytes = std::fs::read(ssl_ca_cert)?;
            client_builder = client_builder.add_root_certificate(reqwest::Certificate::from_pem(&cert_bytes)?);
        }
        if config.accept_invalid_certs {
            warn!("TLS certificate verification is disabled");
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        Ok(Self { client: client_builder.build()? })
    }

    async fn to_http_response(resp: reqwest::Response) -> Result<http::Response<Bytes>> {
        let (status, headers, body) = (resp.status(), resp.headers().clone(), resp.bytes().await?);

        let mut http_resp = http::Response::new(body);
        *http_resp.status_mut() = status;
        *http_resp.headers_mut() = headers;
        Ok(http_resp)
    }
}

#[async_trait]
impl Requester for RequesterHttp {
    async fn send(&self, request: PreparedRequest) -> Result<http::Response<Bytes>> {
        debug!("{} {}", request.method, request.url);

        let mut req = self.client.request(request.method, request.url);
        for (k, v) in request.headers {
            req = req.header(k, v);
        }
        if let Some(body) = request.body {
            req = req.body(body);
        }

        let exchange = async move {
            let resp = req.send().await?;
            Self::to_http_response(resp).await
        };

        match request.signal {
            Some(signal) => tokio::select! {
                biased;
                _ = signal.cancelled() => Err(ArkimeError::Cancelled),
                resp = exchange => resp,
            },
            None => exchange.await,
        }
    }
}

/// Request pipeline shared by the client and its in-flight user lookup.
///
/// Holds no reference to the user cache, so a lookup stored in the cache
/// never keeps the owning client alive.
struct FetchCore {
    requester: Box<dyn Requester>,
    base_url: Option<Url>,
    default_headers: HashMap<String, String>,
    state: SharedState,
}

impl FetchCore {
    async fn fetch(&self, options: RequestOptions) -> Result<Value> {
        let prepared = self.prepare(options)?;
        if prepared.signal.as_ref().is_some_and(|s| s.is_cancelled()) {
            return Err(ArkimeError::Cancelled);
        }

        let url = prepared.url.clone();
        let response = self.requester.send(prepared).await?;
        let status = response.status();

        if !status.is_success() {
            let message = failure_message(&response, status);
            error!("HTTP {} error for {}: {}", status, url, message);
            return Err(ArkimeError::RequestFailed { status, message });
        }

        self.record_response_time(&response);

        if response.body().is_empty() {
            return Ok(Value::Null);
        }

        let body: Value = response.json()?;
        if let Some(bsq_err) = query_build_error(&body) {
            error!("Query build error for {}: {}", url, bsq_err);
            return Err(ArkimeError::QueryBuild(bsq_err));
        }

        Ok(body)
    }

    async fn fetch_json<T: DeserializeOwned>(&self, options: RequestOptions) -> Result<T> {
        let body = self.fetch(options).await?;
        Ok(serde_json::from_value(body)?)
    }

    fn prepare(&self, options: RequestOptions) -> Result<PreparedRequest> {
        let RequestOptions { url, method, params, data, headers, signal } = options;

        if url.trim().is_empty() {
            return Err(ArkimeError::MissingUrl);
        }

        let mut url = self.resolve_url(&url)?;
        let pairs: Vec<(String, String)> =
            params.into_iter().filter_map(|(k, v)| render_param(&v).map(|v| (k, v))).collect();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }

        let mut all_headers = self.default_headers.clone();
        all_headers.extend(headers);
        if !all_headers.keys().any(|k| k.eq_ignore_ascii_case(HTTP_HEADER_CONTENT_TYPE)) {
            all_headers.insert(HTTP_HEADER_CONTENT_TYPE.to_string(), CONTENT_TYPE_JSON.to_string());
        }

        let body = match data {
            None => None,
            Some(Value::String(s)) => Some(Bytes::from(s)),
            Some(v) => Some(Bytes::from(serde_json::to_vec(&v)?)),
        };

        Ok(PreparedRequest { method: method.unwrap_or_default(), url, headers: all_headers, body, signal })
    }

    fn resolve_url(&self, url: &str) -> Result<Url> {
        match Url::parse(url) {
            Ok(absolute) => Ok(absolute),
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.base_url {
                Some(base) => Ok(base.join(url)?),
                None => Err(ArkimeError::InvalidUrl(format!("relative url '{}' without a base url", url))),
            },
            Err(e) => Err(e.into()),
        }
    }

    fn record_response_time(&self, response: &http::Response<Bytes>) {
        let Some(raw) = response.header_str(HTTP_HEADER_RESPONSE_TIME) else {
            return;
        };
        let parsed = raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|ms| *ms >= 0.0)
            .and_then(|ms| Duration::try_from_secs_f64(ms / 1000.0).ok());
        match parsed {
            Some(elapsed) => self.state.set_response_time(elapsed),
            None => warn!("Ignoring unparsable {} header: {}", HTTP_HEADER_RESPONSE_TIME, raw),
        }
    }
}

/// Main client wrapping every JSON API call in one uniform request/response contract
pub struct ArkimeClient {
    core: Arc<FetchCore>,
    user_cache: UserCache,
}

impl std::fmt::Debug for ArkimeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArkimeClient")
            .field("base_url", &self.core.base_url.as_ref().map(Url::as_str))
            .field("requester", &"<dyn Requester>")
            .field("user_cache", &self.user_cache)
            .finish()
    }
}

impl ArkimeClient {
    //
    // Client initialization
    //

    /// Create a new client backed by reqwest
    pub fn new(config: ClientConfig) -> Result<Arc<Self>> {
        let requester = RequesterHttp::new(&config)?;
        Self::build(Box::new(requester), config.base_url.as_deref(), config.default_headers)
    }

    /// Create a client with a custom transport
    pub fn with_requester(requester: Box<dyn Requester>, base_url: Option<&str>) -> Result<Arc<Self>> {
        Self::build(requester, base_url, HashMap::new())
    }

    fn build(
        requester: Box<dyn Requester>,
        base_url: Option<&str>,
        default_headers: HashMap<String, String>,
    ) -> Result<Arc<Self>> {
        let base_url = base_url.map(parse_base_url).transpose()?;
        let core = FetchCore { requester, base_url, default_headers, state: SharedState::new() };
        Ok(Arc::new(Self { core: Arc::new(core), user_cache: UserCache::new() }))
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.core.base_url.as_ref()
    }

    /// State updated as responses arrive (e.g. server response time)
    pub fn state(&self) -> &SharedState {
        &self.core.state
    }

    //
    // Generic fetch
    //

    /// Send one request and return the parsed JSON body unchanged.
    ///
    /// Fails when the url is missing, when the status is outside `[200, 300)`,
    /// or when a successful body carries `data.bsqErr`.
    pub async fn fetch(&self, options: RequestOptions) -> Result<Value> {
        self.core.fetch(options).await
    }

    /// [`fetch`](Self::fetch) and deserialize the body into `T`
    pub async fn fetch_json<T: DeserializeOwned>(&self, options: RequestOptions) -> Result<T> {
        self.core.fetch_json(options).await
    }

    /// [`fetch`](Self::fetch) a `{ success, text, data }` envelope
    pub async fn fetch_envelope(&self, options: RequestOptions) -> Result<ResponseEnvelope> {
        self.core.fetch_json(options).await
    }

    /// Normalize options into a transport request. `url` is consumed here.
    pub(crate) fn prepare(&self, options: RequestOptions) -> Result<PreparedRequest> {
        self.core.prepare(options)
    }

    //
    // Current user
    //

    /// Profile of the logged in user, looked up once and cached for the client lifetime.
    ///
    /// Concurrent callers share a single request.
    pub async fn current_user(&self) -> Result<CurrentUser> {
        let core = Arc::clone(&self.core);
        self.user_cache
            .get_or_fetch(move || async move {
                core.fetch_json::<CurrentUser>(RequestOptions::get(API_PATH_CURRENT_USER)).await
            })
            .await
    }

    /// Current user if a lookup already succeeded, without touching the network
    pub fn cached_user(&self) -> Option<CurrentUser> {
        self.user_cache.cached()
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw).map_err(|e| ArkimeError::InvalidUrl(format!("'{}': {}", raw, e)))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Query string form of a parameter, `None` for values that must be skipped
fn render_param(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(_) | Value::Number(_) => Some(value.to_string()),
        Value::Array(items) => {
            Some(items.iter().map(|v| render_param(v).unwrap_or_default()).collect::<Vec<_>>().join(","))
        }
        Value::Object(_) => Some(value.to_string()),
    }
}

/// Server text, then status reason, then a generic fallback
fn failure_message(response: &http::Response<Bytes>, status: StatusCode) -> String {
    response
        .json::<Value>()
        .ok()
        .and_then(|body| body.get(JSON_KEY_TEXT).and_then(Value::as_str).map(str::to_string))
        .filter(|text| !text.is_empty())
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string())
}

/// `data.bsqErr` when it is truthy (`null`, `false`, `0` and `""` are not errors)
fn query_build_error(body: &Value) -> Option<String> {
    let bsq_err = body.get(JSON_KEY_DATA)?.get(JSON_KEY_BSQ_ERR);
    if !is_truthy(bsq_err) {
        return None;
    }
    match bsq_err? {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelSignal;
    use crate::requester::mock::MockRequester;
    use serde_json::json;
    use std::sync::atomic::Ordering;

    fn client_with(requester: MockRequester) -> Arc<ArkimeClient> {
        ArkimeClient::with_requester(Box::new(requester), Some("http://arkime.test:8005")).unwrap()
    }

    #[tokio::test]
    async fn test_missing_url_fails_before_send() {
        let requester = MockRequester::json(200, json!({}));
        let calls = requester.calls.clone();
        let client = client_with(requester);

        let result = client.fetch(RequestOptions::default()).await;
        assert!(matches!(result, Err(ArkimeError::MissingUrl)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_bsq_err_on_success_status_fails() {
        let client = client_with(MockRequester::json(200, json!({"data": {"bsqErr": "x"}})));

        let err = client.fetch(RequestOptions::get("api/sessions")).await.unwrap_err();
        assert!(matches!(err, ArkimeError::QueryBuild(_)));
        assert_eq!(err.message(), "x");
    }

    #[tokio::test]
    async fn test_error_status_uses_server_text() {
        let client = client_with(MockRequester::json(404, json!({"text": "Not Found"})));

        let err = client.fetch(RequestOptions::get("api/missing")).await.unwrap_err();
        assert_eq!(err.message(), "Not Found");
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn test_error_status_falls_back_to_reason() {
        let client = client_with(MockRequester::new(|_| {
            http::Response::builder().status(503).body(Bytes::from("<html>down</html>")).unwrap()
        }));

        let err = client.fetch(RequestOptions::get("api/stats")).await.unwrap_err();
        assert_eq!(err.message(), "Service Unavailable");
    }

    #[tokio::test]
    async fn test_error_status_without_reason_uses_fallback() {
        let client = client_with(MockRequester::json(599, json!({"success": false})));

        let err = client.fetch(RequestOptions::get("api/stats")).await.unwrap_err();
        assert_eq!(err.message(), FALLBACK_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_success_body_is_passed_through() {
        let body = json!({"recordsTotal": 3, "data": [{"id": "a"}], "success": true});
        let requester = MockRequester::json(200, body.clone());
        let seen = requester.seen.clone();
        let client = client_with(requester);

        let result = client.fetch(RequestOptions::get("api/sessions")).await.unwrap();
        assert_eq!(result, body);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].url.as_str(), "http://arkime.test:8005/api/sessions");
    }

    #[tokio::test]
    async fn test_empty_success_body_is_null() {
        let client =
            client_with(MockRequester::new(|_| http::Response::builder().status(204).body(Bytes::new()).unwrap()));

        let result = client.fetch(RequestOptions::delete("api/view/1")).await.unwrap();
        assert_eq!(result, Value::Null);
    }

    #[test]
    fn test_prepare_query_and_body() {
        let client = client_with(MockRequester::json(200, json!({})));
        let options = RequestOptions::post("api/sessions")
            .param("date", 1)
            .param("expression", "ip == 10.0.0.1")
            .param("skip", Value::Null)
            .param("fields", json!(["a", "b"]))
            .data(json!({"ids": ["x"]}));

        let prepared = client.prepare(options).unwrap();
        assert_eq!(prepared.method, http::Method::POST);
        assert_eq!(prepared.url.path(), "/api/sessions");

        let query: HashMap<String, String> = prepared.url.query_pairs().into_owned().collect();
        assert_eq!(query.len(), 3);
        assert_eq!(query["date"], "1");
        assert_eq!(query["expression"], "ip == 10.0.0.1");
        assert_eq!(query["fields"], "a,b");
        assert!(!query.contains_key("skip"));

        assert_eq!(prepared.headers[HTTP_HEADER_CONTENT_TYPE], CONTENT_TYPE_JSON);
        assert_eq!(prepared.body.unwrap(), Bytes::from(r#"{"ids":["x"]}"#));
    }

    #[test]
    fn test_prepare_only_null_params_leaves_no_query() {
        let client = client_with(MockRequester::json(200, json!({})));
        let prepared = client.prepare(RequestOptions::get("api/user").param("a", Value::Null)).unwrap();
        assert_eq!(prepared.url.query(), None);
        assert_eq!(prepared.method, http::Method::GET);
        assert!(prepared.body.is_none());
    }

    #[test]
    fn test_prepare_keeps_caller_content_type() {
        let client = client_with(MockRequester::json(200, json!({})));
        let prepared = client
            .prepare(RequestOptions::post("api/upload").header("content-type", "text/plain").data("raw text"))
            .unwrap();

        assert_eq!(prepared.headers.len(), 1);
        assert_eq!(prepared.headers["content-type"], "text/plain");
        assert_eq!(prepared.body.unwrap(), Bytes::from("raw text"));
    }

    #[test]
    fn test_prepare_resolves_urls() {
        let client = ArkimeClient::with_requester(
            Box::new(MockRequester::json(200, json!({}))),
            Some("https://arkime.test/arkime"),
        )
        .unwrap();

        let relative = client.prepare(RequestOptions::get("api/user")).unwrap();
        assert_eq!(relative.url.as_str(), "https://arkime.test/arkime/api/user");

        let absolute = client.prepare(RequestOptions::get("http://other.test/api/x")).unwrap();
        assert_eq!(absolute.url.as_str(), "http://other.test/api/x");

        let no_base = ArkimeClient::with_requester(Box::new(MockRequester::json(200, json!({}))), None).unwrap();
        assert!(matches!(no_base.prepare(RequestOptions::get("api/user")), Err(ArkimeError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_response_time_is_recorded() {
        let client = client_with(MockRequester::new(|_| {
            http::Response::builder()
                .status(200)
                .header(HTTP_HEADER_RESPONSE_TIME, "250")
                .body(Bytes::from("{}"))
                .unwrap()
        }));

        assert_eq!(client.state().response_time(), None);
        client.fetch(RequestOptions::get("api/sessions")).await.unwrap();
        assert_eq!(client.state().response_time(), Some(Duration::from_millis(250)));
    }

    #[tokio::test]
    async fn test_cancelled_signal_fails_before_send() {
        let requester = MockRequester::json(200, json!({}));
        let calls = requester.calls.clone();
        let client = client_with(requester);

        let (handle, signal) = CancelSignal::new();
        handle.cancel();

        let result = client.fetch(RequestOptions::get("api/sessions").signal(signal)).await;
        assert!(matches!(result, Err(ArkimeError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_concurrent_current_user_single_request() {
        let requester = MockRequester::json(200, json!({"userId": "admin", "roles": ["arkimeUser"]}))
            .with_delay(Duration::from_millis(20));
        let calls = requester.calls.clone();
        let client = client_with(requester);

        let (a, b) = tokio::join!(client.current_user(), client.current_user());
        assert_eq!(a.unwrap().user_id, "admin");
        assert_eq!(b.unwrap().user_id, "admin");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let cached = client.current_user().await.unwrap();
        assert!(cached.has_role("arkimeUser"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(client.cached_user().map(|u| u.user_id), Some("admin".to_string()));
    }

    #[tokio::test]
    async fn test_invalid_response_time_is_ignored() {
        for raw in ["abc", "-5", "1e30", "NaN"] {
            let client = client_with(MockRequester::new(move |_| {
                http::Response::builder()
                    .status(200)
                    .header(HTTP_HEADER_RESPONSE_TIME, raw)
                    .body(Bytes::from(r#"{"success":true}"#))
                    .unwrap()
            }));

            let body = client.fetch(RequestOptions::get("api/stats")).await.unwrap();
            assert_eq!(body["success"], true, "header value {}", raw);
            assert_eq!(client.state().response_time(), None, "header value {}", raw);
        }
    }

    #[tokio::test]
    async fn test_falsy_bsq_err_is_not_an_error() {
        for bsq_err in [json!(0), json!(false), json!(""), Value::Null] {
            let body = json!({"data": {"bsqErr": bsq_err}});
            let client = client_with(MockRequester::json(200, body.clone()));

            assert_eq!(client.fetch(RequestOptions::get("api/sessions")).await.unwrap(), body);
        }

        let client = client_with(MockRequester::json(200, json!({"data": {"bsqErr": 3}})));
        let err = client.fetch(RequestOptions::get("api/sessions")).await.unwrap_err();
        assert_eq!(err.message(), "3");
    }

    #[tokio::test]
    async fn test_abandoned_user_lookup_does_not_keep_client_alive() {
        let requester = MockRequester::json(200, json!({"userId": "admin"})).with_delay(Duration::from_secs(10));
        let calls = requester.calls.clone();
        let client = client_with(requester);

        let result = tokio::time::timeout(Duration::from_millis(20), client.current_user()).await;
        assert!(result.is_err());

        let weak = Arc::downgrade(&client);
        drop(client);
        assert_eq!(weak.strong_count(), 0);
        assert!(weak.upgrade().is_none());
        // transport released along with the client
        assert_eq!(Arc::strong_count(&calls), 1);
    }
}
