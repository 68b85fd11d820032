// models.rs
use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

use crate::cancel::CancelSignal;

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub base_url: Option<String>,
    pub ssl_ca_cert: Option<String>,
    pub accept_invalid_certs: bool,
    pub timeout: Option<std::time::Duration>,
    pub user_agent: Option<String>,
    pub default_headers: HashMap<String, String>,
}

/// Options for a single call through [`crate::ArkimeClient::fetch`].
///
/// Built fresh per call site and consumed by the call.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Relative (resolved against the client base URL) or absolute URL
    pub url: String,
    /// Defaults to `GET`
    pub method: Option<Method>,
    /// Query parameters, `Value::Null` entries are skipped
    pub params: BTreeMap<String, Value>,
    /// Request body, objects and arrays are sent as JSON
    pub data: Option<Value>,
    pub headers: HashMap<String, String>,
    pub signal: Option<CancelSignal>,
}

impl RequestOptions {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self { url: url.into(), method: Some(method), ..Default::default() }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn data(mut self, data: impl Into<Value>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn signal(mut self, signal: CancelSignal) -> Self {
        self.signal = Some(signal);
        self
    }
}

/// Uniform `{ success, text, data }` shape returned by most API calls
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ResponseEnvelope {
    /// Query build error nested under `data.bsqErr`, if any
    pub fn bsq_err(&self) -> Option<&str> {
        self.data.as_ref().and_then(|d| d.get(crate::constants::JSON_KEY_BSQ_ERR)).and_then(Value::as_str)
    }
}

/// Profile of the logged in user as returned by `api/user`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub web_enabled: bool,
    #[serde(default)]
    pub header_auth_enabled: bool,
    #[serde(default)]
    pub email_search: bool,
    #[serde(default)]
    pub remove_enabled: bool,
    #[serde(default)]
    pub packet_search: bool,
    #[serde(default)]
    pub hide_stats: bool,
    #[serde(default)]
    pub hide_files: bool,
    #[serde(default)]
    pub hide_pcap: bool,
    #[serde(default)]
    pub disable_pcap_download: bool,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub settings: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CurrentUser {
    /// Checks a comma separated list of permission fields.
    ///
    /// Every listed field must be truthy. A leading `!` inverts the check, so
    /// `"emailSearch,!hidePcap"` needs email search enabled and pcap not hidden.
    pub fn has_permission(&self, permissions: &str) -> bool {
        let fields = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => return false,
        };

        permissions.split(',').map(str::trim).filter(|p| !p.is_empty()).all(|perm| {
            let (negate, name) = match perm.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, perm),
            };
            is_truthy(fields.get(name)) != negate
        })
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// JavaScript truthiness of an optional JSON value
pub(crate) fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}
