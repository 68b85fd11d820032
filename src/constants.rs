// constants.rs

// HTTP headers
pub const HTTP_HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HTTP_HEADER_USER_AGENT: &str = "User-Agent";
pub const HTTP_HEADER_RESPONSE_TIME: &str = "X-Arkime-Response-Time";

// Header values
pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const HTTP_USER_AGENT: &str = concat!("arkime-client-rs/", env!("CARGO_PKG_VERSION"));

// Body keys
pub const JSON_KEY_TEXT: &str = "text";
pub const JSON_KEY_DATA: &str = "data";
pub const JSON_KEY_BSQ_ERR: &str = "bsqErr";

// API paths
pub const API_PATH_CURRENT_USER: &str = "api/user";

// Environment
pub const ENV_ARKIME_URL: &str = "ARKIME_URL";
pub const ENV_ARKIME_CA_CERT: &str = "ARKIME_CA_CERT";

// Other constants
pub const FALLBACK_ERROR_MESSAGE: &str = "Request failed";
