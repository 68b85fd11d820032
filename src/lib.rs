// lib.rs
//! Async client for Arkime-style JSON REST APIs

mod cancel;
mod client_builder;
mod client_http;
mod constants;
mod error;
mod models;
mod requester;
mod response_ext;
mod state;
mod user_cache;

pub use cancel::{CancelHandle, CancelSignal};
pub use client_builder::*;
pub use client_http::{ArkimeClient, RequesterHttp};
pub use error::ArkimeError;
pub use models::{ClientConfig, CurrentUser, RequestOptions, ResponseEnvelope};
pub use requester::{PreparedRequest, Requester};
pub use response_ext::ResponseExt;
pub use state::SharedState;
pub use user_cache::UserCache;
