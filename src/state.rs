// state.rs

use std::sync::{Arc, RwLock};
use std::time::Duration;

/// State shared by every clone of a client and readable by the caller at any time.
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    inner: Arc<RwLock<StateInner>>,
}

#[derive(Debug, Default)]
struct StateInner {
    response_time: Option<Duration>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last server-reported processing time
    pub fn response_time(&self) -> Option<Duration> {
        self.inner.read().map(|s| s.response_time).unwrap_or(None)
    }

    pub(crate) fn set_response_time(&self, value: Duration) {
        if let Ok(mut s) = self.inner.write() {
            s.response_time = Some(value);
        }
    }
}
