// user_cache.rs

use futures_util::future::{BoxFuture, FutureExt, Shared};
use log::debug;
use std::future::Future;
use std::sync::Mutex;

use crate::error::ArkimeError;
use crate::models::CurrentUser;

type Result<T> = std::result::Result<T, ArkimeError>;
type SharedLookup = Shared<BoxFuture<'static, Result<CurrentUser>>>;

/// Single-slot cache for the current user with in-flight de-duplication.
///
/// Concurrent callers share one lookup. A successful result is kept for the
/// lifetime of the cache, a failure is handed to every waiter and then forgotten.
#[derive(Default)]
pub struct UserCache {
    slot: Mutex<Slot>,
}

#[derive(Default)]
struct Slot {
    user: Option<CurrentUser>,
    in_flight: Option<(u64, SharedLookup)>,
    generation: u64,
}

impl UserCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached user, if a lookup already succeeded
    pub fn cached(&self) -> Option<CurrentUser> {
        self.slot.lock().ok().and_then(|s| s.user.clone())
    }

    /// Return the cached user, join the lookup in flight, or start one with `fetch`.
    pub async fn get_or_fetch<F, Fut>(&self, fetch: F) -> Result<CurrentUser>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<CurrentUser>> + Send + 'static,
    {
        let (generation, lookup) = {
            let mut slot = self.lock()?;
            if let Some(user) = &slot.user {
                debug!("current user cache hit: {}", user.user_id);
                return Ok(user.clone());
            }
            match slot.in_flight.clone() {
                Some(in_flight) => {
                    debug!("joining in-flight current user lookup");
                    in_flight
                }
                None => {
                    debug!("current user cache miss, starting lookup");
                    slot.generation += 1;
                    let lookup = fetch().boxed().shared();
                    slot.in_flight = Some((slot.generation, lookup.clone()));
                    (slot.generation, lookup)
                }
            }
        };

        let result = lookup.await;

        let mut slot = self.lock()?;
        if matches!(&slot.in_flight, Some((g, _)) if *g == generation) {
            slot.in_flight = None;
        }
        if let Ok(user) = &result {
            if slot.user.is_none() {
                slot.user = Some(user.clone());
            }
        }
        result
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Slot>> {
        self.slot.lock().map_err(|_| ArkimeError::Other("current user cache lock poisoned".to_string()))
    }
}

impl std::fmt::Debug for UserCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserCache").field("cached", &self.cached().map(|u| u.user_id)).finish()
    }
}
