//! Time-to-live cache around any [`IndicatorSource`].

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use crate::domain::error::FetchError;
use crate::domain::snapshot::SnapshotFragment;
use crate::ports::source_port::IndicatorSource;

/// Serves the last successful fragment until it is older than `ttl`.
///
/// Failed fetches are never cached. The lock is held across the inner fetch,
/// so concurrent callers on a cold cache wait for a single origin request.
pub struct CachedSource<S> {
    inner: S,
    ttl: Duration,
    entry: Mutex<Option<(Instant, SnapshotFragment)>>,
}

impl<S: IndicatorSource> CachedSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entry: Mutex::new(None),
        }
    }
}

impl<S: IndicatorSource> IndicatorSource for CachedSource<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch(&self) -> Result<SnapshotFragment, FetchError> {
        let mut entry = self.entry.lock();
        if let Some((fetched_at, fragment)) = entry.as_ref() {
            let age = fetched_at.elapsed();
            if age < self.ttl {
                debug!(source = self.inner.name(), age_secs = age.as_secs(), "cache hit");
                return Ok(fragment.clone());
            }
        }

        let fragment = self.inner.fetch()?;
        *entry = Some((Instant::now(), fragment.clone()));
        Ok(fragment)
    }

    fn invalidate(&self) {
        debug!(source = self.inner.name(), "cache invalidated");
        *self.entry.lock() = None;
        self.inner.invalidate();
    }
}
