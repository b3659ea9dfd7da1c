//! Indicator source port trait.

use crate::domain::error::FetchError;
use crate::domain::snapshot::SnapshotFragment;

/// A capability that produces part of an indicator snapshot.
///
/// Implementations perform their own I/O and report failures as
/// [`FetchError`]; the cycle turns a failure into "unavailable" for whatever
/// the source would have provided.
pub trait IndicatorSource {
    /// Short name used in logs and failure reports.
    fn name(&self) -> &str;

    fn fetch(&self) -> Result<SnapshotFragment, FetchError>;

    /// Drop any retained result so the next `fetch` goes to the origin.
    fn invalidate(&self) {}
}

impl<S: IndicatorSource + ?Sized> IndicatorSource for std::sync::Arc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(&self) -> Result<SnapshotFragment, FetchError> {
        (**self).fetch()
    }

    fn invalidate(&self) {
        (**self).invalidate()
    }
}

/// Source handle that can be shared with worker threads.
pub type SharedSource = std::sync::Arc<dyn IndicatorSource + Send + Sync>;
