//! Named sink for failures that have no reachable reporting channel.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{_prelude::*, obs::LifecycleEvent};

/// Best-effort error policy: the failure is counted and dropped, never logged or rethrown.
///
/// State-change notifications are resolved on detached tasks. Nobody awaits those tasks, and a
/// failure that originates in the provider is reported by the provider itself, so the handler
/// routes its copy here instead of swallowing it silently.
#[derive(Debug, Default)]
pub struct BestEffortSink {
	discarded: AtomicU64,
}
impl BestEffortSink {
	/// Discards `error` raised while handling `event`.
	pub fn discard<E>(&self, event: LifecycleEvent, error: E)
	where
		E: StdError,
	{
		drop(error);

		self.discarded.fetch_add(1, Ordering::Relaxed);

		super::record_discarded(event);
	}

	/// Number of failures discarded so far.
	pub fn discarded(&self) -> u64 {
		self.discarded.load(Ordering::Relaxed)
	}
}
