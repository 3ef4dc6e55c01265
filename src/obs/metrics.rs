// self
use crate::obs::{LifecycleEvent, LifecycleOutcome};

/// Records a lifecycle outcome via the global metrics recorder (when enabled).
pub fn record_lifecycle_outcome(event: LifecycleEvent, outcome: LifecycleOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"circuit_identity_lifecycle_total",
			"event" => event.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (event, outcome);
	}
}

/// Records a failure that was deliberately discarded.
pub fn record_discarded(event: LifecycleEvent) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("circuit_identity_discarded_total", "event" => event.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = event;
	}
}
