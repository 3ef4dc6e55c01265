//! Optional observability helpers for circuit lifecycles.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (default) to emit structured spans named `circuit_identity.lifecycle` with
//!   the `event` and `circuit` fields, plus debug/error events for subscriptions, handler
//!   failures, and revalidation.
//! - Enable `metrics` to increment `circuit_identity_lifecycle_total` for every
//!   attempt/success/failure, labeled by `event` + `outcome`, and
//!   `circuit_identity_discarded_total` for failures routed to a [`BestEffortSink`].

mod metrics;
mod sink;
mod tracing;

pub use self::{metrics::*, sink::*, tracing::*};

// self
use crate::_prelude::*;

/// Lifecycle events observed by circuits and providers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
	/// Circuit opened for the first time.
	CircuitOpened,
	/// Connection established or re-established.
	ConnectionUp,
	/// Connection lost; the circuit may reconnect.
	ConnectionDown,
	/// Circuit torn down.
	CircuitClosed,
	/// Provider pushed a new authentication state.
	StateChanged,
	/// Periodic revalidation of an authenticated state.
	Revalidation,
}
impl LifecycleEvent {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			LifecycleEvent::CircuitOpened => "circuit_opened",
			LifecycleEvent::ConnectionUp => "connection_up",
			LifecycleEvent::ConnectionDown => "connection_down",
			LifecycleEvent::CircuitClosed => "circuit_closed",
			LifecycleEvent::StateChanged => "state_changed",
			LifecycleEvent::Revalidation => "revalidation",
		}
	}
}
impl Display for LifecycleEvent {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each lifecycle step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LifecycleOutcome {
	/// Entry to a lifecycle step.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl LifecycleOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			LifecycleOutcome::Attempt => "attempt",
			LifecycleOutcome::Success => "success",
			LifecycleOutcome::Failure => "failure",
		}
	}
}
impl Display for LifecycleOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
