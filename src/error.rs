//! Crate-level error types shared across providers, circuits, stores, and configuration.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Resolving an authentication state failed.
	#[error(transparent)]
	AuthState(#[from] AuthStateError),
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Circuit lifecycle failure.
	#[error(transparent)]
	Circuit(#[from] CircuitError),
}

/// Failures surfaced while resolving an [`AuthStateTask`](crate::auth::AuthStateTask).
///
/// The error is `Clone` because one pending state is observed by every subscriber.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum AuthStateError {
	/// The producer went away without ever completing the state.
	#[error("Authentication state was abandoned before it resolved.")]
	Abandoned,
	/// The provider reported a failure of its own.
	#[error("Authentication state provider failed: {message}.")]
	Provider {
		/// Provider-supplied message.
		message: String,
	},
}
impl AuthStateError {
	/// Convenience constructor for [`AuthStateError::Provider`].
	pub fn provider(message: impl Into<String>) -> Self {
		Self::Provider { message: message.into() }
	}
}

/// Circuit lifecycle failures raised by [`CircuitHost`](crate::circuit::CircuitHost).
#[derive(Debug, ThisError)]
pub enum CircuitError {
	/// The requested lifecycle event is not valid from the current phase.
	#[error("Circuit cannot handle `{event}` while {from}.")]
	InvalidTransition {
		/// Phase label the circuit was in.
		from: &'static str,
		/// Lifecycle event label that was rejected.
		event: &'static str,
	},
	/// A registered handler failed while processing a lifecycle event.
	#[error("Circuit handler `{handler}` failed during `{event}`.")]
	Handler {
		/// Name reported by the failing handler.
		handler: &'static str,
		/// Lifecycle event label.
		event: &'static str,
		/// Underlying handler failure.
		#[source]
		source: Box<Error>,
	},
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Configuration file could not be read.
	#[error("Configuration file could not be read.")]
	Io(#[from] std::io::Error),
	/// Configuration payload is not valid JSON for the expected shape.
	#[error("Configuration is malformed at `{}`.", .source.path())]
	Parse {
		/// Structured parsing failure carrying the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// A field parsed but holds an unusable value.
	#[error("Configuration field `{field}` is invalid: {reason}.")]
	InvalidValue {
		/// Dotted field path.
		field: &'static str,
		/// Human-readable reason.
		reason: &'static str,
	},
}
