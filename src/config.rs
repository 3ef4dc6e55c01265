//! Configuration for circuits and authentication-state revalidation.
//!
//! Every field has a default, so an empty JSON object is a valid configuration:
//!
//! ```json
//! { "circuit": { "detailed_errors": true }, "revalidation": { "interval_secs": 600 } }
//! ```

// std
use std::path::Path;
// self
use crate::{_prelude::*, error::ConfigError};

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdentityConfig {
	/// Circuit behavior.
	pub circuit: CircuitOptions,
	/// Revalidation behavior.
	pub revalidation: RevalidationOptions,
}
impl IdentityConfig {
	/// Parses and validates a JSON document.
	pub fn from_json_str(payload: &str) -> Result<Self, ConfigError> {
		let mut deserializer = serde_json::Deserializer::from_str(payload);
		let config: Self = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| ConfigError::Parse { source })?;

		config.validate()?;

		Ok(config)
	}

	/// Reads, parses, and validates a JSON file.
	pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let payload = std::fs::read_to_string(path)?;

		Self::from_json_str(&payload)
	}

	/// Overrides the circuit options.
	pub fn with_circuit(mut self, circuit: CircuitOptions) -> Self {
		self.circuit = circuit;

		self
	}

	/// Overrides the revalidation options.
	pub fn with_revalidation(mut self, revalidation: RevalidationOptions) -> Self {
		self.revalidation = revalidation;

		self
	}

	/// Rejects values that parse but cannot be used.
	pub fn validate(&self) -> Result<(), ConfigError> {
		self.revalidation.validate()
	}
}

/// Options applied to every circuit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CircuitOptions {
	/// Include handler error text in logs.
	pub detailed_errors: bool,
}
impl CircuitOptions {
	/// Overrides the detailed-errors flag.
	pub fn with_detailed_errors(mut self, detailed_errors: bool) -> Self {
		self.detailed_errors = detailed_errors;

		self
	}
}

/// Options for [`RevalidatingAuthenticationStateProvider`](crate::provider::RevalidatingAuthenticationStateProvider).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RevalidationOptions {
	/// Whether the periodic check runs at all.
	pub enabled: bool,
	/// Seconds between checks of an authenticated state.
	pub interval_secs: u64,
}
impl RevalidationOptions {
	const DEFAULT_INTERVAL_SECS: u64 = 30 * 60;

	/// Interval between checks.
	pub fn interval(&self) -> Duration {
		Duration::seconds(i64::try_from(self.interval_secs).unwrap_or(i64::MAX))
	}

	/// Interval between checks as a std duration, for timers.
	pub fn std_interval(&self) -> std::time::Duration {
		std::time::Duration::from_secs(self.interval_secs)
	}

	/// Overrides the interval (in whole seconds).
	pub fn with_interval_secs(mut self, interval_secs: u64) -> Self {
		self.interval_secs = interval_secs;

		self
	}

	/// Enables or disables revalidation.
	pub fn with_enabled(mut self, enabled: bool) -> Self {
		self.enabled = enabled;

		self
	}

	/// Rejects a zero interval while revalidation is enabled.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.enabled && self.interval_secs == 0 {
			return Err(ConfigError::InvalidValue {
				field: "revalidation.interval_secs",
				reason: "must be greater than zero",
			});
		}

		Ok(())
	}
}
impl Default for RevalidationOptions {
	fn default() -> Self {
		Self { enabled: true, interval_secs: Self::DEFAULT_INTERVAL_SECS }
	}
}
