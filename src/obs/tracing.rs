// self
use crate::{_prelude::*, auth::CircuitId, obs::LifecycleEvent};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedLifecycle<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedLifecycle<F> = F;

/// A span builder used around lifecycle steps.
#[derive(Clone, Debug)]
pub struct LifecycleSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl LifecycleSpan {
	/// Creates a new span tagged with the lifecycle event + circuit id.
	pub fn new(event: LifecycleEvent, circuit: &CircuitId) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"circuit_identity.lifecycle",
				event = event.as_str(),
				circuit = circuit.as_ref()
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (event, circuit);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedLifecycle<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs a subscription being acquired or released.
pub fn log_subscription(circuit: &CircuitId, active: bool) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(circuit = circuit.as_ref(), active, "auth state subscription changed");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (circuit, active);
	}
}

/// Logs a repeated open that reused the existing subscription.
pub fn log_duplicate_open(circuit: &CircuitId) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(circuit = circuit.as_ref(), "circuit already subscribed, keeping it");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = circuit;
	}
}

/// Logs a handler failure; the error text is only included when `detailed` is set.
pub fn log_handler_failure(
	handler: &'static str,
	event: LifecycleEvent,
	error: &Error,
	detailed: bool,
) {
	#[cfg(feature = "tracing")]
	{
		if detailed {
			tracing::error!(handler, event = event.as_str(), %error, "circuit handler failed");
		} else {
			tracing::error!(handler, event = event.as_str(), "circuit handler failed");
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (handler, event, error, detailed);
	}
}

/// Logs a store failure during revalidation; the caller signs the user out afterwards.
pub fn log_revalidation_failure(error: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::error!(%error, "revalidating authentication state failed");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = error;
	}
}

/// Logs a forced sign-out caused by revalidation.
pub fn log_forced_sign_out(user: Option<&str>) {
	#[cfg(feature = "tracing")]
	{
		tracing::info!(user, "authentication state is no longer valid, signing out");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = user;
	}
}
