//! Circuit lifecycle: the host state machine, the handler contract, and the per-circuit scope.

pub mod host;
pub mod scope;
pub mod user_handler;

pub use host::*;
pub use scope::*;
pub use user_handler::*;

// self
use crate::{_prelude::*, auth::CircuitId};

/// Boxed future returned by [`CircuitHandler`] hooks.
pub type CircuitFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + 'a + Send>>;

/// One logical client session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Circuit {
	/// Circuit identifier.
	pub id: CircuitId,
	/// When the circuit was created.
	pub opened_at: OffsetDateTime,
}
impl Circuit {
	/// Creates a circuit with a fresh identifier.
	pub fn new() -> Self {
		Self::with_id(CircuitId::generate())
	}

	/// Creates a circuit with a caller-supplied identifier.
	pub fn with_id(id: CircuitId) -> Self {
		Self { id, opened_at: OffsetDateTime::now_utc() }
	}
}
impl Default for Circuit {
	fn default() -> Self {
		Self::new()
	}
}

/// Hooks invoked by [`CircuitHost`] at each lifecycle step.
///
/// Every hook defaults to a no-op. Handlers run in ascending [`CircuitHandler::order`] when a
/// circuit opens or connects and in descending order when it disconnects or closes.
pub trait CircuitHandler
where
	Self: Send + Sync,
{
	/// Stable name used for logging and de-duplication.
	fn name(&self) -> &'static str;

	/// Relative execution order; lower runs first on the way up.
	fn order(&self) -> i32 {
		0
	}

	/// The circuit opened.
	fn on_circuit_opened<'a>(&'a self, circuit: &'a Circuit) -> CircuitFuture<'a> {
		let _ = circuit;

		Box::pin(async { Ok(()) })
	}

	/// The client connection came up, either for the first time or after a reconnect.
	fn on_connection_up<'a>(&'a self, circuit: &'a Circuit) -> CircuitFuture<'a> {
		let _ = circuit;

		Box::pin(async { Ok(()) })
	}

	/// The client connection dropped; the circuit may still reconnect.
	fn on_connection_down<'a>(&'a self, circuit: &'a Circuit) -> CircuitFuture<'a> {
		let _ = circuit;

		Box::pin(async { Ok(()) })
	}

	/// The circuit is being torn down.
	fn on_circuit_closed<'a>(&'a self, circuit: &'a Circuit) -> CircuitFuture<'a> {
		let _ = circuit;

		Box::pin(async { Ok(()) })
	}

	/// Releases resources. Called exactly once by the host, after every other hook.
	fn dispose(&self) {}
}
