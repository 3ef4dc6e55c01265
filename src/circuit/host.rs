//! Lifecycle state machine that drives [`CircuitHandler`]s for one circuit.

// self
use crate::{
	_prelude::*,
	circuit::{Circuit, CircuitFuture, CircuitHandler},
	config::CircuitOptions,
	error::CircuitError,
	obs::{self, LifecycleEvent, LifecycleOutcome, LifecycleSpan},
};

/// Where a circuit is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CircuitPhase {
	/// Constructed, not yet opened.
	Created,
	/// Opened, no connection yet.
	Open,
	/// Connection is up.
	Up,
	/// Connection dropped; may come back up.
	Down,
	/// Torn down. Terminal.
	Closed,
}
impl CircuitPhase {
	/// Returns a stable label for errors and logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			CircuitPhase::Created => "created",
			CircuitPhase::Open => "open",
			CircuitPhase::Up => "connected",
			CircuitPhase::Down => "disconnected",
			CircuitPhase::Closed => "closed",
		}
	}
}
impl Display for CircuitPhase {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[derive(Clone, Copy)]
enum Hook {
	Opened,
	Up,
	Down,
	Closed,
}
impl Hook {
	fn event(self) -> LifecycleEvent {
		match self {
			Hook::Opened => LifecycleEvent::CircuitOpened,
			Hook::Up => LifecycleEvent::ConnectionUp,
			Hook::Down => LifecycleEvent::ConnectionDown,
			Hook::Closed => LifecycleEvent::CircuitClosed,
		}
	}

	fn runs_in_reverse(self) -> bool {
		matches!(self, Hook::Down | Hook::Closed)
	}

	fn call<'a>(self, handler: &'a dyn CircuitHandler, circuit: &'a Circuit) -> CircuitFuture<'a> {
		match self {
			Hook::Opened => handler.on_circuit_opened(circuit),
			Hook::Up => handler.on_connection_up(circuit),
			Hook::Down => handler.on_connection_down(circuit),
			Hook::Closed => handler.on_circuit_closed(circuit),
		}
	}
}

/// Owns one circuit and its handlers and enforces `Created → Open → Up ⇄ Down → Closed`.
///
/// A phase only advances when every handler accepted the event, except for
/// [`CircuitHost::close`], which always ends in [`CircuitPhase::Closed`]. Handlers are disposed
/// exactly once, on close or on drop, whichever comes first.
pub struct CircuitHost {
	circuit: Circuit,
	options: CircuitOptions,
	handlers: Vec<Arc<dyn CircuitHandler>>,
	phase: CircuitPhase,
	disposed: bool,
}
impl CircuitHost {
	/// Creates a host for `circuit` with default options.
	pub fn new(circuit: Circuit) -> Self {
		Self {
			circuit,
			options: CircuitOptions::default(),
			handlers: Vec::new(),
			phase: CircuitPhase::Created,
			disposed: false,
		}
	}

	/// Overrides the circuit options.
	pub fn with_options(mut self, options: CircuitOptions) -> Self {
		self.options = options;

		self
	}

	/// Circuit driven by this host.
	pub fn circuit(&self) -> &Circuit {
		&self.circuit
	}

	/// Current phase.
	pub fn phase(&self) -> CircuitPhase {
		self.phase
	}

	/// Names of the registered handlers in execution order.
	pub fn handler_names(&self) -> Vec<&'static str> {
		self.handlers.iter().map(|handler| handler.name()).collect()
	}

	/// Registers a handler, keeping handlers sorted by [`CircuitHandler::order`].
	///
	/// Handlers with equal order keep their registration order.
	pub fn add_handler(&mut self, handler: Arc<dyn CircuitHandler>) {
		let position = self.handlers.partition_point(|existing| existing.order() <= handler.order());

		self.handlers.insert(position, handler);
	}

	/// Registers a handler unless one with the same name already exists.
	///
	/// Returns whether the handler was added.
	pub fn try_add_handler(&mut self, handler: Arc<dyn CircuitHandler>) -> bool {
		if self.handlers.iter().any(|existing| existing.name() == handler.name()) {
			return false;
		}

		self.add_handler(handler);

		true
	}

	/// Opens the circuit.
	pub async fn open(&mut self) -> Result<()> {
		self.ensure(&[CircuitPhase::Created], Hook::Opened)?;
		self.dispatch(Hook::Opened).await?;
		self.phase = CircuitPhase::Open;

		Ok(())
	}

	/// Marks the connection as up, from [`CircuitPhase::Open`] or after a drop.
	pub async fn connection_up(&mut self) -> Result<()> {
		self.ensure(&[CircuitPhase::Open, CircuitPhase::Down], Hook::Up)?;
		self.dispatch(Hook::Up).await?;
		self.phase = CircuitPhase::Up;

		Ok(())
	}

	/// Marks the connection as dropped.
	pub async fn connection_down(&mut self) -> Result<()> {
		self.ensure(&[CircuitPhase::Up], Hook::Down)?;
		self.dispatch(Hook::Down).await?;
		self.phase = CircuitPhase::Down;

		Ok(())
	}

	/// Tears the circuit down and disposes every handler.
	///
	/// A live connection is taken down first. Later steps still run when an earlier one fails;
	/// the first failure is returned.
	pub async fn close(&mut self) -> Result<()> {
		if self.phase == CircuitPhase::Closed {
			return Err(CircuitError::InvalidTransition {
				from: self.phase.as_str(),
				event: Hook::Closed.event().as_str(),
			}
			.into());
		}

		let mut outcome = Ok(());

		if self.phase == CircuitPhase::Up {
			outcome = self.dispatch(Hook::Down).await;
		}
		if self.phase != CircuitPhase::Created {
			let closed = self.dispatch(Hook::Closed).await;

			outcome = outcome.and(closed);
		}

		self.phase = CircuitPhase::Closed;
		self.dispose_handlers();

		outcome
	}

	fn ensure(&self, allowed: &[CircuitPhase], hook: Hook) -> Result<()> {
		if allowed.contains(&self.phase) {
			return Ok(());
		}

		Err(CircuitError::InvalidTransition { from: self.phase.as_str(), event: hook.event().as_str() }
			.into())
	}

	async fn dispatch(&self, hook: Hook) -> Result<()> {
		let event = hook.event();
		let span = LifecycleSpan::new(event, &self.circuit.id);
		let mut handlers = self.handlers.clone();

		if hook.runs_in_reverse() {
			handlers.reverse();
		}

		span.instrument(async move {
			obs::record_lifecycle_outcome(event, LifecycleOutcome::Attempt);

			for handler in handlers {
				if let Err(e) = hook.call(handler.as_ref(), &self.circuit).await {
					obs::log_handler_failure(
						handler.name(),
						event,
						&e,
						self.options.detailed_errors,
					);
					obs::record_lifecycle_outcome(event, LifecycleOutcome::Failure);

					return Err(CircuitError::Handler {
						handler: handler.name(),
						event: event.as_str(),
						source: Box::new(e),
					}
					.into());
				}
			}

			obs::record_lifecycle_outcome(event, LifecycleOutcome::Success);

			Ok(())
		})
		.await
	}

	fn dispose_handlers(&mut self) {
		if self.disposed {
			return;
		}

		self.disposed = true;

		for handler in self.handlers.iter().rev() {
			handler.dispose();
		}
	}
}
impl Debug for CircuitHost {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CircuitHost")
			.field("circuit", &self.circuit)
			.field("phase", &self.phase)
			.field("handlers", &self.handler_names())
			.field("disposed", &self.disposed)
			.finish()
	}
}
impl Drop for CircuitHost {
	fn drop(&mut self) {
		self.dispose_handlers();
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	struct Named(&'static str, i32);
	impl CircuitHandler for Named {
		fn name(&self) -> &'static str {
			self.0
		}

		fn order(&self) -> i32 {
			self.1
		}
	}

	#[test]
	fn handlers_are_sorted_by_order_and_deduplicated_by_name() {
		let mut host = CircuitHost::new(Circuit::new());

		host.add_handler(Arc::new(Named("late", 10)));
		host.add_handler(Arc::new(Named("early", -5)));
		host.add_handler(Arc::new(Named("middle", 0)));

		assert!(!host.try_add_handler(Arc::new(Named("middle", 3))));
		assert!(host.try_add_handler(Arc::new(Named("middle-two", 0))));
		assert_eq!(host.handler_names(), ["early", "middle", "middle-two", "late"]);
	}

	#[tokio::test]
	async fn invalid_transitions_are_rejected_without_changing_phase() {
		let mut host = CircuitHost::new(Circuit::new());
		let err = host.connection_up().await.expect_err("Cannot connect before opening.");

		assert!(matches!(
			err,
			Error::Circuit(CircuitError::InvalidTransition { from: "created", event: "connection_up" })
		));
		assert_eq!(host.phase(), CircuitPhase::Created);

		host.open().await.expect("Opening a fresh circuit should succeed.");

		assert!(host.open().await.is_err());
		assert!(host.connection_down().await.is_err());
		assert_eq!(host.phase(), CircuitPhase::Open);
	}

	#[tokio::test]
	async fn closing_twice_is_an_error() {
		let mut host = CircuitHost::new(Circuit::new());

		host.close().await.expect("Closing an unopened circuit should succeed.");

		assert_eq!(host.phase(), CircuitPhase::Closed);
		assert!(host.close().await.is_err());
	}
}
