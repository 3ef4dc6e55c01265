//! Per-circuit service bundle.

// self
use crate::{
	_prelude::*,
	circuit::{Circuit, CircuitHandler, CircuitHost, CircuitPhase, UserCircuitHandler},
	config::CircuitOptions,
	provider::AuthenticationStateProvider,
	user::UserStateCache,
};

/// Everything one circuit needs: its user cache, the shared provider, and a host already wired
/// with a [`UserCircuitHandler`].
///
/// Create one scope per circuit and pass [`CircuitScope::user_state`] to the code that needs the
/// current user. Scopes share nothing but the provider.
pub struct CircuitScope {
	user_state: Arc<UserStateCache>,
	provider: Arc<dyn AuthenticationStateProvider>,
	user_handler: Arc<UserCircuitHandler>,
	host: CircuitHost,
}
impl CircuitScope {
	/// Creates a scope for a fresh circuit with default options.
	pub fn new(provider: Arc<dyn AuthenticationStateProvider>) -> Self {
		Self::with_options(provider, CircuitOptions::default())
	}

	/// Creates a scope for a fresh circuit.
	pub fn with_options(
		provider: Arc<dyn AuthenticationStateProvider>,
		options: CircuitOptions,
	) -> Self {
		let circuit = Circuit::new();
		let user_state = Arc::new(UserStateCache::new());
		let user_handler = Arc::new(UserCircuitHandler::new(
			circuit.id.clone(),
			provider.clone(),
			user_state.clone(),
		));
		let mut host = CircuitHost::new(circuit).with_options(options);

		host.try_add_handler(user_handler.clone());

		Self { user_state, provider, user_handler, host }
	}

	/// Registers an application handler alongside the user handler.
	pub fn with_handler(mut self, handler: Arc<dyn CircuitHandler>) -> Self {
		self.host.try_add_handler(handler);

		self
	}

	/// The circuit this scope belongs to.
	pub fn circuit(&self) -> &Circuit {
		self.host.circuit()
	}

	/// The circuit's user cache.
	pub fn user_state(&self) -> Arc<UserStateCache> {
		self.user_state.clone()
	}

	/// The shared provider.
	pub fn provider(&self) -> &Arc<dyn AuthenticationStateProvider> {
		&self.provider
	}

	/// The handler keeping [`Self::user_state`] current.
	pub fn user_handler(&self) -> &UserCircuitHandler {
		&self.user_handler
	}

	/// Current lifecycle phase.
	pub fn phase(&self) -> CircuitPhase {
		self.host.phase()
	}

	/// Mutable access to the host, for driving the lifecycle directly.
	pub fn host_mut(&mut self) -> &mut CircuitHost {
		&mut self.host
	}

	/// See [`CircuitHost::open`].
	pub async fn open(&mut self) -> Result<()> {
		self.host.open().await
	}

	/// See [`CircuitHost::connection_up`].
	pub async fn connection_up(&mut self) -> Result<()> {
		self.host.connection_up().await
	}

	/// See [`CircuitHost::connection_down`].
	pub async fn connection_down(&mut self) -> Result<()> {
		self.host.connection_down().await
	}

	/// See [`CircuitHost::close`].
	pub async fn close(&mut self) -> Result<()> {
		self.host.close().await
	}
}
impl Debug for CircuitScope {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CircuitScope")
			.field("host", &self.host)
			.field("user", &self.user_state.get_current())
			.field("user_handler", &self.user_handler)
			.finish()
	}
}
