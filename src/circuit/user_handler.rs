//! Circuit handler that keeps a circuit's [`UserStateCache`] in sync with its provider.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// crates.io
use tokio::runtime::Handle;
// self
use crate::{
	_prelude::*,
	auth::{AuthStateTask, CircuitId},
	circuit::{Circuit, CircuitFuture, CircuitHandler},
	obs::{self, BestEffortSink, LifecycleEvent},
	provider::{AuthStateListener, AuthenticationStateProvider, Subscription},
	user::UserStateCache,
};

/// Bridges the provider's push notifications into the circuit's [`UserStateCache`].
///
/// - Opening the circuit subscribes to state changes. Opening again keeps the one subscription.
/// - Every connection up awaits the provider's current state and writes its principal; a
///   failure is returned to the host.
/// - Every pushed state is resolved on a spawned task so the producer never waits. Failures go
///   to [`UserCircuitHandler::sink`].
/// - Closing or disposing releases the subscription. Resolutions already in flight may still
///   land afterwards.
///
/// Each write carries a sequence number taken when its event arrived, so a slow resolution can
/// never overwrite the result of a later event.
pub struct UserCircuitHandler {
	circuit: CircuitId,
	provider: Arc<dyn AuthenticationStateProvider>,
	user_state: Arc<UserStateCache>,
	subscription: Mutex<Option<Subscription>>,
	sequence: Arc<AtomicU64>,
	sink: Arc<BestEffortSink>,
}
impl UserCircuitHandler {
	/// Registered handler name.
	pub const NAME: &'static str = "user_state";

	/// Creates a handler for `circuit` writing into `user_state`.
	pub fn new(
		circuit: CircuitId,
		provider: Arc<dyn AuthenticationStateProvider>,
		user_state: Arc<UserStateCache>,
	) -> Self {
		Self {
			circuit,
			provider,
			user_state,
			subscription: Mutex::new(None),
			sequence: Arc::new(AtomicU64::new(0)),
			sink: Arc::new(BestEffortSink::default()),
		}
	}

	/// Sink that received every discarded state-change failure.
	pub fn sink(&self) -> &BestEffortSink {
		&self.sink
	}

	/// Returns `true` while subscribed to the provider.
	pub fn is_subscribed(&self) -> bool {
		self.subscription.lock().as_ref().is_some_and(Subscription::is_active)
	}

	fn subscribe(&self) {
		let mut slot = self.subscription.lock();

		if slot.as_ref().is_some_and(Subscription::is_active) {
			obs::log_duplicate_open(&self.circuit);

			return;
		}

		*slot = Some(self.provider.subscribe(self.listener()));

		obs::log_subscription(&self.circuit, true);
	}

	fn unsubscribe(&self) {
		let Some(mut subscription) = self.subscription.lock().take() else {
			return;
		};

		subscription.unsubscribe();
		obs::log_subscription(&self.circuit, false);
	}

	fn listener(&self) -> AuthStateListener {
		let user_state = self.user_state.clone();
		let sequence = self.sequence.clone();
		let sink = self.sink.clone();
		// Producers may notify from outside any runtime; fall back to the one we subscribed on.
		let fallback = Handle::try_current().ok();

		Arc::new(move |task: AuthStateTask| {
			let version = next_version(&sequence);
			let runtime = match Handle::try_current() {
				Ok(runtime) => runtime,
				Err(e) => match &fallback {
					Some(runtime) => runtime.clone(),
					None => return sink.discard(LifecycleEvent::StateChanged, e),
				},
			};
			let user_state = user_state.clone();
			let sink = sink.clone();

			runtime.spawn(async move {
				match task.resolve().await {
					Ok(state) => {
						user_state.set_current_versioned(state.user, version);
					},
					Err(e) => sink.discard(LifecycleEvent::StateChanged, e),
				}
			});
		})
	}
}
impl CircuitHandler for UserCircuitHandler {
	fn name(&self) -> &'static str {
		Self::NAME
	}

	fn on_circuit_opened<'a>(&'a self, _: &'a Circuit) -> CircuitFuture<'a> {
		self.subscribe();

		Box::pin(async { Ok(()) })
	}

	fn on_connection_up<'a>(&'a self, _: &'a Circuit) -> CircuitFuture<'a> {
		let version = next_version(&self.sequence);

		Box::pin(async move {
			let state = self.provider.get_authentication_state().await?;

			self.user_state.set_current_versioned(state.user, version);

			Ok(())
		})
	}

	fn on_circuit_closed<'a>(&'a self, _: &'a Circuit) -> CircuitFuture<'a> {
		self.unsubscribe();

		Box::pin(async { Ok(()) })
	}

	fn dispose(&self) {
		self.unsubscribe();
	}
}
impl Debug for UserCircuitHandler {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("UserCircuitHandler")
			.field("circuit", &self.circuit)
			.field("subscribed", &self.is_subscribed())
			.field("discarded", &self.sink.discarded())
			.finish()
	}
}

fn next_version(sequence: &AtomicU64) -> u64 {
	sequence.fetch_add(1, Ordering::SeqCst) + 1
}
