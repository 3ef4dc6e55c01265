//! Authentication-state providers and their change-notification plumbing.
//!
//! A provider answers "who is authenticated right now" asynchronously and pushes an
//! [`AuthStateTask`] to every subscriber whenever that answer changes. Subscribers hold a
//! [`Subscription`]; releasing or dropping it stops delivery.

pub mod revalidating;
pub mod server;

pub use revalidating::*;
pub use server::*;

// std
use std::sync::{
	Weak,
	atomic::{AtomicU64, Ordering},
};
// self
use crate::{
	_prelude::*,
	auth::{AuthStateTask, AuthenticationState},
	error::AuthStateError,
};

/// Boxed future returned by [`AuthenticationStateProvider::get_authentication_state`].
pub type AuthStateFuture<'a> =
	Pin<Box<dyn Future<Output = Result<AuthenticationState, AuthStateError>> + 'a + Send>>;

/// Callback invoked with every pushed state.
///
/// Listeners run on the producer's call stack and must return promptly.
pub type AuthStateListener = Arc<dyn Fn(AuthStateTask) + Send + Sync>;

/// Authoritative source of the current authentication state.
pub trait AuthenticationStateProvider
where
	Self: Send + Sync,
{
	/// Resolves the current authentication state.
	fn get_authentication_state(&self) -> AuthStateFuture<'_>;

	/// Registers `listener` for state changes until the returned handle is released.
	fn subscribe(&self, listener: AuthStateListener) -> Subscription;
}

#[derive(Default)]
struct Registry {
	next_id: AtomicU64,
	listeners: Mutex<BTreeMap<u64, AuthStateListener>>,
}

/// Listener registry shared by provider implementations.
#[derive(Clone, Default)]
pub struct AuthStateNotifier {
	registry: Arc<Registry>,
}
impl AuthStateNotifier {
	/// Registers a listener.
	pub fn subscribe(&self, listener: AuthStateListener) -> Subscription {
		let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);

		self.registry.listeners.lock().insert(id, listener);

		Subscription { registry: Arc::downgrade(&self.registry), id, active: true }
	}

	/// Delivers `task` to every registered listener.
	///
	/// Listeners are snapshotted first, so a listener may subscribe or unsubscribe from inside
	/// its own callback.
	pub fn notify(&self, task: AuthStateTask) {
		let listeners: Vec<AuthStateListener> =
			self.registry.listeners.lock().values().cloned().collect();

		for listener in listeners {
			listener(task.clone());
		}
	}

	/// Number of registered listeners.
	pub fn listener_count(&self) -> usize {
		self.registry.listeners.lock().len()
	}
}
impl Debug for AuthStateNotifier {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthStateNotifier").field("listeners", &self.listener_count()).finish()
	}
}

/// Handle that keeps a listener registered.
///
/// [`Subscription::unsubscribe`] is idempotent and dropping the handle releases it as well. A
/// handle that outlives its provider is inert.
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription {
	registry: Weak<Registry>,
	id: u64,
	active: bool,
}
impl Subscription {
	/// Releases the listener.
	pub fn unsubscribe(&mut self) {
		if !self.active {
			return;
		}

		self.active = false;

		if let Some(registry) = self.registry.upgrade() {
			registry.listeners.lock().remove(&self.id);
		}
	}

	/// Returns `true` while the listener is still registered.
	pub fn is_active(&self) -> bool {
		self.active && self.registry.strong_count() > 0
	}
}
impl Drop for Subscription {
	fn drop(&mut self) {
		self.unsubscribe();
	}
}
impl Debug for Subscription {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Subscription")
			.field("id", &self.id)
			.field("active", &self.is_active())
			.finish()
	}
}
