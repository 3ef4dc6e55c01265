//! Provider whose state is pushed in by the hosting application.

// self
use crate::{
	_prelude::*,
	auth::{AuthStateTask, AuthenticationState},
	provider::{
		AuthStateFuture, AuthStateListener, AuthStateNotifier, AuthenticationStateProvider,
		Subscription,
	},
};

/// Holds the state the host established for a circuit (typically from the initial HTTP
/// request's authenticated user) and notifies subscribers whenever it is replaced.
#[derive(Debug)]
pub struct ServerAuthenticationStateProvider {
	current: RwLock<AuthStateTask>,
	notifier: AuthStateNotifier,
}
impl ServerAuthenticationStateProvider {
	/// Creates a provider starting from `initial`.
	pub fn new(initial: AuthStateTask) -> Self {
		Self { current: RwLock::new(initial), notifier: AuthStateNotifier::default() }
	}

	/// Replaces the current state and pushes it to every subscriber.
	pub fn set_authentication_state(&self, task: AuthStateTask) {
		*self.current.write() = task.clone();

		self.notifier.notify(task);
	}

	/// Replaces the current state with `task` only if it is still `expected`.
	///
	/// The comparison and the swap happen under one write lock. Subscribers are notified only
	/// when the swap happened; returns whether it did.
	pub fn replace_if_current(&self, expected: &AuthStateTask, task: AuthStateTask) -> bool {
		{
			let mut current = self.current.write();

			if !AuthStateTask::ptr_eq(&current, expected) {
				return false;
			}

			*current = task.clone();
		}

		self.notifier.notify(task);

		true
	}

	/// Task backing the current state.
	pub fn current_task(&self) -> AuthStateTask {
		self.current.read().clone()
	}

	/// Number of live subscriptions.
	pub fn listener_count(&self) -> usize {
		self.notifier.listener_count()
	}
}
impl Default for ServerAuthenticationStateProvider {
	fn default() -> Self {
		Self::new(AuthStateTask::ready(AuthenticationState::anonymous()))
	}
}
impl AuthenticationStateProvider for ServerAuthenticationStateProvider {
	fn get_authentication_state(&self) -> AuthStateFuture<'_> {
		let task = self.current_task();

		Box::pin(async move { task.resolve().await })
	}

	fn subscribe(&self, listener: AuthStateListener) -> Subscription {
		self.notifier.subscribe(listener)
	}
}
