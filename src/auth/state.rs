//! Authentication states and the shared handle used to deliver them asynchronously.

// crates.io
use tokio::sync::watch;
// self
use crate::{_prelude::*, auth::Principal, error::AuthStateError};

type Outcome = Option<Result<AuthenticationState, AuthStateError>>;

/// Snapshot of who is authenticated, as reported by a provider.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthenticationState {
	/// Principal for the snapshot.
	pub user: Principal,
}
impl AuthenticationState {
	/// Wraps a principal.
	pub fn new(user: Principal) -> Self {
		Self { user }
	}

	/// State for an anonymous user.
	pub fn anonymous() -> Self {
		Self::new(Principal::anonymous())
	}
}

/// Clonable handle to an authentication state that may still be resolving.
///
/// Providers hand one task to every subscriber; each clone observes the same outcome.
#[derive(Clone)]
pub struct AuthStateTask {
	rx: watch::Receiver<Outcome>,
}
impl AuthStateTask {
	/// Task that has already resolved to `state`.
	pub fn ready(state: AuthenticationState) -> Self {
		let (_, rx) = watch::channel(Some(Ok(state)));

		Self { rx }
	}

	/// Task that has already failed with `error`.
	pub fn failed(error: AuthStateError) -> Self {
		let (_, rx) = watch::channel(Some(Err(error)));

		Self { rx }
	}

	/// Unresolved task plus the completer that settles it.
	pub fn pending() -> (Self, AuthStateCompleter) {
		let (tx, rx) = watch::channel(None);

		(Self { rx }, AuthStateCompleter { tx })
	}

	/// Returns `true` if both handles observe the same outcome (one is a clone of the other).
	pub fn ptr_eq(a: &Self, b: &Self) -> bool {
		a.rx.same_channel(&b.rx)
	}

	/// Returns `true` once the task has an outcome.
	pub fn is_resolved(&self) -> bool {
		self.rx.borrow().is_some()
	}

	/// Waits for the outcome.
	///
	/// Resolves to [`AuthStateError::Abandoned`] if the completer is dropped first.
	pub async fn resolve(&self) -> Result<AuthenticationState, AuthStateError> {
		let mut rx = self.rx.clone();
		let outcome = rx
			.wait_for(Option::is_some)
			.await
			.map_err(|_| AuthStateError::Abandoned)?
			.clone();

		outcome.unwrap_or(Err(AuthStateError::Abandoned))
	}
}
impl Debug for AuthStateTask {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthStateTask").field("resolved", &self.is_resolved()).finish()
	}
}

/// Producer half of a pending [`AuthStateTask`].
#[derive(Debug)]
pub struct AuthStateCompleter {
	tx: watch::Sender<Outcome>,
}
impl AuthStateCompleter {
	/// Settles the task; every waiter wakes with `outcome`.
	pub fn complete(self, outcome: Result<AuthenticationState, AuthStateError>) {
		self.tx.send_replace(Some(outcome));
	}

	/// Settles the task successfully.
	pub fn succeed(self, state: AuthenticationState) {
		self.complete(Ok(state));
	}

	/// Settles the task with a failure.
	pub fn fail(self, error: AuthStateError) {
		self.complete(Err(error));
	}
}
