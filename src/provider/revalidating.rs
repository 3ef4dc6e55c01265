//! Provider that periodically rechecks an authenticated state against the user store.
//!
//! Every [`RevalidationOptions::interval`] the current principal is looked up by its
//! name-identifier claim and its security-stamp claim is compared with the stored stamp. A
//! missing user, a stale stamp, or a store failure signs the circuit out: the state becomes
//! anonymous and subscribers are notified. The check restarts whenever a new state is set.

// crates.io
use tokio::{sync::watch, task::JoinHandle};
// self
use crate::{
	_prelude::*,
	auth::{AuthStateTask, AuthenticationState, Principal, claims},
	config::RevalidationOptions,
	error::ConfigError,
	obs::{self, LifecycleEvent, LifecycleOutcome},
	provider::{
		AuthStateFuture, AuthStateListener, AuthenticationStateProvider,
		ServerAuthenticationStateProvider, Subscription,
	},
	store::UserStore,
};

struct Shared<S>
where
	S: ?Sized + UserStore,
{
	server: ServerAuthenticationStateProvider,
	store: Arc<S>,
	options: RevalidationOptions,
	changes: watch::Sender<()>,
	check_guard: AsyncMutex<()>,
}
impl<S> Shared<S>
where
	S: ?Sized + UserStore,
{
	fn set(&self, task: AuthStateTask) {
		self.server.set_authentication_state(task);
		self.changes.send_replace(());
	}

	async fn is_valid(&self, principal: &Principal) -> bool {
		let Some(user_id) = principal.user_id() else {
			return false;
		};

		match self.store.find_by_id(&user_id).await {
			Ok(Some(record)) =>
				principal.find_first(claims::SECURITY_STAMP)
					== Some(record.security_stamp.as_str()),
			Ok(None) => false,
			Err(e) => {
				obs::log_revalidation_failure(&e.into());

				false
			},
		}
	}

	/// Checks `principal`, resolved from `expected`, and signs out only while `expected` is still
	/// the current state.
	async fn revalidate(&self, expected: &AuthStateTask, principal: &Principal) -> bool {
		const EVENT: LifecycleEvent = LifecycleEvent::Revalidation;

		let _check = self.check_guard.lock().await;

		obs::record_lifecycle_outcome(EVENT, LifecycleOutcome::Attempt);

		if !AuthStateTask::ptr_eq(&self.server.current_task(), expected)
			|| self.is_valid(principal).await
		{
			obs::record_lifecycle_outcome(EVENT, LifecycleOutcome::Success);

			return true;
		}

		let signed_out = AuthStateTask::ready(AuthenticationState::anonymous());

		// A newer state may have been set while the store was consulted.
		if !self.server.replace_if_current(expected, signed_out) {
			obs::record_lifecycle_outcome(EVENT, LifecycleOutcome::Success);

			return true;
		}

		self.changes.send_replace(());
		obs::log_forced_sign_out(principal.name());
		obs::record_lifecycle_outcome(EVENT, LifecycleOutcome::Failure);

		false
	}
}

/// [`ServerAuthenticationStateProvider`] plus periodic security-stamp revalidation.
///
/// Call [`RevalidatingAuthenticationStateProvider::start`] once from inside a Tokio runtime to
/// launch the background check; dropping the returned handle stops it.
pub struct RevalidatingAuthenticationStateProvider<S>
where
	S: ?Sized + UserStore,
{
	shared: Arc<Shared<S>>,
}
impl<S> RevalidatingAuthenticationStateProvider<S>
where
	S: 'static + ?Sized + UserStore,
{
	/// Creates a provider starting from the anonymous state.
	///
	/// Fails when `options` do not pass [`RevalidationOptions::validate`].
	pub fn new(store: Arc<S>, options: RevalidationOptions) -> Result<Self, ConfigError> {
		options.validate()?;

		let initial = AuthStateTask::ready(AuthenticationState::anonymous());
		let (changes, _) = watch::channel(());

		Ok(Self {
			shared: Arc::new(Shared {
				server: ServerAuthenticationStateProvider::new(initial),
				store,
				options,
				changes,
				check_guard: AsyncMutex::new(()),
			}),
		})
	}

	/// Replaces the current state, notifies subscribers, and restarts revalidation.
	pub fn set_authentication_state(&self, task: AuthStateTask) {
		self.shared.set(task);
	}

	/// Checks the current state immediately, signing out if it is no longer valid.
	///
	/// Returns `true` when the state is still valid (anonymous states always are).
	pub async fn revalidate_now(&self) -> bool {
		let task = self.shared.server.current_task();

		match task.resolve().await {
			Ok(state) if state.user.is_authenticated() =>
				self.shared.revalidate(&task, &state.user).await,
			_ => true,
		}
	}

	/// Options in effect.
	pub fn options(&self) -> &RevalidationOptions {
		&self.shared.options
	}

	/// Number of live subscriptions.
	pub fn listener_count(&self) -> usize {
		self.shared.server.listener_count()
	}

	/// Launches the background revalidation loop.
	///
	/// Returns an idle handle when revalidation is disabled. Must be called from within a Tokio
	/// runtime.
	pub fn start(&self) -> RevalidationHandle {
		if !self.shared.options.enabled {
			return RevalidationHandle { task: None };
		}

		let shared = self.shared.clone();
		let changes = self.shared.changes.subscribe();

		RevalidationHandle { task: Some(tokio::spawn(run(shared, changes))) }
	}
}
impl<S> AuthenticationStateProvider for RevalidatingAuthenticationStateProvider<S>
where
	S: 'static + ?Sized + UserStore,
{
	fn get_authentication_state(&self) -> AuthStateFuture<'_> {
		self.shared.server.get_authentication_state()
	}

	fn subscribe(&self, listener: AuthStateListener) -> Subscription {
		self.shared.server.subscribe(listener)
	}
}
impl<S> Debug for RevalidatingAuthenticationStateProvider<S>
where
	S: ?Sized + UserStore,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RevalidatingAuthenticationStateProvider")
			.field("options", &self.shared.options)
			.field("listeners", &self.shared.server.listener_count())
			.finish()
	}
}

/// Owns the background revalidation loop; dropping it aborts the loop.
#[derive(Debug)]
pub struct RevalidationHandle {
	task: Option<JoinHandle<()>>,
}
impl RevalidationHandle {
	/// Returns `true` while the loop is running.
	pub fn is_running(&self) -> bool {
		self.task.as_ref().is_some_and(|task| !task.is_finished())
	}

	/// Stops the loop.
	pub fn stop(&mut self) {
		if let Some(task) = self.task.take() {
			task.abort();
		}
	}
}
impl Drop for RevalidationHandle {
	fn drop(&mut self) {
		self.stop();
	}
}

async fn run<S>(shared: Arc<Shared<S>>, mut changes: watch::Receiver<()>)
where
	S: ?Sized + UserStore,
{
	let interval = shared.options.std_interval();

	loop {
		changes.mark_unchanged();

		let task = shared.server.current_task();
		let resolved = tokio::select! {
			outcome = task.resolve() => outcome.ok(),
			changed = changes.changed() => {
				if changed.is_err() {
					return;
				}

				continue;
			},
		};

		match resolved.map(|state| state.user).filter(Principal::is_authenticated) {
			Some(principal) => loop {
				tokio::select! {
					changed = changes.changed() => {
						if changed.is_err() {
							return;
						}

						break;
					},
					_ = tokio::time::sleep(interval) => {
						if !shared.revalidate(&task, &principal).await {
							break;
						}
					},
				}
			},
			None =>
				if changes.changed().await.is_err() {
					return;
				},
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		auth::UserId,
		store::{MemoryUserStore, UserRecord},
	};

	type TestProvider = RevalidatingAuthenticationStateProvider<MemoryUserStore>;

	fn provider_with(record: &UserRecord) -> (TestProvider, Arc<MemoryUserStore>) {
		let store = Arc::new(MemoryUserStore::with_records([record.clone()]));
		let provider =
			RevalidatingAuthenticationStateProvider::new(store.clone(), RevalidationOptions::default())
				.expect("Default revalidation options should be valid.");

		(provider, store)
	}

	fn record() -> UserRecord {
		UserRecord::new(UserId::new("user-reval").expect("User fixture should be valid."), "ada")
	}

	#[tokio::test]
	async fn valid_stamp_keeps_the_user_signed_in() {
		let record = record();
		let (provider, _store) = provider_with(&record);

		provider.set_authentication_state(AuthStateTask::ready(AuthenticationState::new(
			record.to_principal("test"),
		)));

		assert!(provider.revalidate_now().await);

		let state = provider.get_authentication_state().await.expect("State should resolve.");

		assert_eq!(state.user.name(), Some("ada"));
	}

	#[tokio::test]
	async fn rotated_stamp_signs_the_user_out() {
		let record = record();
		let (provider, store) = provider_with(&record);

		provider.set_authentication_state(AuthStateTask::ready(AuthenticationState::new(
			record.to_principal("test"),
		)));
		store.rotate_security_stamp(&record.id).expect("Stored user should be rotated.");

		assert!(!provider.revalidate_now().await);

		let state = provider.get_authentication_state().await.expect("State should resolve.");

		assert!(!state.user.is_authenticated());
	}

	#[tokio::test]
	async fn anonymous_state_is_always_valid() {
		let (provider, _store) = provider_with(&record());

		assert!(provider.revalidate_now().await);
	}

	#[test]
	fn disabled_revalidation_returns_an_idle_handle() {
		let store = Arc::new(MemoryUserStore::default());
		let provider = RevalidatingAuthenticationStateProvider::new(
			store,
			RevalidationOptions::default().with_enabled(false),
		)
		.expect("Disabled revalidation options should be valid.");
		let handle = provider.start();

		assert!(!handle.is_running());
	}

	#[test]
	fn zero_interval_is_rejected_at_construction() {
		let err = RevalidatingAuthenticationStateProvider::new(
			Arc::new(MemoryUserStore::default()),
			RevalidationOptions::default().with_interval_secs(0),
		)
		.expect_err("A zero interval must not reach the revalidation loop.");

		assert!(matches!(err, ConfigError::InvalidValue { field: "revalidation.interval_secs", .. }));
	}
}
