#![cfg(feature = "test")]

// std
use std::time::Duration as StdDuration;
// self
use circuit_identity::{
	_preludet::*,
	auth::{AuthStateTask, AuthenticationState, Principal},
	circuit::{CircuitHandler, CircuitPhase, CircuitScope},
	error::{AuthStateError, CircuitError},
	provider::{AuthenticationStateProvider, ServerAuthenticationStateProvider},
	user::UserStateCache,
};

const SETTLE: StdDuration = StdDuration::from_secs(2);

#[test]
fn fresh_cache_is_anonymous() {
	let cache = UserStateCache::new();

	assert!(!cache.get_current().is_authenticated());
	assert_eq!(cache.get_current(), Principal::anonymous());
}

#[test]
fn read_after_write_returns_the_written_principal() {
	let cache = UserStateCache::new();

	for (name, role) in [("ada", "admin"), ("grace", "reader"), ("ada", "admin")] {
		let principal = test_principal(name, role);

		cache.set_current(principal.clone());

		assert!(Principal::ptr_eq(&cache.get_current(), &principal));
	}

	cache.set_current(Principal::anonymous());

	assert!(!cache.is_authenticated());
}

#[tokio::test]
async fn open_then_connected_resolves_identity() {
	let (mut scope, provider) = build_test_scope();
	let ada = test_principal("ada", "admin");

	provider.set_authentication_state(ready_task(ada.clone()));
	scope.open().await.expect("Opening the circuit should succeed.");
	scope.connection_up().await.expect("Connecting the circuit should succeed.");

	assert_eq!(scope.phase(), CircuitPhase::Up);
	assert_eq!(scope.user_state().get_current(), ada);
	assert_eq!(scope.user_state().get_current().name(), Some("ada"));
}

#[tokio::test]
async fn pushed_state_reaches_the_cache() {
	let (mut scope, provider) = build_test_scope();
	let user_state = scope.user_state();

	scope.open().await.expect("Opening the circuit should succeed.");
	scope.connection_up().await.expect("Connecting the circuit should succeed.");

	let grace = test_principal("grace", "reader");

	provider.set_authentication_state(ready_task(grace.clone()));

	assert!(
		wait_until(SETTLE, || user_state.get_current() == grace).await,
		"Pushed principal should eventually reach the cache."
	);
}

#[tokio::test]
async fn pending_push_is_written_once_it_resolves() {
	let (mut scope, provider) = build_test_scope();
	let user_state = scope.user_state();

	scope.open().await.expect("Opening the circuit should succeed.");

	let (task, completer) = AuthStateTask::pending();

	provider.set_authentication_state(task);
	tokio::time::sleep(StdDuration::from_millis(20)).await;

	assert!(!user_state.is_authenticated(), "Nothing may be written before resolution.");

	let ada = test_principal("ada", "admin");

	completer.succeed(AuthenticationState::new(ada.clone()));

	assert!(wait_until(SETTLE, || user_state.get_current() == ada).await);
}

#[tokio::test]
async fn disposal_stops_propagation() {
	let (mut scope, provider) = build_test_scope();
	let user_state = scope.user_state();
	let ada = test_principal("ada", "admin");

	provider.set_authentication_state(ready_task(ada.clone()));
	scope.open().await.expect("Opening the circuit should succeed.");
	scope.connection_up().await.expect("Connecting the circuit should succeed.");
	scope.close().await.expect("Closing the circuit should succeed.");

	assert!(!scope.user_handler().is_subscribed());
	assert_eq!(provider.listener_count(), 0);

	provider.set_authentication_state(ready_task(test_principal("mallory", "admin")));
	tokio::time::sleep(StdDuration::from_millis(50)).await;

	assert_eq!(user_state.get_current(), ada);
}

#[tokio::test]
async fn dropping_the_scope_releases_the_subscription() {
	let (mut scope, provider) = build_test_scope();

	scope.open().await.expect("Opening the circuit should succeed.");

	assert_eq!(provider.listener_count(), 1);

	drop(scope);

	assert_eq!(provider.listener_count(), 0);
}

#[tokio::test]
async fn resolution_in_flight_at_disposal_may_still_land() {
	let (mut scope, provider) = build_test_scope();
	let user_state = scope.user_state();

	scope.open().await.expect("Opening the circuit should succeed.");

	let (task, completer) = AuthStateTask::pending();

	provider.set_authentication_state(task);
	scope.close().await.expect("Closing the circuit should succeed.");

	let late = test_principal("late", "reader");

	completer.succeed(AuthenticationState::new(late.clone()));

	assert!(
		wait_until(SETTLE, || user_state.get_current() == late).await,
		"A resolution already in flight is allowed to land after disposal."
	);
}

#[tokio::test]
async fn failed_push_leaves_the_cache_unchanged() {
	let (mut scope, provider) = build_test_scope();
	let user_state = scope.user_state();
	let ada = test_principal("ada", "admin");

	provider.set_authentication_state(ready_task(ada.clone()));
	scope.open().await.expect("Opening the circuit should succeed.");
	scope.connection_up().await.expect("Connecting the circuit should succeed.");
	provider.set_authentication_state(AuthStateTask::failed(AuthStateError::provider("expired")));

	let (abandoned, completer) = AuthStateTask::pending();

	provider.set_authentication_state(abandoned);
	drop(completer);

	let handler = scope.user_handler();

	assert!(
		wait_until(SETTLE, || handler.sink().discarded() == 2).await,
		"Both failures should be routed to the best-effort sink."
	);
	assert_eq!(user_state.get_current(), ada);
	assert_eq!(scope.phase(), CircuitPhase::Up);
}

#[tokio::test]
async fn reconnects_reresolve_without_accumulating_subscriptions() {
	let (mut scope, provider) = build_test_scope();
	let user_state = scope.user_state();

	scope.open().await.expect("Opening the circuit should succeed.");

	for name in ["ada", "grace", "linus", "barbara"] {
		let principal = test_principal(name, "reader");

		provider.set_authentication_state(ready_task(principal.clone()));
		scope.connection_up().await.expect("Reconnecting should succeed.");

		assert_eq!(user_state.get_current(), principal);

		scope.connection_down().await.expect("Dropping the connection should succeed.");
	}

	assert_eq!(provider.listener_count(), 1);
}

#[tokio::test]
async fn repeated_open_and_connected_on_the_handler_keep_one_subscription() {
	let (scope, provider) = build_test_scope();
	let handler = scope.user_handler();

	for name in ["ada", "grace", "linus"] {
		let principal = test_principal(name, "reader");

		provider.set_authentication_state(ready_task(principal.clone()));
		handler_cycle(&scope).await;

		assert_eq!(scope.user_state().get_current(), principal);
	}

	assert!(handler.is_subscribed());
	assert_eq!(provider.listener_count(), 1);
}

async fn handler_cycle(scope: &CircuitScope) {
	let handler = scope.user_handler();

	handler.on_circuit_opened(scope.circuit()).await.expect("Opening should never fail.");
	handler.on_connection_up(scope.circuit()).await.expect("Connecting should succeed.");
}

#[tokio::test]
async fn stale_resolution_cannot_overwrite_a_newer_event() {
	let (mut scope, provider) = build_test_scope();
	let user_state = scope.user_state();

	scope.open().await.expect("Opening the circuit should succeed.");

	let (slow, completer) = AuthStateTask::pending();
	let newer = test_principal("newer", "reader");

	provider.set_authentication_state(slow);
	provider.set_authentication_state(ready_task(newer.clone()));

	assert!(wait_until(SETTLE, || user_state.get_current() == newer).await);

	completer.succeed(AuthenticationState::new(test_principal("older", "reader")));
	tokio::time::sleep(StdDuration::from_millis(50)).await;

	assert_eq!(user_state.get_current(), newer);
}

#[tokio::test]
async fn initial_connect_failure_propagates_to_the_host() {
	let provider: Arc<dyn AuthenticationStateProvider> =
		Arc::new(ServerAuthenticationStateProvider::new(AuthStateTask::failed(
			AuthStateError::provider("cookie rejected"),
		)));
	let mut scope = CircuitScope::new(provider);

	scope.open().await.expect("Opening the circuit should succeed.");

	let err = scope.connection_up().await.expect_err("A failed initial state must propagate.");

	match err {
		Error::Circuit(CircuitError::Handler { handler, event, source }) => {
			assert_eq!(handler, "user_state");
			assert_eq!(event, "connection_up");
			assert!(matches!(*source, Error::AuthState(AuthStateError::Provider { .. })));
		},
		other => panic!("Unexpected error: {other:?}."),
	}

	assert_eq!(scope.phase(), CircuitPhase::Open);
	assert!(!scope.user_state().is_authenticated());
}

#[tokio::test]
async fn scopes_do_not_share_user_state() {
	let provider = Arc::new(ServerAuthenticationStateProvider::default());
	let mut first = CircuitScope::new(provider.clone());
	let second = CircuitScope::new(provider.clone());

	provider.set_authentication_state(ready_task(test_principal("ada", "admin")));
	first.open().await.expect("Opening the circuit should succeed.");
	first.connection_up().await.expect("Connecting the circuit should succeed.");

	assert!(first.user_state().is_authenticated());
	assert!(!second.user_state().is_authenticated());
	assert_ne!(first.circuit().id, second.circuit().id);
}

#[tokio::test]
async fn push_from_a_plain_thread_lands_on_the_subscribing_runtime() {
	let (mut scope, provider) = build_test_scope();
	let user_state = scope.user_state();
	let ada = test_principal("ada", "admin");

	scope.open().await.expect("Opening the circuit should succeed.");

	let pushed = ada.clone();

	std::thread::spawn(move || provider.set_authentication_state(ready_task(pushed)))
		.join()
		.expect("Pushing thread should not panic.");

	assert!(
		wait_until(SETTLE, || user_state.get_current() == ada).await,
		"A push from outside any runtime should be resolved on the subscribing runtime."
	);
}

#[test]
fn push_without_any_runtime_is_discarded() {
	let (scope, provider) = build_test_scope();
	let handler = scope.user_handler();

	drop(handler.on_circuit_opened(scope.circuit()));
	provider.set_authentication_state(ready_task(test_principal("ada", "admin")));

	assert_eq!(handler.sink().discarded(), 1);
	assert!(!scope.user_state().is_authenticated());
}
