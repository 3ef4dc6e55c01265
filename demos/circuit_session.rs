//! Walks one circuit through its lifecycle against a revalidating provider backed by an in-memory
//! user store, then rotates the user's security stamp and watches the circuit get signed out.

// std
use std::{sync::Arc, time::Duration};
// crates.io
use color_eyre::Result;
// self
use circuit_identity::{
	auth::{AuthStateTask, AuthenticationState, UserId},
	circuit::CircuitScope,
	config::{IdentityConfig, RevalidationOptions},
	provider::{AuthenticationStateProvider, RevalidatingAuthenticationStateProvider},
	store::{MemoryUserStore, UserRecord},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = IdentityConfig::default()
		.with_revalidation(RevalidationOptions::default().with_interval_secs(1));
	let ada = UserRecord::new(UserId::new("user-ada")?, "ada")
		.with_email("ada@example.com", true)
		.with_role("admin");
	let store = Arc::new(MemoryUserStore::with_records([ada.clone()]));
	let provider =
		Arc::new(RevalidatingAuthenticationStateProvider::new(store.clone(), config.revalidation)?);
	let _revalidation = provider.start();
	let shared: Arc<dyn AuthenticationStateProvider> = provider.clone();
	let mut scope = CircuitScope::with_options(shared, config.circuit);
	let user_state = scope.user_state();

	provider.set_authentication_state(AuthStateTask::ready(AuthenticationState::new(
		ada.to_principal("Identity.Application"),
	)));
	scope.open().await?;
	scope.connection_up().await?;

	println!("circuit {} connected as {}", scope.circuit().id, user_state.get_current());

	scope.connection_down().await?;
	scope.connection_up().await?;

	println!("reconnected as {}", user_state.get_current());

	store.rotate_security_stamp(&ada.id);
	tokio::time::sleep(Duration::from_millis(1_500)).await;

	println!("after stamp rotation: {}", user_state.get_current());

	scope.close().await?;

	println!("circuit closed in phase {}", scope.phase());

	Ok(())
}
