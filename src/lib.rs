//! Per-circuit user identity propagation: keep a session-scoped principal cache in sync with an
//! asynchronous authentication-state provider for the whole lifetime of a connection.
//!
//! A *circuit* is one logical session between a client and the server. Each circuit owns a
//! [`user::UserStateCache`] that downstream code reads synchronously, and a
//! [`circuit::UserCircuitHandler`] that bridges the provider's push notifications into that cache.
//! [`circuit::CircuitScope`] wires both together explicitly; nothing in this crate is global.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod circuit;
pub mod config;
pub mod error;
pub mod obs;
pub mod provider;
pub mod store;
pub mod user;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::time::Duration as StdDuration;
	// self
	use crate::{
		auth::{AuthenticationState, AuthStateTask, Principal, UserId},
		circuit::CircuitScope,
		provider::{AuthenticationStateProvider, ServerAuthenticationStateProvider},
		store::UserRecord,
	};

	/// Authentication type stamped on every principal built by the helpers below.
	pub const TEST_AUTH_TYPE: &str = "Identity.Application";

	/// Builds an authenticated principal for `name` carrying a single role.
	pub fn test_principal(name: &str, role: &str) -> Principal {
		Principal::builder(TEST_AUTH_TYPE)
			.claim(crate::auth::claims::NAME_IDENTIFIER, format!("id-{name}"))
			.claim(crate::auth::claims::NAME, name)
			.role(role)
			.build()
	}

	/// Wraps a principal in an already resolved [`AuthStateTask`].
	pub fn ready_task(principal: Principal) -> AuthStateTask {
		AuthStateTask::ready(AuthenticationState::new(principal))
	}

	/// Builds a user record with a deterministic identifier derived from `user_name`.
	pub fn test_user(user_name: &str) -> UserRecord {
		let id = UserId::new(format!("user-{user_name}"))
			.expect("User identifier fixture should be valid.");

		UserRecord::new(id, user_name).with_email(format!("{user_name}@example.com"), true)
	}

	/// Creates a server provider plus a circuit scope wired to it.
	pub fn build_test_scope() -> (CircuitScope, Arc<ServerAuthenticationStateProvider>) {
		let provider = Arc::new(ServerAuthenticationStateProvider::default());
		let shared: Arc<dyn AuthenticationStateProvider> = provider.clone();

		(CircuitScope::new(shared), provider)
	}

	/// Polls `condition` until it holds or `timeout` elapses; returns the final observation.
	pub async fn wait_until<F>(timeout: StdDuration, mut condition: F) -> bool
	where
		F: FnMut() -> bool,
	{
		let deadline = tokio::time::Instant::now() + timeout;

		loop {
			if condition() {
				return true;
			}
			if tokio::time::Instant::now() >= deadline {
				return condition();
			}

			tokio::time::sleep(StdDuration::from_millis(2)).await;
		}
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};

	pub use crate::error::{Error, Result};
}

#[cfg(test)] use {color_eyre as _, tempfile as _};
