//! Storage contracts and built-in user store implementations.

pub mod file;
pub mod memory;
pub mod record;

pub use file::FileUserStore;
pub use memory::MemoryUserStore;
pub use record::UserRecord;

// self
use crate::{_prelude::*, auth::UserId};

/// Boxed future returned by [`UserStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for user accounts.
pub trait UserStore
where
	Self: Send + Sync,
{
	/// Fetches the user with the provided id, if present.
	fn find_by_id<'a>(&'a self, id: &'a UserId) -> StoreFuture<'a, Option<UserRecord>>;

	/// Persists or replaces a user record.
	fn save(&self, record: UserRecord) -> StoreFuture<'_, ()>;

	/// Removes a user, returning the removed record.
	fn remove<'a>(&'a self, id: &'a UserId) -> StoreFuture<'a, Option<UserRecord>>;
}

/// Error type produced by [`UserStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
