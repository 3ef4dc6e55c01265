//! Thread-safe in-memory [`UserStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::UserId,
	store::{StoreFuture, UserRecord, UserStore},
};

type StoreMap = Arc<RwLock<HashMap<UserId, UserRecord>>>;

/// Thread-safe storage backend that keeps user records in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryUserStore(StoreMap);
impl MemoryUserStore {
	/// Creates a store pre-populated with `records`.
	pub fn with_records(records: impl IntoIterator<Item = UserRecord>) -> Self {
		let map = records.into_iter().map(|record| (record.id.clone(), record)).collect();

		Self(Arc::new(RwLock::new(map)))
	}

	/// Rotates the security stamp of a stored user, returning the updated record.
	pub fn rotate_security_stamp(&self, id: &UserId) -> Option<UserRecord> {
		let mut guard = self.0.write();
		let record = guard.get_mut(id)?;

		record.rotate_security_stamp();

		Some(record.clone())
	}

	/// Number of stored users.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when no users are stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl UserStore for MemoryUserStore {
	fn find_by_id<'a>(&'a self, id: &'a UserId) -> StoreFuture<'a, Option<UserRecord>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().get(id).cloned()) })
	}

	fn save(&self, record: UserRecord) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().insert(record.id.clone(), record);

			Ok(())
		})
	}

	fn remove<'a>(&'a self, id: &'a UserId) -> StoreFuture<'a, Option<UserRecord>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.write().remove(id)) })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn user(id: &str) -> UserRecord {
		UserRecord::new(UserId::new(id).expect("User fixture should be valid."), id)
	}

	#[tokio::test]
	async fn save_find_and_remove() {
		let store = MemoryUserStore::default();
		let record = user("user-1");

		store.save(record.clone()).await.expect("Saving into the memory store should succeed.");

		let found = store
			.find_by_id(&record.id)
			.await
			.expect("Lookup should succeed.")
			.expect("Saved record should be present.");

		assert_eq!(found, record);

		let removed = store.remove(&record.id).await.expect("Removal should succeed.");

		assert_eq!(removed, Some(record.clone()));
		assert!(store.is_empty());
		assert!(store.find_by_id(&record.id).await.expect("Lookup should succeed.").is_none());
	}

	#[test]
	fn rotate_updates_the_stored_stamp() {
		let record = user("user-2");
		let store = MemoryUserStore::with_records([record.clone()]);
		let rotated =
			store.rotate_security_stamp(&record.id).expect("Stored user should be rotated.");

		assert_ne!(rotated.security_stamp, record.security_stamp);
		assert_eq!(store.len(), 1);
		assert!(
			store
				.rotate_security_stamp(&UserId::new("missing").expect("Id should be valid."))
				.is_none()
		);
	}
}
