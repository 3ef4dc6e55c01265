//! File-backed [`UserStore`] that keeps a JSON snapshot of every account on disk.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::UserId,
	store::{StoreError, StoreFuture, UserRecord, UserStore},
};

/// Persists user records to a JSON file after each mutation.
#[derive(Clone, Debug)]
pub struct FileUserStore {
	path: PathBuf,
	inner: Arc<RwLock<HashMap<UserId, UserRecord>>>,
}
impl FileUserStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = if path.exists() { Self::load_snapshot(&path)? } else { HashMap::new() };

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	/// Location of the JSON snapshot.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<HashMap<UserId, UserRecord>, StoreError> {
		let metadata = path.metadata().map_err(|e| StoreError::Backend {
			message: format!("Failed to inspect {}: {e}", path.display()),
		})?;

		if metadata.len() == 0 {
			return Ok(HashMap::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;
		let records: Vec<UserRecord> =
			serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
				message: format!("Failed to parse {}: {e}", path.display()),
			})?;

		Ok(records.into_iter().map(|record| (record.id.clone(), record)).collect())
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, contents: &HashMap<UserId, UserRecord>) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		// Sorted so the snapshot diffs cleanly between writes.
		let mut snapshot: Vec<&UserRecord> = contents.values().collect();

		snapshot.sort_by(|a, b| a.id.cmp(&b.id));

		let serialized =
			serde_json::to_vec_pretty(&snapshot).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize store snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl UserStore for FileUserStore {
	fn find_by_id<'a>(&'a self, id: &'a UserId) -> StoreFuture<'a, Option<UserRecord>> {
		Box::pin(async move { Ok(self.inner.read().get(id).cloned()) })
	}

	fn save(&self, record: UserRecord) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();
			let mut next = guard.clone();

			next.insert(record.id.clone(), record);
			// Memory only changes once the snapshot is on disk.
			self.persist_locked(&next)?;
			*guard = next;

			Ok(())
		})
	}

	fn remove<'a>(&'a self, id: &'a UserId) -> StoreFuture<'a, Option<UserRecord>> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			if !guard.contains_key(id) {
				return Ok(None);
			}

			let mut next = guard.clone();
			let removed = next.remove(id);

			self.persist_locked(&next)?;
			*guard = next;

			Ok(removed)
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn user(id: &str) -> UserRecord {
		UserRecord::new(UserId::new(id).expect("User fixture should be valid."), id)
			.with_role("reader")
	}

	#[tokio::test]
	async fn save_and_reload_round_trip() {
		let dir = tempfile::tempdir().expect("Failed to create temporary directory.");
		let path = dir.path().join("nested").join("users.json");
		let store = FileUserStore::open(&path).expect("Failed to open file store snapshot.");
		let record = user("user-file");

		store.save(record.clone()).await.expect("Failed to save fixture record to file store.");
		drop(store);

		let reopened = FileUserStore::open(&path).expect("Failed to reopen file store snapshot.");
		let fetched = reopened
			.find_by_id(&record.id)
			.await
			.expect("Failed to fetch fixture record from file store.")
			.expect("File store lost record after reopen.");

		assert_eq!(fetched, record);
		assert!(!path.with_extension("tmp").exists());
	}

	#[tokio::test]
	async fn removal_is_persisted() {
		let dir = tempfile::tempdir().expect("Failed to create temporary directory.");
		let path = dir.path().join("users.json");
		let store = FileUserStore::open(&path).expect("Failed to open file store snapshot.");
		let record = user("user-gone");

		store.save(record.clone()).await.expect("Saving should succeed.");

		assert_eq!(
			store.remove(&record.id).await.expect("Removal should succeed."),
			Some(record.clone())
		);
		assert_eq!(store.remove(&record.id).await.expect("Second removal should succeed."), None);

		let reopened = FileUserStore::open(&path).expect("Failed to reopen file store snapshot.");

		assert!(reopened.find_by_id(&record.id).await.expect("Lookup should succeed.").is_none());
	}

	#[tokio::test]
	async fn failed_persist_leaves_memory_untouched() {
		let dir = tempfile::tempdir().expect("Failed to create temporary directory.");
		let path = dir.path().join("users.json");
		let store = FileUserStore::open(&path).expect("Failed to open file store snapshot.");
		let kept = user("user-kept");

		store.save(kept.clone()).await.expect("Saving should succeed.");
		// A directory in place of the snapshot makes the final rename fail.
		fs::remove_file(&path).expect("Removing the snapshot should succeed.");
		fs::create_dir(&path).expect("Creating the blocking directory should succeed.");

		let rejected = user("user-rejected");
		let err = store.save(rejected.clone()).await.expect_err("Persisting must fail.");

		assert!(matches!(err, StoreError::Backend { .. }));
		assert!(store.find_by_id(&rejected.id).await.expect("Lookup should succeed.").is_none());

		store.remove(&kept.id).await.expect_err("Persisting the removal must fail.");

		assert_eq!(
			store.find_by_id(&kept.id).await.expect("Lookup should succeed."),
			Some(kept.clone())
		);
	}

	#[test]
	fn empty_and_corrupt_snapshots() {
		let dir = tempfile::tempdir().expect("Failed to create temporary directory.");
		let empty = dir.path().join("empty.json");

		fs::write(&empty, b"").expect("Writing an empty snapshot should succeed.");
		FileUserStore::open(&empty).expect("An empty snapshot should open as an empty store.");

		let corrupt = dir.path().join("corrupt.json");

		fs::write(&corrupt, b"{not json").expect("Writing a corrupt snapshot should succeed.");

		let err = FileUserStore::open(&corrupt).expect_err("A corrupt snapshot must be rejected.");

		assert!(matches!(err, StoreError::Serialization { .. }));
	}
}
