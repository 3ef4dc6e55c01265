//! Session-scoped cache of the current user.
//!
//! One [`UserStateCache`] exists per circuit. It is created by
//! [`CircuitScope`](crate::circuit::CircuitScope) and passed explicitly to whoever needs it;
//! sharing an instance across circuits leaks identities between sessions.

// self
use crate::{_prelude::*, auth::Principal};

#[derive(Debug)]
struct Slot {
	principal: Principal,
	version: u64,
}

/// Holds the latest known principal for one circuit.
///
/// Reads always observe a fully built principal: writes replace the shared handle under a lock
/// and never mutate the principal itself.
#[derive(Debug)]
pub struct UserStateCache {
	slot: RwLock<Slot>,
}
impl UserStateCache {
	/// Creates a cache holding the anonymous principal.
	pub fn new() -> Self {
		Self { slot: RwLock::new(Slot { principal: Principal::anonymous(), version: 0 }) }
	}

	/// Returns the current principal.
	pub fn get_current(&self) -> Principal {
		self.slot.read().principal.clone()
	}

	/// Returns `true` if the current principal is authenticated.
	pub fn is_authenticated(&self) -> bool {
		self.slot.read().principal.is_authenticated()
	}

	/// Replaces the current principal.
	///
	/// Writing the same principal again is harmless; callers must not rely on redundant writes
	/// being skipped.
	pub fn set_current(&self, principal: Principal) {
		let mut slot = self.slot.write();

		if !Principal::ptr_eq(&slot.principal, &principal) {
			slot.principal = principal;
		}
	}

	/// Replaces the current principal only if `version` is newer than the last versioned write.
	///
	/// Returns whether the write landed. Unversioned writes through [`Self::set_current`] do not
	/// advance the version.
	pub fn set_current_versioned(&self, principal: Principal, version: u64) -> bool {
		let mut slot = self.slot.write();

		if version <= slot.version {
			return false;
		}

		slot.principal = principal;
		slot.version = version;

		true
	}

	/// Version of the last accepted versioned write (`0` before any).
	pub fn version(&self) -> u64 {
		self.slot.read().version
	}
}
impl Default for UserStateCache {
	fn default() -> Self {
		Self::new()
	}
}
