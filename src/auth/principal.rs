//! Claims-based principals describing who is authenticated on a circuit.
//!
//! A [`Principal`] is immutable once built and cheap to clone: clones share one allocation, so
//! swapping the principal held by a cache only ever replaces a pointer.

// self
use crate::{_prelude::*, auth::UserId};

/// Well-known claim kinds.
pub mod claims {
	/// Stable user identifier.
	pub const NAME_IDENTIFIER: &str = "nameidentifier";
	/// Display or login name.
	pub const NAME: &str = "name";
	/// Role membership; may appear multiple times.
	pub const ROLE: &str = "role";
	/// Email address.
	pub const EMAIL: &str = "email";
	/// Opaque stamp rotated whenever the account's credentials change.
	pub const SECURITY_STAMP: &str = "security_stamp";
}

/// One statement about a subject.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Claim {
	/// Claim kind (see [`claims`]).
	pub kind: String,
	/// Claim value.
	pub value: String,
}
impl Claim {
	/// Creates a claim.
	pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
		Self { kind: kind.into(), value: value.into() }
	}
}

/// A set of claims issued by a single authentication scheme.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsIdentity {
	/// Scheme that authenticated this identity; `None` for anonymous identities.
	pub authentication_type: Option<String>,
	/// Claims carried by the identity.
	pub claims: Vec<Claim>,
}
impl ClaimsIdentity {
	/// Creates an unauthenticated identity with no claims.
	pub fn anonymous() -> Self {
		Self::default()
	}

	/// Returns `true` when an authentication scheme vouched for this identity.
	pub fn is_authenticated(&self) -> bool {
		self.authentication_type.is_some()
	}

	/// Returns the first value for `kind`, if any.
	pub fn find_first(&self, kind: &str) -> Option<&str> {
		self.claims.iter().find(|claim| claim.kind == kind).map(|claim| claim.value.as_str())
	}
}

#[derive(PartialEq, Eq)]
struct PrincipalInner {
	identities: Vec<ClaimsIdentity>,
}

/// Immutable identity value representing an authenticated or anonymous user.
#[derive(Clone, PartialEq, Eq)]
pub struct Principal(Arc<PrincipalInner>);
impl Principal {
	/// Creates a principal from explicit identities.
	pub fn new(identities: Vec<ClaimsIdentity>) -> Self {
		Self(Arc::new(PrincipalInner { identities }))
	}

	/// Principal holding a single anonymous identity.
	pub fn anonymous() -> Self {
		Self::new(vec![ClaimsIdentity::anonymous()])
	}

	/// Starts a builder for a principal authenticated by `authentication_type`.
	pub fn builder(authentication_type: impl Into<String>) -> PrincipalBuilder {
		PrincipalBuilder {
			identity: ClaimsIdentity {
				authentication_type: Some(authentication_type.into()),
				claims: Vec::new(),
			},
		}
	}

	/// Returns `true` when both handles point at the same allocation.
	pub fn ptr_eq(a: &Self, b: &Self) -> bool {
		Arc::ptr_eq(&a.0, &b.0)
	}

	/// Identities carried by the principal.
	pub fn identities(&self) -> &[ClaimsIdentity] {
		&self.0.identities
	}

	/// The first identity, which is the one most callers care about.
	pub fn primary_identity(&self) -> Option<&ClaimsIdentity> {
		self.0.identities.first()
	}

	/// Returns `true` if any identity is authenticated.
	pub fn is_authenticated(&self) -> bool {
		self.0.identities.iter().any(ClaimsIdentity::is_authenticated)
	}

	/// Iterates over every claim across all identities.
	pub fn claims(&self) -> impl Iterator<Item = &Claim> {
		self.0.identities.iter().flat_map(|identity| identity.claims.iter())
	}

	/// Returns the first value for `kind` across all identities.
	pub fn find_first(&self, kind: &str) -> Option<&str> {
		self.0.identities.iter().find_map(|identity| identity.find_first(kind))
	}

	/// Name claim of the principal, if present.
	pub fn name(&self) -> Option<&str> {
		self.find_first(claims::NAME)
	}

	/// Parses the name-identifier claim as a [`UserId`].
	pub fn user_id(&self) -> Option<UserId> {
		self.find_first(claims::NAME_IDENTIFIER).and_then(|value| UserId::new(value).ok())
	}

	/// Returns `true` if the principal carries `role`.
	pub fn is_in_role(&self, role: &str) -> bool {
		self.claims().any(|claim| claim.kind == claims::ROLE && claim.value == role)
	}
}
impl Default for Principal {
	fn default() -> Self {
		Self::anonymous()
	}
}
impl Debug for Principal {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Principal")
			.field("authenticated", &self.is_authenticated())
			.field("name", &self.name())
			.field("identities", &self.0.identities.len())
			.finish()
	}
}
impl Display for Principal {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match (self.is_authenticated(), self.name()) {
			(true, Some(name)) => f.write_str(name),
			(true, None) => f.write_str("<unnamed>"),
			(false, _) => f.write_str("<anonymous>"),
		}
	}
}
impl From<ClaimsIdentity> for Principal {
	fn from(identity: ClaimsIdentity) -> Self {
		Self::new(vec![identity])
	}
}

/// Builder for single-identity [`Principal`]s.
#[derive(Clone, Debug)]
pub struct PrincipalBuilder {
	identity: ClaimsIdentity,
}
impl PrincipalBuilder {
	/// Appends a claim.
	pub fn claim(mut self, kind: impl Into<String>, value: impl Into<String>) -> Self {
		self.identity.claims.push(Claim::new(kind, value));

		self
	}

	/// Appends a role claim.
	pub fn role(self, role: impl Into<String>) -> Self {
		self.claim(claims::ROLE, role)
	}

	/// Finalizes the principal.
	pub fn build(self) -> Principal {
		self.identity.into()
	}
}
