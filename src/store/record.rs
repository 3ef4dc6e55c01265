//! Stored user accounts and their projection into principals.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	auth::{Principal, UserId, claims},
};

const SECURITY_STAMP_LEN: usize = 32;

/// A stored user account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
	/// Stable identifier.
	pub id: UserId,
	/// Login name.
	pub user_name: String,
	/// Email address, if known.
	pub email: Option<String>,
	/// Whether the email address has been confirmed.
	pub email_confirmed: bool,
	/// Opaque stamp rotated on every credential or role change.
	pub security_stamp: String,
	/// Role memberships.
	pub roles: Vec<String>,
}
impl UserRecord {
	/// Creates a record with a fresh security stamp.
	pub fn new(id: UserId, user_name: impl Into<String>) -> Self {
		Self {
			id,
			user_name: user_name.into(),
			email: None,
			email_confirmed: false,
			security_stamp: new_security_stamp(),
			roles: Vec::new(),
		}
	}

	/// Sets the email address and its confirmation flag.
	pub fn with_email(mut self, email: impl Into<String>, confirmed: bool) -> Self {
		self.email = Some(email.into());
		self.email_confirmed = confirmed;

		self
	}

	/// Adds a role membership.
	pub fn with_role(mut self, role: impl Into<String>) -> Self {
		self.roles.push(role.into());

		self
	}

	/// Replaces the security stamp, invalidating principals issued from the old one.
	pub fn rotate_security_stamp(&mut self) {
		self.security_stamp = new_security_stamp();
	}

	/// Builds the principal a sign-in with `authentication_type` would produce.
	pub fn to_principal(&self, authentication_type: impl Into<String>) -> Principal {
		let mut builder = Principal::builder(authentication_type)
			.claim(claims::NAME_IDENTIFIER, self.id.as_ref())
			.claim(claims::NAME, &self.user_name)
			.claim(claims::SECURITY_STAMP, &self.security_stamp);

		if let Some(email) = &self.email {
			builder = builder.claim(claims::EMAIL, email);
		}

		self.roles.iter().fold(builder, |builder, role| builder.role(role)).build()
	}
}

fn new_security_stamp() -> String {
	rand::rng().sample_iter(Alphanumeric).take(SECURITY_STAMP_LEN).map(char::from).collect()
}
