//! Allow-list authorization applied after authentication succeeds.

// std
use std::collections::BTreeSet;
// self
use crate::{
	_prelude::*,
	auth::{Identity, RawClaims},
};

/// Reason code routed to the host when the allow-list rejects an identity.
pub const INVALID_EMAIL: &str = "invalid_email";

/// Rejections raised by [`AuthorizationPolicy::verify`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum AuthorizationError {
	/// The resolved email (if any) is not allow-listed.
	#[error("Invalid Email Domain or Email Not Authorized")]
	InvalidEmail {
		/// Email resolved from `email`/`upn`, when present.
		email: Option<String>,
	},
}
impl AuthorizationError {
	/// Short reason code for the host's failure channel.
	pub const fn reason(&self) -> &'static str {
		match self {
			Self::InvalidEmail { .. } => INVALID_EMAIL,
		}
	}
}

/// Allow-list of identities permitted to complete a sign-in.
///
/// Emails match exactly. Domains are opt-in and match the part after the final `@`
/// case-insensitively; with no domains configured, only exact email entries grant access.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorizationPolicy {
	/// Exact email addresses that may sign in.
	pub authorized_emails: BTreeSet<String>,
	/// Email domains whose members may sign in.
	pub authorized_domains: BTreeSet<String>,
}
impl AuthorizationPolicy {
	/// Creates a policy from exact email addresses.
	pub fn new<I, S>(emails: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self { authorized_emails: emails.into_iter().map(Into::into).collect(), ..Default::default() }
	}

	/// Adds domain-level entries.
	pub fn with_authorized_domains<I, S>(mut self, domains: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.authorized_domains
			.extend(domains.into_iter().map(|domain| domain.into().to_ascii_lowercase()));

		self
	}

	/// Returns true when `email` is allow-listed.
	pub fn permits(&self, email: &str) -> bool {
		if self.authorized_emails.contains(email) {
			return true;
		}

		email.rsplit_once('@').is_some_and(|(_, domain)| {
			self.authorized_domains.iter().any(|allowed| allowed.eq_ignore_ascii_case(domain))
		})
	}

	/// Accepts or rejects the identity described by `claims`.
	pub fn verify(&self, claims: &RawClaims) -> Result<Identity, AuthorizationError> {
		match claims.email() {
			Some(email) if self.permits(email) => Ok(Identity::from_claims(claims)),
			email => Err(AuthorizationError::InvalidEmail { email: email.map(ToOwned::to_owned) }),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn claims(value: JsonValue) -> RawClaims {
		match value {
			JsonValue::Object(map) => RawClaims::from(map),
			_ => panic!("Fixture must be a JSON object."),
		}
	}

	#[test]
	fn allow_listed_email_yields_identity() {
		let policy = AuthorizationPolicy::new(["alice@x.com"]);
		let identity = policy
			.verify(&claims(serde_json::json!({ "oid": "oid-alice", "email": "alice@x.com" })))
			.expect("Allow-listed email should verify.");

		assert_eq!(identity.uid.as_deref(), Some("oid-alice"));
	}

	#[test]
	fn other_emails_are_rejected() {
		let policy = AuthorizationPolicy::new(["alice@x.com"]);
		let err = policy
			.verify(&claims(serde_json::json!({ "oid": "oid-bob", "email": "bob@x.com" })))
			.expect_err("Unlisted email must be rejected.");

		assert_eq!(err, AuthorizationError::InvalidEmail { email: Some("bob@x.com".into()) });
		assert_eq!(err.reason(), INVALID_EMAIL);
	}

	#[test]
	fn missing_email_is_rejected_without_panicking() {
		let policy = AuthorizationPolicy::new(["alice@x.com"]);
		let err = policy.verify(&RawClaims::default()).expect_err("Empty claims must be rejected.");

		assert_eq!(err, AuthorizationError::InvalidEmail { email: None });
	}

	#[test]
	fn email_matching_is_exact() {
		let policy = AuthorizationPolicy::new(["alice@x.com"]);

		assert!(!policy.permits("Alice@x.com"));
		assert!(!policy.permits("carol@x.com"), "Domain membership alone grants nothing by default.");
	}

	#[test]
	fn opt_in_domains_match_case_insensitively() {
		let policy = AuthorizationPolicy::default().with_authorized_domains(["X.com"]);

		assert!(policy.permits("carol@x.com"));
		assert!(policy.permits("dave@X.COM"));
		assert!(!policy.permits("eve@y.com"));
		assert!(!policy.permits("no-at-sign"));
	}

	#[test]
	fn deserialized_domains_match_regardless_of_case() {
		let policy: AuthorizationPolicy =
			serde_json::from_str(r#"{"authorized_domains":["X.com"]}"#)
				.expect("Policy should deserialize.");

		assert!(policy.permits("carol@x.com"));
		assert!(policy.permits("carol@X.com"));
		assert!(!policy.permits("carol@y.com"));
	}

	#[test]
	fn upn_is_used_when_email_is_missing() {
		let policy = AuthorizationPolicy::new(["alice@contoso.com"]);

		assert!(policy.verify(&claims(serde_json::json!({ "upn": "alice@contoso.com" }))).is_ok());
	}
}
