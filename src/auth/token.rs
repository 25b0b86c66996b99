//! Token artifacts produced by the authorization-code exchange.

// self
use crate::{_prelude::*, auth::Secret};

/// Access token plus the optional companions returned by the token endpoint.
///
/// Fields stay public so hosts (and tests) can inspect or adjust them; claim extraction
/// reads `token` and `id_token` once per flow.
#[derive(Clone, Debug)]
pub struct AccessToken {
	/// Raw access token (`access_token`).
	pub token: Secret,
	/// Raw identity token (`id_token`), absent for some account types.
	pub id_token: Option<Secret>,
	/// Refresh token, when `offline_access` was granted.
	pub refresh_token: Option<Secret>,
	/// Scope string echoed by the provider.
	pub scope: Option<String>,
	/// Instant the exchange completed.
	pub issued_at: OffsetDateTime,
	/// Expiry derived from `expires_in`, when supplied.
	pub expires_at: Option<OffsetDateTime>,
}
impl AccessToken {
	/// Creates a token issued now with no companions.
	pub fn new(token: impl Into<String>) -> Self {
		Self {
			token: Secret::new(token),
			id_token: None,
			refresh_token: None,
			scope: None,
			issued_at: OffsetDateTime::now_utc(),
			expires_at: None,
		}
	}

	/// Attaches the identity token.
	pub fn with_id_token(mut self, id_token: impl Into<String>) -> Self {
		self.id_token = Some(Secret::new(id_token));

		self
	}

	/// Attaches the refresh token.
	pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
		self.refresh_token = Some(Secret::new(refresh_token));

		self
	}

	/// Records the scope string echoed by the provider.
	pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = Some(scope.into());

		self
	}

	/// Derives the expiry from a relative lifetime; out-of-range lifetimes leave it unset.
	pub fn with_expires_in(mut self, expires_in: Duration) -> Self {
		self.expires_at = self.issued_at.checked_add(expires_in);

		self
	}

	/// Returns true when the provider supplied a lifetime.
	pub fn expires(&self) -> bool {
		self.expires_at.is_some()
	}
}
