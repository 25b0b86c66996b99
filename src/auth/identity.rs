//! Identity projections exposed to the host after a successful callback.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, RawClaims},
};

/// Profile fields projected from the merged claims.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthInfo {
	/// `name` claim.
	pub name: Option<String>,
	/// `email`, falling back to `upn`.
	pub email: Option<String>,
	/// `unique_name` claim.
	pub nickname: Option<String>,
	/// `given_name` claim.
	pub first_name: Option<String>,
	/// `family_name` claim.
	pub last_name: Option<String>,
}

/// Read-only identity view over [`RawClaims`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
	/// Stable object identifier (`oid`).
	pub uid: Option<String>,
	/// Profile fields.
	pub info: AuthInfo,
}
impl Identity {
	/// Projects the identity fields out of `claims`.
	pub fn from_claims(claims: &RawClaims) -> Self {
		let owned = |name: &str| claims.get_str(name).map(ToOwned::to_owned);

		Self {
			uid: owned("oid"),
			info: AuthInfo {
				name: owned("name"),
				email: claims.email().map(ToOwned::to_owned),
				nickname: owned("unique_name"),
				first_name: owned("given_name"),
				last_name: owned("family_name"),
			},
		}
	}
}

/// Token material handed to the host alongside the identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
	/// Raw access token.
	pub token: String,
	/// Refresh token, when issued.
	pub refresh_token: Option<String>,
	/// Expiry as a UNIX timestamp, when the provider supplied a lifetime.
	pub expires_at: Option<i64>,
	/// Whether the access token expires.
	pub expires: bool,
}
impl From<&AccessToken> for Credentials {
	fn from(token: &AccessToken) -> Self {
		Self {
			token: token.token.expose().to_owned(),
			refresh_token: token.refresh_token.as_ref().map(|secret| secret.expose().to_owned()),
			expires_at: token.expires_at.map(OffsetDateTime::unix_timestamp),
			expires: token.expires(),
		}
	}
}

/// Extra payload carrying the merged claims.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthExtra {
	/// Every claim decoded from the identity and access tokens.
	pub raw_info: RawClaims,
}

/// Successful authentication result handed to the host application.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthHash {
	/// Strategy name (e.g. `azure_activedirectory_v2`).
	pub provider: String,
	/// Stable object identifier (`oid`).
	pub uid: Option<String>,
	/// Profile fields.
	pub info: AuthInfo,
	/// Token material.
	pub credentials: Credentials,
	/// Merged claims.
	pub extra: AuthExtra,
}
impl AuthHash {
	/// Assembles the hash for a verified identity.
	pub fn new(
		provider: impl Into<String>,
		identity: Identity,
		token: &AccessToken,
		raw_info: RawClaims,
	) -> Self {
		Self {
			provider: provider.into(),
			uid: identity.uid,
			info: identity.info,
			credentials: Credentials::from(token),
			extra: AuthExtra { raw_info },
		}
	}
}
impl Debug for AuthHash {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthHash")
			.field("provider", &self.provider)
			.field("uid", &self.uid)
			.field("info", &self.info)
			.field("credentials_expires_at", &self.credentials.expires_at)
			.field("raw_info_claims", &self.extra.raw_info.len())
			.finish()
	}
}
