//! Unverified claim extraction from identity and access tokens.
//!
//! Tokens are decoded without signature, issuer, audience, or expiry checks: they arrive
//! straight from the token endpoint over TLS. Different account types populate different
//! claims across the two artifacts (personal accounts often carry an opaque access token),
//! so both are decoded best-effort and merged, with the access token winning on conflict.

// crates.io
use base64::{
	Engine as _, alphabet,
	engine::{DecodePaddingMode, GeneralPurpose, general_purpose},
};
// self
use crate::_prelude::*;

const SEGMENT_ENGINE: GeneralPurpose = GeneralPurpose::new(
	&alphabet::URL_SAFE,
	general_purpose::NO_PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Reasons a token could not be read as a claim set.
///
/// Extraction swallows these; they exist for diagnostics and direct callers of
/// [`decode_unverified`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum TokenDecodeError {
	/// Token did not have two or three dot-separated segments.
	#[error("Token has {count} segments; expected 2 or 3.")]
	Segments {
		/// Observed segment count.
		count: usize,
	},
	/// A segment was not valid base64url.
	#[error("Token {segment} is not valid base64url.")]
	Base64 {
		/// Which segment failed.
		segment: &'static str,
	},
	/// A segment was not valid JSON.
	#[error("Token {segment} is not valid JSON.")]
	Json {
		/// Which segment failed.
		segment: &'static str,
	},
	/// A segment decoded to JSON that is not an object.
	#[error("Token {segment} is not a JSON object.")]
	NotAnObject {
		/// Which segment failed.
		segment: &'static str,
	},
}

/// Decodes a compact JWS into its payload claims without verifying anything.
pub fn decode_unverified(token: &str) -> Result<JsonMap<String, JsonValue>, TokenDecodeError> {
	let segments = token.split('.').collect::<Vec<_>>();

	if !(2..=3).contains(&segments.len()) {
		return Err(TokenDecodeError::Segments { count: segments.len() });
	}

	decode_segment("header", segments[0])?;

	decode_segment("payload", segments[1])
}

fn decode_segment(
	segment: &'static str,
	raw: &str,
) -> Result<JsonMap<String, JsonValue>, TokenDecodeError> {
	let bytes = SEGMENT_ENGINE.decode(raw).map_err(|_| TokenDecodeError::Base64 { segment })?;

	match serde_json::from_slice(&bytes).map_err(|_| TokenDecodeError::Json { segment })? {
		JsonValue::Object(map) => Ok(map),
		_ => Err(TokenDecodeError::NotAnObject { segment }),
	}
}

/// Merged claim set from the identity and access tokens.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawClaims(JsonMap<String, JsonValue>);
impl RawClaims {
	/// Decodes both tokens best-effort and merges them (access token wins).
	///
	/// A missing or undecodable token contributes nothing.
	pub fn extract(id_token: Option<&str>, access_token: &str) -> Self {
		let id_claims = id_token.map(|token| decode_or_empty("id_token", token)).unwrap_or_default();
		let access_claims = decode_or_empty("access_token", access_token);

		Self::merge(id_claims, access_claims)
	}

	/// Overlays `access_claims` on top of `id_claims`.
	pub fn merge(
		id_claims: JsonMap<String, JsonValue>,
		access_claims: JsonMap<String, JsonValue>,
	) -> Self {
		let mut merged = id_claims;

		merged.extend(access_claims);

		Self(merged)
	}

	/// Returns the raw value of a claim.
	pub fn get(&self, name: &str) -> Option<&JsonValue> {
		self.0.get(name)
	}

	/// Returns a claim when it is a JSON string.
	pub fn get_str(&self, name: &str) -> Option<&str> {
		self.get(name).and_then(JsonValue::as_str)
	}

	/// `email`, falling back to `upn` for work accounts that omit it.
	pub fn email(&self) -> Option<&str> {
		self.get_str("email").or_else(|| self.get_str("upn"))
	}

	/// Number of claims.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true when neither token contributed claims.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Borrows the underlying JSON object.
	pub fn as_map(&self) -> &JsonMap<String, JsonValue> {
		&self.0
	}
}
impl From<JsonMap<String, JsonValue>> for RawClaims {
	fn from(map: JsonMap<String, JsonValue>) -> Self {
		Self(map)
	}
}

fn decode_or_empty(kind: &'static str, token: &str) -> JsonMap<String, JsonValue> {
	match decode_unverified(token) {
		Ok(claims) => claims,
		Err(e) => {
			#[cfg(feature = "tracing")]
			tracing::debug!(token = kind, error = %e, "token is not decodable; ignoring its claims");
			#[cfg(not(feature = "tracing"))]
			let _ = (kind, e);

			JsonMap::new()
		},
	}
}
