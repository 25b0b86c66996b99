//! Strategy-level error types shared across provider resolution, exchanges, and verification.

// self
use crate::{_prelude::*, auth::AuthorizationError};

/// Result alias defaulting to the strategy [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

type DynError = Box<dyn StdError + Send + Sync>;

/// Canonical strategy error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Credentials, endpoints, or transport setup are unusable.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Token endpoint answered, but not with a usable token; retrying later may help.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Token endpoint could not be reached.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Resolved identity is not allowed to sign in.
	#[error(transparent)]
	Unauthorized(#[from] AuthorizationError),

	/// Provider rejected the grant (e.g., expired or already redeemed code).
	#[error("Authorization code was rejected: {reason}.")]
	InvalidGrant {
		/// Provider- or strategy-supplied reason string.
		reason: String,
	},
	/// Client id or secret was rejected by the directory.
	#[error("Application credentials were rejected: {reason}.")]
	InvalidClient {
		/// Provider- or strategy-supplied reason string.
		reason: String,
	},
	/// Callback `state` was missing or did not match the flow.
	#[error("CSRF detected.")]
	CsrfDetected,
	/// Provider redirected back with an OAuth `error` parameter.
	#[error("Provider returned `{error}`{}.", describe(.description))]
	ProviderDenied {
		/// OAuth `error` (or `error_reason`) value.
		error: String,
		/// Optional `error_description`.
		description: Option<String>,
		/// Optional `error_uri`.
		uri: Option<String>,
	},
}

/// Problems detected before any request reaches the directory.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Transport failed to build its client or a request.
	#[error("Token endpoint transport is misconfigured.")]
	HttpClientBuild {
		/// Builder error reported by the transport.
		#[source]
		source: DynError,
	},
	/// Token request could not be assembled.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Tenant provider (or static options) did not supply a client id.
	#[error("Client id is not configured.")]
	MissingClientId,
	/// Tenant provider (or static options) did not supply a client secret.
	#[error("Client secret is not configured.")]
	MissingClientSecret,
	/// A resolved endpoint could not be parsed.
	#[error("The {endpoint} endpoint is not a valid URL: {url}.")]
	InvalidEndpoint {
		/// Which endpoint failed to parse.
		endpoint: &'static str,
		/// Raw endpoint string.
		url: String,
		/// Parser error.
		#[source]
		source: url::ParseError,
	},
	/// Host plus callback path does not form an absolute URL.
	#[error("Redirect URI is invalid: {url}.")]
	InvalidRedirect {
		/// Raw redirect URI string.
		url: String,
		/// Parser error.
		#[source]
		source: url::ParseError,
	},
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(source: ReqwestError) -> Self {
		Self::HttpClientBuild { source: Box::new(source) }
	}
}

/// Token endpoint failures that are not the caller's fault.
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Directory reported an error it may recover from (throttling, outage, loop detection).
	#[error("Token endpoint is unavailable: {message}.")]
	TokenEndpoint {
		/// Error description (or code) from the directory.
		message: String,
		/// Response status.
		status: Option<u16>,
		/// `Retry-After` hint.
		retry_after: Option<Duration>,
	},
	/// Token response body did not match the expected shape.
	#[error("Token response could not be parsed.")]
	TokenResponseParse {
		/// Path-aware JSON error.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// Response status.
		status: Option<u16>,
	},
	/// Token endpoint did not answer in time.
	#[error("Token endpoint timed out.")]
	Timeout {
		/// Response status, if headers arrived before the timeout.
		status: Option<u16>,
	},
}

/// Connection-level failures.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// DNS, TCP, or TLS failure.
	#[error("Could not connect to the token endpoint.")]
	Network {
		/// Error reported by the transport.
		#[source]
		source: DynError,
	},
	/// Socket I/O failure.
	#[error("Token endpoint connection failed mid-request.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a custom transport's connection error.
	pub fn network(source: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { source: Box::new(source) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(source: ReqwestError) -> Self {
		Self::network(source)
	}
}

fn describe(description: &Option<String>) -> String {
	description.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn provider_denied_renders_optional_description() {
		let bare = Error::ProviderDenied { error: "access_denied".into(), description: None, uri: None };

		assert_eq!(bare.to_string(), "Provider returned `access_denied`.");

		let described = Error::ProviderDenied {
			error: "access_denied".into(),
			description: Some("User cancelled".into()),
			uri: None,
		};

		assert_eq!(described.to_string(), "Provider returned `access_denied`: User cancelled.");
	}

	#[test]
	fn unauthorized_is_transparent() {
		let err = Error::from(AuthorizationError::InvalidEmail { email: None });

		assert_eq!(err.to_string(), "Invalid Email Domain or Email Not Authorized");
	}
}
