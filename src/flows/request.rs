//! Flow initiation: provider resolution, state + PKCE generation, authorize URL.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	flows::Strategy,
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
	obs::{FlowOutcome, FlowPhase, FlowSpan},
	provider::{AzureEndpoints, ProviderConfig},
};

const STATE_LEN: usize = 32;
const PKCE_VERIFIER_LEN: usize = 64;
// Owned by the strategy; extra authorize params never override them.
const RESERVED_PARAMS: [&str; 7] = [
	"response_type",
	"client_id",
	"redirect_uri",
	"scope",
	"state",
	"code_challenge",
	"code_challenge_method",
];

/// The slice of the hosting request the strategy reads.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestContext {
	/// Scheme, host, and port (e.g. `https://app.example.com`).
	pub full_host: String,
	/// Request path.
	pub path: String,
	/// Decoded query parameters; the last occurrence of a repeated key wins.
	pub query: BTreeMap<String, String>,
}
impl RequestContext {
	/// Creates a context without query parameters.
	pub fn new(full_host: impl Into<String>, path: impl Into<String>) -> Self {
		Self { full_host: full_host.into(), path: path.into(), query: BTreeMap::new() }
	}

	/// Builds a context from an absolute request URL.
	pub fn from_url(url: &Url) -> Self {
		Self {
			full_host: url.origin().ascii_serialization(),
			path: url.path().to_owned(),
			query: url.query_pairs().into_owned().collect(),
		}
	}

	/// Adds a query parameter.
	pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.insert(key.into(), value.into());

		self
	}

	/// Returns a query parameter, including present-but-empty values.
	pub fn query_param(&self, name: &str) -> Option<&str> {
		self.query.get(name).map(String::as_str)
	}
}

/// Supported PKCE challenge methods surfaced via [`AuthorizationSession`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PkceCodeChallengeMethod {
	/// SHA-256 based PKCE (RFC 7636 S256).
	S256,
}
impl PkceCodeChallengeMethod {
	/// Returns the RFC 7636 identifier for the challenge method.
	pub fn as_str(self) -> &'static str {
		match self {
			PkceCodeChallengeMethod::S256 => "S256",
		}
	}
}

/// Per-flow state produced by [`Strategy::request_phase`].
///
/// The host keeps the session (server-side; it holds the client secret) until the
/// provider redirects back, then hands it to [`Strategy::callback_phase`]. The callback
/// exchanges the code against exactly the config and endpoints resolved here.
#[derive(Clone)]
pub struct AuthorizationSession {
	/// Opaque state value that must round-trip via the redirect.
	pub state: String,
	/// Redirect URI sent with the authorize request and the token exchange.
	pub redirect_uri: Url,
	/// Authorize URL the host should redirect the user agent to.
	pub authorize_url: Url,
	/// Provider settings resolved at flow start.
	pub config: ProviderConfig,
	/// Endpoint pair built from [`AuthorizationSession::config`].
	pub endpoints: AzureEndpoints,
	pkce: Option<PkcePair>,
}
impl AuthorizationSession {
	/// PKCE code challenge, when PKCE is enabled.
	pub fn code_challenge(&self) -> Option<&str> {
		self.pkce.as_ref().map(|pkce| pkce.challenge.as_str())
	}

	/// PKCE challenge method, when PKCE is enabled.
	pub fn code_challenge_method(&self) -> Option<PkceCodeChallengeMethod> {
		self.pkce.as_ref().map(|pkce| pkce.method)
	}

	/// Validates the `state` returned on the redirect.
	pub fn validate_state(&self, returned_state: Option<&str>) -> Result<()> {
		match returned_state {
			Some(state) if !state.is_empty() && state == self.state => Ok(()),
			_ => Err(Error::CsrfDetected),
		}
	}

	pub(crate) fn pkce_verifier(&self) -> Option<&str> {
		self.pkce.as_ref().map(|pkce| pkce.verifier.as_str())
	}
}
impl Debug for AuthorizationSession {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationSession")
			.field("state", &self.state)
			.field("redirect_uri", &self.redirect_uri)
			.field("authorize_url", &self.authorize_url)
			.field("config", &self.config)
			.field("endpoints", &self.endpoints)
			.field("code_challenge", &self.code_challenge())
			.field("code_challenge_method", &self.code_challenge_method())
			.finish()
	}
}

#[derive(Clone)]
struct PkcePair {
	verifier: String,
	challenge: String,
	method: PkceCodeChallengeMethod,
}
impl PkcePair {
	fn generate() -> Self {
		let verifier = random_string(PKCE_VERIFIER_LEN);
		let challenge = compute_pkce_challenge(&verifier);

		Self { verifier, challenge, method: PkceCodeChallengeMethod::S256 }
	}
}

impl<C, M> Strategy<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Starts a flow: resolves the provider for `request` and prepares the redirect.
	///
	/// No network I/O happens here. Missing client credentials surface as
	/// [`ConfigError`]s and the flow cannot start.
	pub fn request_phase(&self, request: &RequestContext) -> Result<AuthorizationSession> {
		let span = FlowSpan::start(FlowPhase::Request, self.name());
		let result = span.in_scope(|| self.start_session(request));

		span.finish(FlowOutcome::of(&result));

		result
	}

	fn start_session(&self, request: &RequestContext) -> Result<AuthorizationSession> {
		let config = self.resolve_provider(request)?;
		let endpoints = AzureEndpoints::build(&config);
		let redirect_uri = self.callback_url(request)?;

		Ok(build_session(config, endpoints, redirect_uri, self.options.pkce)?)
	}
}

fn build_session(
	config: ProviderConfig,
	endpoints: AzureEndpoints,
	redirect_uri: Url,
	pkce: bool,
) -> Result<AuthorizationSession, ConfigError> {
	let state = random_string(STATE_LEN);
	let pkce = pkce.then(PkcePair::generate);
	let authorize_url =
		build_authorize_url(&config, &endpoints, &redirect_uri, &state, pkce.as_ref())?;

	Ok(AuthorizationSession { state, redirect_uri, authorize_url, config, endpoints, pkce })
}

fn build_authorize_url(
	config: &ProviderConfig,
	endpoints: &AzureEndpoints,
	redirect_uri: &Url,
	state: &str,
	pkce: Option<&PkcePair>,
) -> Result<Url, ConfigError> {
	let mut url = endpoints.authorize()?;
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("response_type", "code");
	pairs.append_pair("client_id", &config.client_id);
	pairs.append_pair("redirect_uri", redirect_uri.as_str());
	pairs.append_pair("scope", &config.scope);
	pairs.append_pair("state", state);

	if let Some(pkce) = pkce {
		pairs.append_pair("code_challenge", &pkce.challenge);
		pairs.append_pair("code_challenge_method", pkce.method.as_str());
	}

	for (key, value) in &config.authorize_extra_params {
		if !RESERVED_PARAMS.contains(&key.as_str()) {
			pairs.append_pair(key, value);
		}
	}

	drop(pairs);

	Ok(url)
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

fn compute_pkce_challenge(verifier: &str) -> String {
	URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}
