//! Redirect handling: code exchange, claim extraction, verification.
//!
//! Each callback drives a fresh [`CallbackFlow`] through
//! `Started -> Exchanging -> ClaimsExtracted -> Verifying -> {Completed | Failed}`.
//! Failures never retry; they are reported to the host as a [`CallbackFailure`] pairing a
//! short [`FailureReason`] with the underlying [`Error`].

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, AuthHash, AuthorizationError, AuthorizationPolicy, Identity, RawClaims},
	error::TransientError,
	flows::{AuthorizationSession, RequestContext, Strategy},
	http::TokenHttpClient,
	oauth::{AzureFacade, TransportErrorMapper},
	obs::{self, FlowOutcome, FlowPhase, FlowSpan},
};

/// Parameters the provider appends to the callback redirect.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallbackParams {
	/// Authorization code.
	pub code: Option<String>,
	/// Echoed `state`.
	pub state: Option<String>,
	/// OAuth `error` code.
	pub error: Option<String>,
	/// Legacy `error_reason` code.
	pub error_reason: Option<String>,
	/// Human-readable `error_description`.
	pub error_description: Option<String>,
	/// `error_uri` pointing at provider documentation.
	pub error_uri: Option<String>,
}
impl CallbackParams {
	/// Extracts the callback parameters from decoded query pairs.
	pub fn from_query(query: &BTreeMap<String, String>) -> Self {
		let take = |name: &str| query.get(name).cloned();

		Self {
			code: take("code"),
			state: take("state"),
			error: take("error"),
			error_reason: take("error_reason"),
			error_description: take("error_description"),
			error_uri: take("error_uri"),
		}
	}

	/// The provider's rejection, when it redirected back with `error`/`error_reason`.
	pub fn provider_error(&self) -> Option<Error> {
		let error = self.error.clone().or_else(|| self.error_reason.clone())?;

		Some(Error::ProviderDenied {
			error,
			description: self.error_description.clone(),
			uri: self.error_uri.clone(),
		})
	}
}

/// Callback orchestration states.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CallbackState {
	/// Redirect received; nothing exchanged yet.
	#[default]
	Started,
	/// Authorization code is being redeemed.
	Exchanging,
	/// Tokens received; claims available.
	ClaimsExtracted,
	/// Allow-list is being applied.
	Verifying,
	/// Identity verified.
	Completed,
	/// Flow failed; terminal.
	Failed,
}
impl CallbackState {
	/// Returns a stable label suitable for span or log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallbackState::Started => "started",
			CallbackState::Exchanging => "exchanging",
			CallbackState::ClaimsExtracted => "claims_extracted",
			CallbackState::Verifying => "verifying",
			CallbackState::Completed => "completed",
			CallbackState::Failed => "failed",
		}
	}

	/// Returns true for `Completed` and `Failed`.
	pub const fn is_terminal(self) -> bool {
		matches!(self, CallbackState::Completed | CallbackState::Failed)
	}
}

/// State owned by a single callback invocation.
///
/// Merged claims are computed at most once: after the first call to
/// [`CallbackFlow::raw_info`], later calls return the same value even if the stored token
/// is modified.
#[derive(Debug, Default)]
pub struct CallbackFlow {
	state: CallbackState,
	access_token: Option<AccessToken>,
	raw_info: OnceLock<RawClaims>,
}
impl CallbackFlow {
	/// Current state.
	pub fn state(&self) -> CallbackState {
		self.state
	}

	/// Marks the start of the code exchange.
	pub fn begin_exchange(&mut self) {
		self.transition(CallbackState::Exchanging);
	}

	/// Stores the exchanged token.
	pub fn exchanged(&mut self, token: AccessToken) {
		self.access_token = Some(token);
		self.transition(CallbackState::ClaimsExtracted);
	}

	/// Token obtained by the exchange.
	pub fn access_token(&self) -> Option<&AccessToken> {
		self.access_token.as_ref()
	}

	/// Mutable access to the exchanged token; does not invalidate memoized claims.
	pub fn access_token_mut(&mut self) -> Option<&mut AccessToken> {
		self.access_token.as_mut()
	}

	/// Merged identity/access token claims, or `None` before the exchange completes.
	pub fn raw_info(&self) -> Option<&RawClaims> {
		let token = self.access_token.as_ref()?;

		Some(self.raw_info.get_or_init(|| {
			RawClaims::extract(token.id_token.as_ref().map(|id| id.expose()), token.token.expose())
		}))
	}

	/// Applies `policy` to the merged claims.
	///
	/// Without claims (no exchange, or neither token decodable) the email is absent and
	/// verification fails.
	pub fn verify(&mut self, policy: &AuthorizationPolicy) -> Result<Identity, AuthorizationError> {
		self.transition(CallbackState::Verifying);

		let result = match self.raw_info() {
			Some(claims) => policy.verify(claims),
			None => policy.verify(&RawClaims::default()),
		};

		self.transition(match result {
			Ok(_) => CallbackState::Completed,
			Err(_) => CallbackState::Failed,
		});

		result
	}

	/// Builds the host-facing result once the exchange has produced a token.
	pub fn auth_hash(&self, provider: &str, identity: Identity) -> Option<AuthHash> {
		let token = self.access_token()?;
		let raw_info = self.raw_info()?.clone();

		Some(AuthHash::new(provider, identity, token, raw_info))
	}

	/// Moves the flow into `Failed`.
	pub fn fail(&mut self) {
		self.transition(CallbackState::Failed);
	}

	fn transition(&mut self, next: CallbackState) {
		if self.state == next || self.state.is_terminal() {
			return;
		}

		obs::trace_transition(self.state.as_str(), next.as_str());

		self.state = next;
	}
}

/// Short failure code routed through the host's failure channel.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FailureReason {
	/// Allow-list rejected the identity.
	InvalidEmail,
	/// `state` was missing or did not match.
	CsrfDetected,
	/// Provider redirected back with this `error` code.
	Provider(String),
	/// Token endpoint rejected the exchange or answered unexpectedly.
	InvalidCredentials,
	/// Transport timed out.
	Timeout,
	/// Transport could not reach the token endpoint.
	FailedToConnect,
	/// Local configuration prevented the exchange.
	InvalidConfiguration,
}
impl FailureReason {
	/// Returns the reason code.
	pub fn as_str(&self) -> &str {
		match self {
			FailureReason::InvalidEmail => crate::auth::INVALID_EMAIL,
			FailureReason::CsrfDetected => "csrf_detected",
			FailureReason::Provider(error) => error.as_str(),
			FailureReason::InvalidCredentials => "invalid_credentials",
			FailureReason::Timeout => "timeout",
			FailureReason::FailedToConnect => "failed_to_connect",
			FailureReason::InvalidConfiguration => "invalid_configuration",
		}
	}

	/// Classifies a strategy error.
	pub fn from_error(error: &Error) -> Self {
		match error {
			Error::Unauthorized(_) => FailureReason::InvalidEmail,
			Error::CsrfDetected => FailureReason::CsrfDetected,
			Error::ProviderDenied { error, .. } => FailureReason::Provider(error.clone()),
			Error::Transient(TransientError::Timeout { .. }) => FailureReason::Timeout,
			Error::Transient(_) | Error::InvalidGrant { .. } | Error::InvalidClient { .. } =>
				FailureReason::InvalidCredentials,
			Error::Transport(_) => FailureReason::FailedToConnect,
			Error::Config(_) => FailureReason::InvalidConfiguration,
		}
	}
}
impl Display for FailureReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Failed callback: reason code plus the originating error.
#[derive(Debug, ThisError)]
#[error("{reason}: {error}")]
pub struct CallbackFailure {
	/// Short reason code.
	pub reason: FailureReason,
	/// Underlying cause.
	#[source]
	pub error: Error,
}
impl From<Error> for CallbackFailure {
	fn from(error: Error) -> Self {
		Self { reason: FailureReason::from_error(&error), error }
	}
}

/// Terminal result of one callback.
#[derive(Debug)]
pub enum CallbackOutcome {
	/// Identity verified.
	Completed(Box<AuthHash>),
	/// Flow failed.
	Failed(CallbackFailure),
}
impl CallbackOutcome {
	/// Returns true when the identity was verified.
	pub fn is_completed(&self) -> bool {
		matches!(self, CallbackOutcome::Completed(_))
	}

	/// Borrows the auth hash of a completed flow.
	pub fn auth_hash(&self) -> Option<&AuthHash> {
		match self {
			CallbackOutcome::Completed(hash) => Some(hash),
			CallbackOutcome::Failed(_) => None,
		}
	}

	/// Converts into a `Result`.
	pub fn into_result(self) -> Result<AuthHash, CallbackFailure> {
		match self {
			CallbackOutcome::Completed(hash) => Ok(*hash),
			CallbackOutcome::Failed(failure) => Err(failure),
		}
	}
}

impl<C, M> Strategy<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Completes a flow started by [`Strategy::request_phase`].
	///
	/// Provider errors are reported before the `state` comparison; the comparison is
	/// skipped when `provider_ignores_state` is set.
	pub async fn callback_phase(
		&self,
		session: &AuthorizationSession,
		request: &RequestContext,
	) -> CallbackOutcome {
		let span = FlowSpan::start(FlowPhase::Callback, self.name());
		let mut flow = CallbackFlow::default();
		let result = span.instrument(self.run_callback(&mut flow, session, request)).await;

		span.finish(FlowOutcome::of(&result));

		match result {
			Ok(hash) => CallbackOutcome::Completed(Box::new(hash)),
			Err(error) => {
				flow.fail();

				#[cfg(feature = "tracing")]
				tracing::debug!(error = %error, "callback failed");

				CallbackOutcome::Failed(CallbackFailure::from(error))
			},
		}
	}

	async fn run_callback(
		&self,
		flow: &mut CallbackFlow,
		session: &AuthorizationSession,
		request: &RequestContext,
	) -> Result<AuthHash> {
		let params = CallbackParams::from_query(&request.query);

		if let Some(error) = params.provider_error() {
			return Err(error);
		}
		if !self.options.provider_ignores_state {
			session.validate_state(params.state.as_deref())?;
		}

		let code = params.code.as_deref().filter(|code| !code.is_empty()).ok_or_else(|| {
			Error::InvalidGrant { reason: "Callback did not include an authorization code".into() }
		})?;

		flow.begin_exchange();

		let facade = <AzureFacade<C, M>>::from_config(
			&session.config,
			&session.endpoints,
			&session.redirect_uri,
			self.http_client.clone(),
			self.transport_mapper.clone(),
		)?;
		let token = facade.exchange_code(code, session.pkce_verifier()).await?;

		flow.exchanged(token);

		let identity = flow.verify(self.policy())?;

		flow.auth_hash(self.name(), identity).ok_or_else(|| Error::InvalidGrant {
			reason: "Token exchange did not complete".into(),
		})
	}
}
