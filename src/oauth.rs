//! Authorization-code exchange facade over the `oauth2` crate.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, AuthorizationCode, Client, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	ExtraTokenFields, HttpClientError, PkceCodeVerifier, RedirectUrl, RequestTokenError,
	StandardRevocableToken, StandardTokenResponse, TokenResponse, TokenUrl,
	basic::{
		BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
		BasicTokenType,
	},
};
// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	error::{ConfigError, TransientError, TransportError},
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
	provider::{AzureEndpoints, ProviderConfig},
};

/// Token endpoint response carrying the OpenID Connect `id_token`.
pub type AzureTokenResponse = StandardTokenResponse<IdTokenFields, BasicTokenType>;

type ConfiguredClient = Client<
	BasicErrorResponse,
	AzureTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointSet,
>;

/// Extra token-response fields beyond RFC 6749.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdTokenFields {
	/// Raw identity token, absent for some account types.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id_token: Option<String>,
}
impl ExtraTokenFields for IdTokenFields {}

/// Maps HTTP transport failures into strategy [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a strategy error.
	fn map_transport_error(
		&self,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(meta, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => map_generic_transport_error(meta, message),
			_ => map_generic_transport_error(meta, "unrecognized transport failure"),
		}
	}
}

/// Classification of token endpoint rejections.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExchangeErrorKind {
	/// Code expired, already redeemed, or issued for another redirect/client.
	InvalidGrant,
	/// Client secret or registration problem.
	InvalidClient,
	/// Provider-side trouble worth retrying later.
	Transient,
}

/// Classifies a token endpoint error response.
///
/// Directory `AADSTS` codes in the description win, then the OAuth `error` code, then the
/// HTTP status.
pub fn classify_exchange_error(
	oauth_error: &str,
	description: Option<&str>,
	status: Option<u16>,
) -> ExchangeErrorKind {
	description
		.and_then(aadsts_code)
		.and_then(classify_aadsts)
		.or_else(|| classify_oauth_error(oauth_error))
		.unwrap_or_else(|| classify_status(status))
}

pub(crate) struct AzureFacade<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: ConfiguredClient,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> AzureFacade<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn from_config(
		config: &ProviderConfig,
		endpoints: &AzureEndpoints,
		redirect_uri: &Url,
		http_client: Arc<C>,
		error_mapper: Arc<M>,
	) -> Result<Self> {
		let oauth_client = Client::new(ClientId::new(config.client_id.clone()))
			.set_client_secret(ClientSecret::new(config.client_secret.expose().to_owned()))
			.set_token_uri(TokenUrl::from_url(endpoints.token()?))
			.set_redirect_uri(RedirectUrl::from_url(redirect_uri.clone()))
			.set_auth_type(AuthType::RequestBody);

		Ok(Self { oauth_client, http_client, error_mapper })
	}

	/// Redeems `code` at the token endpoint.
	pub(crate) async fn exchange_code(
		&self,
		code: &str,
		pkce_verifier: Option<&str>,
	) -> Result<AccessToken> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.with_metadata(meta.clone());
		let mut request = self.oauth_client.exchange_code(AuthorizationCode::new(code.to_owned()));

		if let Some(verifier) = pkce_verifier {
			request = request.set_pkce_verifier(PkceCodeVerifier::new(verifier.to_owned()));
		}

		let response = request
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(meta.take(), err, self.error_mapper.as_ref()))?;

		Ok(map_token_response(&response))
	}
}

fn map_token_response(response: &AzureTokenResponse) -> AccessToken {
	let mut token = AccessToken::new(response.access_token().secret().to_owned());

	if let Some(id_token) = response.extra_fields().id_token.as_deref() {
		token = token.with_id_token(id_token);
	}
	if let Some(refresh) = response.refresh_token() {
		token = token.with_refresh_token(refresh.secret().to_owned());
	}
	if let Some(scopes) = response.scopes() {
		token = token.with_scope(
			scopes.iter().map(|scope| scope.as_str()).collect::<Vec<_>>().join(" "),
		);
	}
	if let Some(expires_in) = response.expires_in().and_then(|value| Duration::try_from(value).ok())
	{
		token = token.with_expires_in(expires_in);
	}

	token
}

fn map_request_error<E, M>(
	meta: Option<ResponseMetadata>,
	err: RequestTokenError<HttpClientError<E>, BasicErrorResponse>,
	mapper: &M,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let meta_ref = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) => map_server_response_error(response, meta_ref),
		RequestTokenError::Request(error) => mapper.map_transport_error(meta_ref, error),
		RequestTokenError::Parse(error, _body) =>
			TransientError::TokenResponseParse { source: error, status: meta_status(meta_ref) }
				.into(),
		RequestTokenError::Other(message) => TransientError::TokenEndpoint {
			message,
			status: meta_status(meta_ref),
			retry_after: meta_retry_after(meta_ref),
		}
		.into(),
	}
}

fn map_server_response_error(response: BasicErrorResponse, meta: Option<&ResponseMetadata>) -> Error {
	let code = response.error().as_ref().to_owned();
	let description = response.error_description().cloned();
	let kind = classify_exchange_error(&code, description.as_deref(), meta_status(meta));
	let reason = description.unwrap_or(code);

	match kind {
		ExchangeErrorKind::InvalidGrant => Error::InvalidGrant { reason },
		ExchangeErrorKind::InvalidClient => Error::InvalidClient { reason },
		ExchangeErrorKind::Transient => TransientError::TokenEndpoint {
			message: reason,
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		}
		.into(),
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(meta: Option<&ResponseMetadata>, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransientError::Timeout {
			status: meta_status(meta).or_else(|| err.status().map(|code| code.as_u16())),
		}
		.into();
	}

	TransportError::from(err).into()
}

#[cfg(feature = "reqwest")]
fn map_generic_transport_error(meta: Option<&ResponseMetadata>, message: impl Display) -> Error {
	TransientError::TokenEndpoint {
		message: format!("HTTP client error: {message}"),
		status: meta_status(meta),
		retry_after: meta_retry_after(meta),
	}
	.into()
}

fn aadsts_code(description: &str) -> Option<u32> {
	let rest = &description[description.find("AADSTS")? + "AADSTS".len()..];
	let digits = rest.bytes().take_while(u8::is_ascii_digit).count();

	rest[..digits].parse().ok()
}

fn classify_aadsts(code: u32) -> Option<ExchangeErrorKind> {
	match code {
		// Expired, redeemed, or malformed codes; redirect or PKCE mismatches.
		70000 | 70008 | 54005 | 50148 | 501481 | 9002313 | 500112 =>
			Some(ExchangeErrorKind::InvalidGrant),
		// Bad or expired secret, unknown application, unknown tenant.
		7000215 | 7000222 | 700016 | 700027 | 90002 => Some(ExchangeErrorKind::InvalidClient),
		// Directory throttling and outages.
		50196 | 90033 | 500011 => Some(ExchangeErrorKind::Transient),
		_ => None,
	}
}

fn classify_oauth_error(value: &str) -> Option<ExchangeErrorKind> {
	match value.to_ascii_lowercase().as_str() {
		"invalid_grant" | "access_denied" | "invalid_request" | "invalid_scope" =>
			Some(ExchangeErrorKind::InvalidGrant),
		"invalid_client" | "unauthorized_client" => Some(ExchangeErrorKind::InvalidClient),
		"temporarily_unavailable" | "server_error" => Some(ExchangeErrorKind::Transient),
		_ => None,
	}
}

fn classify_status(status: Option<u16>) -> ExchangeErrorKind {
	match status {
		Some(400 | 404 | 410) => ExchangeErrorKind::InvalidGrant,
		Some(401 | 403) => ExchangeErrorKind::InvalidClient,
		_ => ExchangeErrorKind::Transient,
	}
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

fn meta_retry_after(meta: Option<&ResponseMetadata>) -> Option<Duration> {
	meta.and_then(|value| value.retry_after)
}
