//! Strategy orchestration: flow initiation (request phase) and redirect handling
//! (callback phase).

pub mod callback;
pub mod request;

pub use callback::*;
pub use request::*;

// self
use crate::{
	_prelude::*,
	auth::AuthorizationPolicy,
	config::StrategyOptions,
	error::ConfigError,
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
	provider::{ProviderConfig, TenantProviderFactory},
};
#[cfg(feature = "reqwest")]
use crate::{
	http::{DEFAULT_TIMEOUT, ReqwestHttpClient},
	oauth::ReqwestTransportErrorMapper,
};

#[cfg(feature = "reqwest")]
/// Strategy specialized for the crate's default reqwest transport stack.
pub type ReqwestStrategy = Strategy<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Azure AD sign-in strategy.
///
/// A strategy is built once from [`StrategyOptions`] and shared across requests; it holds
/// no per-request state. Every flow resolves its own [`ProviderConfig`] at start
/// ([`Strategy::request_phase`]) and carries it inside the returned
/// [`AuthorizationSession`], which the host keeps until the provider redirects back to
/// [`Strategy::callback_phase`].
#[derive(Clone)]
pub struct Strategy<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client used for the token exchange.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Static options; also the provider source when no tenant provider is set.
	pub options: StrategyOptions,
	tenant_provider: Option<Arc<dyn TenantProviderFactory>>,
	policy: AuthorizationPolicy,
}
impl<C, M> Strategy<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a strategy that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		options: StrategyOptions,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		let policy = options.authorization_policy();

		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			options,
			tenant_provider: None,
			policy,
		}
	}

	/// Resolves credentials and tenant settings per request through `factory`.
	pub fn with_tenant_provider(mut self, factory: impl 'static + TenantProviderFactory) -> Self {
		self.tenant_provider = Some(Arc::new(factory));

		self
	}

	/// Strategy name reported in [`AuthHash::provider`](crate::auth::AuthHash::provider).
	pub fn name(&self) -> &str {
		&self.options.name
	}

	/// Allow-list applied to every verified identity.
	pub fn policy(&self) -> &AuthorizationPolicy {
		&self.policy
	}

	/// Returns true when `request` targets the flow-initiation route.
	pub fn on_request_path(&self, request: &RequestContext) -> bool {
		request.path == self.options.request_path()
	}

	/// Returns true when `request` targets the callback route.
	pub fn on_callback_path(&self, request: &RequestContext) -> bool {
		request.path == self.options.callback_path()
	}

	/// Redirect URI for `request`: its host plus the configured callback path, no query.
	pub fn callback_url(&self, request: &RequestContext) -> Result<Url, ConfigError> {
		let raw = format!("{}{}", request.full_host.trim_end_matches('/'), self.options.callback_path());

		Url::parse(&raw).map_err(|source| ConfigError::InvalidRedirect { url: raw, source })
	}

	/// Resolves the effective provider settings for `request`.
	///
	/// The tenant provider (when configured) is bound to the request first; otherwise the
	/// static options are the source of truth.
	pub fn resolve_provider(&self, request: &RequestContext) -> Result<ProviderConfig, ConfigError> {
		match &self.tenant_provider {
			Some(factory) => {
				let provider = factory.bind(request);

				ProviderConfig::resolve(provider.as_ref(), request)
			},
			None => ProviderConfig::resolve(&self.options, request),
		}
	}
}
#[cfg(feature = "reqwest")]
impl Strategy<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a strategy backed by a redirect-free reqwest transport that gives up after
	/// [`DEFAULT_TIMEOUT`].
	pub fn new(options: StrategyOptions) -> Result<Self, ConfigError> {
		Ok(Self::with_http_client(
			options,
			ReqwestHttpClient::new(DEFAULT_TIMEOUT)?,
			Arc::new(ReqwestTransportErrorMapper),
		))
	}
}
impl<C, M> Debug for Strategy<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Strategy")
			.field("options", &self.options)
			.field("tenant_provider_set", &self.tenant_provider.is_some())
			.field("policy", &self.policy)
			.finish()
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;
	use crate::provider::TenantProvider;

	struct PerTenant(String);
	impl TenantProvider for PerTenant {
		fn client_id(&self) -> Option<String> {
			Some(format!("{}-client", self.0))
		}

		fn client_secret(&self) -> Option<String> {
			Some("tenant-secret".into())
		}

		fn tenant_id(&self) -> Option<String> {
			Some(self.0.clone())
		}
	}

	fn request() -> RequestContext {
		RequestContext::new("https://app.example.com/", "/auth/azure_activedirectory_v2")
	}

	#[test]
	fn callback_url_joins_host_and_callback_path() {
		let strategy =
			Strategy::new(StrategyOptions::new("client", "secret")).expect("Default transport should build.");
		let url = strategy.callback_url(&request().with_query("prompt", "login")).expect("Callback URL should parse.");

		assert_eq!(url.as_str(), "https://app.example.com/auth/azure_activedirectory_v2/callback");
		assert!(strategy.on_request_path(&request()));
		assert!(!strategy.on_callback_path(&request()));
	}

	#[test]
	fn callback_url_rejects_relative_hosts() {
		let strategy =
			Strategy::new(StrategyOptions::new("client", "secret")).expect("Default transport should build.");
		let err = strategy
			.callback_url(&RequestContext::new("app.example.com", "/"))
			.expect_err("A host without a scheme cannot form a redirect URI.");

		assert!(matches!(err, ConfigError::InvalidRedirect { .. }));
	}

	#[test]
	fn static_options_resolve_without_tenant_provider() {
		let strategy = Strategy::new(StrategyOptions::new("client", "secret").with_tenant_id("contoso"))
			.expect("Default transport should build.");
		let config = strategy.resolve_provider(&request()).expect("Static options should resolve.");

		assert_eq!(config.client_id, "client");
		assert_eq!(config.tenant_id, "contoso");
	}

	#[test]
	fn tenant_provider_is_bound_per_request() {
		let strategy = Strategy::new(StrategyOptions::default())
			.expect("Default transport should build.")
			.with_tenant_provider(|request: &RequestContext| {
				PerTenant(request.query_param("tenant").unwrap_or("common").to_owned())
			});
		let fabrikam = strategy
			.resolve_provider(&request().with_query("tenant", "fabrikam"))
			.expect("Tenant provider should resolve.");
		let fallback = strategy.resolve_provider(&request()).expect("Tenant provider should resolve.");

		assert_eq!(fabrikam.client_id, "fabrikam-client");
		assert_eq!(fabrikam.tenant_id, "fabrikam");
		assert_eq!(fallback.tenant_id, "common");
	}

	#[test]
	fn missing_static_credentials_fail_resolution() {
		let strategy = Strategy::new(StrategyOptions::default()).expect("Default transport should build.");
		let err = strategy.resolve_provider(&request()).expect_err("No credentials must fail.");

		assert!(matches!(err, ConfigError::MissingClientId));
	}
}
